//! OpenManus terminal console entry point.

use chrono::Utc;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use manus_tui::api_client::{ApiClient, Backend};
use manus_tui::config::TuiConfig;
use manus_tui::error::TuiError;
use manus_tui::events::TuiEvent;
use manus_tui::logging;
use manus_tui::persistence::{self, PersistedState};
use manus_tui::realtime::spawn_flow_stream;
use manus_tui::state::App;
use manus_tui::store::{perform, Effect, Request};
use manus_tui::views::render_view;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    logging::init(&config)?;
    let api = ApiClient::new(&config)?;
    let backend: Arc<dyn Backend> = Arc::new(api.rest().clone());

    let mut app = App::new(config);
    match persistence::load(&app.config.persistence_path) {
        Ok(Some(state)) => app.active_view = state.active_view,
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable UI state"),
    }

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());

    for request in app.startup_requests() {
        dispatch(&backend, &event_tx, request);
    }

    let tick_rate = Duration::from_millis(app.config.tick_rate_ms);
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        terminal.draw(|f| render_view(f, &app))?;

        tokio::select! {
            _ = ticker.tick() => app.on_tick(Utc::now()),
            Some(event) = event_rx.recv() => {
                if handle_event(&mut app, &api, &backend, &event_tx, event) {
                    break;
                }
            }
        }
    }

    if let Some(stream) = app.stream.take() {
        stream.close();
    }
    let persisted = PersistedState {
        active_view: app.active_view,
    };
    if let Err(err) = persistence::save(&app.config.persistence_path, &persisted) {
        tracing::warn!(error = %err, "failed to save UI state");
    }
    tracing::info!("Shutting down");

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let sent = match evt {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        sender.blocking_send(TuiEvent::Input(key))
                    }
                    CrosstermEvent::Resize(width, height) => {
                        sender.blocking_send(TuiEvent::Resize { width, height })
                    }
                    _ => Ok(()),
                };
                if sent.is_err() {
                    break;
                }
            }
        }
    });
}

/// Run `request` on its own task; the response comes back through the channel.
fn dispatch(backend: &Arc<dyn Backend>, sender: &mpsc::Sender<TuiEvent>, request: Request) {
    let backend = Arc::clone(backend);
    let sender = sender.clone();
    tracing::debug!(request = request.name(), "dispatching request");
    tokio::spawn(async move {
        let response = perform(backend.as_ref(), request).await;
        let _ = sender.send(TuiEvent::Response(Box::new(response))).await;
    });
}

/// Returns `true` when the app should quit.
fn handle_event(
    app: &mut App,
    api: &ApiClient,
    backend: &Arc<dyn Backend>,
    sender: &mpsc::Sender<TuiEvent>,
    event: TuiEvent,
) -> bool {
    match event {
        TuiEvent::Input(key) => {
            let outcome = app.handle_key(key);
            for request in outcome.requests {
                dispatch(backend, sender, request);
            }
            return outcome.quit;
        }
        TuiEvent::Response(response) => {
            if let Some(Effect::SubscribeStream(flow_id)) = app.apply_response(*response) {
                let subscription = spawn_flow_stream(api.stream().clone(), flow_id, sender.clone());
                app.attach_stream(subscription);
            }
        }
        TuiEvent::Stream(stream_event) => app.handle_stream_event(stream_event),
        TuiEvent::Resize { .. } => {}
    }
    false
}
