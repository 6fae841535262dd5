use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use manus_core::{LlmSettings, Message, StepStatus};
use manus_test_utils::fixtures::sample_tools;
use manus_test_utils::generators::arb_step_status;
use manus_tui::config::{ThemeConfig, TuiConfig};
use manus_tui::history::{HistoryCursor, Recall};
use manus_tui::keys::{map_key, Action};
use manus_tui::nav::View;
use manus_tui::persistence::{self, PersistedState};
use manus_tui::state::{App, Outcome};
use manus_tui::store::{Request, RequestStatus, Response};
use manus_tui::theme::{request_status_color, step_status_color, Theme};
use proptest::prelude::*;
use std::io::Write;

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:8000".to_string(),
        request_timeout_ms: 5_000,
        tick_rate_ms: 250,
        message_ttl_ms: 3_000,
        persistence_path: "tmp/manus-tui.json".into(),
        log_path: "tmp/manus-tui.log".into(),
        log_filter: "info".to_string(),
        theme: ThemeConfig {
            name: "terminal".to_string(),
        },
        tools: sample_tools(),
    }
}

fn press(app: &mut App, code: KeyCode) -> Outcome {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn configured_app() -> App {
    let mut app = App::new(base_config());
    app.store.llm.update_settings(LlmSettings::default());
    app
}

/// Submit `command` from an open terminal editor and answer it with `reply`.
fn run_command(app: &mut App, command: &str, reply: &str) {
    type_text(app, command);
    let outcome = press(app, KeyCode::Enter);
    let token = match outcome.requests.as_slice() {
        [Request::ExecuteCommand { token, .. }] => *token,
        other => panic!("expected one command request, got {other:?}"),
    };
    app.apply_response(Response::CommandExecuted {
        token,
        result: Ok(Message::assistant(reply)),
    });
}

fn editor_text(app: &App) -> Option<String> {
    app.editor.as_ref().map(|e| e.text())
}

#[test]
fn base_config_is_valid() {
    assert!(base_config().validate().is_ok());
}

#[test]
fn config_requires_http_base_url() {
    let mut config = base_config();
    config.api_base_url = "localhost:8000".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn config_requires_known_theme() {
    let mut config = base_config();
    config.theme = ThemeConfig {
        name: "unknown".to_string(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn config_rejects_zero_intervals() {
    let mut config = base_config();
    config.tick_rate_ms = 0;
    assert!(config.validate().is_err());

    let mut config = base_config();
    config.message_ttl_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn config_rejects_duplicate_tools() {
    let mut config = base_config();
    config.tools.push(config.tools[0].clone());
    assert!(config.validate().is_err());
}

#[test]
fn config_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
api_base_url = "https://manus.example"
request_timeout_ms = 2000
tick_rate_ms = 100
message_ttl_ms = 3000
persistence_path = "state.json"
log_path = "manus.log"
log_filter = "manus_tui=debug"

[theme]
name = "Terminal"

[[tools]]
name = "python_execute"
description = "Execute Python code"
"#
    )
    .expect("write config");

    let config = TuiConfig::from_path(file.path()).expect("parse config");
    assert!(config.validate().is_ok());
    assert_eq!(config.tools.len(), 1);
    assert_eq!(config.tools[0].name, "python_execute");
}

#[test]
fn config_rejects_unknown_fields() {
    let result = TuiConfig::from_toml(
        r#"
api_base_url = "http://localhost:8000"
request_timeout_ms = 1000
tick_rate_ms = 250
message_ttl_ms = 3000
persistence_path = "state.json"
log_path = "manus.log"
log_filter = "info"
refresh_interval_ms = 10

[theme]
name = "terminal"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn persisted_view_round_trips() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("state.json");
    assert_eq!(persistence::load(&path).expect("missing file is fine"), None);

    let state = PersistedState {
        active_view: View::Flow,
    };
    persistence::save(&path, &state).expect("save");
    assert_eq!(persistence::load(&path).expect("load"), Some(state));
}

#[test]
fn corrupt_state_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").expect("write");
    assert!(persistence::load(&path).is_err());
}

#[test]
fn history_recall_walks_commands() {
    let mut app = configured_app();
    press(&mut app, KeyCode::Enter);
    run_command(&mut app, "cmd1", "one");
    run_command(&mut app, "cmd2", "two");
    run_command(&mut app, "cmd3", "three");

    press(&mut app, KeyCode::Up);
    assert_eq!(editor_text(&app).as_deref(), Some("cmd3"));
    press(&mut app, KeyCode::Up);
    assert_eq!(editor_text(&app).as_deref(), Some("cmd2"));
    press(&mut app, KeyCode::Down);
    assert_eq!(editor_text(&app).as_deref(), Some("cmd3"));
    press(&mut app, KeyCode::Down);
    assert_eq!(editor_text(&app).as_deref(), Some(""));
}

#[test]
fn busy_terminal_keeps_the_typed_command() {
    let mut app = configured_app();
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "slow");
    let first = press(&mut app, KeyCode::Enter);
    assert_eq!(first.requests.len(), 1);

    type_text(&mut app, "next");
    let second = press(&mut app, KeyCode::Enter);
    assert!(second.requests.is_empty());
    assert_eq!(editor_text(&app).as_deref(), Some("next"));
    assert_eq!(app.store.terminal.command_history, vec!["slow"]);
}

#[test]
fn llm_form_submit_saves_settings() {
    let mut app = App::new(base_config());
    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.active_view, View::LlmConfig);

    // Focus the API key row and type a key.
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);
    type_text(&mut app, "sk-live");
    press(&mut app, KeyCode::Enter);

    let outcome = press(&mut app, KeyCode::Char('s'));
    assert!(matches!(
        outcome.requests.as_slice(),
        [Request::SaveSettings { settings, .. }] if settings.api_key == "sk-live"
    ));
    assert_eq!(app.store.llm.status, RequestStatus::Loading);
    assert!(app.store.llm.is_configured);
}

#[test]
fn failed_flow_start_raises_a_notification() {
    let mut app = App::new(base_config());
    press(&mut app, KeyCode::Char('4'));

    let empty = press(&mut app, KeyCode::Char('x'));
    assert!(empty.requests.is_empty());

    press(&mut app, KeyCode::Char('n'));
    type_text(&mut app, "plan the work");
    press(&mut app, KeyCode::Enter);
    let outcome = press(&mut app, KeyCode::Char('x'));
    let Some(Request::CreateFlow { token, .. }) = outcome.requests.into_iter().next() else {
        panic!("expected a flow creation request");
    };
    assert!(app.store.flow.is_executing);

    let effect = app.apply_response(Response::FlowCreated {
        token,
        result: Err("planner unavailable".to_string()),
    });
    assert_eq!(effect, None);
    assert!(!app.store.flow.is_executing);
    assert!(app
        .notifications
        .iter()
        .any(|n| n.message.contains("planner unavailable")));
}

#[test]
fn theme_names_are_case_insensitive() {
    assert!(Theme::by_name("TERMINAL").is_some());
    assert!(Theme::by_name("synthbrute").is_none());
}

#[test]
fn request_colors_distinguish_outcomes() {
    let theme = Theme::terminal();
    assert_ne!(
        request_status_color(RequestStatus::Succeeded, &theme),
        request_status_color(RequestStatus::Failed, &theme)
    );
    assert_ne!(
        step_status_color(StepStatus::Completed, &theme),
        step_status_color(StepStatus::Blocked, &theme)
    );
}

proptest! {
    #[test]
    fn digit_keys_select_existing_views(c in proptest::char::range('0', '9')) {
        let key = KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        };
        let action = map_key(key);
        match c {
            '1'..='4' => {
                let index = c as usize - '1' as usize;
                prop_assert_eq!(action, Some(Action::SwitchView(index)));
                prop_assert!(View::from_index(index).is_some());
            }
            _ => prop_assert_eq!(action, None),
        }
    }

    #[test]
    fn tab_cycles_back_to_start(start in 0usize..4, presses in 0usize..12) {
        let start = View::from_index(start).unwrap_or_default();
        let mut view = start;
        for _ in 0..presses {
            view = view.next();
        }
        for _ in 0..presses {
            view = view.previous();
        }
        prop_assert_eq!(view, start);
    }

    #[test]
    fn history_previous_stays_in_bounds(len in 0usize..6, presses in 0usize..10) {
        let history: Vec<String> = (1..=len).map(|i| format!("cmd{i}")).collect();
        let mut cursor = HistoryCursor::default();
        let mut last = None;
        for _ in 0..presses {
            if let Recall::Command(command) = cursor.previous(&history) {
                last = Some(command);
            }
        }
        if presses == 0 || len == 0 {
            prop_assert_eq!(last, None);
        } else {
            let reached = presses.min(len);
            prop_assert_eq!(last, Some(format!("cmd{}", len + 1 - reached)));
        }
    }

    #[test]
    fn step_colors_come_from_the_palette(status in arb_step_status()) {
        let theme = Theme::terminal();
        let color = step_status_color(status, &theme);
        prop_assert!([theme.text_dim, theme.accent, theme.success, theme.error].contains(&color));
    }
}
