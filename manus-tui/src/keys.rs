//! Keybinding definitions for the TUI.
//!
//! Normal mode maps keys to [`Action`]s. While a text field has focus the
//! keys go to the field instead, except for the few handled by
//! [`map_editing_key`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    SwitchView(usize),
    MoveUp,
    MoveDown,
    /// Previous pane on the flow screen.
    PaneLeft,
    PaneRight,
    /// Edit the focused field, or activate the focused item.
    Activate,
    Toggle,
    Submit,
    NewStep,
    DeleteStep,
    CycleStatus,
    StartFlow,
    Refresh,
    ResetFlow,
    ClearTerminal,
}

/// Keys with a meaning while a text field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    Commit,
    Cancel,
    HistoryPrevious,
    HistoryNext,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('l') => Some(Action::ClearTerminal),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::PaneLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::PaneRight),
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Char('s') => Some(Action::Submit),
        KeyCode::Char('n') => Some(Action::NewStep),
        KeyCode::Char('d') => Some(Action::DeleteStep),
        KeyCode::Char('c') => Some(Action::CycleStatus),
        KeyCode::Char('x') => Some(Action::StartFlow),
        KeyCode::Char('r') => Some(Action::Refresh),
        KeyCode::Char('z') => Some(Action::ResetFlow),
        KeyCode::Char(c @ '1'..='4') => Some(Action::SwitchView(c as usize - '1' as usize)),
        _ => None,
    }
}

pub fn map_editing_key(event: KeyEvent) -> Option<EditAction> {
    match event.code {
        KeyCode::Enter => Some(EditAction::Commit),
        KeyCode::Esc => Some(EditAction::Cancel),
        KeyCode::Up => Some(EditAction::HistoryPrevious),
        KeyCode::Down => Some(EditAction::HistoryNext),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digits_switch_views() {
        assert_eq!(map_key(key(KeyCode::Char('1'))), Some(Action::SwitchView(0)));
        assert_eq!(map_key(key(KeyCode::Char('4'))), Some(Action::SwitchView(3)));
        assert_eq!(map_key(key(KeyCode::Char('5'))), None);
    }

    #[test]
    fn ctrl_l_clears_terminal() {
        let event = KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL);
        assert_eq!(map_key(event), Some(Action::ClearTerminal));
        assert_eq!(map_key(key(KeyCode::Char('l'))), Some(Action::PaneRight));
    }

    #[test]
    fn editing_keys() {
        assert_eq!(map_editing_key(key(KeyCode::Enter)), Some(EditAction::Commit));
        assert_eq!(map_editing_key(key(KeyCode::Char('q'))), None);
    }
}
