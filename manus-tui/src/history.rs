//! Command history recall for the terminal input.

/// What the input line should show after a recall key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recall {
    Command(String),
    Clear,
    Unchanged,
}

/// Position in the command history. Index 0 is the most recent command;
/// `None` means the user is typing a fresh line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryCursor {
    index: Option<usize>,
}

impl HistoryCursor {
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = None;
    }

    /// Step back to an older command. A no-op past the oldest entry.
    pub fn previous(&mut self, history: &[String]) -> Recall {
        let next = self.index.map_or(0, |i| i + 1);
        if next >= history.len() {
            return Recall::Unchanged;
        }
        self.index = Some(next);
        Recall::Command(history[history.len() - 1 - next].clone())
    }

    /// Step forward to a newer command. Moving past the newest clears the
    /// input.
    pub fn next(&mut self, history: &[String]) -> Recall {
        match self.index {
            None => Recall::Unchanged,
            Some(0) => {
                self.index = None;
                Recall::Clear
            }
            Some(i) => {
                let i = (i - 1).min(history.len().saturating_sub(1));
                self.index = Some(i);
                match history.len().checked_sub(1 + i) {
                    Some(pos) => Recall::Command(history[pos].clone()),
                    None => {
                        self.index = None;
                        Recall::Clear
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> Vec<String> {
        vec!["cmd1".into(), "cmd2".into(), "cmd3".into()]
    }

    #[test]
    fn previous_then_next_walks_history() {
        let history = history();
        let mut cursor = HistoryCursor::default();
        assert_eq!(cursor.previous(&history), Recall::Command("cmd3".into()));
        assert_eq!(cursor.previous(&history), Recall::Command("cmd2".into()));
        assert_eq!(cursor.next(&history), Recall::Command("cmd3".into()));
        assert_eq!(cursor.next(&history), Recall::Clear);
        assert_eq!(cursor.index(), None);
    }

    #[test]
    fn previous_past_oldest_is_noop() {
        let history = history();
        let mut cursor = HistoryCursor::default();
        for _ in 0..3 {
            cursor.previous(&history);
        }
        assert_eq!(cursor.previous(&history), Recall::Unchanged);
        assert_eq!(cursor.index(), Some(2));
    }

    #[test]
    fn empty_history_never_moves() {
        let mut cursor = HistoryCursor::default();
        assert_eq!(cursor.previous(&[]), Recall::Unchanged);
        assert_eq!(cursor.next(&[]), Recall::Unchanged);
    }
}
