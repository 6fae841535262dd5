//! Multi-select list with a cursor: `[x] name  description`.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub struct ChecklistItem {
    pub label: String,
    pub detail: String,
    pub checked: bool,
}

pub struct Checklist<'a> {
    pub title: &'a str,
    pub items: Vec<ChecklistItem>,
    /// Highlighted row, if the list has focus.
    pub cursor: Option<usize>,
    pub style: Style,
    pub detail_style: Style,
    pub border_style: Style,
    pub empty: &'a str,
}

impl<'a> Checklist<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(self.border_style);

        if self.items.is_empty() {
            let list = List::new(vec![ListItem::new(Span::styled(self.empty, self.detail_style))])
                .block(block);
            f.render_widget(list, area);
            return;
        }

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let mark = if item.checked { "[x] " } else { "[ ] " };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, self.style),
                    Span::styled(item.label.clone(), self.style),
                    Span::raw("  "),
                    Span::styled(item.detail.clone(), self.detail_style),
                ]))
            })
            .collect();

        let mut state = ListState::default();
        state.select(self.cursor.map(|c| c.min(self.items.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        f.render_stateful_widget(list, area, &mut state);
    }
}
