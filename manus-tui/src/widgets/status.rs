//! One-line status banner.

use crate::store::{RequestStatus, TransientMessage};
use crate::theme::{request_status_color, Theme};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct Banner {
    pub text: String,
    pub style: Style,
}

impl Banner {
    /// Banner for a slice's transient message, colored by its request status.
    pub fn for_message(message: Option<&TransientMessage>, status: RequestStatus, theme: &Theme) -> Option<Self> {
        message.map(|m| Self {
            text: m.text.clone(),
            style: Style::default()
                .fg(request_status_color(status, theme))
                .add_modifier(Modifier::BOLD),
        })
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let paragraph = Paragraph::new(self.text.as_str())
            .style(self.style)
            .block(Block::default().borders(Borders::ALL).border_style(self.style));
        f.render_widget(paragraph, area);
    }
}
