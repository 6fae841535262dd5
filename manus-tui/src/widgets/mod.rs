//! Reusable widget components.

pub mod checklist;
pub mod detail;
pub mod status;

pub use checklist::{Checklist, ChecklistItem};
pub use detail::DetailPanel;
pub use status::Banner;
