//! OpenManus terminal console library exports.

pub mod api_client;
pub mod config;
pub mod error;
pub mod events;
pub mod forms;
pub mod history;
pub mod keys;
pub mod logging;
pub mod nav;
pub mod notifications;
pub mod persistence;
pub mod realtime;
pub mod state;
pub mod store;
pub mod theme;
pub mod views;
pub mod widgets;
