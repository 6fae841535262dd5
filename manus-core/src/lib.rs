//! Manus Core - Entity Types
//!
//! Data structures shared by the console crates: LLM settings, agent
//! configuration, tool definitions, flow steps and chat messages, plus the
//! small amount of bookkeeping logic that belongs with them.
//! No I/O lives here.

pub mod entities;
pub mod enums;
pub mod error;
pub mod ids;

pub use entities::*;
pub use enums::*;
pub use error::{ValidationError, ValidationResult};
pub use ids::StepIdGenerator;

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Identifier of a flow step. Opaque and client-generated.
pub type StepId = String;

/// Identifier of a flow assigned by the backend.
pub type FlowId = String;
