//! Convenience re-exports for common use.

pub use crate::approval::{ApprovalGate, Verdict};
pub use crate::error::{ChatError, Result};
pub use crate::history::History;
pub use crate::provider::{EventStream, ProviderAdapter};
pub use crate::session::Chat;
pub use crate::tools::{AddOptions, Tool, ToolRegistry};
pub use crate::types::{ChatEvent, EventKind, Sender, ToolCallEvent};
