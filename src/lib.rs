pub mod diff;
pub mod engine;
pub mod events;
pub mod host;
pub mod panel;
pub mod refstore;
pub mod runner;
pub mod snapshot;
pub mod testutil;

pub use diff::PatchOp;
pub use events::Notification;
pub use host::{HostError, ScenarioHost, SourceLocation};
pub use runner::{RunError, RunOptions, RunReport, UpdateMode, Verdict};
pub use snapshot::{Node, NodeRef, Snapshot};
