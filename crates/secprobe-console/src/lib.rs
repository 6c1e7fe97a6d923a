/*
[INPUT]:  Public API exports for the secprobe console core
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod catalog;
pub mod config;
pub mod console;
pub mod error;
pub mod gate;
pub mod intent;
pub mod poller;
pub mod reconcile;
pub mod render;
pub mod request;
pub mod selection;
pub mod summary;

// Re-export main types for convenience
pub use catalog::{CaseCatalog, CatalogCategory};
pub use config::ConsoleConfig;
pub use console::{CompositionSession, SessionUpdate, TaskConsole, TaskDetailSession};
pub use error::{ConsoleError, Result};
pub use gate::{ActionSet, TaskAction, actions_for};
pub use intent::{Intent, IntentOutcome, IntentState};
pub use poller::{
    BoardPoller, BoardUpdate, PollCadence, PollEvent, PollMachine, PollState, PollUpdate,
    StartOutcome, TaskPoller,
};
pub use reconcile::{ApplyOutcome, TaskView};
pub use request::{ComposeError, TaskRequest, build_request, parse_target};
pub use selection::{CategoryState, SelectionTree};
pub use summary::DashboardSummary;
