//! Panel data orchestration.
//!
//! - [`derive`]: snapshot -> ordered panel descriptors
//! - [`state`]: per-panel view state and the pure reconciliation step
//! - [`orchestrator`]: generation counter + board, ticket issue and staleness checks
//! - [`driver`]: async execution of tickets against a gateway

pub mod derive;
pub mod driver;
pub mod orchestrator;
pub mod state;

pub use derive::{PanelDescriptor, derive_panels};
pub use driver::{DispatchedRun, PanelDriver};
pub use orchestrator::{FetchTicket, PanelOrchestrator, Reconciled};
pub use state::{FetchOutcome, PanelBoard, PanelKind, PanelState, SliceView, apply_result};
