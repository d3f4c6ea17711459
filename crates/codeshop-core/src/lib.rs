//! Simulation engine for the Codeshop software company.
//!
//! Everything mutable lives in one [`EntityStore`]. The clock, the AI work
//! queue, the mission service, and the advisor are `impl EntityStore`
//! blocks in their own modules; [`runner`] drives them on a timer.
//!
//! # Modules
//!
//! - [`store`] -- The entity store, its queries, and consistency checks.
//! - [`clock`] -- Simulation clock and the per-tick progress rule.
//! - [`assignment`] -- Binding tasks to employees and status updates.
//! - [`staffing`] -- Hiring and firing.
//! - [`treasury`] -- Funds, the ledger, and upgrade purchases.
//! - [`queue`] -- The AI work queue and result merging.
//! - [`generation`] -- [`ArtifactGenerator`] and [`ScriptedGenerator`].
//! - [`memory`] -- Employee experience and specializations.
//! - [`mission`] -- Missions, branches, and commits.
//! - [`advisor`] -- Product analysis and proposal generation.
//! - [`proposals`] -- Approving, rejecting, and dismissing proposals.
//! - [`snapshot`] -- Whole-store snapshots for persistence.
//! - [`operator`] -- Pause, speed, stop, and bounds.
//! - [`runner`] -- The clock and queue loops.
//! - [`config`] -- `codeshop-config.yaml` loading.
//!
//! [`ArtifactGenerator`]: generation::ArtifactGenerator
//! [`ScriptedGenerator`]: generation::ScriptedGenerator

pub mod advisor;
pub mod assignment;
pub mod clock;
pub mod config;
pub mod generation;
pub mod memory;
pub mod mission;
pub mod operator;
pub mod proposals;
pub mod queue;
pub mod runner;
pub mod snapshot;
pub mod staffing;
pub mod store;
pub mod treasury;

pub use advisor::{AdvisorState, ProductState};
pub use clock::{ClockError, SimClock, TickSummary};
pub use config::{CompanyConfig, ConfigError};
pub use generation::{ArtifactGenerator, GenerationError, ScriptedGenerator};
pub use operator::{OperatorState, OperatorStatus, SimulationEndReason};
pub use proposals::ProposalEffect;
pub use queue::{WorkOutcome, WorkQueue};
pub use runner::{
    ChangeObserver, NoOpObserver, RunnerError, SharedStore, SimulationResult, process_one,
    run_simulation,
};
pub use snapshot::{SnapshotError, StoreSnapshot};
pub use store::EntityStore;
pub use treasury::{Treasury, TreasuryError};
