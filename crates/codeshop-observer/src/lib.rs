//! Observer API server for the Codeshop simulation.
//!
//! An Axum HTTP server that is the presentation layer's window onto a
//! running company:
//!
//! - **Read endpoints** for tasks, employees, missions, proposals, the AI
//!   queue, notifications, the advisor, and the ledger
//! - **Command endpoints** mirroring every store command; unknown ids are
//!   no-ops answered with `{ "ok": false }`
//! - **Operator endpoints** for pause, resume, speed, stop, and status
//! - **`WebSocket` endpoint** (`/ws/events`) streaming change events
//! - **Minimal HTML page** (`GET /`) with the headline numbers
//!
//! # Architecture
//!
//! [`AppState`] shares the engine's store behind its async mutex. Handlers
//! hold the lock only while reading or applying one command, never across
//! an await on anything else. [`AppState`] doubles as the engine's
//! [`ChangeObserver`](codeshop_core::runner::ChangeObserver), so events
//! drained by the simulation loops and by command handlers go out on the
//! same broadcast channel.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
