//! # ts3bridge-core
//!
//! Pure lifecycle logic for the TeamSpeak 3 synchronous bridge (no I/O,
//! no threads, instant tests).
//!
//! ## Design Philosophy
//!
//! Everything here answers a question without touching shared state:
//! - may a connect/disconnect start right now? ([`ExpectedStateCell`])
//! - where does an incoming server error go? ([`ErrorRoute`])
//! - what outcome does an event post to a waiting connect/disconnect?
//!   ([`resolve_lifecycle_error`], [`resolve_status_change`])
//!
//! The bridge crate owns the maps, the locks and the waiting; it asks these
//! functions what to do.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod route;
pub mod state;

pub use route::{resolve_lifecycle_error, resolve_status_change, ErrorRoute};
pub use state::{ExpectedState, ExpectedStateCell, Transition, TransitionRejected};
