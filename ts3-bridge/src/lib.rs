//! # ts3bridge
//!
//! Synchronous call surface over the callback-driven TeamSpeak 3 client SDK.
//!
//! Many SDK entry points only report whether a request was *accepted*; the
//! real outcome arrives later on the SDK's notification thread. This crate
//! turns each of those into a blocking call that returns the final result
//! code, with a bounded wait.
//!
//! ## Design
//!
//! - Correlated requests carry a fresh token as their return-code text;
//!   [`CorrelationRegistry`] maps it back to the waiting caller
//! - Connect and disconnect are keyed by connection handle; a per-handle
//!   state machine admits one transition at a time
//! - [`EventBridge`] runs on the notification thread and only ever posts
//!   outcomes, it never blocks or creates state
//! - [`BridgeHost`] reference-counts library init/destroy across users
//! - [`sim::SimulatedClientLib`] stands in for the native library in tests
//!   and the CLI

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod config;
pub mod connections;
pub mod error;
pub mod events;
pub mod handle;
pub mod host;
pub mod registry;
pub mod sdk;
pub mod sim;
pub mod types;
pub mod wait;

pub use bridge::{DrainReport, SyncBridge};
pub use config::{BridgeConfig, ClientLibConfig, ConfigError, LogType, WaitConfig};
pub use connections::{ConnectionRecord, ConnectionTable, TransitionGuard};
pub use error::{final_code, BridgeError, CallError};
pub use events::EventBridge;
pub use handle::ClientHandle;
pub use host::{BridgeHost, BridgeLease};
pub use registry::{CorrelationRegistry, PendingRequest};
pub use sdk::{ClientEvents, ClientLib, ClientLibOptions};
pub use types::ConnectParams;
pub use wait::{WaitOutcome, WaitSlot};

// Value types callers need alongside the bridge.
pub use ts3_types::{
    ChannelId, ChannelProperty, ClientId, ClientProperty, ConnectStatus, ConnectionHandle,
    ConnectionProperty, CorrelationToken, ReturnCode, Variable, VariableKind,
    VirtualServerProperty,
};
