//! # ts3bridge-types
//!
//! Boundary value types for the TeamSpeak 3 client SDK bridge.
//!
//! Every other crate in the workspace speaks in these types:
//! - [`ReturnCode`] - the SDK's result code space
//! - [`ConnectStatus`] - connection status delivered by status-change events
//! - [`ConnectionHandle`], [`ClientId`], [`ChannelId`], [`CorrelationToken`] - identities
//! - [`ClientProperty`], [`ChannelProperty`], [`VirtualServerProperty`],
//!   [`ConnectionProperty`] - variable selectors
//! - [`Variable`] - typed variable values
//! - [`TypesError`] - conversion errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod code;
mod error;
mod ids;
mod properties;
mod status;
mod variable;

pub use code::ReturnCode;
pub use error::TypesError;
pub use ids::{ChannelId, ClientId, ConnectionHandle, CorrelationToken};
pub use properties::{
    ChannelProperty, ClientProperty, Codec, ConnectionProperty, TalkStatus, VirtualServerProperty,
};
pub use status::ConnectStatus;
pub use variable::{Variable, VariableKind};
