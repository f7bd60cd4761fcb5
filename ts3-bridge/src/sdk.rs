//! Boundary with the native client SDK.
//!
//! [`ClientLib`] is the consumed function surface. Entry points come in
//! three shapes:
//! - synchronous: the return value is final;
//! - correlated: the last argument is the return-code text, the call only
//!   reports acceptance, and the real outcome arrives later through
//!   [`ClientEvents::on_server_error`] carrying that same text;
//! - connect/disconnect: accepted synchronously, outcome reported through
//!   the two event callbacks keyed by connection handle.
//!
//! Synchronous getters return `Err(code)` for any non-ok code; values are
//! only produced on success.

use crate::types::ConnectParams;
use std::path::PathBuf;
use std::sync::Arc;
use ts3_types::{
    ChannelId, ChannelProperty, ClientId, ClientProperty, ConnectStatus, ConnectionHandle,
    ConnectionProperty, ReturnCode, Variable, VariableKind, VirtualServerProperty,
};

/// Event callbacks the SDK invokes from its own notification thread.
pub trait ClientEvents: Send + Sync {
    /// A server error, optionally tagged with the return-code text of the
    /// request it answers.
    fn on_server_error(
        &self,
        handle: ConnectionHandle,
        message: &str,
        code: ReturnCode,
        return_code: Option<&str>,
        extra: &str,
    );

    /// The status of a connection handler changed. `new_status` is the raw
    /// SDK value.
    fn on_connect_status_change(&self, handle: ConnectionHandle, new_status: i32, code: ReturnCode);
}

/// Options passed to [`ClientLib::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientLibOptions {
    /// Bit mask of enabled log sinks.
    pub log_types: u32,
    /// Folder for SDK log files.
    pub log_file_folder: Option<PathBuf>,
    /// Folder holding SDK resources.
    pub resources_folder: Option<PathBuf>,
}

/// The client SDK function surface used by the bridge.
pub trait ClientLib: Send + Sync + 'static {
    // --- lifecycle ---

    /// Initialise the library and register the event callbacks.
    fn init(&self, events: Arc<dyn ClientEvents>, options: &ClientLibOptions) -> ReturnCode;

    /// Tear the library down. After this no more events are delivered.
    fn destroy(&self) -> ReturnCode;

    // --- synchronous ---

    /// Full library version string.
    fn lib_version(&self) -> Result<String, ReturnCode>;

    /// Library version number.
    fn lib_version_number(&self) -> Result<u64, ReturnCode>;

    /// Create a new client identity.
    fn create_identity(&self) -> Result<String, ReturnCode>;

    /// Unique id of an identity string.
    fn identity_to_unique_identifier(&self, identity: &str) -> Result<String, ReturnCode>;

    /// Printable message for a result code.
    fn error_message(&self, code: ReturnCode) -> Result<String, ReturnCode>;

    /// Create a server connection handler bound to `port` (0 = any).
    fn spawn_connection_handler(&self, port: u16) -> Result<ConnectionHandle, ReturnCode>;

    /// Destroy a server connection handler.
    fn destroy_connection_handler(&self, handle: ConnectionHandle) -> ReturnCode;

    /// Current status of a handler.
    fn connection_status(&self, handle: ConnectionHandle) -> Result<ConnectStatus, ReturnCode>;

    /// Own client id on the server.
    fn client_id(&self, handle: ConnectionHandle) -> Result<ClientId, ReturnCode>;

    /// All visible clients.
    fn client_list(&self, handle: ConnectionHandle) -> Result<Vec<ClientId>, ReturnCode>;

    /// Channel a client is in.
    fn channel_of_client(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<ChannelId, ReturnCode>;

    /// All channels.
    fn channel_list(&self, handle: ConnectionHandle) -> Result<Vec<ChannelId>, ReturnCode>;

    /// Clients in one channel.
    fn channel_client_list(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<Vec<ClientId>, ReturnCode>;

    /// Parent of a channel (`ChannelId::ROOT` for top level).
    fn parent_channel(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<ChannelId, ReturnCode>;

    /// Seconds a channel has been empty.
    fn channel_empty_secs(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<i32, ReturnCode>;

    /// Read a property of the own client.
    fn client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Read a property of another client.
    fn client_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Read a property of a channel.
    fn channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Read a property of the virtual server.
    fn server_variable(
        &self,
        handle: ConnectionHandle,
        property: VirtualServerProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Read a connection statistic for a client.
    fn connection_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Read a connection statistic for the server connection.
    fn server_connection_variable(
        &self,
        handle: ConnectionHandle,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode>;

    /// Stage a change to the own client; applied by
    /// [`ClientLib::flush_client_self_updates`].
    fn set_client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        value: &Variable,
    ) -> ReturnCode;

    /// Stage a change to a channel; applied by
    /// [`ClientLib::flush_channel_updates`] or
    /// [`ClientLib::flush_channel_creation`] (channel 0).
    fn set_channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        value: &Variable,
    ) -> ReturnCode;

    /// Drop cached connection info for a client.
    fn clean_up_connection_info(&self, handle: ConnectionHandle, client: ClientId) -> ReturnCode;

    /// Ask the server to refresh the virtual server variables.
    fn request_server_variables(&self, handle: ConnectionHandle) -> ReturnCode;

    /// Send a private text message.
    fn send_private_text(&self, handle: ConnectionHandle, message: &str, target: ClientId)
        -> ReturnCode;

    /// Send a text message to a channel.
    fn send_channel_text(
        &self,
        handle: ConnectionHandle,
        message: &str,
        target: ChannelId,
    ) -> ReturnCode;

    /// Send a text message to the whole server.
    fn send_server_text(&self, handle: ConnectionHandle, message: &str) -> ReturnCode;

    // --- correlated ---

    /// Move a client to another channel.
    fn request_client_move(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        channel: ChannelId,
        password: &str,
        return_code: &str,
    ) -> ReturnCode;

    /// Request the full variable set of a client.
    fn request_client_variables(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        return_code: &str,
    ) -> ReturnCode;

    /// Kick a client back to the default channel.
    fn request_client_kick_from_channel(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        reason: &str,
        return_code: &str,
    ) -> ReturnCode;

    /// Kick a client off the server.
    fn request_client_kick_from_server(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        reason: &str,
        return_code: &str,
    ) -> ReturnCode;

    /// Delete a channel; `force` also removes it when occupied.
    fn request_channel_delete(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        force: bool,
        return_code: &str,
    ) -> ReturnCode;

    /// Reparent a channel and place it after `new_order`.
    fn request_channel_move(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        new_parent: ChannelId,
        new_order: ChannelId,
        return_code: &str,
    ) -> ReturnCode;

    /// Request connection statistics of a client.
    fn request_connection_info(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        return_code: &str,
    ) -> ReturnCode;

    /// Request statistics of the server connection.
    fn request_server_connection_info(&self, handle: ConnectionHandle, return_code: &str)
        -> ReturnCode;

    /// Subscribe to every channel.
    fn request_channel_subscribe_all(&self, handle: ConnectionHandle, return_code: &str)
        -> ReturnCode;

    /// Unsubscribe from every channel.
    fn request_channel_unsubscribe_all(
        &self,
        handle: ConnectionHandle,
        return_code: &str,
    ) -> ReturnCode;

    /// Apply staged own-client changes.
    fn flush_client_self_updates(&self, handle: ConnectionHandle, return_code: &str)
        -> ReturnCode;

    /// Apply staged changes to a channel.
    fn flush_channel_updates(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        return_code: &str,
    ) -> ReturnCode;

    /// Create a channel from the staged changes to channel 0.
    fn flush_channel_creation(
        &self,
        handle: ConnectionHandle,
        parent: ChannelId,
        return_code: &str,
    ) -> ReturnCode;

    // --- connect / disconnect ---

    /// Start connecting a handler to a server.
    fn start_connection(&self, handle: ConnectionHandle, params: &ConnectParams) -> ReturnCode;

    /// Disconnect a handler from its server.
    fn stop_connection(&self, handle: ConnectionHandle, quit_message: &str) -> ReturnCode;
}
