//! ClientHandle: one blocking method per client library operation.
//!
//! Synchronous operations pass straight through. Correlated ones go via
//! [`SyncBridge::begin_correlated`], connect/disconnect via the lifecycle
//! state machine. Every method yields either its value or a [`CallError`]
//! whose [`code`](CallError::code) is the final SDK result code.

use crate::bridge::SyncBridge;
use crate::error::CallError;
use crate::sdk::ClientLib;
use crate::types::ConnectParams;
use std::sync::Arc;
use ts3_types::{
    ChannelId, ChannelProperty, ClientId, ClientProperty, ConnectStatus, ConnectionHandle,
    ConnectionProperty, ReturnCode, Variable, VariableKind, VirtualServerProperty,
};

/// Blocking front end over a client library and its bridge.
pub struct ClientHandle<L: ClientLib> {
    lib: Arc<L>,
    bridge: Arc<SyncBridge>,
}

impl<L: ClientLib> Clone for ClientHandle<L> {
    fn clone(&self) -> Self {
        Self {
            lib: Arc::clone(&self.lib),
            bridge: Arc::clone(&self.bridge),
        }
    }
}

fn check(code: ReturnCode) -> Result<(), CallError> {
    if code.is_ok() {
        Ok(())
    } else {
        Err(CallError::Rejected { code })
    }
}

fn value<T>(result: Result<T, ReturnCode>) -> Result<T, CallError> {
    result.map_err(|code| CallError::Rejected { code })
}

impl<L: ClientLib> ClientHandle<L> {
    /// Pair a library with the bridge its events feed.
    pub fn new(lib: Arc<L>, bridge: Arc<SyncBridge>) -> Self {
        Self { lib, bridge }
    }

    /// The underlying client library.
    pub fn lib(&self) -> &Arc<L> {
        &self.lib
    }

    /// The bridge state.
    pub fn bridge(&self) -> &Arc<SyncBridge> {
        &self.bridge
    }

    // =========================================================================
    // Library and identity
    // =========================================================================

    /// Full library version string.
    pub fn lib_version(&self) -> Result<String, CallError> {
        value(self.lib.lib_version())
    }

    /// Library version number.
    pub fn lib_version_number(&self) -> Result<u64, CallError> {
        value(self.lib.lib_version_number())
    }

    /// Create a new identity.
    pub fn create_identity(&self) -> Result<String, CallError> {
        value(self.lib.create_identity())
    }

    /// Unique id of an identity.
    pub fn identity_to_unique_identifier(&self, identity: &str) -> Result<String, CallError> {
        value(self.lib.identity_to_unique_identifier(identity))
    }

    /// Printable message for a result code.
    pub fn error_message(&self, code: ReturnCode) -> Result<String, CallError> {
        value(self.lib.error_message(code))
    }

    // =========================================================================
    // Connection handlers
    // =========================================================================

    /// Create a server connection handler.
    pub fn spawn_server_connection_handler(&self, port: u16) -> Result<ConnectionHandle, CallError> {
        value(self.lib.spawn_connection_handler(port))
    }

    /// Destroy a handler and forget its lifecycle record.
    pub fn destroy_server_connection_handler(
        &self,
        handle: ConnectionHandle,
    ) -> Result<(), CallError> {
        check(self.lib.destroy_connection_handler(handle))?;
        self.bridge.delete_connection(handle);
        Ok(())
    }

    /// Connect and block until established or failed.
    pub fn start_connection(
        &self,
        handle: ConnectionHandle,
        params: &ConnectParams,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_connect(handle, || self.lib.start_connection(handle, params))
    }

    /// Disconnect and block until gone.
    pub fn stop_connection(
        &self,
        handle: ConnectionHandle,
        quit_message: &str,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_disconnect(handle, || self.lib.stop_connection(handle, quit_message))
    }

    /// Current status of a handler.
    pub fn connection_status(&self, handle: ConnectionHandle) -> Result<ConnectStatus, CallError> {
        value(self.lib.connection_status(handle))
    }

    /// Own client id.
    pub fn client_id(&self, handle: ConnectionHandle) -> Result<ClientId, CallError> {
        value(self.lib.client_id(handle))
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Move a client to a channel.
    pub fn request_client_move(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        channel: ChannelId,
        password: &str,
    ) -> Result<(), CallError> {
        self.bridge.begin_correlated(|rc| {
            self.lib
                .request_client_move(handle, client, channel, password, rc)
        })
    }

    /// Fetch the full variable set of a client.
    pub fn request_client_variables(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_client_variables(handle, client, rc))
    }

    /// Kick a client from its channel.
    pub fn request_client_kick_from_channel(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        reason: &str,
    ) -> Result<(), CallError> {
        self.bridge.begin_correlated(|rc| {
            self.lib
                .request_client_kick_from_channel(handle, client, reason, rc)
        })
    }

    /// Kick a client from the server.
    pub fn request_client_kick_from_server(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        reason: &str,
    ) -> Result<(), CallError> {
        self.bridge.begin_correlated(|rc| {
            self.lib
                .request_client_kick_from_server(handle, client, reason, rc)
        })
    }

    /// All visible clients.
    pub fn client_list(&self, handle: ConnectionHandle) -> Result<Vec<ClientId>, CallError> {
        value(self.lib.client_list(handle))
    }

    /// Channel of a client.
    pub fn channel_of_client(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<ChannelId, CallError> {
        value(self.lib.channel_of_client(handle, client))
    }

    /// Read a property of the own client.
    pub fn client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.client_self_variable(handle, property, kind))
    }

    /// Stage a change to the own client.
    pub fn set_client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        new_value: &Variable,
    ) -> Result<(), CallError> {
        check(self.lib.set_client_self_variable(handle, property, new_value))
    }

    /// Apply staged own-client changes.
    pub fn flush_client_self_updates(&self, handle: ConnectionHandle) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.flush_client_self_updates(handle, rc))
    }

    /// Read a property of another client.
    pub fn client_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.client_variable(handle, client, property, kind))
    }

    // =========================================================================
    // Channels
    // =========================================================================

    /// Delete a channel.
    pub fn request_channel_delete(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        force: bool,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_channel_delete(handle, channel, force, rc))
    }

    /// Reparent and reorder a channel.
    pub fn request_channel_move(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        new_parent: ChannelId,
        new_order: ChannelId,
    ) -> Result<(), CallError> {
        self.bridge.begin_correlated(|rc| {
            self.lib
                .request_channel_move(handle, channel, new_parent, new_order, rc)
        })
    }

    /// Subscribe to every channel.
    pub fn request_channel_subscribe_all(&self, handle: ConnectionHandle) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_channel_subscribe_all(handle, rc))
    }

    /// Unsubscribe from every channel.
    pub fn request_channel_unsubscribe_all(
        &self,
        handle: ConnectionHandle,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_channel_unsubscribe_all(handle, rc))
    }

    /// All channels.
    pub fn channel_list(&self, handle: ConnectionHandle) -> Result<Vec<ChannelId>, CallError> {
        value(self.lib.channel_list(handle))
    }

    /// Clients in a channel.
    pub fn channel_client_list(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<Vec<ClientId>, CallError> {
        value(self.lib.channel_client_list(handle, channel))
    }

    /// Parent of a channel.
    pub fn parent_channel_of_channel(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<ChannelId, CallError> {
        value(self.lib.parent_channel(handle, channel))
    }

    /// Seconds a channel has been empty.
    pub fn channel_empty_secs(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<i32, CallError> {
        value(self.lib.channel_empty_secs(handle, channel))
    }

    /// Read a channel property.
    pub fn channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.channel_variable(handle, channel, property, kind))
    }

    /// Stage a channel change.
    pub fn set_channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        new_value: &Variable,
    ) -> Result<(), CallError> {
        check(
            self.lib
                .set_channel_variable(handle, channel, property, new_value),
        )
    }

    /// Apply staged changes to a channel.
    pub fn flush_channel_updates(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.flush_channel_updates(handle, channel, rc))
    }

    /// Create a channel under `parent` from staged changes to channel 0.
    pub fn flush_channel_creation(
        &self,
        handle: ConnectionHandle,
        parent: ChannelId,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.flush_channel_creation(handle, parent, rc))
    }

    // =========================================================================
    // Server and connection info
    // =========================================================================

    /// Read a virtual server property.
    pub fn server_variable(
        &self,
        handle: ConnectionHandle,
        property: VirtualServerProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.server_variable(handle, property, kind))
    }

    /// Ask the server to refresh its variables.
    pub fn request_server_variables(&self, handle: ConnectionHandle) -> Result<(), CallError> {
        check(self.lib.request_server_variables(handle))
    }

    /// Fetch connection statistics of a client.
    pub fn request_connection_info(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_connection_info(handle, client, rc))
    }

    /// Read a connection statistic of a client.
    pub fn connection_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.connection_variable(handle, client, property, kind))
    }

    /// Drop cached connection statistics of a client.
    pub fn clean_up_connection_info(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<(), CallError> {
        check(self.lib.clean_up_connection_info(handle, client))
    }

    /// Fetch statistics of the server connection.
    pub fn request_server_connection_info(&self, handle: ConnectionHandle) -> Result<(), CallError> {
        self.bridge
            .begin_correlated(|rc| self.lib.request_server_connection_info(handle, rc))
    }

    /// Read a statistic of the server connection.
    pub fn server_connection_variable(
        &self,
        handle: ConnectionHandle,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, CallError> {
        value(self.lib.server_connection_variable(handle, property, kind))
    }

    // =========================================================================
    // Text messages
    // =========================================================================

    /// Send a private message.
    pub fn send_private_text(
        &self,
        handle: ConnectionHandle,
        message: &str,
        target: ClientId,
    ) -> Result<(), CallError> {
        check(self.lib.send_private_text(handle, message, target))
    }

    /// Send a channel message.
    pub fn send_channel_text(
        &self,
        handle: ConnectionHandle,
        message: &str,
        target: ChannelId,
    ) -> Result<(), CallError> {
        check(self.lib.send_channel_text(handle, message, target))
    }

    /// Send a server-wide message.
    pub fn send_server_text(&self, handle: ConnectionHandle, message: &str) -> Result<(), CallError> {
        check(self.lib.send_server_text(handle, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::final_code;
    use crate::sdk::ClientLibOptions;
    use crate::sim::SimulatedClientLib;
    use std::thread;
    use std::time::Duration;
    use ts3_core::{ExpectedState, Transition};

    fn setup(timeout: Duration) -> (Arc<SimulatedClientLib>, ClientHandle<SimulatedClientLib>) {
        let lib = Arc::new(
            SimulatedClientLib::new().with_latency(Duration::from_millis(1), Duration::ZERO),
        );
        let bridge = SyncBridge::with_timeout(timeout);
        assert_eq!(
            lib.init(bridge.event_sink(), &ClientLibOptions::default()),
            ReturnCode::OK
        );
        (Arc::clone(&lib), ClientHandle::new(lib, bridge))
    }

    fn online(client: &ClientHandle<SimulatedClientLib>) -> ConnectionHandle {
        let handle = client.spawn_server_connection_handler(0).unwrap();
        let identity = client.create_identity().unwrap();
        client
            .start_connection(handle, &ConnectParams::new(identity, "localhost", "tester"))
            .unwrap();
        handle
    }

    #[test]
    fn connect_then_move_self() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = online(&client);

        assert_eq!(
            client.connection_status(handle),
            Ok(ConnectStatus::ConnectionEstablished)
        );
        let me = client.client_id(handle).unwrap();
        client
            .request_client_move(handle, me, ChannelId::new(3), "")
            .unwrap();
        assert_eq!(client.channel_of_client(handle, me), Ok(ChannelId::new(3)));
        assert!(client.bridge().registry().is_empty());
    }

    #[test]
    fn asynchronous_failure_carries_sdk_code() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = online(&client);

        let result = client.request_channel_delete(handle, ChannelId::new(1), true);
        assert_eq!(
            result,
            Err(CallError::Failed {
                code: ReturnCode::CHANNEL_CAN_NOT_DELETE_DEFAULT
            })
        );
        assert_eq!(final_code(&result), ReturnCode::CHANNEL_CAN_NOT_DELETE_DEFAULT);
    }

    #[test]
    fn synchronous_refusal_is_not_awaited() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = online(&client);

        let result = client.flush_client_self_updates(handle);
        assert_eq!(
            result,
            Err(CallError::Rejected {
                code: ReturnCode::OK_NO_UPDATE
            })
        );
        assert!(client.bridge().registry().is_empty());
    }

    #[test]
    fn lost_event_times_out_and_late_duplicates_are_dropped() {
        let (lib, client) = setup(Duration::from_millis(150));
        let handle = online(&client);

        lib.drop_next_events(1);
        let result = client.request_server_connection_info(handle);
        assert!(matches!(result, Err(CallError::TimedOut { .. })));
        assert!(client.bridge().registry().is_empty());

        lib.set_duplicate_events(true);
        client.request_server_connection_info(handle).unwrap();
    }

    #[test]
    fn failed_connect_reports_lifecycle_error() {
        let (lib, client) = setup(Duration::from_secs(2));
        let handle = client.spawn_server_connection_handler(0).unwrap();

        lib.fail_next_connect(ReturnCode::COULD_NOT_RESOLVE_HOSTNAME);
        let result = client.start_connection(handle, &ConnectParams::new("id", "nowhere", "me"));
        assert_eq!(
            result,
            Err(CallError::Failed {
                code: ReturnCode::COULD_NOT_RESOLVE_HOSTNAME
            })
        );
        let record = client.bridge().connections().get(handle).unwrap();
        assert_eq!(record.expected(), ExpectedState::None);
    }

    #[test]
    fn disconnect_during_connect_reads_as_undefined() {
        let (lib, client) = setup(Duration::from_secs(2));
        let handle = client.spawn_server_connection_handler(0).unwrap();

        lib.bare_disconnect_next_connect();
        let result = client.start_connection(handle, &ConnectParams::new("id", "localhost", "me"));
        assert_eq!(
            result,
            Err(CallError::Failed {
                code: ReturnCode::UNDEFINED
            })
        );
    }

    #[test]
    fn stop_connection_and_destroy_handler() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = online(&client);

        client.stop_connection(handle, "bye").unwrap();
        assert_eq!(
            client.connection_status(handle),
            Ok(ConnectStatus::Disconnected)
        );
        assert_eq!(
            client.stop_connection(handle, "again"),
            Err(CallError::Rejected {
                code: ReturnCode::NOT_CONNECTED
            })
        );

        client.destroy_server_connection_handler(handle).unwrap();
        assert!(client.bridge().connections().get(handle).is_none());
    }

    #[test]
    fn busy_handle_refuses_second_transition() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = client.spawn_server_connection_handler(0).unwrap();
        let record = client.bridge().connections().get_or_create(handle);
        let _guard = record.begin(Transition::Connect).unwrap();

        let result = client.stop_connection(handle, "");
        assert_eq!(
            result,
            Err(CallError::CurrentlyNotPossible {
                current: ExpectedState::Connecting
            })
        );
        // The library never saw the disconnect.
        assert_eq!(
            client.connection_status(handle),
            Ok(ConnectStatus::Disconnected)
        );
    }

    #[test]
    fn synchronous_getters_and_staged_updates() {
        let (_lib, client) = setup(Duration::from_secs(2));
        let handle = online(&client);

        client
            .set_client_self_variable(handle, ClientProperty::Nickname, &Variable::from("renamed"))
            .unwrap();
        client.flush_client_self_updates(handle).unwrap();
        assert_eq!(
            client.client_self_variable(handle, ClientProperty::Nickname, VariableKind::String),
            Ok(Variable::from("renamed"))
        );

        client
            .set_channel_variable(
                handle,
                ChannelId::ROOT,
                ChannelProperty::Name,
                &Variable::from("Lobby"),
            )
            .unwrap();
        assert_eq!(
            client.flush_channel_creation(handle, ChannelId::ROOT),
            Err(CallError::Failed {
                code: ReturnCode::CHANNEL_NAME_INUSE
            })
        );

        assert_eq!(
            client.server_variable(handle, VirtualServerProperty::ChannelsOnline, VariableKind::Int),
            Ok(Variable::Int(3))
        );
        assert_eq!(
            client.client_id(ConnectionHandle::new(99)),
            Err(CallError::Rejected {
                code: ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID
            })
        );
    }

    #[test]
    fn concurrent_requests_each_get_their_own_outcome() {
        let (lib, client) = setup(Duration::from_secs(5));
        lib.set_latency(Duration::from_millis(1), Duration::from_millis(3));
        let handle = online(&client);

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                thread::spawn(move || {
                    for _ in 0..20 {
                        if i % 2 == 0 {
                            client.request_server_connection_info(handle).unwrap();
                        } else {
                            let result = client.request_client_variables(handle, ClientId::new(500));
                            assert_eq!(
                                result,
                                Err(CallError::Failed {
                                    code: ReturnCode::CLIENT_INVALID_ID
                                })
                            );
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert!(client.bridge().registry().is_empty());
    }
}
