//! Parameter types for bridged operations.

use ts3_types::ChannelId;

/// Everything `start_connection` needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Identity string from `create_identity`.
    pub identity: String,
    /// Server address.
    pub address: String,
    /// Server port.
    pub port: u16,
    /// Nickname to use.
    pub nickname: String,
    /// Channel to join on connect (`ChannelId::ROOT` for the server default).
    pub default_channel: ChannelId,
    /// Password of the default channel.
    pub default_channel_password: String,
    /// Server password.
    pub server_password: String,
}

impl ConnectParams {
    /// Parameters for the default port with no passwords.
    pub fn new(
        identity: impl Into<String>,
        address: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            address: address.into(),
            port: Self::DEFAULT_PORT,
            nickname: nickname.into(),
            default_channel: ChannelId::ROOT,
            default_channel_password: String::new(),
            server_password: String::new(),
        }
    }

    /// Default voice port of a TeamSpeak 3 server.
    pub const DEFAULT_PORT: u16 = 9987;

    /// Use a different port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Join `channel` on connect.
    pub fn with_default_channel(mut self, channel: ChannelId, password: impl Into<String>) -> Self {
        self.default_channel = channel;
        self.default_channel_password = password.into();
        self
    }

    /// Connect with a server password.
    pub fn with_server_password(mut self, password: impl Into<String>) -> Self {
        self.server_password = password.into();
        self
    }
}
