//! Result codes of the TeamSpeak client library.
//!
//! Every SDK entry point and every asynchronous event reports one of these.
//! The bridge treats the space as opaque except for the handful of codes it
//! produces itself (`UNDEFINED`, `CONNECTION_LOST`, `CURRENTLY_NOT_POSSIBLE`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A result code reported by the client library (or synthesized by the bridge).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ReturnCode(u32);

macro_rules! return_codes {
    ($($(#[$doc:meta])* $name:ident = $value:expr, $text:literal;)*) => {
        impl ReturnCode {
            $(
                $(#[$doc])*
                pub const $name: ReturnCode = ReturnCode($value);
            )*

            /// Every code with a published symbolic name, in ascending order.
            pub const KNOWN: &'static [(ReturnCode, &'static str)] = &[
                $((ReturnCode($value), $text),)*
            ];
        }
    };
}

return_codes! {
    /// Success.
    OK = 0x0000, "ERROR_ok";
    /// Generic failure; also used by the bridge for contradictory status events.
    UNDEFINED = 0x0001, "ERROR_undefined";
    NOT_IMPLEMENTED = 0x0002, "ERROR_not_implemented";
    OK_NO_UPDATE = 0x0003, "ERROR_ok_no_update";
    DONT_NOTIFY = 0x0004, "ERROR_dont_notify";
    LIB_TIME_LIMIT_REACHED = 0x0005, "ERROR_lib_time_limit_reached";

    COMMAND_NOT_FOUND = 0x0100, "ERROR_command_not_found";
    UNABLE_TO_BIND_NETWORK_PORT = 0x0101, "ERROR_unable_to_bind_network_port";
    NO_NETWORK_PORT_AVAILABLE = 0x0102, "ERROR_no_network_port_available";
    PORT_ALREADY_IN_USE = 0x0103, "ERROR_port_already_in_use";

    CLIENT_INVALID_ID = 0x0200, "ERROR_client_invalid_id";
    CLIENT_NICKNAME_INUSE = 0x0201, "ERROR_client_nickname_inuse";
    CLIENT_PROTOCOL_LIMIT_REACHED = 0x0203, "ERROR_client_protocol_limit_reached";
    CLIENT_INVALID_TYPE = 0x0204, "ERROR_client_invalid_type";
    CLIENT_ALREADY_SUBSCRIBED = 0x0205, "ERROR_client_already_subscribed";
    CLIENT_NOT_LOGGED_IN = 0x0206, "ERROR_client_not_logged_in";
    CLIENT_COULD_NOT_VALIDATE_IDENTITY = 0x0207, "ERROR_client_could_not_validate_identity";
    CLIENT_VERSION_OUTDATED = 0x020a, "ERROR_client_version_outdated";
    CLIENT_IS_FLOODING = 0x020c, "ERROR_client_is_flooding";
    CLIENT_HACKED = 0x020d, "ERROR_client_hacked";
    CLIENT_CANNOT_VERIFY_NOW = 0x020e, "ERROR_client_cannot_verify_now";
    CLIENT_LOGIN_NOT_PERMITTED = 0x020f, "ERROR_client_login_not_permitted";
    CLIENT_NOT_SUBSCRIBED = 0x0210, "ERROR_client_not_subscribed";

    CHANNEL_INVALID_ID = 0x0300, "ERROR_channel_invalid_id";
    CHANNEL_PROTOCOL_LIMIT_REACHED = 0x0301, "ERROR_channel_protocol_limit_reached";
    CHANNEL_ALREADY_IN = 0x0302, "ERROR_channel_already_in";
    CHANNEL_NAME_INUSE = 0x0303, "ERROR_channel_name_inuse";
    CHANNEL_NOT_EMPTY = 0x0304, "ERROR_channel_not_empty";
    CHANNEL_CAN_NOT_DELETE_DEFAULT = 0x0305, "ERROR_channel_can_not_delete_default";
    CHANNEL_DEFAULT_REQUIRE_PERMANENT = 0x0306, "ERROR_channel_default_require_permanent";
    CHANNEL_INVALID_FLAGS = 0x0307, "ERROR_channel_invalid_flags";
    CHANNEL_PARENT_NOT_PERMANENT = 0x0308, "ERROR_channel_parent_not_permanent";
    CHANNEL_MAXCLIENTS_REACHED = 0x0309, "ERROR_channel_maxclients_reached";
    CHANNEL_MAXFAMILY_REACHED = 0x030a, "ERROR_channel_maxfamily_reached";
    CHANNEL_INVALID_ORDER = 0x030b, "ERROR_channel_invalid_order";
    CHANNEL_NO_FILETRANSFER_SUPPORTED = 0x030c, "ERROR_channel_no_filetransfer_supported";
    CHANNEL_INVALID_PASSWORD = 0x030d, "ERROR_channel_invalid_password";
    CHANNEL_INVALID_SECURITY_HASH = 0x030f, "ERROR_channel_invalid_security_hash";

    SERVER_INVALID_ID = 0x0400, "ERROR_server_invalid_id";
    SERVER_RUNNING = 0x0401, "ERROR_server_running";
    SERVER_IS_SHUTTING_DOWN = 0x0402, "ERROR_server_is_shutting_down";
    SERVER_MAXCLIENTS_REACHED = 0x0403, "ERROR_server_maxclients_reached";
    SERVER_INVALID_PASSWORD = 0x0404, "ERROR_server_invalid_password";
    SERVER_IS_VIRTUAL = 0x0407, "ERROR_server_is_virtual";
    SERVER_IS_NOT_RUNNING = 0x0409, "ERROR_server_is_not_running";
    SERVER_IS_BOOTING = 0x040a, "ERROR_server_is_booting";
    SERVER_STATUS_INVALID = 0x040b, "ERROR_server_status_invalid";
    SERVER_VERSION_OUTDATED = 0x040d, "ERROR_server_version_outdated";
    SERVER_DUPLICATE_RUNNING = 0x040e, "ERROR_server_duplicate_running";

    PARAMETER_QUOTE = 0x0600, "ERROR_parameter_quote";
    PARAMETER_INVALID_COUNT = 0x0601, "ERROR_parameter_invalid_count";
    PARAMETER_INVALID = 0x0602, "ERROR_parameter_invalid";
    PARAMETER_NOT_FOUND = 0x0603, "ERROR_parameter_not_found";
    PARAMETER_CONVERT = 0x0604, "ERROR_parameter_convert";
    PARAMETER_INVALID_SIZE = 0x0605, "ERROR_parameter_invalid_size";
    PARAMETER_MISSING = 0x0606, "ERROR_parameter_missing";
    PARAMETER_CHECKSUM = 0x0607, "ERROR_parameter_checksum";

    VS_CRITICAL = 0x0700, "ERROR_vs_critical";
    /// Reported by the bridge when no outcome arrives before the deadline.
    CONNECTION_LOST = 0x0701, "ERROR_connection_lost";
    NOT_CONNECTED = 0x0702, "ERROR_not_connected";
    NO_CACHED_CONNECTION_INFO = 0x0703, "ERROR_no_cached_connection_info";
    /// Reported by the bridge when a connect/disconnect is already in flight.
    CURRENTLY_NOT_POSSIBLE = 0x0704, "ERROR_currently_not_possible";
    FAILED_CONNECTION_INITIALISATION = 0x0705, "ERROR_failed_connection_initialisation";
    COULD_NOT_RESOLVE_HOSTNAME = 0x0706, "ERROR_could_not_resolve_hostname";
    INVALID_SERVER_CONNECTION_HANDLER_ID = 0x0707, "ERROR_invalid_server_connection_handler_id";
    COULD_NOT_INITIALISE_INPUT_MANAGER = 0x0708, "ERROR_could_not_initialise_input_manager";
    CLIENTLIBRARY_NOT_INITIALISED = 0x0709, "ERROR_clientlibrary_not_initialised";
    SERVERLIBRARY_NOT_INITIALISED = 0x070a, "ERROR_serverlibrary_not_initialised";
    WHISPER_TOO_MANY_TARGETS = 0x070b, "ERROR_whisper_too_many_targets";
    WHISPER_NO_TARGETS = 0x070c, "ERROR_whisper_no_targets";
    CONNECTION_IP_PROTOCOL_MISSING = 0x070d, "ERROR_connection_ip_protocol_missing";

    FILE_INVALID_NAME = 0x0800, "ERROR_file_invalid_name";
    FILE_INVALID_PERMISSIONS = 0x0801, "ERROR_file_invalid_permissions";
    FILE_ALREADY_EXISTS = 0x0802, "ERROR_file_already_exists";
    FILE_NOT_FOUND = 0x0803, "ERROR_file_not_found";
    FILE_IO_ERROR = 0x0804, "ERROR_file_io_error";
    FILE_INVALID_TRANSFER_ID = 0x0805, "ERROR_file_invalid_transfer_id";
    FILE_INVALID_PATH = 0x0806, "ERROR_file_invalid_path";
    FILE_NO_FILES_AVAILABLE = 0x0807, "ERROR_file_no_files_available";
    FILE_OVERWRITE_EXCLUDES_RESUME = 0x0808, "ERROR_file_overwrite_excludes_resume";
    FILE_INVALID_SIZE = 0x0809, "ERROR_file_invalid_size";
    FILE_ALREADY_IN_USE = 0x080a, "ERROR_file_already_in_use";
    FILE_COULD_NOT_OPEN_CONNECTION = 0x080b, "ERROR_file_could_not_open_connection";
    FILE_NO_SPACE_LEFT_ON_DEVICE = 0x080c, "ERROR_file_no_space_left_on_device";
    FILE_EXCEEDS_FILE_SYSTEM_MAXIMUM_SIZE = 0x080d, "ERROR_file_exceeds_file_system_maximum_size";
    FILE_TRANSFER_CONNECTION_TIMEOUT = 0x080e, "ERROR_file_transfer_connection_timeout";
    FILE_CONNECTION_LOST = 0x080f, "ERROR_file_connection_lost";
    FILE_EXCEEDS_SUPPLIED_SIZE = 0x0810, "ERROR_file_exceeds_supplied_size";
    FILE_TRANSFER_COMPLETE = 0x0811, "ERROR_file_transfer_complete";
    FILE_TRANSFER_CANCELED = 0x0812, "ERROR_file_transfer_canceled";
    FILE_TRANSFER_INTERRUPTED = 0x0813, "ERROR_file_transfer_interrupted";
    FILE_TRANSFER_SERVER_QUOTA_EXCEEDED = 0x0814, "ERROR_file_transfer_server_quota_exceeded";
    FILE_TRANSFER_CLIENT_QUOTA_EXCEEDED = 0x0815, "ERROR_file_transfer_client_quota_exceeded";
    FILE_TRANSFER_RESET = 0x0816, "ERROR_file_transfer_reset";
    FILE_TRANSFER_LIMIT_REACHED = 0x0817, "ERROR_file_transfer_limit_reached";

    SOUND_PREPROCESSOR_DISABLED = 0x0900, "ERROR_sound_preprocessor_disabled";
    SOUND_INTERNAL_PREPROCESSOR = 0x0901, "ERROR_sound_internal_preprocessor";
    SOUND_INTERNAL_ENCODER = 0x0902, "ERROR_sound_internal_encoder";
    SOUND_INTERNAL_PLAYBACK = 0x0903, "ERROR_sound_internal_playback";
    SOUND_NO_CAPTURE_DEVICE_AVAILABLE = 0x0904, "ERROR_sound_no_capture_device_available";
    SOUND_NO_PLAYBACK_DEVICE_AVAILABLE = 0x0905, "ERROR_sound_no_playback_device_available";
    SOUND_COULD_NOT_OPEN_CAPTURE_DEVICE = 0x0906, "ERROR_sound_could_not_open_capture_device";
    SOUND_COULD_NOT_OPEN_PLAYBACK_DEVICE = 0x0907, "ERROR_sound_could_not_open_playback_device";
    SOUND_HANDLER_HAS_DEVICE = 0x0908, "ERROR_sound_handler_has_device";
    SOUND_INVALID_CAPTURE_DEVICE = 0x0909, "ERROR_sound_invalid_capture_device";
    SOUND_INVALID_PLAYBACK_DEVICE = 0x090a, "ERROR_sound_invalid_playback_device";
    SOUND_INVALID_WAVE = 0x090b, "ERROR_sound_invalid_wave";
    SOUND_UNSUPPORTED_WAVE = 0x090c, "ERROR_sound_unsupported_wave";
    SOUND_OPEN_WAVE = 0x090d, "ERROR_sound_open_wave";
    SOUND_INTERNAL_CAPTURE = 0x090e, "ERROR_sound_internal_capture";
    SOUND_DEVICE_IN_USE = 0x090f, "ERROR_sound_device_in_use";
    SOUND_DEVICE_ALREADY_REGISTERRED = 0x0910, "ERROR_sound_device_already_registerred";
    SOUND_UNKNOWN_DEVICE = 0x0911, "ERROR_sound_unknown_device";
    SOUND_UNSUPPORTED_FREQUENCY = 0x0912, "ERROR_sound_unsupported_frequency";
    SOUND_INVALID_CHANNEL_COUNT = 0x0913, "ERROR_sound_invalid_channel_count";
    SOUND_READ_WAVE = 0x0914, "ERROR_sound_read_wave";
    SOUND_NEED_MORE_DATA = 0x0915, "ERROR_sound_need_more_data";
    SOUND_DEVICE_BUSY = 0x0916, "ERROR_sound_device_busy";
    SOUND_NO_DATA = 0x0917, "ERROR_sound_no_data";
    SOUND_CHANNEL_MASK_MISMATCH = 0x0918, "ERROR_sound_channel_mask_mismatch";

    /// Usual asynchronous refusal of kicks, moves and channel edits.
    PERMISSIONS_CLIENT_INSUFFICIENT = 0x0a08, "ERROR_permissions_client_insufficient";
    PERMISSIONS = 0x0a0c, "ERROR_permissions";

    ACCOUNTING_VIRTUALSERVER_LIMIT_REACHED = 0x0b00, "ERROR_accounting_virtualserver_limit_reached";
    ACCOUNTING_SLOT_LIMIT_REACHED = 0x0b01, "ERROR_accounting_slot_limit_reached";
    ACCOUNTING_LICENSE_FILE_NOT_FOUND = 0x0b02, "ERROR_accounting_license_file_not_found";
    ACCOUNTING_LICENSE_DATE_NOT_OK = 0x0b03, "ERROR_accounting_license_date_not_ok";
    ACCOUNTING_UNABLE_TO_CONNECT_TO_SERVER = 0x0b04, "ERROR_accounting_unable_to_connect_to_server";
    ACCOUNTING_UNKNOWN_ERROR = 0x0b05, "ERROR_accounting_unknown_error";
    ACCOUNTING_SERVER_ERROR = 0x0b06, "ERROR_accounting_server_error";
    ACCOUNTING_INSTANCE_LIMIT_REACHED = 0x0b07, "ERROR_accounting_instance_limit_reached";
    ACCOUNTING_INSTANCE_CHECK_ERROR = 0x0b08, "ERROR_accounting_instance_check_error";
    ACCOUNTING_LICENSE_FILE_INVALID = 0x0b09, "ERROR_accounting_license_file_invalid";
    ACCOUNTING_RUNNING_ELSEWHERE = 0x0b0a, "ERROR_accounting_running_elsewhere";
    ACCOUNTING_INSTANCE_DUPLICATED = 0x0b0b, "ERROR_accounting_instance_duplicated";
    ACCOUNTING_ALREADY_STARTED = 0x0b0c, "ERROR_accounting_already_started";
    ACCOUNTING_NOT_STARTED = 0x0b0d, "ERROR_accounting_not_started";
    ACCOUNTING_TO_MANY_STARTS = 0x0b0e, "ERROR_accounting_to_many_starts";

    PROVISIONING_INVALID_PASSWORD = 0x1100, "ERROR_provisioning_invalid_password";
    PROVISIONING_INVALID_REQUEST = 0x1101, "ERROR_provisioning_invalid_request";
    PROVISIONING_NO_SLOTS_AVAILABLE = 0x1102, "ERROR_provisioning_no_slots_available";
    PROVISIONING_POOL_MISSING = 0x1103, "ERROR_provisioning_pool_missing";
    PROVISIONING_POOL_UNKNOWN = 0x1104, "ERROR_provisioning_pool_unknown";
    PROVISIONING_UNKNOWN_IP_LOCATION = 0x1105, "ERROR_provisioning_unknown_ip_location";
    PROVISIONING_INTERNAL_TRIES_EXCEEDED = 0x1106, "ERROR_provisioning_internal_tries_exceeded";
    PROVISIONING_TOO_MANY_SLOTS_REQUESTED = 0x1107, "ERROR_provisioning_too_many_slots_requested";
    PROVISIONING_TOO_MANY_RESERVED = 0x1108, "ERROR_provisioning_too_many_reserved";
    PROVISIONING_COULD_NOT_CONNECT = 0x1109, "ERROR_provisioning_could_not_connect";
    PROVISIONING_AUTH_SERVER_NOT_CONNECTED = 0x1110, "ERROR_provisioning_auth_server_not_connected";
    PROVISIONING_AUTH_DATA_TOO_LARGE = 0x1111, "ERROR_provisioning_auth_data_too_large";
    PROVISIONING_ALREADY_INITIALIZED = 0x1112, "ERROR_provisioning_already_initialized";
    PROVISIONING_NOT_INITIALIZED = 0x1113, "ERROR_provisioning_not_initialized";
    PROVISIONING_CONNECTING = 0x1114, "ERROR_provisioning_connecting";
    PROVISIONING_ALREADY_CONNECTED = 0x1115, "ERROR_provisioning_already_connected";
    PROVISIONING_NOT_CONNECTED = 0x1116, "ERROR_provisioning_not_connected";
    PROVISIONING_IO_ERROR = 0x1117, "ERROR_provisioning_io_error";
    PROVISIONING_INVALID_TIMEOUT = 0x1118, "ERROR_provisioning_invalid_timeout";
    PROVISIONING_TS3SERVER_NOT_FOUND = 0x1119, "ERROR_provisioning_ts3server_not_found";
    PROVISIONING_NO_PERMISSION = 0x111a, "ERROR_provisioning_no_permission";
}

impl ReturnCode {
    /// Wrap a raw code as delivered by the SDK.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// True for `ERROR_ok`.
    pub const fn is_ok(&self) -> bool {
        self.0 == Self::OK.0
    }

    /// Symbolic SDK name, if this code is one the SDK publishes.
    pub fn name(&self) -> Option<&'static str> {
        Self::KNOWN
            .binary_search_by_key(self, |(code, _)| *code)
            .ok()
            .map(|idx| Self::KNOWN[idx].1)
    }

    /// Look a code up by its symbolic SDK name (`ERROR_ok`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::KNOWN
            .iter()
            .find(|(_, text)| *text == name)
            .map(|(code, _)| *code)
    }
}

impl From<u32> for ReturnCode {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:04x})", name, self.0),
            None => write!(f, "0x{:04x}", self.0),
        }
    }
}

impl fmt::Debug for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReturnCode({})", self)
    }
}
