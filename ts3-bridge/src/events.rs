//! Event bridge: the SDK's callbacks, resolved to waiting records.
//!
//! Runs on the SDK notification thread only. Nothing here blocks beyond
//! the short wait-slot lock, and events never create records.

use crate::bridge::SyncBridge;
use crate::sdk::ClientEvents;
use std::sync::Arc;
use ts3_core::{resolve_lifecycle_error, resolve_status_change, ErrorRoute};
use ts3_types::{ConnectStatus, ConnectionHandle, ReturnCode};

/// [`ClientEvents`] implementation that posts outcomes into a [`SyncBridge`].
#[derive(Debug, Clone)]
pub struct EventBridge {
    bridge: Arc<SyncBridge>,
}

impl EventBridge {
    /// Wrap a bridge.
    pub fn new(bridge: Arc<SyncBridge>) -> Self {
        Self { bridge }
    }
}

impl ClientEvents for EventBridge {
    fn on_server_error(
        &self,
        handle: ConnectionHandle,
        message: &str,
        code: ReturnCode,
        return_code: Option<&str>,
        _extra: &str,
    ) {
        match ErrorRoute::classify(return_code) {
            ErrorRoute::Correlated(token) => match self.bridge.registry.remove(token) {
                Some(pending) => {
                    pending.slot().post(code);
                    self.bridge.registry.release(pending);
                }
                None => {
                    tracing::debug!("dropping outcome {} for unknown token {}", code, token);
                }
            },
            ErrorRoute::Lifecycle => {
                let Some(record) = self.bridge.connections.get(handle) else {
                    tracing::debug!("handle {}: server error {} ({})", handle, code, message);
                    return;
                };
                if let Some(result) = resolve_lifecycle_error(record.expected(), code) {
                    record.slot().post(result);
                }
            }
            ErrorRoute::Malformed => {
                tracing::debug!(
                    "dropping outcome {} with malformed return code {:?}",
                    code,
                    return_code
                );
            }
        }
    }

    fn on_connect_status_change(&self, handle: ConnectionHandle, new_status: i32, code: ReturnCode) {
        let status = match ConnectStatus::try_from(new_status) {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!("handle {}: {}", handle, e);
                return;
            }
        };
        let Some(record) = self.bridge.connections.get(handle) else {
            return;
        };
        if let Some(result) = resolve_status_change(record.expected(), status, code) {
            tracing::debug!("handle {}: {} posts {}", handle, status, result);
            record.slot().post(result);
        }
    }
}
