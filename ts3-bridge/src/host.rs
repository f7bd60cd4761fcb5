//! Reference-counted ownership of an initialised client library.
//!
//! Several independent users may share one client library. The first
//! [`BridgeHost::acquire`] initialises it with a fresh [`SyncBridge`]; when
//! the last [`BridgeLease`] is dropped the library is destroyed and the
//! bridge drained. The cycle can repeat.

use crate::bridge::SyncBridge;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::handle::ClientHandle;
use crate::sdk::ClientLib;
use parking_lot::Mutex;
use std::ops::Deref;
use std::sync::Arc;

struct HostState {
    leases: usize,
    bridge: Option<Arc<SyncBridge>>,
}

/// Owner of a client library and the bridge state for its current cycle.
pub struct BridgeHost<L: ClientLib> {
    lib: Arc<L>,
    config: BridgeConfig,
    state: Mutex<HostState>,
}

impl<L: ClientLib> BridgeHost<L> {
    /// Wrap a (not yet initialised) client library.
    pub fn new(lib: L, config: BridgeConfig) -> Arc<Self> {
        Arc::new(Self {
            lib: Arc::new(lib),
            config,
            state: Mutex::new(HostState {
                leases: 0,
                bridge: None,
            }),
        })
    }

    /// Take a lease, initialising the library if this is the first one.
    ///
    /// # Errors
    ///
    /// [`BridgeError::InitFailed`] if the library refuses to initialise;
    /// the host then stays uninitialised.
    pub fn acquire(self: &Arc<Self>) -> Result<BridgeLease<L>, BridgeError> {
        let mut state = self.state.lock();

        let bridge = match &state.bridge {
            Some(bridge) => Arc::clone(bridge),
            None => {
                let bridge = SyncBridge::new(&self.config);
                let options = self.config.client_lib_options();
                let code = self.lib.init(bridge.event_sink(), &options);
                if !code.is_ok() {
                    tracing::warn!("client library init failed: {}", code);
                    return Err(BridgeError::InitFailed { code });
                }
                tracing::info!(
                    "client library initialised (wait timeout {:?})",
                    bridge.wait_timeout()
                );
                state.bridge = Some(Arc::clone(&bridge));
                bridge
            }
        };
        state.leases += 1;

        Ok(BridgeLease {
            host: Arc::clone(self),
            handle: ClientHandle::new(Arc::clone(&self.lib), bridge),
        })
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.leases = state.leases.saturating_sub(1);
        if state.leases > 0 {
            return;
        }
        let Some(bridge) = state.bridge.take() else {
            return;
        };

        let code = self.lib.destroy();
        if !code.is_ok() {
            tracing::warn!("client library destroy returned {}", code);
        }
        let report = bridge.shutdown();
        tracing::info!(
            "client library destroyed ({} pending requests, {} connections drained)",
            report.pending,
            report.connections
        );
    }

    /// Number of live leases.
    pub fn leases(&self) -> usize {
        self.state.lock().leases
    }

    /// Whether the library is currently initialised.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().bridge.is_some()
    }

    /// The wrapped library.
    pub fn lib(&self) -> &Arc<L> {
        &self.lib
    }

    /// The configuration each cycle starts from.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

/// A live reference to an initialised host. Derefs to [`ClientHandle`].
pub struct BridgeLease<L: ClientLib> {
    host: Arc<BridgeHost<L>>,
    handle: ClientHandle<L>,
}

impl<L: ClientLib> BridgeLease<L> {
    /// The blocking call surface.
    pub fn handle(&self) -> &ClientHandle<L> {
        &self.handle
    }
}

impl<L: ClientLib> Deref for BridgeLease<L> {
    type Target = ClientHandle<L>;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<L: ClientLib> Drop for BridgeLease<L> {
    fn drop(&mut self) {
        self.host.release();
    }
}
