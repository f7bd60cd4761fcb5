//! Stress harness: a bridge host over the simulated client library with
//! one connection already established.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use ts3_bridge::sim::SimulatedClientLib;
use ts3_bridge::{
    BridgeConfig, BridgeError, BridgeHost, BridgeLease, CallError, ClientHandle, ConnectParams,
    ConnectionHandle, SyncBridge,
};

/// Errors bringing a harness up.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The host refused to initialise.
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// A setup call failed.
    #[error("setup call failed: {0}")]
    Call(#[from] CallError),
}

/// Timing of a harness run.
#[derive(Debug, Clone, Copy)]
pub struct HarnessConfig {
    /// Base event latency.
    pub latency: Duration,
    /// Upper bound of random extra event delay.
    pub jitter: Duration,
    /// Per-call deadline.
    pub wait_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(1),
            jitter: Duration::from_millis(2),
            wait_timeout: Duration::from_secs(5),
        }
    }
}

/// A live host, its lease and one connected handler.
pub struct Harness {
    host: Arc<BridgeHost<SimulatedClientLib>>,
    lease: BridgeLease<SimulatedClientLib>,
    handle: ConnectionHandle,
}

impl Harness {
    /// Start a host and connect one handler.
    pub fn start(config: HarnessConfig) -> Result<Self, HarnessError> {
        let sim = SimulatedClientLib::new().with_latency(config.latency, config.jitter);
        let host = BridgeHost::new(
            sim,
            BridgeConfig::default().with_wait_timeout(config.wait_timeout),
        );
        let lease = host.acquire()?;

        let handle = lease.spawn_server_connection_handler(0)?;
        let identity = lease.create_identity()?;
        lease.start_connection(handle, &ConnectParams::new(identity, "localhost", "stress"))?;
        tracing::debug!("harness connected handle {}", handle);

        Ok(Self {
            host,
            lease,
            handle,
        })
    }

    /// The blocking call surface.
    pub fn client(&self) -> &ClientHandle<SimulatedClientLib> {
        self.lease.handle()
    }

    /// The simulated library, for fault injection.
    pub fn sim(&self) -> &SimulatedClientLib {
        self.host.lib()
    }

    /// The host, for taking further leases.
    pub fn host(&self) -> &Arc<BridgeHost<SimulatedClientLib>> {
        &self.host
    }

    /// The bridge of the current cycle.
    pub fn bridge(&self) -> &Arc<SyncBridge> {
        self.client().bridge()
    }

    /// The connected handler.
    pub fn handle(&self) -> ConnectionHandle {
        self.handle
    }

    /// Spawn a fresh, unconnected handler.
    pub fn fresh_handle(&self) -> Result<ConnectionHandle, HarnessError> {
        Ok(self.client().spawn_server_connection_handler(0)?)
    }
}

/// Sleep for a random duration up to `max`.
pub fn random_pause(max: Duration) {
    let max_us = u64::try_from(max.as_micros()).unwrap_or(u64::MAX);
    if max_us == 0 {
        return;
    }
    let pause = rand::thread_rng().gen_range(0..=max_us);
    std::thread::sleep(Duration::from_micros(pause));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts3_bridge::ConnectStatus;

    #[test]
    fn start_connects_one_handle() {
        let harness = Harness::start(HarnessConfig::default()).unwrap();
        assert_eq!(
            harness.client().connection_status(harness.handle()),
            Ok(ConnectStatus::ConnectionEstablished)
        );
        assert_eq!(harness.host().leases(), 1);
    }

    #[test]
    fn fresh_handles_are_disconnected() {
        let harness = Harness::start(HarnessConfig::default()).unwrap();
        let fresh = harness.fresh_handle().unwrap();
        assert_ne!(fresh, harness.handle());
        assert_eq!(
            harness.client().connection_status(fresh),
            Ok(ConnectStatus::Disconnected)
        );
    }

    #[test]
    fn zero_pause_returns_immediately() {
        random_pause(Duration::ZERO);
    }
}
