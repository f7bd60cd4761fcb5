//! Connection transitions and host lifecycle.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use ts3_bridge::sim::SimulatedClientLib;
use ts3_bridge::{
    BridgeConfig, BridgeHost, CallError, ConnectParams, ConnectStatus, ConnectionHandle,
    ReturnCode,
};

use super::MAX_PAUSE;
use crate::assertions::{self, AssertionResult, RaceRound};
use crate::harness::{random_pause, Harness, HarnessConfig};

fn params() -> ConnectParams {
    ConnectParams::new("identity", "localhost", "racer")
}

fn is_idle(harness: &Harness, handle: ConnectionHandle) -> bool {
    harness
        .bridge()
        .connections()
        .get(handle)
        .map_or(true, |record| record.expected().is_idle())
}

/// Race a connect against a disconnect on a fresh handle, `rounds` times.
pub fn connect_disconnect_race(rounds: usize) -> AssertionResult {
    let harness = match Harness::start(HarnessConfig::default()) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("State machine exclusivity", &e.to_string()),
    };
    let client = harness.client();
    let mut played = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let handle = match harness.fresh_handle() {
            Ok(handle) => handle,
            Err(e) => return AssertionResult::fail("State machine exclusivity", &e.to_string()),
        };
        let barrier = Barrier::new(2);

        let (connect, disconnect) = thread::scope(|s| {
            let connect = s.spawn(|| {
                barrier.wait();
                random_pause(MAX_PAUSE);
                client.start_connection(handle, &params())
            });
            let disconnect = s.spawn(|| {
                barrier.wait();
                random_pause(MAX_PAUSE);
                client.stop_connection(handle, "race")
            });
            (join(connect), join(disconnect))
        });

        played.push(RaceRound {
            connect,
            disconnect,
            idle_after: is_idle(&harness, handle),
        });

        if let Err(CallError::CurrentlyNotPossible { current }) =
            client.stop_connection(handle, "cleanup")
        {
            return AssertionResult::fail(
                "State machine exclusivity",
                &format!("cleanup stop refused: handle still {:?}", current),
            );
        }
        if let Err(e) = client.destroy_server_connection_handler(handle) {
            return AssertionResult::fail("State machine exclusivity", &e.to_string());
        }
    }

    assertions::assert_exclusive(&played)
}

fn join(
    worker: thread::ScopedJoinHandle<'_, Result<(), CallError>>,
) -> Result<(), CallError> {
    worker.join().unwrap_or(Err(CallError::Failed {
        code: ReturnCode::UNDEFINED,
    }))
}

/// Connects that end in a bare disconnect must fail with `UNDEFINED`
/// rather than report success, and leave the handle idle.
pub fn mismatched_status_corrected(rounds: usize) -> AssertionResult {
    let harness = match Harness::start(HarnessConfig::default()) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("Status correction", &e.to_string()),
    };
    let client = harness.client();

    for round in 0..rounds {
        let handle = match harness.fresh_handle() {
            Ok(handle) => handle,
            Err(e) => return AssertionResult::fail("Status correction", &e.to_string()),
        };
        harness.sim().bare_disconnect_next_connect();
        random_pause(MAX_PAUSE);

        let result = client.start_connection(handle, &params());
        let check = assertions::assert_delivered(ReturnCode::UNDEFINED, &result);
        if !check.passed {
            return AssertionResult::fail(
                "Status correction",
                &format!("round {}: {}", round, check.failure_details.unwrap_or_default()),
            );
        }
        if !is_idle(&harness, handle) {
            return AssertionResult::fail(
                "Status correction",
                &format!("round {}: handle left mid-transition", round),
            );
        }
        if client.connection_status(handle) != Ok(ConnectStatus::Disconnected) {
            return AssertionResult::fail(
                "Status correction",
                &format!("round {}: handle not disconnected", round),
            );
        }
        if let Err(e) = client.destroy_server_connection_handler(handle) {
            return AssertionResult::fail("Status correction", &e.to_string());
        }
    }
    AssertionResult::pass(&format!("{} mismatched connects rewritten", rounds))
}

/// A connect the server refuses must surface the server's error code.
pub fn failed_connect_reports_cause() -> AssertionResult {
    let harness = match Harness::start(HarnessConfig::default()) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("Failed connect", &e.to_string()),
    };
    harness.sim().set_server_password(Some("secret"));

    let handle = match harness.fresh_handle() {
        Ok(handle) => handle,
        Err(e) => return AssertionResult::fail("Failed connect", &e.to_string()),
    };
    let refused = harness.client().start_connection(handle, &params());
    let check = assertions::assert_delivered(ReturnCode::SERVER_INVALID_PASSWORD, &refused);
    if !check.passed {
        return check;
    }

    let retry = match harness.fresh_handle() {
        Ok(handle) => handle,
        Err(e) => return AssertionResult::fail("Failed connect", &e.to_string()),
    };
    let accepted = harness
        .client()
        .start_connection(retry, &params().with_server_password("secret"));
    assertions::assert_delivered(ReturnCode::OK, &accepted)
}

/// Acquire and release the host `cycles` times, connecting once per cycle.
pub fn host_cycles(cycles: usize) -> AssertionResult {
    let sim = SimulatedClientLib::new().with_latency(Duration::from_millis(1), Duration::ZERO);
    let host = BridgeHost::new(sim, BridgeConfig::default());

    for cycle in 0..cycles {
        let lease = match host.acquire() {
            Ok(lease) => lease,
            Err(e) => {
                return AssertionResult::fail(
                    "Host cycles",
                    &format!("cycle {}: {}", cycle, e),
                )
            }
        };
        let connected = lease
            .spawn_server_connection_handler(0)
            .and_then(|handle| lease.start_connection(handle, &params()));
        if let Err(e) = connected {
            return AssertionResult::fail("Host cycles", &format!("cycle {}: {}", cycle, e));
        }
        drop(lease);

        if host.is_initialized() || host.lib().is_initialized() || host.leases() != 0 {
            return AssertionResult::fail(
                "Host cycles",
                &format!("cycle {}: library still up after last release", cycle),
            );
        }
    }
    AssertionResult::pass(&format!("{} init/destroy cycles", cycles))
}

/// Block `callers` requests on lost events, then shut the bridge down and
/// check every caller wakes with `CONNECTION_LOST`.
pub fn shutdown_wakes_callers(callers: usize) -> AssertionResult {
    let harness = match Harness::start(HarnessConfig {
        wait_timeout: Duration::from_secs(10),
        ..HarnessConfig::default()
    }) {
        Ok(harness) => harness,
        Err(e) => return AssertionResult::fail("Shutdown", &e.to_string()),
    };
    harness.sim().set_drop_rate(1.0);
    let client = harness.client();
    let handle = harness.handle();
    let bridge = Arc::clone(harness.bridge());

    let (results, report) = thread::scope(|s| {
        let workers: Vec<_> = (0..callers)
            .map(|_| s.spawn(move || client.request_server_connection_info(handle)))
            .collect();

        let started = Instant::now();
        while bridge.registry().len() < callers && started.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(1));
        }
        let report = bridge.shutdown();

        let results: Vec<_> = workers.into_iter().map(join).collect();
        (results, report)
    });

    if report.pending != callers || report.woken != callers {
        return AssertionResult::fail(
            "Shutdown",
            &format!(
                "drained {} pending, woke {}, expected {}",
                report.pending, report.woken, callers
            ),
        );
    }
    for result in &results {
        let check = assertions::assert_delivered(ReturnCode::CONNECTION_LOST, result);
        if !check.passed {
            return check;
        }
    }
    if bridge.shutdown().pending != 0 {
        return AssertionResult::fail("Shutdown", "second shutdown found pending requests");
    }
    assertions::assert_drained(bridge.registry().len(), "tokens")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ROUNDS;

    #[test]
    fn connect_and_disconnect_never_overlap() {
        connect_disconnect_race(ROUNDS / 2).check();
    }

    #[test]
    fn bare_disconnect_never_reads_as_success() {
        mismatched_status_corrected(ROUNDS / 4).check();
    }

    #[test]
    fn refused_connect_carries_server_code() {
        failed_connect_reports_cause().check();
    }

    #[test]
    fn repeated_host_cycles() {
        host_cycles(10).check();
    }

    #[test]
    fn shutdown_wakes_every_blocked_caller() {
        shutdown_wakes_callers(12).check();
    }
}
