//! Race connect against disconnect on fresh handles.
//!
//! Each round spawns a handler and releases both calls from a barrier.
//! Whichever wins the per-handle state machine proceeds to the library;
//! the other must see `CURRENTLY_NOT_POSSIBLE`. When the winner finishes
//! before the loser even starts, both proceed in turn, which is also legal.

use anyhow::{Context, Result};
use std::sync::Barrier;
use std::thread;
use ts3_bridge::{
    BridgeHost, CallError, ClientHandle, ClientLib, ConnectParams, ConnectStatus, ConnectionHandle,
};
use ts3_core::ExpectedState;

use crate::config::CliConfig;

/// Tally of all rounds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RaceReport {
    /// Rounds played.
    pub rounds: usize,
    /// Exactly one call was refused as busy.
    pub exclusive: usize,
    /// Neither call overlapped the other.
    pub sequential: usize,
    /// Both refused, or the handle was left mid-transition.
    pub violations: usize,
}

/// Run the race command.
pub async fn run(config: CliConfig, rounds: usize) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || play(&config, rounds))
        .await
        .context("Race task panicked")??;

    println!("=== ts3bridge race ===");
    println!("  rounds:     {}", report.rounds);
    println!("  exclusive:  {}", report.exclusive);
    println!("  sequential: {}", report.sequential);
    println!("  violations: {}", report.violations);

    if report.violations > 0 {
        anyhow::bail!("{} rounds broke connect/disconnect exclusivity", report.violations);
    }
    Ok(())
}

/// Play `rounds` rounds.
pub fn play(config: &CliConfig, rounds: usize) -> Result<RaceReport> {
    let host = BridgeHost::new(config.simulator(), config.bridge.clone());
    let lease = host.acquire()?;
    let client = lease.handle();
    let mut report = RaceReport {
        rounds,
        ..RaceReport::default()
    };

    for round in 0..rounds {
        let handle = client.spawn_server_connection_handler(0)?;
        let params = ConnectParams::new(format!("race-{}", round), "localhost", "racer");
        let barrier = Barrier::new(2);

        let (connect, disconnect) = thread::scope(|s| {
            let connect = s.spawn(|| {
                barrier.wait();
                client.start_connection(handle, &params)
            });
            let disconnect = s.spawn(|| {
                barrier.wait();
                client.stop_connection(handle, "race")
            });
            (connect.join(), disconnect.join())
        });
        let (connect, disconnect) = match (connect, disconnect) {
            (Ok(c), Ok(d)) => (c, d),
            _ => anyhow::bail!("race thread panicked in round {}", round),
        };

        let busy = [&connect, &disconnect]
            .iter()
            .filter(|r| matches!(r, Err(CallError::CurrentlyNotPossible { .. })))
            .count();
        let idle = client
            .bridge()
            .connections()
            .get(handle)
            .map_or(true, |record| record.expected() == ExpectedState::None);

        match (busy, idle) {
            (1, true) => report.exclusive += 1,
            (0, true) => report.sequential += 1,
            _ => {
                tracing::warn!(
                    "round {}: connect={:?} disconnect={:?} idle={}",
                    round,
                    connect,
                    disconnect,
                    idle
                );
                report.violations += 1;
            }
        }

        cleanup(client, handle)?;
    }

    Ok(report)
}

fn cleanup<L: ClientLib>(client: &ClientHandle<L>, handle: ConnectionHandle) -> Result<()> {
    if client.connection_status(handle)? != ConnectStatus::Disconnected {
        // A late connect may still be settling; a refusal here is harmless.
        let _ = client.stop_connection(handle, "cleanup");
    }
    client.destroy_server_connection_handler(handle)?;
    Ok(())
}
