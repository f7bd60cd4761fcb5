//! Fire concurrent correlated requests and tally their outcomes.

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use std::time::Instant;
use ts3_bridge::{
    final_code, BridgeHost, CallError, ChannelId, ClientHandle, ClientId, ClientLib,
    ConnectParams, ConnectionHandle,
};

use crate::config::CliConfig;

/// Knobs of one stress run.
#[derive(Debug, Clone, Copy)]
pub struct StressOptions {
    /// Total number of requests.
    pub requests: usize,
    /// Caller threads.
    pub threads: usize,
    /// Probability that an outcome event is lost.
    pub drop_rate: f64,
    /// Jitter override in milliseconds.
    pub jitter_ms: Option<u64>,
}

/// Result of a stress run.
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    /// Requests issued.
    pub requests: usize,
    /// Wall time of the request phase.
    pub elapsed_ms: u64,
    /// Final code name (or `TIMED_OUT`) to count.
    pub histogram: BTreeMap<String, usize>,
    /// Tokens still registered after every caller returned.
    pub leaked_tokens: usize,
}

/// Run the stress command.
pub async fn run(config: CliConfig, options: StressOptions, json: bool) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || execute(&config, options))
        .await
        .context("Stress task panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== ts3bridge stress ===");
        println!("  requests: {}", report.requests);
        println!("  elapsed:  {} ms", report.elapsed_ms);
        for (outcome, count) in &report.histogram {
            println!("  {:<32} {}", outcome, count);
        }
        println!("  leaked tokens: {}", report.leaked_tokens);
    }

    if report.leaked_tokens > 0 {
        anyhow::bail!("{} tokens left in the registry", report.leaked_tokens);
    }
    Ok(())
}

/// Connect once, then spread `requests` over `threads` callers.
pub fn execute(config: &CliConfig, options: StressOptions) -> Result<StressReport> {
    let mut config = config.clone();
    if let Some(jitter) = options.jitter_ms {
        config.sim.jitter_ms = jitter;
    }
    let threads = options.threads.max(1);

    let host = BridgeHost::new(config.simulator(), config.bridge.clone());
    let lease = host.acquire()?;
    let client = lease.handle();

    let handle = client.spawn_server_connection_handler(0)?;
    let identity = client.create_identity()?;
    let mut params = ConnectParams::new(identity, "localhost", "stress");
    if let Some(password) = &config.sim.server_password {
        params = params.with_server_password(password.clone());
    }
    client.start_connection(handle, &params)?;
    let me = client.client_id(handle)?;

    host.lib().set_drop_rate(options.drop_rate);
    let started = Instant::now();

    let outcomes: Vec<Vec<String>> = thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|i| {
                let share = options.requests / threads + usize::from(i < options.requests % threads);
                s.spawn(move || {
                    (0..share)
                        .map(|_| one_request(client, handle, me))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().unwrap_or_default())
            .collect()
    });
    let elapsed = started.elapsed();

    host.lib().set_drop_rate(0.0);
    let leaked_tokens = client.bridge().registry().len();

    let mut histogram = BTreeMap::new();
    for outcome in outcomes.into_iter().flatten() {
        *histogram.entry(outcome).or_insert(0) += 1;
    }

    let _ = client.stop_connection(handle, "stress done");
    client.destroy_server_connection_handler(handle)?;

    Ok(StressReport {
        requests: options.requests,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        histogram,
        leaked_tokens,
    })
}

fn one_request<L: ClientLib>(
    client: &ClientHandle<L>,
    handle: ConnectionHandle,
    me: ClientId,
) -> String {
    let result = match rand::thread_rng().gen_range(0..4) {
        0 => client.request_server_connection_info(handle),
        1 => client.request_channel_subscribe_all(handle),
        2 => client.request_client_variables(handle, ClientId::new(999)),
        _ => {
            let channel = ChannelId::new(rand::thread_rng().gen_range(1..=3));
            client.request_client_move(handle, me, channel, "")
        }
    };
    outcome_label(&result)
}

fn outcome_label(result: &Result<(), CallError>) -> String {
    if let Err(CallError::TimedOut { .. }) = result {
        return "TIMED_OUT".into();
    }
    let code = final_code(result);
    code.name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("0x{:04x}", code.raw()))
}
