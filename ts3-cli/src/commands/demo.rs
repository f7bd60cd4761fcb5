//! Walk one connection through its whole life.

use anyhow::{Context, Result};
use ts3_bridge::{BridgeHost, ChannelId, ClientId, ConnectParams, ReturnCode};

use super::report;
use crate::config::CliConfig;

const GAMES: ChannelId = ChannelId::new(2);
const MUSIC: ChannelId = ChannelId::new(3);
const BOB: ClientId = ClientId::new(3);

/// Run the demo command.
pub async fn run(config: CliConfig) -> Result<()> {
    let steps = tokio::task::spawn_blocking(move || steps(&config))
        .await
        .context("Demo task panicked")??;

    let failed = steps.iter().filter(|(_, code)| !code.is_ok()).count();
    println!();
    println!("{} steps, {} did not end in ok", steps.len(), failed);
    Ok(())
}

/// Execute every step, returning each step name with its final code.
pub fn steps(config: &CliConfig) -> Result<Vec<(&'static str, ReturnCode)>> {
    let host = BridgeHost::new(config.simulator(), config.bridge.clone());
    let client = host.acquire()?;
    let mut steps = Vec::new();

    println!("=== ts3bridge demo ===");
    println!("  library: {}", client.lib_version()?);
    println!();

    let handle = client.spawn_server_connection_handler(0)?;
    let identity = client.create_identity()?;
    let mut params = ConnectParams::new(identity, "localhost", "ts3bridge-demo");
    if let Some(password) = &config.sim.server_password {
        params = params.with_server_password(password.clone());
    }

    let connected = client.start_connection(handle, &params);
    steps.push(("start_connection", report("start_connection", &connected)));
    if connected.is_err() {
        client.destroy_server_connection_handler(handle)?;
        return Ok(steps);
    }

    let me = client.client_id(handle)?;

    let mut step = |name: &'static str, code: ReturnCode| steps.push((name, code));

    step(
        "request_channel_subscribe_all",
        report(
            "request_channel_subscribe_all",
            &client.request_channel_subscribe_all(handle),
        ),
    );
    step(
        "flush_client_self_updates",
        report(
            "flush_client_self_updates",
            &client.flush_client_self_updates(handle),
        ),
    );
    step(
        "request_client_move",
        report(
            "request_client_move",
            &client.request_client_move(handle, me, GAMES, ""),
        ),
    );
    step(
        "request_client_kick_from_channel",
        report(
            "request_client_kick_from_channel",
            &client.request_client_kick_from_channel(handle, BOB, "demo"),
        ),
    );
    step(
        "request_channel_delete(music)",
        report(
            "request_channel_delete(music)",
            &client.request_channel_delete(handle, MUSIC, false),
        ),
    );
    step(
        "request_channel_delete(games)",
        report(
            "request_channel_delete(games)",
            &client.request_channel_delete(handle, GAMES, false),
        ),
    );
    step(
        "stop_connection",
        report("stop_connection", &client.stop_connection(handle, "bye")),
    );
    step(
        "destroy_server_connection_handler",
        report(
            "destroy_server_connection_handler",
            &client.destroy_server_connection_handler(handle),
        ),
    );

    Ok(steps)
}
