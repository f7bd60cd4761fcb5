//! In-process simulated client library.
//!
//! Implements [`ClientLib`] without the native SDK so the bridge can be
//! driven end to end. Like the real library it owns exactly one
//! notification thread (started by `init`, joined by `destroy`) and
//! delivers events serially, each after a configurable latency plus
//! optional random jitter.
//!
//! Fault injection covers every path the bridge has to survive: synchronous
//! rejection, asynchronous failure, lost and duplicated events, failed or
//! contradictory connects, and raw event injection.

use crate::sdk::{ClientEvents, ClientLib, ClientLibOptions};
use crate::types::ConnectParams;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use ts3_types::{
    ChannelId, ChannelProperty, ClientId, ClientProperty, ConnectStatus, ConnectionHandle,
    ConnectionProperty, ReturnCode, Variable, VariableKind, VirtualServerProperty,
};

const IDENTITY_PREFIX: &str = "sim-identity:";
const VERSION: &str = "3.3.2 [Simulated]";
const VERSION_NUMBER: u64 = 1_588_684_012;
const DEFAULT_CHANNEL: ChannelId = ChannelId::new(1);
const OWN_CLIENT: ClientId = ClientId::new(1);

/// Where a sent text message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTarget {
    /// Private message.
    Client(ClientId),
    /// Channel message.
    Channel(ChannelId),
    /// Server-wide message.
    Server,
}

/// A text message accepted by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentText {
    /// Sending handler.
    pub handle: ConnectionHandle,
    /// Recipient.
    pub target: TextTarget,
    /// Message body.
    pub message: String,
}

/// Counters of the notification thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimStats {
    /// Events handed to the registered callbacks.
    pub delivered: u64,
    /// Events swallowed by fault injection.
    pub dropped: u64,
}

#[derive(Debug, Clone)]
enum SimEvent {
    ServerError {
        handle: ConnectionHandle,
        code: ReturnCode,
        message: String,
        return_code: Option<String>,
    },
    Status {
        handle: ConnectionHandle,
        status: i32,
        code: ReturnCode,
    },
}

struct Scheduled {
    at: Instant,
    event: SimEvent,
}

#[derive(Debug, Default)]
struct Faults {
    fail_next_init: Option<ReturnCode>,
    reject_next: Option<ReturnCode>,
    fail_next: Option<ReturnCode>,
    fail_next_connect: Option<ReturnCode>,
    bare_disconnect_next_connect: bool,
    drop_next: usize,
    drop_rate: f64,
    duplicate: bool,
}

#[derive(Debug, Clone)]
struct SimClient {
    channel: ChannelId,
    nickname: String,
}

#[derive(Debug, Clone)]
struct SimChannel {
    parent: ChannelId,
    order: ChannelId,
    vars: HashMap<ChannelProperty, Variable>,
}

impl SimChannel {
    fn new(parent: ChannelId, name: &str) -> Self {
        let mut vars = HashMap::new();
        vars.insert(ChannelProperty::Name, Variable::from(name));
        Self {
            parent,
            order: ChannelId::ROOT,
            vars,
        }
    }

    fn name(&self) -> Option<&str> {
        self.vars.get(&ChannelProperty::Name).and_then(Variable::as_str)
    }

    fn password(&self) -> &str {
        self.vars
            .get(&ChannelProperty::Password)
            .and_then(Variable::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug)]
struct SimServer {
    status: ConnectStatus,
    address: String,
    port: u16,
    connected_at: Option<Instant>,
    clients: BTreeMap<ClientId, SimClient>,
    channels: BTreeMap<ChannelId, SimChannel>,
    next_channel: u64,
    self_vars: HashMap<ClientProperty, Variable>,
    staged_self: HashMap<ClientProperty, Variable>,
    staged_channels: HashMap<ChannelId, HashMap<ChannelProperty, Variable>>,
    subscribed_all: bool,
}

impl SimServer {
    fn new() -> Self {
        Self {
            status: ConnectStatus::Disconnected,
            address: String::new(),
            port: 0,
            connected_at: None,
            clients: BTreeMap::new(),
            channels: BTreeMap::new(),
            next_channel: 1,
            self_vars: HashMap::new(),
            staged_self: HashMap::new(),
            staged_channels: HashMap::new(),
            subscribed_all: false,
        }
    }

    /// Server-side view right after a successful login.
    fn populate(&mut self, params: &ConnectParams) {
        self.address = params.address.clone();
        self.port = params.port;
        self.channels.clear();
        self.clients.clear();

        let mut lobby = SimChannel::new(ChannelId::ROOT, "Lobby");
        lobby
            .vars
            .insert(ChannelProperty::FlagDefault, Variable::Int(1));
        self.channels.insert(DEFAULT_CHANNEL, lobby);
        self.channels
            .insert(ChannelId::new(2), SimChannel::new(ChannelId::ROOT, "Games"));
        self.channels
            .insert(ChannelId::new(3), SimChannel::new(ChannelId::new(2), "Music"));
        self.next_channel = 4;

        let home = if self.channels.contains_key(&params.default_channel) {
            params.default_channel
        } else {
            DEFAULT_CHANNEL
        };
        self.clients.insert(
            OWN_CLIENT,
            SimClient {
                channel: home,
                nickname: params.nickname.clone(),
            },
        );
        self.clients.insert(
            ClientId::new(2),
            SimClient {
                channel: DEFAULT_CHANNEL,
                nickname: "Alice".into(),
            },
        );
        self.clients.insert(
            ClientId::new(3),
            SimClient {
                channel: ChannelId::new(2),
                nickname: "Bob".into(),
            },
        );

        self.self_vars.clear();
        self.self_vars.insert(
            ClientProperty::Nickname,
            Variable::from(params.nickname.as_str()),
        );
        self.self_vars.insert(
            ClientProperty::UniqueIdentifier,
            Variable::from(unique_identifier(&params.identity)),
        );
        self.self_vars
            .insert(ClientProperty::Platform, Variable::from("Linux"));
        self.self_vars
            .insert(ClientProperty::Version, Variable::from(VERSION));
        self.staged_self.clear();
        self.staged_channels.clear();
        self.subscribed_all = false;
    }

    fn channel(&self, channel: ChannelId) -> Result<&SimChannel, ReturnCode> {
        self.channels
            .get(&channel)
            .ok_or(ReturnCode::CHANNEL_INVALID_ID)
    }

    fn client(&self, client: ClientId) -> Result<&SimClient, ReturnCode> {
        self.clients.get(&client).ok_or(ReturnCode::CLIENT_INVALID_ID)
    }

    fn is_descendant(&self, channel: ChannelId, ancestor: ChannelId) -> bool {
        let mut current = channel;
        while let Some(c) = self.channels.get(&current) {
            if c.parent == ancestor {
                return true;
            }
            if c.parent == ChannelId::ROOT {
                return false;
            }
            current = c.parent;
        }
        false
    }

    fn subtree(&self, root: ChannelId) -> Vec<ChannelId> {
        self.channels
            .keys()
            .copied()
            .filter(|c| *c == root || self.is_descendant(*c, root))
            .collect()
    }

    fn sibling_named(&self, parent: ChannelId, name: &str, except: ChannelId) -> bool {
        self.channels
            .iter()
            .any(|(id, c)| *id != except && c.parent == parent && c.name() == Some(name))
    }

    fn occupied(&self, channel: ChannelId) -> bool {
        self.clients.values().any(|c| c.channel == channel)
    }
}

struct SimState {
    initialized: bool,
    notifier: Option<Sender<Scheduled>>,
    next_handle: u64,
    servers: HashMap<ConnectionHandle, SimServer>,
    faults: Faults,
    latency: Duration,
    jitter: Duration,
    server_password: Option<String>,
    sent: Vec<SentText>,
    options: Option<ClientLibOptions>,
}

struct Shared {
    state: Mutex<SimState>,
    stopping: AtomicBool,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

enum Reply {
    /// Refuse synchronously; nothing is scheduled.
    Sync(ReturnCode),
    /// Accept and report this outcome later.
    Async(ReturnCode),
}

/// Simulated client library.
pub struct SimulatedClientLib {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for SimulatedClientLib {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedClientLib {
    /// Create an uninitialised simulator with 5ms event latency.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SimState {
                    initialized: false,
                    notifier: None,
                    next_handle: 1,
                    servers: HashMap::new(),
                    faults: Faults::default(),
                    latency: Duration::from_millis(5),
                    jitter: Duration::ZERO,
                    server_password: None,
                    sent: Vec::new(),
                    options: None,
                }),
                stopping: AtomicBool::new(false),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Set the event latency and the upper bound of random extra delay.
    pub fn with_latency(self, latency: Duration, jitter: Duration) -> Self {
        self.set_latency(latency, jitter);
        self
    }

    /// Change the event latency at runtime.
    pub fn set_latency(&self, latency: Duration, jitter: Duration) {
        let mut state = self.shared.state.lock();
        state.latency = latency;
        state.jitter = jitter;
    }

    /// Require this server password on connect (`None` for open servers).
    pub fn set_server_password(&self, password: Option<&str>) {
        self.shared.state.lock().server_password = password.map(str::to_owned);
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Cause the next `init` to fail with `code`.
    pub fn fail_next_init(&self, code: ReturnCode) {
        self.shared.state.lock().faults.fail_next_init = Some(code);
    }

    /// Cause the next correlated request or connect to be refused
    /// synchronously with `code`.
    pub fn reject_next(&self, code: ReturnCode) {
        self.shared.state.lock().faults.reject_next = Some(code);
    }

    /// Cause the next accepted correlated request to report `code`.
    pub fn fail_next(&self, code: ReturnCode) {
        self.shared.state.lock().faults.fail_next = Some(code);
    }

    /// Cause the next connect to fail with `code` (error event followed by
    /// a disconnect carrying the same code).
    pub fn fail_next_connect(&self, code: ReturnCode) {
        self.shared.state.lock().faults.fail_next_connect = Some(code);
    }

    /// Cause the next connect to end in a plain disconnect with `OK`.
    pub fn bare_disconnect_next_connect(&self) {
        self.shared.state.lock().faults.bare_disconnect_next_connect = true;
    }

    /// Swallow the next `n` events.
    pub fn drop_next_events(&self, n: usize) {
        self.shared.state.lock().faults.drop_next = n;
    }

    /// Swallow each event with probability `rate` (clamped to `0.0..=1.0`).
    pub fn set_drop_rate(&self, rate: f64) {
        self.shared.state.lock().faults.drop_rate = rate.clamp(0.0, 1.0);
    }

    /// Deliver every event twice.
    pub fn set_duplicate_events(&self, duplicate: bool) {
        self.shared.state.lock().faults.duplicate = duplicate;
    }

    /// Queue a raw server error event. Returns false when not initialised.
    pub fn inject_server_error(
        &self,
        handle: ConnectionHandle,
        code: ReturnCode,
        return_code: Option<&str>,
    ) -> bool {
        self.inject(SimEvent::ServerError {
            handle,
            code,
            message: "injected".into(),
            return_code: return_code.map(str::to_owned),
        })
    }

    /// Queue a raw status change event. Returns false when not initialised.
    pub fn inject_status(&self, handle: ConnectionHandle, status: i32, code: ReturnCode) -> bool {
        self.inject(SimEvent::Status {
            handle,
            status,
            code,
        })
    }

    fn inject(&self, event: SimEvent) -> bool {
        let mut state = self.shared.state.lock();
        if !state.initialized {
            return false;
        }
        self.emit(&mut state, event);
        true
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Event counters.
    pub fn stats(&self) -> SimStats {
        SimStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }

    /// Text messages sent so far.
    pub fn sent_texts(&self) -> Vec<SentText> {
        self.shared.state.lock().sent.clone()
    }

    /// Options passed to the last successful `init`.
    pub fn init_options(&self) -> Option<ClientLibOptions> {
        self.shared.state.lock().options.clone()
    }

    /// Whether `init` has run without a matching `destroy`.
    pub fn is_initialized(&self) -> bool {
        self.shared.state.lock().initialized
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn state(&self) -> Result<MutexGuard<'_, SimState>, ReturnCode> {
        let state = self.shared.state.lock();
        if state.initialized {
            Ok(state)
        } else {
            Err(ReturnCode::CLIENTLIBRARY_NOT_INITIALISED)
        }
    }

    fn emit(&self, state: &mut SimState, event: SimEvent) {
        let copies = if state.faults.duplicate { 2 } else { 1 };
        for _ in 0..copies {
            if state.faults.drop_next > 0 {
                state.faults.drop_next -= 1;
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            let mut rng = rand::thread_rng();
            if state.faults.drop_rate > 0.0 && rng.gen_bool(state.faults.drop_rate) {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            let jitter_ms = u64::try_from(state.jitter.as_millis()).unwrap_or(u64::MAX);
            let jitter = if jitter_ms > 0 {
                Duration::from_millis(rng.gen_range(0..=jitter_ms))
            } else {
                Duration::ZERO
            };
            let scheduled = Scheduled {
                at: Instant::now() + state.latency + jitter,
                event: event.clone(),
            };
            if let Some(tx) = &state.notifier {
                // Only fails once the notification thread is gone.
                let _ = tx.send(scheduled);
            }
        }
    }

    fn with_server<T>(
        &self,
        handle: ConnectionHandle,
        f: impl FnOnce(&SimServer) -> Result<T, ReturnCode>,
    ) -> Result<T, ReturnCode> {
        let state = self.state()?;
        let server = state
            .servers
            .get(&handle)
            .ok_or(ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID)?;
        f(server)
    }

    fn with_online<T>(
        &self,
        handle: ConnectionHandle,
        f: impl FnOnce(&SimServer) -> Result<T, ReturnCode>,
    ) -> Result<T, ReturnCode> {
        self.with_server(handle, |server| {
            if server.status != ConnectStatus::ConnectionEstablished {
                return Err(ReturnCode::NOT_CONNECTED);
            }
            f(server)
        })
    }

    fn with_online_mut(
        &self,
        handle: ConnectionHandle,
        f: impl FnOnce(&mut SimServer) -> ReturnCode,
    ) -> ReturnCode {
        let mut state = match self.state() {
            Ok(state) => state,
            Err(code) => return code,
        };
        match state.servers.get_mut(&handle) {
            None => ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
            Some(server) if server.status != ConnectStatus::ConnectionEstablished => {
                ReturnCode::NOT_CONNECTED
            }
            Some(server) => f(server),
        }
    }

    /// Shared path of every request that reports through a return code.
    fn correlated(
        &self,
        handle: ConnectionHandle,
        return_code: &str,
        action: impl FnOnce(&mut SimServer) -> Reply,
    ) -> ReturnCode {
        let mut guard = match self.state() {
            Ok(guard) => guard,
            Err(code) => return code,
        };
        let state = &mut *guard;
        if let Some(code) = state.faults.reject_next.take() {
            return code;
        }
        let outcome = match state.servers.get_mut(&handle) {
            None => return ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
            Some(server) if server.status != ConnectStatus::ConnectionEstablished => {
                return ReturnCode::NOT_CONNECTED
            }
            Some(server) => match state.faults.fail_next.take() {
                Some(code) => code,
                None => match action(server) {
                    Reply::Sync(code) => return code,
                    Reply::Async(code) => code,
                },
            },
        };
        self.emit(
            state,
            SimEvent::ServerError {
                handle,
                code: outcome,
                message: message_for(outcome),
                return_code: Some(return_code.to_owned()),
            },
        );
        ReturnCode::OK
    }

    fn stop_worker(&self) {
        self.shared.stopping.store(true, Ordering::Release);
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::warn!("simulated notification thread panicked");
            }
        }
    }
}

impl Drop for SimulatedClientLib {
    fn drop(&mut self) {
        self.shared.state.lock().notifier = None;
        self.stop_worker();
    }
}

fn run_notifier(shared: Arc<Shared>, rx: Receiver<Scheduled>, events: Arc<dyn ClientEvents>) {
    for Scheduled { at, event } in rx.iter() {
        if shared.stopping.load(Ordering::Acquire) {
            continue;
        }
        let now = Instant::now();
        if at > now {
            std::thread::sleep(at - now);
        }
        if shared.stopping.load(Ordering::Acquire) {
            continue;
        }
        match event {
            SimEvent::ServerError {
                handle,
                code,
                message,
                return_code,
            } => {
                events.on_server_error(handle, &message, code, return_code.as_deref(), "");
            }
            SimEvent::Status {
                handle,
                status,
                code,
            } => {
                if let Ok(new_status) = ConnectStatus::try_from(status) {
                    let mut state = shared.state.lock();
                    if let Some(server) = state.servers.get_mut(&handle) {
                        server.status = new_status;
                        if new_status == ConnectStatus::ConnectionEstablished {
                            server.connected_at = Some(Instant::now());
                        }
                    }
                }
                events.on_connect_status_change(handle, status, code);
            }
        }
        shared.delivered.fetch_add(1, Ordering::Relaxed);
    }
}

fn message_for(code: ReturnCode) -> String {
    if code.is_ok() {
        return "ok".into();
    }
    code.name()
        .map(|n| n.trim_start_matches("ERROR_").replace('_', " "))
        .unwrap_or_else(|| "unknown error".into())
}

fn unique_identifier(identity: &str) -> String {
    let mut hasher = DefaultHasher::new();
    identity.hash(&mut hasher);
    format!("{:016x}=", hasher.finish())
}

fn default_value(kind: VariableKind) -> Variable {
    match kind {
        VariableKind::Int => Variable::Int(0),
        VariableKind::UInt64 => Variable::UInt64(0),
        VariableKind::Double => Variable::Double(0.0),
        VariableKind::String => Variable::String(String::new()),
    }
}

fn convert(value: &Variable, kind: VariableKind) -> Result<Variable, ReturnCode> {
    if value.kind() == kind {
        return Ok(value.clone());
    }
    match (value, kind) {
        (v, VariableKind::String) => Ok(Variable::String(v.to_string())),
        (Variable::Int(i), VariableKind::UInt64) => u64::try_from(*i)
            .map(Variable::UInt64)
            .map_err(|_| ReturnCode::PARAMETER_CONVERT),
        (Variable::UInt64(u), VariableKind::Int) => i32::try_from(*u)
            .map(Variable::Int)
            .map_err(|_| ReturnCode::PARAMETER_CONVERT),
        (Variable::Int(i), VariableKind::Double) => Ok(Variable::Double(f64::from(*i))),
        (Variable::UInt64(u), VariableKind::Double) => Ok(Variable::Double(*u as f64)),
        (Variable::String(s), VariableKind::Int) => s
            .parse()
            .map(Variable::Int)
            .map_err(|_| ReturnCode::PARAMETER_CONVERT),
        (Variable::String(s), VariableKind::UInt64) => s
            .parse()
            .map(Variable::UInt64)
            .map_err(|_| ReturnCode::PARAMETER_CONVERT),
        (Variable::String(s), VariableKind::Double) => s
            .parse()
            .map(Variable::Double)
            .map_err(|_| ReturnCode::PARAMETER_CONVERT),
        _ => Err(ReturnCode::PARAMETER_CONVERT),
    }
}

fn read<K: Hash + Eq>(
    vars: &HashMap<K, Variable>,
    key: &K,
    kind: VariableKind,
) -> Result<Variable, ReturnCode> {
    match vars.get(key) {
        Some(v) => convert(v, kind),
        None => Ok(default_value(kind)),
    }
}

impl ClientLib for SimulatedClientLib {
    fn init(&self, events: Arc<dyn ClientEvents>, options: &ClientLibOptions) -> ReturnCode {
        let mut state = self.shared.state.lock();
        if let Some(code) = state.faults.fail_next_init.take() {
            return code;
        }
        if state.initialized {
            return ReturnCode::CURRENTLY_NOT_POSSIBLE;
        }

        let (tx, rx) = unbounded();
        self.shared.stopping.store(false, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("ts3-sim-events".into())
            .spawn(move || run_notifier(shared, rx, events));
        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                tracing::warn!("failed to start notification thread: {}", e);
                return ReturnCode::UNDEFINED;
            }
        };

        *self.worker.lock() = Some(worker);
        state.notifier = Some(tx);
        state.initialized = true;
        state.options = Some(options.clone());
        ReturnCode::OK
    }

    fn destroy(&self) -> ReturnCode {
        {
            let mut state = self.shared.state.lock();
            if !state.initialized {
                return ReturnCode::CLIENTLIBRARY_NOT_INITIALISED;
            }
            state.initialized = false;
            state.notifier = None;
            state.servers.clear();
        }
        self.stop_worker();
        ReturnCode::OK
    }

    fn lib_version(&self) -> Result<String, ReturnCode> {
        self.state().map(|_| VERSION.to_string())
    }

    fn lib_version_number(&self) -> Result<u64, ReturnCode> {
        self.state().map(|_| VERSION_NUMBER)
    }

    fn create_identity(&self) -> Result<String, ReturnCode> {
        self.state()?;
        let body: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(40)
            .map(char::from)
            .collect();
        Ok(format!("{}{}", IDENTITY_PREFIX, body))
    }

    fn identity_to_unique_identifier(&self, identity: &str) -> Result<String, ReturnCode> {
        self.state()?;
        if !identity.starts_with(IDENTITY_PREFIX) {
            return Err(ReturnCode::PARAMETER_INVALID);
        }
        Ok(unique_identifier(identity))
    }

    fn error_message(&self, code: ReturnCode) -> Result<String, ReturnCode> {
        self.state()?;
        match code.name() {
            Some(_) => Ok(message_for(code)),
            None => Err(ReturnCode::PARAMETER_INVALID),
        }
    }

    fn spawn_connection_handler(&self, _port: u16) -> Result<ConnectionHandle, ReturnCode> {
        let mut state = self.state()?;
        let handle = ConnectionHandle::new(state.next_handle);
        state.next_handle += 1;
        state.servers.insert(handle, SimServer::new());
        Ok(handle)
    }

    fn destroy_connection_handler(&self, handle: ConnectionHandle) -> ReturnCode {
        let mut state = match self.state() {
            Ok(state) => state,
            Err(code) => return code,
        };
        match state.servers.remove(&handle) {
            Some(_) => ReturnCode::OK,
            None => ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
        }
    }

    fn connection_status(&self, handle: ConnectionHandle) -> Result<ConnectStatus, ReturnCode> {
        self.with_server(handle, |server| Ok(server.status))
    }

    fn client_id(&self, handle: ConnectionHandle) -> Result<ClientId, ReturnCode> {
        self.with_online(handle, |_| Ok(OWN_CLIENT))
    }

    fn client_list(&self, handle: ConnectionHandle) -> Result<Vec<ClientId>, ReturnCode> {
        self.with_online(handle, |server| Ok(server.clients.keys().copied().collect()))
    }

    fn channel_of_client(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
    ) -> Result<ChannelId, ReturnCode> {
        self.with_online(handle, |server| server.client(client).map(|c| c.channel))
    }

    fn channel_list(&self, handle: ConnectionHandle) -> Result<Vec<ChannelId>, ReturnCode> {
        self.with_online(handle, |server| Ok(server.channels.keys().copied().collect()))
    }

    fn channel_client_list(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<Vec<ClientId>, ReturnCode> {
        self.with_online(handle, |server| {
            server.channel(channel)?;
            Ok(server
                .clients
                .iter()
                .filter(|(_, c)| c.channel == channel)
                .map(|(id, _)| *id)
                .collect())
        })
    }

    fn parent_channel(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<ChannelId, ReturnCode> {
        self.with_online(handle, |server| server.channel(channel).map(|c| c.parent))
    }

    fn channel_empty_secs(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
    ) -> Result<i32, ReturnCode> {
        self.with_online(handle, |server| {
            server.channel(channel)?;
            if server.occupied(channel) {
                return Ok(0);
            }
            let secs = server
                .connected_at
                .map(|t| t.elapsed().as_secs())
                .unwrap_or(0);
            Ok(i32::try_from(secs).unwrap_or(i32::MAX))
        })
    }

    fn client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| read(&server.self_vars, &property, kind))
    }

    fn client_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ClientProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| {
            let c = server.client(client)?;
            if client == OWN_CLIENT {
                return read(&server.self_vars, &property, kind);
            }
            match property {
                ClientProperty::Nickname => convert(&Variable::from(c.nickname.as_str()), kind),
                _ => Ok(default_value(kind)),
            }
        })
    }

    fn channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| {
            let c = server.channel(channel)?;
            match property {
                ChannelProperty::Order => convert(&Variable::UInt64(c.order.raw()), kind),
                _ => read(&c.vars, &property, kind),
            }
        })
    }

    fn server_variable(
        &self,
        handle: ConnectionHandle,
        property: VirtualServerProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| {
            let value = match property {
                VirtualServerProperty::Name => Variable::from("Simulated Server"),
                VirtualServerProperty::WelcomeMessage => Variable::from("Welcome to the simulator"),
                VirtualServerProperty::Platform => Variable::from("Linux"),
                VirtualServerProperty::Version => Variable::from(VERSION),
                VirtualServerProperty::MaxClients => Variable::Int(32),
                VirtualServerProperty::ClientsOnline => Variable::Int(server.clients.len() as i32),
                VirtualServerProperty::ChannelsOnline => {
                    Variable::Int(server.channels.len() as i32)
                }
                VirtualServerProperty::Uptime => Variable::UInt64(
                    server
                        .connected_at
                        .map(|t| t.elapsed().as_secs())
                        .unwrap_or(0),
                ),
                VirtualServerProperty::UniqueIdentifier => {
                    Variable::from(unique_identifier(&server.address))
                }
                _ => default_value(kind),
            };
            convert(&value, kind)
        })
    }

    fn connection_variable(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| {
            server.client(client)?;
            connection_value(server, property, kind)
        })
    }

    fn server_connection_variable(
        &self,
        handle: ConnectionHandle,
        property: ConnectionProperty,
        kind: VariableKind,
    ) -> Result<Variable, ReturnCode> {
        self.with_online(handle, |server| connection_value(server, property, kind))
    }

    fn set_client_self_variable(
        &self,
        handle: ConnectionHandle,
        property: ClientProperty,
        value: &Variable,
    ) -> ReturnCode {
        self.with_online_mut(handle, |server| {
            server.staged_self.insert(property, value.clone());
            ReturnCode::OK
        })
    }

    fn set_channel_variable(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        property: ChannelProperty,
        value: &Variable,
    ) -> ReturnCode {
        self.with_online_mut(handle, |server| {
            if channel != ChannelId::ROOT && !server.channels.contains_key(&channel) {
                return ReturnCode::CHANNEL_INVALID_ID;
            }
            server
                .staged_channels
                .entry(channel)
                .or_default()
                .insert(property, value.clone());
            ReturnCode::OK
        })
    }

    fn clean_up_connection_info(&self, handle: ConnectionHandle, client: ClientId) -> ReturnCode {
        match self.with_online(handle, |server| server.client(client).map(|_| ())) {
            Ok(()) => ReturnCode::OK,
            Err(code) => code,
        }
    }

    fn request_server_variables(&self, handle: ConnectionHandle) -> ReturnCode {
        self.with_online_mut(handle, |_| ReturnCode::OK)
    }

    fn send_private_text(
        &self,
        handle: ConnectionHandle,
        message: &str,
        target: ClientId,
    ) -> ReturnCode {
        self.send_text(handle, message, TextTarget::Client(target))
    }

    fn send_channel_text(
        &self,
        handle: ConnectionHandle,
        message: &str,
        target: ChannelId,
    ) -> ReturnCode {
        self.send_text(handle, message, TextTarget::Channel(target))
    }

    fn send_server_text(&self, handle: ConnectionHandle, message: &str) -> ReturnCode {
        self.send_text(handle, message, TextTarget::Server)
    }

    fn request_client_move(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        channel: ChannelId,
        password: &str,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            let target = match server.channel(channel) {
                Ok(target) => target,
                Err(code) => return Reply::Async(code),
            };
            let target_password = target.password().to_owned();
            match server.clients.get_mut(&client) {
                None => Reply::Async(ReturnCode::CLIENT_INVALID_ID),
                Some(c) if c.channel == channel => Reply::Async(ReturnCode::CHANNEL_ALREADY_IN),
                Some(_) if !target_password.is_empty() && target_password != password => {
                    Reply::Async(ReturnCode::CHANNEL_INVALID_PASSWORD)
                }
                Some(c) => {
                    c.channel = channel;
                    Reply::Async(ReturnCode::OK)
                }
            }
        })
    }

    fn request_client_variables(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            Reply::Async(match server.client(client) {
                Ok(_) => ReturnCode::OK,
                Err(code) => code,
            })
        })
    }

    fn request_client_kick_from_channel(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        _reason: &str,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            match server.clients.get_mut(&client) {
                None => Reply::Async(ReturnCode::CLIENT_INVALID_ID),
                Some(c) if c.channel == DEFAULT_CHANNEL => {
                    Reply::Async(ReturnCode::CHANNEL_ALREADY_IN)
                }
                Some(c) => {
                    c.channel = DEFAULT_CHANNEL;
                    Reply::Async(ReturnCode::OK)
                }
            }
        })
    }

    fn request_client_kick_from_server(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        _reason: &str,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            if client == OWN_CLIENT {
                return Reply::Async(ReturnCode::PARAMETER_INVALID);
            }
            match server.clients.remove(&client) {
                Some(_) => Reply::Async(ReturnCode::OK),
                None => Reply::Async(ReturnCode::CLIENT_INVALID_ID),
            }
        })
    }

    fn request_channel_delete(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        force: bool,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            if let Err(code) = server.channel(channel) {
                return Reply::Async(code);
            }
            if channel == DEFAULT_CHANNEL {
                return Reply::Async(ReturnCode::CHANNEL_CAN_NOT_DELETE_DEFAULT);
            }
            let doomed = server.subtree(channel);
            let occupied = doomed.iter().any(|c| server.occupied(*c));
            if occupied && !force {
                return Reply::Async(ReturnCode::CHANNEL_NOT_EMPTY);
            }
            for client in server.clients.values_mut() {
                if doomed.contains(&client.channel) {
                    client.channel = DEFAULT_CHANNEL;
                }
            }
            for c in doomed {
                server.channels.remove(&c);
                server.staged_channels.remove(&c);
            }
            Reply::Async(ReturnCode::OK)
        })
    }

    fn request_channel_move(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        new_parent: ChannelId,
        new_order: ChannelId,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            if server.channel(channel).is_err() {
                return Reply::Async(ReturnCode::CHANNEL_INVALID_ID);
            }
            if new_parent != ChannelId::ROOT && server.channel(new_parent).is_err() {
                return Reply::Async(ReturnCode::CHANNEL_INVALID_ID);
            }
            if new_parent == channel || server.is_descendant(new_parent, channel) {
                return Reply::Async(ReturnCode::PARAMETER_INVALID);
            }
            let name = server
                .channel(channel)
                .ok()
                .and_then(|c| c.name().map(str::to_owned));
            if let Some(name) = name {
                if server.sibling_named(new_parent, &name, channel) {
                    return Reply::Async(ReturnCode::CHANNEL_NAME_INUSE);
                }
            }
            if let Some(c) = server.channels.get_mut(&channel) {
                c.parent = new_parent;
                c.order = new_order;
            }
            Reply::Async(ReturnCode::OK)
        })
    }

    fn request_connection_info(
        &self,
        handle: ConnectionHandle,
        client: ClientId,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            Reply::Async(match server.client(client) {
                Ok(_) => ReturnCode::OK,
                Err(code) => code,
            })
        })
    }

    fn request_server_connection_info(
        &self,
        handle: ConnectionHandle,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |_| Reply::Async(ReturnCode::OK))
    }

    fn request_channel_subscribe_all(
        &self,
        handle: ConnectionHandle,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            server.subscribed_all = true;
            Reply::Async(ReturnCode::OK)
        })
    }

    fn request_channel_unsubscribe_all(
        &self,
        handle: ConnectionHandle,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            server.subscribed_all = false;
            Reply::Async(ReturnCode::OK)
        })
    }

    fn flush_client_self_updates(&self, handle: ConnectionHandle, return_code: &str) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            if server.staged_self.is_empty() {
                return Reply::Sync(ReturnCode::OK_NO_UPDATE);
            }
            let staged: Vec<_> = server.staged_self.drain().collect();
            for (property, value) in staged {
                if property == ClientProperty::Nickname {
                    if let (Some(name), Some(own)) =
                        (value.as_str(), server.clients.get_mut(&OWN_CLIENT))
                    {
                        own.nickname = name.to_owned();
                    }
                }
                server.self_vars.insert(property, value);
            }
            Reply::Async(ReturnCode::OK)
        })
    }

    fn flush_channel_updates(
        &self,
        handle: ConnectionHandle,
        channel: ChannelId,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            let Some(staged) = server.staged_channels.remove(&channel) else {
                return Reply::Sync(ReturnCode::OK_NO_UPDATE);
            };
            let parent = match server.channel(channel) {
                Ok(c) => c.parent,
                Err(code) => return Reply::Async(code),
            };
            if let Some(name) = staged.get(&ChannelProperty::Name).and_then(Variable::as_str) {
                if server.sibling_named(parent, name, channel) {
                    return Reply::Async(ReturnCode::CHANNEL_NAME_INUSE);
                }
            }
            if let Some(c) = server.channels.get_mut(&channel) {
                c.vars.extend(staged);
            }
            Reply::Async(ReturnCode::OK)
        })
    }

    fn flush_channel_creation(
        &self,
        handle: ConnectionHandle,
        parent: ChannelId,
        return_code: &str,
    ) -> ReturnCode {
        self.correlated(handle, return_code, |server| {
            let Some(staged) = server.staged_channels.remove(&ChannelId::ROOT) else {
                return Reply::Sync(ReturnCode::OK_NO_UPDATE);
            };
            if parent != ChannelId::ROOT && server.channel(parent).is_err() {
                return Reply::Async(ReturnCode::CHANNEL_INVALID_ID);
            }
            let Some(name) = staged
                .get(&ChannelProperty::Name)
                .and_then(Variable::as_str)
                .map(str::to_owned)
            else {
                return Reply::Async(ReturnCode::PARAMETER_MISSING);
            };
            if server.sibling_named(parent, &name, ChannelId::ROOT) {
                return Reply::Async(ReturnCode::CHANNEL_NAME_INUSE);
            }
            let id = ChannelId::new(server.next_channel);
            server.next_channel += 1;
            let mut channel = SimChannel::new(parent, &name);
            channel.vars.extend(staged);
            server.channels.insert(id, channel);
            Reply::Async(ReturnCode::OK)
        })
    }

    fn start_connection(&self, handle: ConnectionHandle, params: &ConnectParams) -> ReturnCode {
        let mut state = match self.state() {
            Ok(state) => state,
            Err(code) => return code,
        };
        if let Some(code) = state.faults.reject_next.take() {
            return code;
        }
        if params.address.is_empty() || params.nickname.is_empty() {
            return ReturnCode::PARAMETER_INVALID;
        }

        let failure = match state.faults.fail_next_connect.take() {
            Some(code) => Some(code),
            None => match &state.server_password {
                Some(pw) if *pw != params.server_password => {
                    Some(ReturnCode::SERVER_INVALID_PASSWORD)
                }
                _ => None,
            },
        };
        let bare_disconnect = std::mem::take(&mut state.faults.bare_disconnect_next_connect);

        match state.servers.get_mut(&handle) {
            None => return ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
            Some(server) if server.status != ConnectStatus::Disconnected => {
                return ReturnCode::CURRENTLY_NOT_POSSIBLE
            }
            Some(server) => server.populate(params),
        }

        let status = |s: ConnectStatus, code: ReturnCode| SimEvent::Status {
            handle,
            status: s.as_raw(),
            code,
        };
        let mut events = vec![status(ConnectStatus::Connecting, ReturnCode::OK)];
        if let Some(code) = failure {
            events.push(SimEvent::ServerError {
                handle,
                code,
                message: message_for(code),
                return_code: None,
            });
            events.push(status(ConnectStatus::Disconnected, code));
        } else if bare_disconnect {
            events.push(status(ConnectStatus::Disconnected, ReturnCode::OK));
        } else {
            events.push(status(ConnectStatus::Connected, ReturnCode::OK));
            events.push(status(ConnectStatus::ConnectionEstablishing, ReturnCode::OK));
            events.push(status(ConnectStatus::ConnectionEstablished, ReturnCode::OK));
        }
        for event in events {
            self.emit(&mut state, event);
        }
        ReturnCode::OK
    }

    fn stop_connection(&self, handle: ConnectionHandle, _quit_message: &str) -> ReturnCode {
        let mut state = match self.state() {
            Ok(state) => state,
            Err(code) => return code,
        };
        if let Some(code) = state.faults.reject_next.take() {
            return code;
        }
        match state.servers.get(&handle) {
            None => return ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
            Some(server) if server.status == ConnectStatus::Disconnected => {
                return ReturnCode::NOT_CONNECTED
            }
            Some(_) => {}
        }
        self.emit(
            &mut state,
            SimEvent::Status {
                handle,
                status: ConnectStatus::Disconnected.as_raw(),
                code: ReturnCode::OK,
            },
        );
        ReturnCode::OK
    }
}

impl SimulatedClientLib {
    fn send_text(&self, handle: ConnectionHandle, message: &str, target: TextTarget) -> ReturnCode {
        let mut state = match self.state() {
            Ok(state) => state,
            Err(code) => return code,
        };
        let check = match state.servers.get(&handle) {
            None => ReturnCode::INVALID_SERVER_CONNECTION_HANDLER_ID,
            Some(server) if server.status != ConnectStatus::ConnectionEstablished => {
                ReturnCode::NOT_CONNECTED
            }
            Some(_) if message.is_empty() => ReturnCode::PARAMETER_INVALID,
            Some(server) => match &target {
                TextTarget::Client(c) => server.client(*c).err().unwrap_or(ReturnCode::OK),
                TextTarget::Channel(c) => server.channel(*c).err().unwrap_or(ReturnCode::OK),
                TextTarget::Server => ReturnCode::OK,
            },
        };
        if check.is_ok() {
            state.sent.push(SentText {
                handle,
                target,
                message: message.to_owned(),
            });
        }
        check
    }
}

fn connection_value(
    server: &SimServer,
    property: ConnectionProperty,
    kind: VariableKind,
) -> Result<Variable, ReturnCode> {
    let value = match property {
        ConnectionProperty::Ping => Variable::UInt64(12),
        ConnectionProperty::PingDeviation => Variable::Double(0.5),
        ConnectionProperty::ConnectedTime => Variable::UInt64(
            server
                .connected_at
                .map(|t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX))
                .unwrap_or(0),
        ),
        ConnectionProperty::ServerIp => Variable::from(server.address.as_str()),
        ConnectionProperty::ServerPort => Variable::UInt64(u64::from(server.port)),
        ConnectionProperty::ClientIp => Variable::from("127.0.0.1"),
        _ => default_value(kind),
    };
    convert(&value, kind)
}
