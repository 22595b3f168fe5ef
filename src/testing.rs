//! In-process fakes shared by the unit tests

use crate::device::{DeviceInfoSource, DeviceSnapshot, ScreenInfo};
use crate::error::{ProviderError, SessionError};
use crate::node::{KeyValueStore, NodeRegistrar, RegistrationReceipt};
use crate::session::{HeartbeatReport, Notice, SessionEvents, SessionView};
use crate::wallet::{WalletProvider, WalletSnapshot};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct WalletState {
    account: String,
    chain_id: String,
    snapshot: WalletSnapshot,
    balance: String,
    connect_error: Option<ProviderError>,
    terminate_error: Option<ProviderError>,
    method_errors: HashMap<String, ProviderError>,
    connect_delay: Option<Duration>,
    method_delays: HashMap<String, Duration>,
    requests: Vec<(String, Vec<Value>)>,
    connect_calls: usize,
    terminate_calls: usize,
}

/// Scriptable wallet capability; clones share state
#[derive(Debug, Clone)]
pub struct FakeWallet {
    state: Arc<Mutex<WalletState>>,
}

impl FakeWallet {
    pub fn new(account: &str, chain_id: &str) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState {
                account: account.to_string(),
                chain_id: chain_id.to_string(),
                snapshot: WalletSnapshot::disconnected(),
                balance: "0x0".to_string(),
                connect_error: None,
                terminate_error: None,
                method_errors: HashMap::new(),
                connect_delay: None,
                method_delays: HashMap::new(),
                requests: Vec::new(),
                connect_calls: 0,
                terminate_calls: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, WalletState> {
        self.state.lock().unwrap()
    }

    pub fn fail_connect(&self, error: ProviderError) {
        self.state().connect_error = Some(error);
    }

    pub fn fail_terminate(&self, error: ProviderError) {
        self.state().terminate_error = Some(error);
    }

    pub fn fail_method(&self, method: &str, error: ProviderError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.connect_error = None;
        state.terminate_error = None;
        state.method_errors.clear();
    }

    /// Account the wallet reports after a permission re-request
    pub fn set_switch_account(&self, account: &str) {
        self.state().account = account.to_string();
    }

    /// Hex quantity returned by `eth_getBalance`
    pub fn set_balance(&self, quantity: &str) {
        self.state().balance = quantity.to_string();
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        self.state().connect_delay = Some(delay);
    }

    /// Hold answers to `method` back for `delay`
    pub fn set_request_delay(&self, method: &str, delay: Duration) {
        self.state().method_delays.insert(method.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
        self.state().requests.clone()
    }

    pub fn balance_queries(&self) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|(method, _)| method == "eth_getBalance")
            .count()
    }

    pub fn connect_calls(&self) -> usize {
        self.state().connect_calls
    }

    pub fn terminate_calls(&self) -> usize {
        self.state().terminate_calls
    }
}

impl WalletProvider for FakeWallet {
    async fn connect(&self) -> Result<WalletSnapshot, ProviderError> {
        let delay = {
            let mut state = self.state();
            state.connect_calls += 1;
            state.snapshot.connecting = true;
            state.connect_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(error) = state.connect_error.clone() {
            state.snapshot = WalletSnapshot::disconnected();
            return Err(error);
        }
        state.snapshot = WalletSnapshot::connected(state.account.clone(), state.chain_id.clone());
        Ok(state.snapshot.clone())
    }

    async fn terminate(&self) -> Result<(), ProviderError> {
        let mut state = self.state();
        state.terminate_calls += 1;
        if let Some(error) = state.terminate_error.clone() {
            return Err(error);
        }
        state.snapshot = WalletSnapshot::disconnected();
        Ok(())
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        let delay = {
            let mut state = self.state();
            state.requests.push((method.to_string(), params));
            state.method_delays.get(method).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        match method {
            "wallet_requestPermissions" => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            "eth_accounts" => {
                let account = state.account.clone();
                if state.snapshot.connected {
                    state.snapshot.account = Some(account.clone());
                }
                Ok(json!([account]))
            }
            "eth_chainId" => Ok(json!(state.chain_id)),
            "eth_getBalance" => Ok(json!(state.balance)),
            other => Err(ProviderError::new(
                Some(4200),
                format!("Unsupported method: {}", other),
            )),
        }
    }

    fn snapshot(&self) -> WalletSnapshot {
        self.state().snapshot.clone()
    }
}

#[derive(Debug, Default)]
struct RegistrarState {
    calls: Vec<(String, u64)>,
    completed: usize,
    failure: Option<SessionError>,
    delay: Option<Duration>,
}

/// Registrar that records calls; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeRegistrar {
    state: Arc<Mutex<RegistrarState>>,
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistrarState> {
        self.state.lock().unwrap()
    }

    pub fn fail_with(&self, error: SessionError) {
        self.state().failure = Some(error);
    }

    pub fn succeed(&self) {
        self.state().failure = None;
    }

    /// Hold every call for `delay` before answering
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// (address, timestamp) of every call started
    pub fn calls(&self) -> Vec<(String, u64)> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn completed(&self) -> usize {
        self.state().completed
    }
}

impl NodeRegistrar for FakeRegistrar {
    async fn register(
        &self,
        address: &str,
        _device: &DeviceSnapshot,
        timestamp: u64,
    ) -> Result<RegistrationReceipt, SessionError> {
        let delay = {
            let mut state = self.state();
            state.calls.push((address.to_string(), timestamp));
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.completed += 1;
        match state.failure.clone() {
            Some(error) => Err(error),
            None => Ok(RegistrationReceipt {
                status: 200,
                body: Some(json!({ "ok": true })),
            }),
        }
    }
}

/// Device source that counts how often it is sampled
#[derive(Debug, Clone, Default)]
pub struct FakeDevices {
    samples: Arc<AtomicUsize>,
}

impl FakeDevices {
    pub fn samples(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

impl DeviceInfoSource for FakeDevices {
    async fn snapshot(&self) -> DeviceSnapshot {
        self.samples.fetch_add(1, Ordering::SeqCst);
        DeviceSnapshot::minimal(&ScreenInfo::default())
    }
}

/// Store whose every operation fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::Persistence("storage unavailable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Err(SessionError::Persistence("storage unavailable".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::Persistence("storage unavailable".to_string()))
    }
}

/// Event sink that keeps everything it receives
#[derive(Debug, Default)]
pub struct RecordingEvents {
    views: Mutex<Vec<SessionView>>,
    notices: Mutex<Vec<Notice>>,
    heartbeats: Mutex<Vec<HeartbeatReport>>,
}

impl RecordingEvents {
    pub fn views(&self) -> Vec<SessionView> {
        self.views.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn heartbeats(&self) -> Vec<HeartbeatReport> {
        self.heartbeats.lock().unwrap().clone()
    }
}

impl SessionEvents for RecordingEvents {
    fn on_state_changed(&self, view: &SessionView) {
        self.views.lock().unwrap().push(view.clone());
    }

    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn on_heartbeat(&self, report: &HeartbeatReport) {
        self.heartbeats.lock().unwrap().push(report.clone());
    }
}

/// Serve a single HTTP response on a local port.
///
/// Returns the base url and a handle resolving to the raw request text.
pub async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    serve_raw(format!(
        "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    ))
    .await
}

/// Like `serve_once`, but writes `response` to the socket as is
pub async fn serve_raw(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);

            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + content_length {
                    break;
                }
            }
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        String::from_utf8_lossy(&request).to_string()
    });

    (format!("http://{}", addr), handle)
}
