//! Local HTTP server for the dashboard page.
//!
//! A hand-rolled HTTP/1.1 loop on a tokio `TcpListener`: one request per
//! connection, `Connection: close`, except `/events` which stays open as a
//! server-sent-event stream. The session sits behind a mutex; every action
//! and every trial tick takes the lock, applies one transition and releases
//! it, then wakes the event streams so each re-renders for its own host.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, Weak};

use colored::*;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::checkout::{CheckoutGateway, CheckoutRedirect, Plan};
use crate::config::ServerConfig;
use crate::entitlement::TickOutcome;
use crate::error::DashboardError;
use crate::onboarding::{FlagStore, ONBOARDING_FLAG};
use crate::session::{Action, DashboardSession, DashboardView, Effect, Transition};
use crate::trial::{TrialTimer, TICK_PERIOD};

/// Largest request (headers plus body) the server will buffer.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Everything the connection handlers share.
pub struct AppState {
    session: Mutex<DashboardSession>,
    flags: Mutex<Box<dyn FlagStore>>,
    checkout: CheckoutGateway,
    timer: Mutex<Option<TrialTimer>>,
    updates: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        session: DashboardSession,
        flags: Box<dyn FlagStore>,
        checkout: CheckoutGateway,
    ) -> Arc<Self> {
        let (updates, _) = broadcast::channel(64);
        Arc::new(Self {
            session: Mutex::new(session),
            flags: Mutex::new(flags),
            checkout,
            timer: Mutex::new(None),
            updates,
        })
    }

    /// Render the current session for `host`.
    pub fn view(&self, host: &str) -> Result<DashboardView, DashboardError> {
        let session = self.session.lock().map_err(|_| DashboardError::Poisoned)?;
        Ok(session.view(host))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.updates.subscribe()
    }

    pub fn onboarding_completed(&self) -> Result<bool, DashboardError> {
        let flags = self.flags.lock().map_err(|_| DashboardError::Poisoned)?;
        flags.get(ONBOARDING_FLAG)
    }

    pub fn trial_timer_running(&self) -> bool {
        self.timer
            .lock()
            .map(|t| t.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }

    fn notify(&self) {
        // No subscribers is fine.
        let _ = self.updates.send(());
    }
}

/// Apply one action and carry out its effects.
pub fn dispatch(state: &Arc<AppState>, action: Action) -> Result<(), DashboardError> {
    let transition = {
        let mut session = state.session.lock().map_err(|_| DashboardError::Poisoned)?;
        session.apply(action)
    };
    finish(state, transition)
}

fn finish(state: &Arc<AppState>, transition: Transition) -> Result<(), DashboardError> {
    for effect in transition.effects {
        run_effect(state, effect)?;
    }
    if transition.changed {
        state.notify();
    }
    Ok(())
}

fn run_effect(state: &Arc<AppState>, effect: Effect) -> Result<(), DashboardError> {
    match effect {
        Effect::PersistOnboarding => {
            let mut flags = state.flags.lock().map_err(|_| DashboardError::Poisoned)?;
            if let Err(e) = flags.set(ONBOARDING_FLAG, true) {
                tracing::warn!(error = %e, "could not persist onboarding flag");
            }
        }
        Effect::StartTrialTimer => {
            let timer = spawn_trial_timer(Arc::downgrade(state));
            let mut slot = state.timer.lock().map_err(|_| DashboardError::Poisoned)?;
            *slot = Some(timer);
        }
        Effect::StopTrialTimer => {
            let mut slot = state.timer.lock().map_err(|_| DashboardError::Poisoned)?;
            if let Some(timer) = slot.take() {
                timer.stop();
                tracing::debug!("trial timer stopped");
            }
        }
    }
    Ok(())
}

fn spawn_trial_timer(state: Weak<AppState>) -> TrialTimer {
    TrialTimer::spawn(TICK_PERIOD, move || {
        let Some(state) = state.upgrade() else {
            return ControlFlow::Break(());
        };
        let outcome = match state.session.lock() {
            Ok(mut session) => session.tick(),
            Err(_) => return ControlFlow::Break(()),
        };
        if outcome != TickOutcome::Idle {
            state.notify();
        }
        match outcome {
            TickOutcome::Counting(_) => ControlFlow::Continue(()),
            TickOutcome::Expired | TickOutcome::Idle => ControlFlow::Break(()),
        }
    })
}

#[derive(Debug, Deserialize)]
struct CheckoutRequest {
    plan: Plan,
}

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<CheckoutRedirect>,
    view: DashboardView,
}

/// Ask the checkout backend for a session and feed the result back into the
/// dashboard. Checkout failures are not errors here: they become a notice.
///
/// Only a gateway that confirms instantly upgrades here. Any other redirect
/// leaves the checkout pending until [`complete_checkout`] confirms payment.
pub async fn checkout(
    state: &Arc<AppState>,
    plan: Plan,
) -> Result<Option<CheckoutRedirect>, DashboardError> {
    tracing::info!(plan = %plan, "checkout requested");
    let result = state.checkout.create_session(plan).await;
    let (transition, redirect) = {
        let mut session = state.session.lock().map_err(|_| DashboardError::Poisoned)?;
        match result {
            Ok(redirect) if state.checkout.confirms_instantly() => {
                (session.checkout_succeeded(plan), Some(redirect))
            }
            Ok(redirect) => (session.checkout_started(plan, &redirect), Some(redirect)),
            Err(e) => (session.checkout_failed(plan, &e), None),
        }
    };
    finish(state, transition)?;
    Ok(redirect)
}

/// The viewer came back from the payment page for `session_id`. Asks the
/// backend whether it was paid and upgrades only if so. Returns whether the
/// session is premium afterwards.
pub async fn complete_checkout(state: &Arc<AppState>, session_id: &str) -> Result<bool, DashboardError> {
    let pending = {
        let session = state.session.lock().map_err(|_| DashboardError::Poisoned)?;
        session
            .pending_checkout()
            .filter(|p| p.session_id == session_id)
            .cloned()
    };
    let Some(pending) = pending else {
        tracing::warn!(session = session_id, "no pending checkout for returned session");
        return Ok(false);
    };

    let result = state.checkout.confirm(session_id).await;
    let (transition, paid) = {
        let mut session = state.session.lock().map_err(|_| DashboardError::Poisoned)?;
        match result {
            Ok(true) => (session.checkout_confirmed(session_id), true),
            Ok(false) => (session.checkout_unpaid(pending.plan), false),
            Err(e) => (session.checkout_failed(pending.plan, &e), false),
        }
    };
    finish(state, transition)?;
    Ok(paid)
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Percent-decoding for URL query parameters.
pub fn url_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        match b {
            b'+' => bytes.push(b' '),
            b'%' => {
                let hex: Vec<u8> = iter.by_ref().take(2).collect();
                let decoded = std::str::from_utf8(&hex)
                    .ok()
                    .filter(|h| h.len() == 2)
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = decoded {
                    bytes.push(byte);
                }
            }
            _ => bytes.push(b),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse query string into key-value pairs.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((url_decode(key), url_decode(val)))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    /// `Host` header, if any.
    pub host: String,
    pub body: Vec<u8>,
}

impl Request {
    /// Host the page is embedded under: `?host=` wins over the header.
    pub fn embed_host(&self) -> &str {
        self.query
            .get("host")
            .map(String::as_str)
            .filter(|h| !h.is_empty())
            .unwrap_or(self.host.as_str())
    }
}

/// Parse a buffered request. `Ok(None)` means more bytes are needed.
pub fn parse_request(buf: &[u8]) -> Result<Option<Request>, DashboardError> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut req = httparse::Request::new(&mut headers);
    let header_len = match req.parse(buf) {
        Ok(httparse::Status::Complete(n)) => n,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(DashboardError::BadRequest(e.to_string())),
    };

    let mut host = String::new();
    let mut content_length = 0usize;
    for h in req.headers.iter() {
        if h.name.eq_ignore_ascii_case("host") {
            host = String::from_utf8_lossy(h.value).trim().to_string();
        } else if h.name.eq_ignore_ascii_case("content-length") {
            content_length = std::str::from_utf8(h.value)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| DashboardError::BadRequest("invalid Content-Length".into()))?;
        }
    }

    if header_len + content_length > MAX_REQUEST_BYTES {
        return Err(DashboardError::BadRequest("request too large".into()));
    }
    if buf.len() < header_len + content_length {
        return Ok(None);
    }

    let target = req.path.unwrap_or("/");
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, q),
        None => (target, ""),
    };
    Ok(Some(Request {
        method: req.method.unwrap_or("GET").to_string(),
        path: path.to_string(),
        query: parse_query(query),
        host,
        body: buf[header_len..header_len + content_length].to_vec(),
    }))
}

async fn read_request(stream: &mut TcpStream) -> Result<Option<Request>, DashboardError> {
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| DashboardError::io("socket", e))?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(req) = parse_request(&buf)? {
            return Ok(Some(req));
        }
        if buf.len() > MAX_REQUEST_BYTES {
            return Err(DashboardError::BadRequest("request too large".into()));
        }
    }
}

// ---------------------------------------------------------------------------
// Responses and routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn html(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    fn from_error(err: &DashboardError) -> Self {
        Self::error(err.status(), &err.to_string())
    }

    pub fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason(self.status),
            self.content_type,
            self.body.len(),
            self.body,
        )
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Internal Server Error",
    }
}

/// Answer every request except the `/events` stream.
pub async fn route(state: &Arc<AppState>, req: &Request) -> Response {
    match handle(state, req).await {
        Ok(resp) => resp,
        Err(e) => {
            if e.status() >= 500 {
                tracing::warn!(path = %req.path, error = %e, "request failed");
            } else {
                tracing::debug!(path = %req.path, error = %e, "rejected request");
            }
            Response::from_error(&e)
        }
    }
}

async fn handle(state: &Arc<AppState>, req: &Request) -> Result<Response, DashboardError> {
    let host = req.embed_host();
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => Ok(Response::html(INDEX_HTML)),
        ("GET", "/api/state") => Ok(Response::json(200, &state.view(host)?)),
        ("POST", "/api/action") => {
            let action: Action = serde_json::from_slice(&req.body)?;
            tracing::debug!(?action, "action");
            dispatch(state, action)?;
            Ok(Response::json(200, &state.view(host)?))
        }
        ("POST", "/api/checkout") => {
            let body: CheckoutRequest = serde_json::from_slice(&req.body)?;
            let redirect = checkout(state, body.plan).await?;
            Ok(Response::json(
                200,
                &CheckoutResponse {
                    ok: redirect.is_some(),
                    redirect,
                    view: state.view(host)?,
                },
            ))
        }
        ("GET", "/api/checkout/complete") => {
            let session_id = req
                .query
                .get("session_id")
                .filter(|id| !id.is_empty())
                .ok_or_else(|| DashboardError::BadRequest("missing session_id".to_string()))?;
            complete_checkout(state, session_id).await?;
            Ok(Response::html(INDEX_HTML))
        }
        (
            _,
            "/" | "/api/state" | "/api/action" | "/api/checkout" | "/api/checkout/complete" | "/events",
        ) => {
            Ok(Response::error(405, "method not allowed"))
        }
        _ => Ok(Response::error(404, "not found")),
    }
}

/// Server-sent events: the current view now, then one per change.
async fn stream_events(
    stream: &mut TcpStream,
    state: &Arc<AppState>,
    host: &str,
) -> Result<(), DashboardError> {
    let io = |e| DashboardError::io("socket", e);
    let headers = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: keep-alive\r\n\r\n";
    stream.write_all(headers.as_bytes()).await.map_err(io)?;

    let mut updates = BroadcastStream::new(state.subscribe());
    loop {
        let json = serde_json::to_string(&state.view(host)?)?;
        if stream
            .write_all(format!("data: {}\n\n", json).as_bytes())
            .await
            .is_err()
        {
            tracing::debug!("event stream closed by client");
            return Ok(());
        }
        // A lagged receiver still re-renders: the view is a full snapshot.
        if updates.next().await.is_none() {
            return Ok(());
        }
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) -> Result<(), DashboardError> {
    let req = match read_request(&mut stream).await {
        Ok(Some(req)) => req,
        Ok(None) => return Ok(()),
        Err(e) => {
            let resp = Response::from_error(&e);
            let _ = stream.write_all(resp.to_http().as_bytes()).await;
            return Err(e);
        }
    };

    if req.method == "GET" && req.path == "/events" {
        let host = req.embed_host().to_string();
        return stream_events(&mut stream, &state, &host).await;
    }

    let resp = route(&state, &req).await;
    stream
        .write_all(resp.to_http().as_bytes())
        .await
        .map_err(|e| DashboardError::io("socket", e))
}

/// Accept connections on `listener` until the task is cancelled.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> Result<(), DashboardError> {
    loop {
        let (stream, addr) = listener
            .accept()
            .await
            .map_err(|e| DashboardError::io("listener", e))?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                tracing::debug!(%addr, error = %e, "connection error");
            }
        });
    }
}

fn open_browser(url: &str) {
    #[cfg(target_os = "windows")]
    {
        let _ = std::process::Command::new("cmd")
            .args(["/C", &format!("start {}", url)])
            .spawn();
    }
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
}

/// Bind, announce and serve the dashboard.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    let url = format!("http://localhost:{}", addr.port());

    eprintln!("{}", format!("  Dashboard running at {}", url).bright_green());
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());
    tracing::info!(%addr, "dashboard server listening");

    if config.open_browser {
        open_browser(&url);
    }

    run(listener, state).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// Embedded single-page dashboard. All state lives on the server; the page
/// posts actions and re-renders from the returned view.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>MultiStream Watch</title>
<style>
:root{--accent:#9333ea;--bg:#f4f4f5;--fg:#18181b;--panel:#fff;--line:#d4d4d8}
body.dark{--bg:#09090b;--fg:#e4e4e7;--panel:#18181b;--line:#3f3f46}
*{box-sizing:border-box}
body{margin:0;font:14px system-ui,sans-serif;background:var(--bg);color:var(--fg)}
header{display:flex;flex-wrap:wrap;gap:8px;align-items:center;padding:10px 16px;background:var(--panel);border-bottom:1px solid var(--line)}
header h1{font-size:18px;margin:0 12px 0 0;color:var(--accent)}
button,select,input{font:inherit;padding:5px 9px;border:1px solid var(--line);border-radius:6px;background:var(--panel);color:var(--fg)}
button{cursor:pointer}
button.primary{background:var(--accent);border-color:var(--accent);color:#fff}
button:disabled{opacity:.45;cursor:not-allowed}
.badge{padding:3px 8px;border-radius:999px;background:var(--accent);color:#fff;font-size:12px;text-transform:uppercase}
.badge.free{background:#71717a}
#countdown{font-variant-numeric:tabular-nums}
#notice{display:none;white-space:pre-wrap;margin:10px 16px;padding:10px 14px;border-left:4px solid var(--accent);background:var(--panel)}
main{display:flex;gap:16px;padding:16px}
#board{flex:1;min-height:70vh;position:relative;overflow:auto}
#board.grid{display:grid;grid-template-columns:repeat(3,1fr);gap:16px;align-content:start}
#board.top-bottom{display:flex;flex-direction:column;gap:16px}
#board.top-bottom .row{display:flex;gap:16px;min-height:200px}
#board.top-bottom .row .slot{flex:1}
#board.freeform .slot{position:absolute}
.slot{background:var(--panel);border:2px solid var(--line);border-radius:8px;overflow:hidden;display:flex;flex-direction:column;min-height:240px}
.slot.selected{border-color:var(--accent)}
.slot.frozen{opacity:.55}
.slot .bar{display:flex;gap:6px;align-items:center;padding:6px;border-bottom:1px solid var(--line);cursor:default}
#board.freeform .slot .bar{cursor:move}
.slot .num{font-weight:700;color:var(--accent);cursor:pointer}
.slot .chan{flex:1;min-width:60px}
.slot iframe{border:0;width:100%;flex:1;min-height:180px}
.slot iframe.inline-chat{flex:0 0 260px}
.h{position:absolute;width:14px;height:14px;background:var(--accent);opacity:.7;display:none}
#board.freeform .h{display:block}
.h.nw{left:0;top:0;cursor:nwse-resize}.h.ne{right:0;top:0;cursor:nesw-resize}
.h.sw{left:0;bottom:0;cursor:nesw-resize}.h.se{right:0;bottom:0;cursor:nwse-resize}
aside{width:260px;flex:0 0 260px}
aside section{background:var(--panel);border:1px solid var(--line);border-radius:8px;padding:10px;margin-bottom:12px}
aside h3{margin:0 0 8px;font-size:13px;text-transform:uppercase;color:#71717a}
.entry{display:flex;justify-content:space-between;align-items:center;padding:4px 0}
.entry small{color:#71717a}
#chat-layer{position:fixed;inset:0;pointer-events:none}
.chatwin{position:absolute;pointer-events:auto;background:var(--panel);border:1px solid var(--line);border-radius:8px;display:flex;flex-direction:column;box-shadow:0 8px 30px rgba(0,0,0,.3)}
.chatwin .bar{display:flex;justify-content:space-between;padding:6px 8px;cursor:move;border-bottom:1px solid var(--line)}
.chatwin iframe{border:0;flex:1}
.chatwin .h{display:block}
.modal{position:fixed;inset:0;background:rgba(0,0,0,.55);display:none;align-items:center;justify-content:center}
.modal .card{background:var(--panel);padding:24px;border-radius:12px;min-width:340px;max-width:520px}
.modal .plans{display:flex;gap:10px;margin:14px 0}
.hint{color:#71717a;font-size:12px}
</style>
</head>
<body>
<header>
  <h1>MultiStream Watch</h1>
  <span id="tier" class="badge free">free</span>
  <span id="countdown"></span>
  <button id="b-layout">Layout</button>
  <button id="b-mute">Mute all</button>
  <button id="b-chats">Chats</button>
  <button id="b-dark">Dark</button>
  <select id="theme"><option>purple</option><option>blue</option><option>green</option><option>red</option><option>orange</option></select>
  <button id="b-restore">Restore streams</button>
  <span style="flex:1"></span>
  <button id="b-trial">Start free trial</button>
  <button id="b-plans" class="primary">Go premium</button>
</header>
<div id="notice"><span id="notice-text"></span> <button id="notice-x">Dismiss</button></div>
<main>
  <div id="board" class="grid"></div>
  <aside>
    <section>
      <h3>Add stream</h3>
      <form id="add-form" style="display:flex;flex-direction:column;gap:6px">
        <select id="add-platform"><option value="twitch">Twitch</option><option value="kick">Kick</option><option value="youtube">YouTube</option></select>
        <input id="add-channel" placeholder="Enter Twitch username...">
        <button class="primary">Add</button>
      </form>
    </section>
    <section>
      <h3>Accounts</h3>
      <label><input type="checkbox" id="auth-twitch"> Twitch</label><br>
      <label><input type="checkbox" id="auth-kick"> Kick</label><br>
      <label><input type="checkbox" id="auth-youtube"> YouTube</label>
    </section>
    <div id="browse"></div>
  </aside>
</main>
<div id="chat-layer"></div>

<div id="onboarding" class="modal"><div class="card">
  <div id="ob-platform">
    <h2>Welcome! Where do you watch?</h2>
    <div class="plans">
      <button data-p="twitch">Twitch</button><button data-p="kick">Kick</button><button data-p="youtube">YouTube</button>
    </div>
  </div>
  <div id="ob-streamers" style="display:none">
    <h2>Pick up to two streamers</h2>
    <input id="ob-1" placeholder="First channel"><br><br>
    <input id="ob-2" placeholder="Second channel"><br><br>
    <button id="ob-back">Back</button> <button id="ob-done" class="primary">Start watching</button>
  </div>
  <p><a href="#" id="ob-skip">Skip</a></p>
</div></div>

<div id="plans" class="modal"><div class="card">
  <h2 id="plans-title">Go premium</h2>
  <p class="hint">Six streams, free-form layout, pop-out chats, platform switching, dark mode and themes.</p>
  <div class="plans">
    <button data-plan="monthly">Monthly</button>
    <button data-plan="quarterly">Quarterly</button>
    <button data-plan="yearly" class="primary">Yearly</button>
  </div>
  <button id="plans-trial">Start 15-minute free trial</button>
  <button id="plans-close">Not now</button>
</div></div>

<script>
const $=s=>document.querySelector(s);
const HOST=encodeURIComponent(location.hostname);
const board=$('#board'),chatLayer=$('#chat-layer');
let view=null,space='board',pending=null,sending=false;
const slotEls=new Map(),chatEls=[];

async function post(url,body){
  const r=await fetch(url+'?host='+HOST,{method:'POST',headers:{'Content-Type':'application/json'},body:JSON.stringify(body)});
  const j=await r.json();
  if(!r.ok){console.warn(j.error);return null}
  return j;
}
async function act(type,extra){const v=await post('/api/action',Object.assign({type},extra||{}));if(v)render(v);return v}

function pt(e){
  if(space==='chat')return{x:e.clientX,y:e.clientY};
  const r=board.getBoundingClientRect();
  return{x:e.clientX-r.left+board.scrollLeft,y:e.clientY-r.top+board.scrollTop};
}
async function flush(){
  sending=true;
  while(pending){const p=pending;pending=null;await act('pointer_move',{pointer:p})}
  sending=false;
}
document.addEventListener('mousemove',e=>{if(!view||!view.interacting)return;pending=pt(e);if(!sending)flush()});
document.addEventListener('mouseup',()=>{if(view&&view.interacting){pending=null;act('pointer_up')}});

function setSrc(f,u){if(f.getAttribute('src')!==u)f.setAttribute('src',u)}
function handles(el,onDown){
  for(const c of['nw','ne','sw','se']){
    const h=document.createElement('div');h.className='h '+c;
    h.addEventListener('mousedown',e=>{e.preventDefault();e.stopPropagation();onDown(c,e)});
    el.appendChild(h);
  }
}
function platformSelect(){
  const s=document.createElement('select');s.className='plat';
  for(const p of['twitch','kick','youtube']){const o=document.createElement('option');o.value=p;o.textContent=p;s.appendChild(o)}
  return s;
}
function index(id){return view.slots.findIndex(s=>s.id===id)}

function slotEl(s){
  let el=slotEls.get(s.id);
  if(el)return el;
  el=document.createElement('div');el.className='slot';
  el.innerHTML='<div class="bar"><span class="num"></span><input class="chan"><span class="selwrap"></span><button class="size">Size</button><button class="row">Row</button><button class="pop">Chat</button><button class="rm">&times;</button></div><iframe class="video" allowfullscreen allow="autoplay; fullscreen"></iframe><iframe class="inline-chat"></iframe>';
  const sel=platformSelect();el.querySelector('.selwrap').appendChild(sel);
  const id=s.id,bar=el.querySelector('.bar');
  el.querySelector('.num').onclick=()=>act('select_slot',{index:index(id)});
  el.querySelector('.chan').addEventListener('change',e=>act('change_channel',{slot:id,channel:e.target.value}));
  sel.onchange=e=>act('change_platform',{slot:id,platform:e.target.value});
  el.querySelector('.size').onclick=()=>act('cycle_size',{slot:id});
  el.querySelector('.row').onclick=()=>act('toggle_row',{slot:id});
  el.querySelector('.pop').onclick=()=>{const x=view.slots[index(id)];act('open_chat',{channel:x.channel,platform:x.platform})};
  el.querySelector('.rm').onclick=()=>act('remove_slot',{index:index(id)});
  bar.addEventListener('mousedown',e=>{
    if(view.layout!=='freeform'||e.target!==bar)return;
    space='board';act('drag_slot',{index:index(id),pointer:pt(e)});
  });
  handles(el,(c,e)=>{space='board';act('resize_slot',{index:index(id),corner:c,pointer:pt(e)})});
  slotEls.set(id,el);
  return el;
}

function renderSlots(v){
  const caps=v.capabilities,seen=new Set();
  board.className=v.layout;
  board.querySelectorAll('.row').forEach(r=>r.remove());
  let top=null,bottom=null;
  if(v.layout==='top-bottom'){
    top=document.createElement('div');top.className='row';
    bottom=document.createElement('div');bottom.className='row';
    board.append(top,bottom);
  }
  let maxX=0,maxY=0;
  for(const s of v.slots){
    const el=slotEl(s);seen.add(s.id);
    el.classList.toggle('selected',s.selected);
    el.classList.toggle('frozen',s.frozen);
    el.querySelector('.num').textContent=s.number;
    const chan=el.querySelector('.chan');if(document.activeElement!==chan)chan.value=s.channel;
    const sel=el.querySelector('.plat');sel.value=s.platform;sel.disabled=!caps.switch_platform||s.frozen;
    el.querySelector('.size').style.display=caps.cycle_size?'':'none';
    el.querySelector('.row').style.display=caps.arrange&&v.layout==='top-bottom'?'':'none';
    el.querySelector('.pop').style.display=caps.pop_out_chat?'':'none';
    el.querySelector('.rm').style.display=caps.remove?'':'none';
    setSrc(el.querySelector('.video'),s.video_url);
    const ic=el.querySelector('.inline-chat');
    ic.style.display=v.preferences.show_chats&&!caps.pop_out_chat?'':'none';
    if(ic.style.display!=='none')setSrc(ic,s.chat_url);
    const p=s.placement;
    el.style.gridColumn='';el.style.left=el.style.top=el.style.width=el.style.height='';
    if(p.mode==='grid'){el.style.gridColumn='span '+p.span;board.appendChild(el)}
    else if(p.mode==='top-bottom'){(p.row==='top'?top:bottom).appendChild(el)}
    else{
      const f=p.frame;
      el.style.left=f.origin.x+'px';el.style.top=f.origin.y+'px';
      el.style.width=f.size.width+'px';el.style.height=f.size.height+'px';
      maxX=Math.max(maxX,f.origin.x+f.size.width);maxY=Math.max(maxY,f.origin.y+f.size.height);
      board.appendChild(el);
    }
  }
  for(const[id,el]of slotEls){if(!seen.has(id)){el.remove();slotEls.delete(id)}}
  board.style.minHeight=v.layout==='freeform'?(maxY+40)+'px':'';
  board.style.minWidth=v.layout==='freeform'?(maxX+40)+'px':'';
}

function renderChats(v){
  while(chatEls.length>v.chats.length)chatEls.pop().remove();
  v.chats.forEach((c,i)=>{
    let el=chatEls[i];
    if(!el){
      el=document.createElement('div');el.className='chatwin';
      el.innerHTML='<div class="bar"><span class="title"></span><button class="x">&times;</button></div><iframe></iframe>';
      el.querySelector('.x').onclick=()=>act('close_chat',{index:i});
      el.querySelector('.bar').addEventListener('mousedown',e=>{if(e.target.tagName==='BUTTON')return;space='chat';act('drag_chat',{index:i,pointer:pt(e)})});
      handles(el,(corner,e)=>{space='chat';act('resize_chat',{index:i,corner,pointer:pt(e)})});
      chatLayer.appendChild(el);chatEls.push(el);
    }
    el.querySelector('.title').textContent=c.channel+' ('+c.platform+')';
    el.style.left=c.position.x+'px';el.style.top=c.position.y+'px';
    el.style.width=c.size.width+'px';el.style.height=c.size.height+'px';
    setSrc(el.querySelector('iframe'),c.url);
  });
}

function renderBrowse(v){
  const b=$('#browse');b.innerHTML='';
  for(const g of v.browse){
    const sec=document.createElement('section');
    sec.innerHTML='<h3>Live on '+g.platform+'</h3>'+(v.selected_slot!==null?'<p class="hint">Pick a streamer for slot '+(v.selected_slot+1)+'</p>':'');
    for(const e of g.channels){
      const row=document.createElement('div');row.className='entry';
      row.innerHTML='<span>'+e.display_name+' <small>'+e.viewers+'</small></span>';
      const btn=document.createElement('button');
      if(v.selected_slot!==null){btn.textContent='Assign';btn.onclick=()=>act('assign_streamer',{channel:e.channel,platform:g.platform})}
      else{btn.textContent='Add';btn.disabled=v.slots.length>=v.capabilities.max_slots;btn.onclick=()=>act('add_slot',{channel:e.channel,platform:g.platform})}
      row.appendChild(btn);sec.appendChild(row);
    }
    b.appendChild(sec);
  }
}

function render(v){
  view=v;
  const caps=v.capabilities;
  document.body.classList.toggle('dark',v.preferences.dark_mode);
  document.documentElement.style.setProperty('--accent',v.theme_hex);
  const tier=$('#tier');tier.textContent=v.tier;tier.classList.toggle('free',v.tier==='free');
  const t=v.trial_seconds_remaining;
  $('#countdown').textContent=t!=null?'Trial '+Math.floor(t/60)+':'+String(t%60).padStart(2,'0'):'';
  $('#b-layout').textContent='Layout: '+v.layout;
  $('#b-mute').textContent=v.preferences.muted?'Unmute all':'Mute all';
  $('#b-chats').textContent=v.preferences.show_chats?'Hide chats':'Show chats';
  $('#b-chats').style.display=caps.pop_out_chat?'none':'';
  $('#b-dark').disabled=!caps.dark_mode&&!v.preferences.dark_mode;
  const th=$('#theme');th.disabled=!caps.theme_colors;th.value=v.preferences.theme;
  $('#b-restore').style.display=caps.max_slots>=6?'':'none';
  $('#b-trial').style.display=v.trial_available?'':'none';
  $('#b-plans').style.display=v.tier==='premium'?'none':'';
  for(const p of['twitch','kick','youtube'])$('#auth-'+p).checked=v.auth[p];
  const n=$('#notice');n.style.display=v.notice?'block':'none';$('#notice-text').textContent=v.notice||'';
  const ob=v.onboarding;
  $('#onboarding').style.display=ob.active?'flex':'none';
  $('#ob-platform').style.display=ob.step==='platform-choice'?'':'none';
  $('#ob-streamers').style.display=ob.step==='streamer-choice'?'':'none';
  $('#plans').style.display=(v.plans_open||v.trial_ended)&&!ob.active?'flex':'none';
  $('#plans-title').textContent=v.trial_ended?'Your free trial has ended':'Go premium';
  $('#plans-trial').style.display=v.trial_available?'':'none';
  renderSlots(v);renderChats(v);renderBrowse(v);
}

$('#b-layout').onclick=()=>act('cycle_layout');
$('#b-mute').onclick=()=>act('toggle_mute');
$('#b-chats').onclick=()=>act('toggle_chats');
$('#b-dark').onclick=()=>act('toggle_dark_mode');
$('#theme').onchange=e=>act('set_theme',{color:e.target.value});
$('#b-restore').onclick=()=>act('restore_defaults');
$('#b-trial').onclick=()=>act('start_trial');
$('#plans-trial').onclick=()=>act('start_trial');
$('#b-plans').onclick=()=>act('open_plans');
$('#plans-close').onclick=()=>act('dismiss_trial_prompt');
$('#notice-x').onclick=()=>act('dismiss_notice');
for(const p of['twitch','kick','youtube'])$('#auth-'+p).onchange=e=>act('set_auth',{platform:p,signed_in:e.target.checked});
const PH={twitch:'Enter Twitch username...',kick:'Enter Kick username...',youtube:'Enter YouTube channel/video ID...'};
$('#add-platform').onchange=e=>{$('#add-channel').placeholder=PH[e.target.value]};
$('#add-form').onsubmit=e=>{e.preventDefault();const c=$('#add-channel').value.trim();if(!c)return;act('add_slot',{channel:c,platform:$('#add-platform').value});$('#add-channel').value=''};
document.querySelectorAll('#ob-platform [data-p]').forEach(b=>b.onclick=()=>act('onboarding_platform',{platform:b.dataset.p}));
$('#ob-back').onclick=()=>act('onboarding_back');
$('#ob-done').onclick=()=>act('onboarding_complete',{channels:[$('#ob-1').value,$('#ob-2').value]});
$('#ob-skip').onclick=e=>{e.preventDefault();act('onboarding_skip')};
document.querySelectorAll('#plans [data-plan]').forEach(b=>b.onclick=async()=>{
  const r=await post('/api/checkout',{plan:b.dataset.plan});
  if(!r)return;
  if(r.redirect&&r.redirect.url){location.href=r.redirect.url;return}
  render(r.view);
});

fetch('/api/state?host='+HOST).then(r=>r.json()).then(render);
const es=new EventSource('/events?host='+HOST);
es.onmessage=e=>render(JSON.parse(e.data));
</script>
</body>
</html>"##;
