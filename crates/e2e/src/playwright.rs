//! Playwright browser backend
//!
//! One long-lived `node` process runs an embedded bridge script. The harness
//! writes JSON requests to its stdin and reads JSON messages from its stdout:
//!
//! ```text
//!  harness ──{id, op: launch|eval|close}──────────▶ bridge ──▶ page
//!  harness ◀─{type: reply, id, ok, value|error}──── bridge
//!  harness ◀─{type: gateway, call, method, args}─── bridge ◀── app.gister.*
//!  harness ──{call, ok, value|error}──────────────▶ bridge
//! ```
//!
//! The page's gister methods are replaced by a shim that forwards every call
//! to the harness, where the gateway slot's current implementation answers it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::app::{Button, DomEvent, Element, LaunchRequest, Launcher, Playground};
use crate::error::{E2eError, E2eResult};
use crate::gateway::{
    CreateFn, Credentials, Gateway, GatewayFuture, GetFn, Gist, UpdateFn, CREATE, GET, UPDATE,
};
use crate::server::StaticServer;

const BRIDGE_JS: &str = r#"
const readline = require("readline");

function send(msg) {
    process.stdout.write(JSON.stringify(msg) + "\n");
}

let playwright;
try {
    playwright = require("playwright");
} catch (e) {
    send({ type: "fatal", missing: true, error: String(e && e.message || e) });
    process.exit(3);
}

const [browserName, mode] = process.argv.slice(2);
const calls = new Map();
let nextCall = 1;
let browser, context, page;

function gateway(method, args) {
    const call = nextCall++;
    send({ type: "gateway", call, method, args });
    return new Promise((resolve, reject) => calls.set(call, { resolve, reject }));
}

async function launch({ url, clear_keys }) {
    if (page) await page.close();
    page = await context.newPage();
    page.on("console", (m) => send({ type: "console", level: m.type(), text: m.text() }));
    await page.exposeFunction("__e2eGateway", gateway);
    await page.goto(new URL("/__e2e_blank", url).href);
    await page.evaluate((keys) => keys.forEach((k) => localStorage.removeItem(k)), clear_keys);
    await page.goto(url);
    return null;
}

async function evaluate({ body, arg }) {
    if (!page) throw new Error("no page loaded");
    return page.evaluate(([body, arg]) => new Function("arg", body)(arg), [body, arg]);
}

async function handle(req) {
    try {
        let value = null;
        if (req.op === "launch") {
            value = await launch(req);
        } else if (req.op === "eval") {
            value = await evaluate(req);
        } else if (req.op === "close") {
            await browser.close();
            send({ type: "reply", id: req.id, ok: true, value: null });
            process.exit(0);
        } else {
            throw new Error("unknown op " + req.op);
        }
        send({ type: "reply", id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
        send({ type: "reply", id: req.id, ok: false, error: String(e && e.message || e) });
    }
}

(async () => {
    try {
        browser = await playwright[browserName].launch({ headless: mode !== "headed" });
        context = await browser.newContext();
    } catch (e) {
        send({ type: "fatal", missing: false, error: String(e && e.message || e) });
        process.exit(3);
    }

    let version = null;
    try {
        version = require("playwright/package.json").version;
    } catch (e) {}
    send({ type: "ready", version });

    const rl = readline.createInterface({ input: process.stdin });
    rl.on("line", (line) => {
        const msg = JSON.parse(line);
        if (msg.call !== undefined) {
            const pending = calls.get(msg.call);
            if (pending) {
                calls.delete(msg.call);
                if (msg.ok) pending.resolve(msg.value);
                else pending.reject(new Error(msg.error));
            }
            return;
        }
        handle(msg);
    });
    rl.on("close", async () => {
        await browser.close();
        process.exit(0);
    });
})();
"#;

/// Prepended to every eval body
const PRELUDE: &str = r#"
const app = window.app;
const ui = app && app.ui;
function el(name) {
    if (name === "header") return document.querySelector(".header h1");
    return ui ? ui[name] : undefined;
}
"#;

const BIND_JS: &str = r#"
const missing = [];
if (!app) return ["app"];
for (const name of ["actions", "gister", "ui"]) {
    if (!app[name]) missing.push(name);
}
if (ui) {
    for (const name of ["editor", "status", "result", "commandbar", "name", "buttons"]) {
        if (!ui[name]) missing.push("ui." + name);
    }
    if (ui.buttons) {
        for (const name of ["execute", "save", "showTables"]) {
            if (!ui.buttons[name]) missing.push("ui.buttons." + name);
        }
    }
}
if (!el("header")) missing.push(".header h1");
if (app.gister) {
    for (const name of ["create", "update", "get"]) {
        if (typeof app.gister[name] !== "function") missing.push("gister." + name);
    }
}
if (missing.length) return missing;

const gister = app.gister;
if (!window.__e2eOriginal) {
    window.__e2eOriginal = {};
    for (const name of ["create", "update", "get"]) {
        window.__e2eOriginal[name] = gister[name].bind(gister);
        gister[name] = (...args) => window.__e2eGateway(name, args);
    }
}
return missing;
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for the Playwright bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    /// Browser engine to launch
    pub browser: Browser,

    /// Run without a visible window
    pub headless: bool,

    /// Node executable
    pub node: PathBuf,

    /// `NODE_PATH` for resolving the `playwright` module.
    /// Defaults to `./node_modules` when that directory exists.
    pub node_path: Option<PathBuf>,

    /// How long the browser gets to start
    pub startup_timeout_ms: u64,

    /// Upper bound on a single bridge request
    pub request_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            node: PathBuf::from("node"),
            node_path: None,
            startup_timeout_ms: 30_000,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Serialize)]
struct Request {
    id: u64,
    #[serde(flatten)]
    op: BridgeOp,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum BridgeOp {
    Launch { url: String, clear_keys: Vec<String> },
    Eval { body: String, arg: Value },
    Close,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Inbound {
    Ready {
        #[serde(default)]
        version: Option<String>,
    },
    Fatal {
        error: String,
        #[serde(default)]
        missing: bool,
    },
    Reply {
        id: u64,
        ok: bool,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Gateway {
        call: u64,
        method: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Console {
        level: String,
        text: String,
    },
}

#[derive(Debug, Serialize)]
struct GatewayReply {
    call: u64,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl GatewayReply {
    fn from_result(call: u64, result: E2eResult<Gist>) -> Self {
        match result.and_then(|gist| Ok(serde_json::to_value(gist)?)) {
            Ok(value) => Self {
                call,
                ok: true,
                value: Some(value),
                error: None,
            },
            Err(e) => Self {
                call,
                ok: false,
                value: None,
                error: Some(e.to_string()),
            },
        }
    }
}

type Pending = oneshot::Sender<Result<Value, String>>;

/// State shared by the launcher, its pages and the reader task
struct Shared {
    stdin: tokio::sync::Mutex<ChildStdin>,
    pending: Mutex<HashMap<u64, Pending>>,
    next_id: AtomicU64,
    /// Gateway of the page bound last; forwarded calls land here
    gateway: Mutex<Option<Arc<Gateway>>>,
    request_timeout: Duration,
}

impl Shared {
    async fn write_line<T: Serialize>(&self, msg: &T) -> E2eResult<()> {
        let mut line = serde_json::to_string(msg)?;
        line.push('\n');
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn request(&self, op: BridgeOp) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if let Err(e) = self.write_line(&Request { id, op }).await {
            self.pending.lock().remove(&id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(E2eError::Bridge(message)),
            Ok(Err(_)) => Err(E2eError::Bridge("bridge exited".to_string())),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(E2eError::Timeout(format!("bridge request {}", id)))
            }
        }
    }

    async fn eval(&self, body: &str, arg: Value) -> E2eResult<Value> {
        self.request(BridgeOp::Eval {
            body: format!("{}\n{}", PRELUDE, body),
            arg,
        })
        .await
    }
}

async fn read_loop(
    shared: Weak<Shared>,
    stdout: ChildStdout,
    ready: oneshot::Sender<E2eResult<Option<String>>>,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut ready = Some(ready);

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Bridge read failed: {}", e);
                break;
            }
        };

        let msg: Inbound = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(_) => {
                debug!("bridge: {}", line);
                continue;
            }
        };

        match msg {
            Inbound::Ready { version } => {
                if let Some(tx) = ready.take() {
                    let _ = tx.send(Ok(version));
                }
            }
            Inbound::Fatal { error, missing } => {
                let err = if missing {
                    debug!("Playwright module unavailable: {}", error);
                    E2eError::PlaywrightNotFound
                } else {
                    E2eError::Bridge(error)
                };
                match ready.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(err));
                    }
                    None => warn!("Bridge failed: {}", err),
                }
            }
            Inbound::Reply {
                id,
                ok,
                value,
                error,
            } => {
                let Some(shared) = shared.upgrade() else { break };
                let pending = shared.pending.lock().remove(&id);
                match pending {
                    Some(tx) => {
                        let reply = if ok { Ok(value) } else { Err(error.unwrap_or_default()) };
                        let _ = tx.send(reply);
                    }
                    None => debug!("Dropping late bridge reply {}", id),
                }
            }
            Inbound::Gateway { call, method, args } => {
                let Some(shared) = shared.upgrade() else { break };
                tokio::spawn(answer_gateway(shared, call, method, args));
            }
            Inbound::Console { level, text } => {
                debug!(target: "playground", "[{}] {}", level, text);
            }
        }
    }

    if let Some(shared) = shared.upgrade() {
        shared.pending.lock().clear();
    }
    debug!("Bridge reader finished");
}

async fn answer_gateway(shared: Arc<Shared>, call: u64, method: String, args: Vec<Value>) {
    let gateway = shared.gateway.lock().clone();
    let result = match gateway {
        Some(gateway) => dispatch_gateway(&gateway, &method, &args).await,
        None => Err(E2eError::Gateway("no page is bound".to_string())),
    };

    let reply = GatewayReply::from_result(call, result);
    if let Err(e) = shared.write_line(&reply).await {
        warn!("Failed to answer gateway call {}: {}", call, e);
    }
}

async fn dispatch_gateway(gateway: &Gateway, method: &str, args: &[Value]) -> E2eResult<Gist> {
    let arg = |i: usize| -> String {
        args.get(i)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    match method {
        CREATE => gateway.create(arg(0), arg(1), arg(2)).await,
        UPDATE => gateway.update(arg(0), arg(1), arg(2), arg(3)).await,
        GET => gateway.fetch(arg(0)).await,
        other => Err(E2eError::Gateway(format!("unknown gateway method {}", other))),
    }
}

/// Run the page's own gister method, bypassing the shim
fn call_original(shared: Weak<Shared>, method: &'static str, args: Vec<Value>) -> GatewayFuture {
    async move {
        let shared = shared
            .upgrade()
            .ok_or_else(|| E2eError::Bridge("bridge closed".to_string()))?;
        let value = shared
            .eval(
                "return window.__e2eOriginal[arg.method](...arg.args);",
                json!({ "method": method, "args": args }),
            )
            .await
            .map_err(|e| E2eError::Gateway(e.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }
    .boxed()
}

fn page_gateway(shared: &Arc<Shared>) -> Gateway {
    let weak = Arc::downgrade(shared);
    let create: Arc<CreateFn> = {
        let weak = weak.clone();
        Arc::new(move |name: String, schema: String, query: String| {
            call_original(weak.clone(), CREATE, vec![name.into(), schema.into(), query.into()])
        })
    };
    let update: Arc<UpdateFn> = {
        let weak = weak.clone();
        Arc::new(move |id: String, name: String, schema: String, query: String| {
            call_original(
                weak.clone(),
                UPDATE,
                vec![id.into(), name.into(), schema.into(), query.into()],
            )
        })
    };
    let get: Arc<GetFn> =
        Arc::new(move |id: String| call_original(weak.clone(), GET, vec![id.into()]));
    Gateway::new(create, update, get)
}

/// Launches application pages in a real browser
pub struct PlaywrightLauncher {
    shared: Arc<Shared>,
    child: Mutex<Option<Child>>,
    server: Mutex<Option<StaticServer>>,
    _script_dir: TempDir,
}

impl PlaywrightLauncher {
    /// Start the bridge and wait for the browser to come up
    pub async fn start(config: PlaywrightConfig, server: StaticServer) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script = script_dir.path().join("bridge.js");
        std::fs::write(&script, BRIDGE_JS)?;

        let mut cmd = TokioCommand::new(&config.node);
        cmd.arg(&script)
            .arg(config.browser.as_str())
            .arg(if config.headless { "headless" } else { "headed" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let node_path = match &config.node_path {
            Some(path) => Some(path.clone()),
            None => {
                let local = std::env::current_dir()?.join("node_modules");
                local.is_dir().then_some(local)
            }
        };
        if let Some(path) = node_path {
            cmd.env("NODE_PATH", path);
        }

        info!("Starting Playwright bridge ({})", config.browser.as_str());
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => E2eError::PlaywrightNotFound,
            _ => E2eError::Io(e),
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Bridge("bridge stdout unavailable".to_string()))?;

        let shared = Arc::new(Shared {
            stdin: tokio::sync::Mutex::new(stdin),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            gateway: Mutex::new(None),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        });

        let (ready_tx, ready_rx) = oneshot::channel();
        tokio::spawn(read_loop(Arc::downgrade(&shared), stdout, ready_tx));

        let startup = Duration::from_millis(config.startup_timeout_ms);
        let version = match tokio::time::timeout(startup, ready_rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => {
                return Err(E2eError::Bridge("bridge exited during startup".to_string()));
            }
            Err(_) => return Err(E2eError::Timeout("Playwright bridge startup".to_string())),
        };

        info!(
            "Playwright {} ready",
            version.as_deref().unwrap_or("(unknown version)")
        );

        Ok(Self {
            shared,
            child: Mutex::new(Some(child)),
            server: Mutex::new(Some(server)),
            _script_dir: script_dir,
        })
    }

    fn base_url(&self) -> E2eResult<String> {
        self.server
            .lock()
            .as_ref()
            .map(|server| server.base_url().to_string())
            .ok_or_else(|| E2eError::Bridge("launcher is shut down".to_string()))
    }
}

#[async_trait]
impl Launcher for PlaywrightLauncher {
    async fn launch(&self, request: LaunchRequest) -> E2eResult<Box<dyn Playground>> {
        let url = format!(
            "{}/{}",
            self.base_url()?,
            request.entry.trim_start_matches('/')
        );
        debug!("Loading {}", url);

        self.shared
            .request(BridgeOp::Launch {
                url: url.clone(),
                clear_keys: request.clear_keys,
            })
            .await?;

        let gateway = Arc::new(page_gateway(&self.shared));
        Ok(Box::new(BrowserPlayground {
            shared: self.shared.clone(),
            url,
            gateway,
        }))
    }

    async fn shutdown(&self) -> E2eResult<()> {
        let close = self.shared.request(BridgeOp::Close);
        if tokio::time::timeout(Duration::from_secs(2), close).await.is_err() {
            debug!("Bridge did not acknowledge close");
        }

        let child = self.child.lock().take();
        if let Some(mut child) = child {
            if tokio::time::timeout(Duration::from_secs(2), child.wait())
                .await
                .is_err()
            {
                terminate(&child);
                let _ = child.kill().await;
            }
        }

        let server = self.server.lock().take();
        if let Some(server) = server {
            server.stop().await;
        }
        info!("Playwright bridge stopped");
        Ok(())
    }
}

#[cfg(unix)]
fn terminate(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) {}

/// An application page in the browser
pub struct BrowserPlayground {
    shared: Arc<Shared>,
    url: String,
    gateway: Arc<Gateway>,
}

impl BrowserPlayground {
    async fn eval(&self, body: &str, arg: Value) -> E2eResult<Value> {
        self.shared.eval(body, arg).await
    }

    /// Run an element script that answers `null` when the element lacks the property
    async fn element_op(
        &self,
        element: Element,
        operation: &str,
        body: &str,
        arg: Value,
    ) -> E2eResult<Value> {
        let value = self.eval(body, arg).await?;
        if value.is_null() {
            return Err(E2eError::UnsupportedElement {
                element: element.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(value)
    }
}

fn as_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Playground for BrowserPlayground {
    async fn bind(&self) -> E2eResult<()> {
        let value = self.eval(BIND_JS, Value::Null).await?;
        let missing: Vec<String> = serde_json::from_value(value)?;
        if !missing.is_empty() {
            return Err(E2eError::MissingCapabilities(missing));
        }
        *self.shared.gateway.lock() = Some(self.gateway.clone());
        Ok(())
    }

    async fn value(&self, element: Element) -> E2eResult<String> {
        let body = r#"const e = el(arg.element);
            return e && "value" in e ? e.value : null;"#;
        let value = self
            .element_op(element, "value", body, json!({ "element": element.as_str() }))
            .await?;
        Ok(as_string(value))
    }

    async fn text(&self, element: Element) -> E2eResult<String> {
        let body = r#"const e = el(arg.element);
            return e ? e.innerText : null;"#;
        let value = self
            .element_op(element, "text", body, json!({ "element": element.as_str() }))
            .await?;
        Ok(as_string(value))
    }

    async fn set_value(&self, element: Element, value: &str) -> E2eResult<()> {
        let body = r#"const e = el(arg.element);
            if (!e || !("value" in e)) return null;
            e.value = arg.value;
            return true;"#;
        self.element_op(
            element,
            "set_value",
            body,
            json!({ "element": element.as_str(), "value": value }),
        )
        .await?;
        Ok(())
    }

    async fn dispatch(&self, element: Element, event: DomEvent) -> E2eResult<()> {
        let body = r#"const e = el(arg.element);
            if (!e) return null;
            e.dispatchEvent(new Event(arg.event));
            return true;"#;
        self.element_op(
            element,
            "dispatch",
            body,
            json!({ "element": element.as_str(), "event": event.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn has_class(&self, element: Element, class: &str) -> E2eResult<bool> {
        let body = r#"const e = el(arg.element);
            return e ? e.classList.contains(arg.class) : null;"#;
        let value = self
            .element_op(
                element,
                "has_class",
                body,
                json!({ "element": element.as_str(), "class": class }),
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, button: Button) -> E2eResult<()> {
        self.eval(
            "ui.buttons[arg.button].click(); return true;",
            json!({ "button": button.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn click_action(&self, container: Element, action: &str) -> E2eResult<()> {
        let body = r#"const e = el(arg.container);
            const target = e && e.querySelector(`[data-action="${arg.action}"]`);
            if (!target) return false;
            target.click();
            return true;"#;
        let clicked = self
            .eval(body, json!({ "container": container.as_str(), "action": action }))
            .await?;
        if clicked.as_bool() != Some(true) {
            return Err(E2eError::ActionNotFound {
                container: container.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    async fn navigate(&self, fragment: &str) -> E2eResult<()> {
        let url = format!("{}#{}", self.url, fragment.trim_start_matches('#'));
        self.eval("window.location.assign(arg.url); return true;", json!({ "url": url }))
            .await?;
        Ok(())
    }

    async fn location_path(&self) -> E2eResult<String> {
        let value = self.eval("return window.location.pathname;", Value::Null).await?;
        Ok(as_string(value))
    }

    async fn storage_get(&self, key: &str) -> E2eResult<Option<String>> {
        let value = self
            .eval("return localStorage.getItem(arg.key);", json!({ "key": key }))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn set_credentials(&self, credentials: Option<Credentials>) -> E2eResult<()> {
        let (username, password) = match credentials {
            Some(c) => (Value::from(c.username), Value::from(c.password)),
            None => (Value::Null, Value::Null),
        };
        self.eval(
            "app.gister.username = arg.username; app.gister.password = arg.password; return true;",
            json!({ "username": username, "password": password }),
        )
        .await?;
        Ok(())
    }

    fn gateway(&self) -> Arc<Gateway> {
        self.gateway.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let launch = serde_json::to_value(Request {
            id: 7,
            op: BridgeOp::Launch {
                url: "http://127.0.0.1:1/index.html".to_string(),
                clear_keys: vec!["new.db.sql".to_string()],
            },
        })
        .unwrap();
        assert_eq!(launch["id"], 7);
        assert_eq!(launch["op"], "launch");
        assert_eq!(launch["clear_keys"][0], "new.db.sql");

        let close = serde_json::to_value(Request {
            id: 8,
            op: BridgeOp::Close,
        })
        .unwrap();
        assert_eq!(close, json!({ "id": 8, "op": "close" }));
    }

    #[test]
    fn test_inbound_messages() {
        let reply: Inbound =
            serde_json::from_str(r#"{"type":"reply","id":3,"ok":false,"error":"boom"}"#).unwrap();
        assert!(matches!(
            reply,
            Inbound::Reply {
                id: 3,
                ok: false,
                value: Value::Null,
                error: Some(ref e),
            } if e == "boom"
        ));

        let call: Inbound = serde_json::from_str(
            r#"{"type":"gateway","call":1,"method":"create","args":["new.db","","select 1"]}"#,
        )
        .unwrap();
        assert!(matches!(call, Inbound::Gateway { call: 1, ref args, .. } if args.len() == 3));

        let fatal: Inbound =
            serde_json::from_str(r#"{"type":"fatal","missing":true,"error":"Cannot find module"}"#)
                .unwrap();
        assert!(matches!(fatal, Inbound::Fatal { missing: true, .. }));
    }

    #[test]
    fn test_gateway_reply_shape() {
        let ok = GatewayReply::from_result(
            2,
            Ok(Gist::new("424242131313", "new.db", "test", "", "select 1")),
        );
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["value"]["id"], "424242131313");
        assert!(value.get("error").is_none());

        let err = GatewayReply::from_result(3, Err(E2eError::Gateway("nope".to_string())));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "Gateway error: nope");
    }

    #[test]
    fn test_config_defaults_from_partial_toml() {
        let config: PlaywrightConfig =
            toml::from_str("browser = \"firefox\"\nheadless = false\n").unwrap();
        assert_eq!(config.browser, Browser::Firefox);
        assert!(!config.headless);
        assert_eq!(config.node, PathBuf::from("node"));
    }

    #[tokio::test]
    async fn test_missing_node_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let server = StaticServer::start(crate::server::ServerConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

        let config = PlaywrightConfig {
            node: PathBuf::from("/nonexistent/node-binary"),
            ..PlaywrightConfig::default()
        };
        let err = PlaywrightLauncher::start(config, server).await;
        assert!(matches!(err, Err(E2eError::PlaywrightNotFound)));
    }
}
