//! WASM WebSocket client for connecting to the tracker server
//!
//! Everything runs on the browser event loop: the socket callbacks apply
//! frames to the tracker state, and a close schedules the next attempt with
//! `setTimeout`. The loop lives as long as the page.
//!
//! JS pages use [`TrackerLink`]; Rust UIs compiled into the same module use
//! [`WsTrackerClient`] directly.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, Event, MessageEvent, UrlSearchParams, WebSocket};

use crate::core::{
    apply_frame, PageLocation, Ruleset, Shared, TrackerConfig, TrackerHandle, TrackerState,
};
use crate::error::{Result, TrackerError};

#[wasm_bindgen(start)]
pub fn start() {
    install_logging();
}

/// Route `tracing` output to the browser console
pub fn install_logging() {
    if tracing_wasm::try_set_as_global_default().is_err() {
        debug!("Global tracing subscriber already installed");
    }
}

/// Read host and query string from `window.location`
pub fn page_location() -> Result<PageLocation> {
    let window = web_sys::window().ok_or_else(|| TrackerError::InvalidUrl("no window".into()))?;
    let location = window.location();
    let host = location
        .host()
        .map_err(|e| TrackerError::InvalidUrl(format!("{e:?}")))?;
    let search = location
        .search()
        .map_err(|e| TrackerError::InvalidUrl(format!("{e:?}")))?;
    Ok(PageLocation::new(host, search))
}

/// Ruleset as the browser itself reads `?ruleset=` from a search string
pub fn page_ruleset(search: &str) -> Ruleset {
    match UrlSearchParams::new_with_str(search) {
        Ok(params) => Ruleset::from_param(params.get("ruleset").as_deref()),
        Err(e) => {
            warn!(?e, "URLSearchParams rejected query, parsing it natively");
            Ruleset::from_query(search)
        }
    }
}

/// A live socket with the callbacks attached to it
struct Session {
    ws: WebSocket,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl Drop for Session {
    fn drop(&mut self) {
        // Detach first so the callbacks are never invoked after being freed
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        let _ = self.ws.close();
    }
}

struct Inner<S> {
    url: String,
    retry_ms: i32,
    state: Shared<TrackerState<S>>,
    attempts: Cell<u64>,
    /// The tracked socket, `None` between close and the next attempt
    socket: RefCell<Option<Session>>,
    /// Sessions closed from inside their own callback, freed on the next attempt
    retired: RefCell<Vec<Session>>,
}

/// WASM tracker client
pub struct WsTrackerClient<S> {
    inner: Rc<Inner<S>>,
}

impl<S> WsTrackerClient<S>
where
    S: DeserializeOwned + Clone + 'static,
{
    /// Connect to `ws://<page host>/ws/` with the ruleset from the page query.
    pub fn from_page(default_stats: S) -> Result<Self> {
        let location = page_location()?;
        let mut config = TrackerConfig::for_location(&location, default_stats);
        config.ruleset = page_ruleset(&location.query);
        Ok(Self::connect(config))
    }

    pub fn connect(config: TrackerConfig<S>) -> Self {
        let state = Shared::new(TrackerState::new(
            config.default_stats.clone(),
            config.ruleset,
        ));
        let inner = Rc::new(Inner {
            url: config.endpoint,
            retry_ms: i32::try_from(config.retry_delay.as_millis()).unwrap_or(i32::MAX),
            state,
            attempts: Cell::new(0),
            socket: RefCell::new(None),
            retired: RefCell::new(Vec::new()),
        });
        open(&inner);
        Self { inner }
    }

    pub fn handle(&self) -> TrackerHandle<S> {
        TrackerHandle::new(Shared::clone(&self.inner.state))
    }

    /// Replace the tracked socket with a fresh one.
    pub fn reconnect(&self) {
        open(&self.inner);
    }
}

fn open<S>(inner: &Rc<Inner<S>>)
where
    S: DeserializeOwned + Clone + 'static,
{
    inner.retired.borrow_mut().clear();
    if inner.socket.borrow_mut().take().is_some() {
        debug!("Replacing tracker socket");
        inner.state.mark_disconnected();
    }

    let attempt = inner.attempts.get() + 1;
    inner.attempts.set(attempt);
    inner.state.mark_connecting();
    info!(url = %inner.url, attempt, "Connecting to tracker");

    let ws = match WebSocket::new(&inner.url) {
        Ok(ws) => ws,
        Err(e) => {
            error!(?e, "Failed to create WebSocket");
            inner.state.mark_disconnected();
            schedule_retry(inner);
            return;
        }
    };

    // On message - apply to state in arrival order
    let weak = Rc::downgrade(inner);
    let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
        let Some(inner) = weak.upgrade() else { return };
        if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
            let text: String = txt.into();
            if let Err(err) = apply_frame(&text, &inner.state) {
                warn!(error = %err, "Ignoring malformed frame");
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

    // On error - close explicitly, the close handler schedules the retry
    let ws_clone = ws.clone();
    let on_error = Closure::wrap(Box::new(move |e: Event| {
        error!(event = %e.type_(), "Socket encountered error, closing socket");
        if let Err(e) = ws_clone.close() {
            debug!(?e, "Close after error failed");
        }
    }) as Box<dyn FnMut(Event)>);
    ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

    // On close
    let weak = Rc::downgrade(inner);
    let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
        let Some(inner) = weak.upgrade() else { return };
        warn!(code = e.code(), reason = %e.reason(), "Tracker server went away");
        if let Some(session) = inner.socket.borrow_mut().take() {
            inner.retired.borrow_mut().push(session);
        }
        inner.state.mark_disconnected();
        schedule_retry(&inner);
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

    *inner.socket.borrow_mut() = Some(Session {
        ws,
        _on_message: on_message,
        _on_error: on_error,
        _on_close: on_close,
    });
}

fn schedule_retry<S>(inner: &Rc<Inner<S>>)
where
    S: DeserializeOwned + Clone + 'static,
{
    let Some(window) = web_sys::window() else {
        error!("No window, cannot schedule reconnect");
        return;
    };

    let weak: Weak<Inner<S>> = Rc::downgrade(inner);
    let retry = Closure::once_into_js(move || {
        if let Some(inner) = weak.upgrade() {
            open(&inner);
        }
    });

    debug!(delay_ms = inner.retry_ms, "Scheduling reconnect");
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(retry.unchecked_ref(), inner.retry_ms)
    {
        error!(?e, "Failed to schedule reconnect");
    }
}

fn to_js_error(e: TrackerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn json_to_js<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|e| to_js_error(e.into()))?;
    js_sys::JSON::parse(&text)
}

fn js_to_json(value: &JsValue) -> std::result::Result<Value, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Value::Object(Default::default()));
    }
    let text: String = js_sys::JSON::stringify(value)?.into();
    serde_json::from_str(&text).map_err(|e| to_js_error(e.into()))
}

/// Call `callback` with the current value now and with every later update.
fn spawn_subscription<T, F>(mut rx: watch::Receiver<T>, callback: js_sys::Function, convert: F)
where
    T: Clone + 'static,
    F: Fn(&T) -> std::result::Result<JsValue, JsValue> + 'static,
{
    wasm_bindgen_futures::spawn_local(async move {
        loop {
            let value = rx.borrow_and_update().clone();
            match convert(&value) {
                Ok(js) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &js) {
                        warn!(?e, "Subscriber callback threw");
                    }
                }
                Err(e) => error!(?e, "Failed to convert value for subscriber"),
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    });
}

/// Tracker connection for JS pages.
///
/// Connects to the page's own host. `stats` is whatever JSON the server
/// sends, or `default_stats` (`{}` if omitted) until the first payload.
#[wasm_bindgen]
pub struct TrackerLink {
    client: WsTrackerClient<Value>,
}

#[wasm_bindgen]
impl TrackerLink {
    #[wasm_bindgen(constructor)]
    pub fn new(default_stats: JsValue) -> std::result::Result<TrackerLink, JsValue> {
        let default_stats = js_to_json(&default_stats)?;
        let client = WsTrackerClient::from_page(default_stats).map_err(to_js_error)?;
        Ok(TrackerLink { client })
    }

    pub fn stats(&self) -> std::result::Result<JsValue, JsValue> {
        json_to_js(&self.client.handle().stats())
    }

    pub fn connected(&self) -> bool {
        self.client.handle().is_connected()
    }

    pub fn ruleset(&self) -> u8 {
        self.client.handle().ruleset().as_u8()
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.client.handle().phase())
    }

    pub fn reconnect(&self) {
        self.client.reconnect();
    }

    #[wasm_bindgen(js_name = subscribeStats)]
    pub fn subscribe_stats(&self, callback: js_sys::Function) {
        spawn_subscription(self.client.handle().subscribe_stats(), callback, json_to_js);
    }

    #[wasm_bindgen(js_name = subscribeConnected)]
    pub fn subscribe_connected(&self, callback: js_sys::Function) {
        spawn_subscription(self.client.handle().subscribe_connected(), callback, |c| {
            Ok(JsValue::from_bool(*c))
        });
    }
}
