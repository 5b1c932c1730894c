//! Telemetry feed over a browser WebSocket.
//!
//! The socket callbacks report every event to a shared [`FeedListener`],
//! which decides what to send, which locations to hand on and when to dial
//! again.

use std::cell::RefCell;
use std::rc::Rc;

use telemetry::{FeedConfig, FeedFrame, FeedListener, Location};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{BinaryType, Blob, CloseEvent, Event, MessageEvent, WebSocket};

type LocationSink = Rc<dyn Fn(Vec<Location>)>;

/// The live socket and the callbacks registered on it. Dropped when the next
/// socket is attached.
struct Attached {
    ws: WebSocket,
    _onopen: Closure<dyn FnMut(Event)>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
}

impl Attached {
    fn detach(&self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onclose(None);
    }
}

#[derive(Clone)]
pub struct FeedConnection {
    listener: Rc<RefCell<FeedListener>>,
    attached: Rc<RefCell<Option<Attached>>>,
    sink: LocationSink,
}

impl FeedConnection {
    pub fn new(config: FeedConfig, sink: impl Fn(Vec<Location>) + 'static) -> Self {
        Self {
            listener: Rc::new(RefCell::new(FeedListener::new(config))),
            attached: Rc::new(RefCell::new(None)),
            sink: Rc::new(sink),
        }
    }

    pub fn state(&self) -> telemetry::ConnectionState {
        self.listener.borrow().state()
    }

    /// Stops reconnecting and closes the open socket, if any.
    pub fn stop(&self) {
        self.listener.borrow_mut().stop();
        if let Some(attached) = self.attached.borrow().as_ref()
            && let Err(err) = attached.ws.close()
        {
            web_sys::console::log_1(&JsValue::from_str(&format!(
                "feed close failed: {err:?}"
            )));
        }
    }

    /// Dials the feed unless already connected or stopped.
    pub fn connect(&self) {
        let Some(endpoint) = self
            .listener
            .borrow_mut()
            .begin_connect()
            .map(str::to_string)
        else {
            return;
        };

        match WebSocket::new(&endpoint) {
            Ok(ws) => self.attach(ws),
            Err(err) => {
                web_sys::console::log_1(&JsValue::from_str(&format!(
                    "feed socket error: {err:?}"
                )));
                self.schedule_reconnect();
            }
        }
    }

    fn attach(&self, ws: WebSocket) {
        ws.set_binary_type(BinaryType::Blob);

        let onopen: Closure<dyn FnMut(Event)> = {
            let this = self.clone();
            let socket = ws.clone();
            Closure::new(move |_e: Event| {
                let commands = this.listener.borrow_mut().on_open();
                for command in &commands {
                    if let Err(err) = socket.send_with_str(command) {
                        web_sys::console::log_1(&JsValue::from_str(&format!(
                            "feed send failed: {err:?}"
                        )));
                    }
                }
            })
        };
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let onmessage: Closure<dyn FnMut(MessageEvent)> = {
            let this = self.clone();
            Closure::new(move |e: MessageEvent| {
                let data = e.data();
                if let Some(text) = data.as_string() {
                    this.deliver(FeedFrame::Text(text));
                } else if let Ok(blob) = data.dyn_into::<Blob>() {
                    let this = this.clone();
                    spawn_local(async move {
                        match JsFuture::from(blob.text()).await {
                            Ok(text) => {
                                this.deliver(FeedFrame::Text(text.as_string().unwrap_or_default()))
                            }
                            Err(err) => web_sys::console::log_1(&JsValue::from_str(&format!(
                                "feed blob read failed: {err:?}"
                            ))),
                        }
                    });
                }
            })
        };
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let onclose: Closure<dyn FnMut(CloseEvent)> = {
            let this = self.clone();
            Closure::new(move |e: CloseEvent| {
                web_sys::console::log_1(&JsValue::from_str(&format!(
                    "feed closed: code={} reason='{}'",
                    e.code(),
                    e.reason()
                )));
                this.schedule_reconnect();
            })
        };
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        let previous = self.attached.borrow_mut().replace(Attached {
            ws,
            _onopen: onopen,
            _onmessage: onmessage,
            _onclose: onclose,
        });
        if let Some(previous) = previous {
            previous.detach();
        }
    }

    fn deliver(&self, frame: FeedFrame) {
        if self.state() == telemetry::ConnectionState::Stopped {
            return;
        }
        let locations = self.listener.borrow_mut().on_frame(frame);
        if !locations.is_empty() {
            (self.sink)(locations);
        }
    }

    fn schedule_reconnect(&self) {
        let Some(delay) = self.listener.borrow_mut().on_close() else {
            return;
        };
        let Some(window) = web_sys::window() else {
            return;
        };
        let this = self.clone();
        let retry = Closure::once_into_js(move || this.connect());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if let Err(err) = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(retry.unchecked_ref(), millis)
        {
            web_sys::console::log_1(&JsValue::from_str(&format!(
                "feed reconnect scheduling failed: {err:?}"
            )));
        }
    }
}
