use gloo_net::http::Request;
use std::cell::RefCell;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::JsCast;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    CanvasRenderingContext2d, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent,
    PointerEvent,
};

use foundation::math::ViewportRect;
use foundation::time::Time;
use markers::{InMemoryMarkerStore, LocalStorageMarkerStore, MarkerStore};
use overlay::{CONNECTOR_COLOR, CONNECTOR_WIDTH_PX};
use scene::prefabs::IcoSphere;

pub mod app;
pub mod config;
mod feed;
pub mod land;
pub mod wgpu;

pub use app::{FrameOutput, GlobeApp, ReadyState};
pub use config::{GlobeConfig, SurfaceLayout};

use crate::feed::FeedConnection;
use crate::land::LandMask;
use crate::wgpu::{
    WgpuContext, init_wgpu_from_canvas_id, render_globe, resize_wgpu, set_dot_sprites,
    set_marker_sprites, set_pointer_sprite,
};

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static GLOBE_STARTED: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK_SET: OnceLock<()> = OnceLock::new();
static LOGGER_SET: OnceLock<()> = OnceLock::new();

/// Level of library log records forwarded to the browser console.
const CONSOLE_LOG_LEVEL: log::Level = log::Level::Info;

/// Page elements the globe draws into.
struct Dom {
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    overlay: HtmlCanvasElement,
    overlay_ctx: CanvasRenderingContext2d,
    popup: HtmlElement,
    /// Label currently in the popup, to avoid rewriting its HTML every frame.
    popup_label: Option<String>,
    cursor: &'static str,
}

#[derive(Default)]
struct WebState {
    ready: ReadyState,
    app: Option<GlobeApp>,
    dom: Option<Dom>,
    wgpu: Option<WgpuContext>,
    feed: Option<FeedConnection>,
    frame_callback: Option<Closure<dyn FnMut(f64)>>,
}

thread_local! {
    static STATE: RefCell<WebState> = RefCell::new(WebState::default());
}

/// TLS access that yields `R::default()` during teardown instead of panicking.
fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&RefCell<WebState>) -> R,
    R: Default,
{
    STATE.try_with(f).unwrap_or_default()
}

fn init_panic_hook() {
    PANIC_HOOK_SET.get_or_init(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = info.to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }));
    });
}

/// Routes `log` records, and `tracing` events from the library crates, to the
/// browser console.
fn init_logging() {
    LOGGER_SET.get_or_init(|| {
        if let Err(err) = console_log::init_with_level(CONSOLE_LOG_LEVEL) {
            log_error(&format!("console logger not installed: {err}"));
        }
    });
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn now() -> Time {
    let ms = web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now);
    Time(ms / 1000.0)
}

fn event_time(e: &web_sys::Event) -> Time {
    Time(e.time_stamp() / 1000.0)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    init_panic_hook();
    init_logging();
    Ok(())
}

/// Builds the globe into the page. `config_json` is a (possibly empty)
/// [`GlobeConfig`] object. Progress is reported through [`ready_state`].
#[wasm_bindgen]
pub fn init_globe(config_json: &str) -> Result<(), JsValue> {
    let config = GlobeConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&format!("invalid globe config: {e}")))?;
    if GLOBE_STARTED.swap(true, Ordering::SeqCst) {
        return Err(JsValue::from_str("globe already initialized"));
    }
    with_state(|state| state.borrow_mut().ready = ReadyState::Loading);

    spawn_local(async move {
        let ready = match init_globe_inner(config).await {
            Ok(()) => ReadyState::Ready,
            Err(err) => {
                log_error(&format!("globe init failed: {err:?}"));
                // Allow the page to retry.
                GLOBE_STARTED.store(false, Ordering::SeqCst);
                ReadyState::Failed
            }
        };
        with_state(|state| state.borrow_mut().ready = ready);
    });
    Ok(())
}

#[wasm_bindgen]
pub fn ready_state() -> String {
    with_state(|state| state.borrow().ready).as_str().to_string()
}

#[wasm_bindgen]
pub fn marker_count() -> usize {
    with_state(|state| state.borrow().app.as_ref().map(GlobeApp::marker_count)).unwrap_or(0)
}

/// Coordinates shown in the popup, once a point has been selected.
#[wasm_bindgen]
pub fn pointer_label() -> Option<String> {
    with_state(|state| {
        let s = state.borrow();
        s.app.as_ref()?.pointer_label().map(str::to_string)
    })
}

#[wasm_bindgen]
pub fn popup_state() -> String {
    with_state(|state| {
        state
            .borrow()
            .app
            .as_ref()
            .map(|app| app.popup_state().as_str().to_string())
    })
    .unwrap_or_else(|| "hidden".to_string())
}

#[wasm_bindgen]
pub fn feed_state() -> String {
    with_state(|state| {
        state
            .borrow()
            .feed
            .as_ref()
            .map(|feed| format!("{:?}", feed.state()).to_lowercase())
    })
    .unwrap_or_else(|| "idle".to_string())
}

/// Advances the globe to `now_ms` (a `requestAnimationFrame` timestamp) and
/// draws it. The globe schedules this itself once ready.
#[wasm_bindgen]
pub fn advance_frame(now_ms: f64) -> Result<(), JsValue> {
    let out = with_state(|state| {
        state
            .borrow_mut()
            .app
            .as_mut()
            .map(|app| app.frame(now_ms))
    });
    let Some(out) = out else {
        return Ok(());
    };
    STATE
        .try_with(|state| {
            let mut s = state.borrow_mut();
            let WebState { dom, wgpu, .. } = &mut *s;
            if let Some(dom) = dom.as_mut() {
                apply_dom(dom, &out)?;
            }
            match wgpu.as_mut() {
                Some(ctx) => {
                    if let Some(markers) = &out.markers {
                        set_marker_sprites(ctx, markers);
                    }
                    set_pointer_sprite(ctx, out.pointer_sprite.as_ref());
                    render_globe(ctx, &out.uniforms)
                }
                None => Ok(()),
            }
        })
        .unwrap_or(Ok(()))
}

async fn init_globe_inner(config: GlobeConfig) -> Result<(), JsValue> {
    let dom = Dom::query(&config)?;

    let store: Box<dyn MarkerStore> = match LocalStorageMarkerStore::new(&config.storage_key) {
        Ok(store) => Box::new(store),
        Err(err) => {
            log(&format!("marker persistence disabled: {err}"));
            Box::new(InMemoryMarkerStore::new())
        }
    };
    let mut app = GlobeApp::new(config.clone(), store, IcoSphere::globe());

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let (w, h) = viewport_size(&window)?;
    let layout = app.resize(w, h);
    dom.apply_layout(layout)?;

    let mask = fetch_land_mask(&config.texture_url).await?;
    let dots = app.land_dots(|point| mask.is_land(point, config.land_threshold));
    log(&format!("globe: {} land dots", dots.len() / 6));

    let mut ctx = init_wgpu_from_canvas_id(&config.canvas_id).await?;
    resize_wgpu(&mut ctx, layout.side_px, layout.side_px);
    set_dot_sprites(&mut ctx, &dots);

    with_state(|state| {
        let mut s = state.borrow_mut();
        s.app = Some(app);
        s.dom = Some(dom);
        s.wgpu = Some(ctx);
    });

    install_listeners(&window)?;
    start_frame_loop(&window)?;
    if config.feed_enabled {
        start_feed(&config);
    }
    Ok(())
}

async fn fetch_land_mask(url: &str) -> Result<LandMask, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "globe texture: HTTP {}",
            resp.status()
        )));
    }
    let bytes = resp
        .binary()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    LandMask::from_image_bytes(&bytes)
        .map_err(|e| JsValue::from_str(&format!("globe texture: {e}")))
}

fn viewport_size(window: &web_sys::Window) -> Result<(f64, f64), JsValue> {
    let w = window.inner_width()?.as_f64().unwrap_or(0.0);
    let h = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok((w, h))
}

impl Dom {
    fn query(config: &GlobeConfig) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let by_selector = |selector: &str| -> Result<HtmlElement, JsValue> {
            document
                .query_selector(selector)?
                .ok_or_else(|| JsValue::from_str(&format!("missing {selector}")))?
                .dyn_into::<HtmlElement>()
                .map_err(|_| JsValue::from_str(&format!("{selector} is not an HTML element")))
        };
        let canvas_by_id = |id: &str| -> Result<HtmlCanvasElement, JsValue> {
            document
                .get_element_by_id(id)
                .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| JsValue::from_str(&format!("#{id} is not a canvas")))
        };

        let overlay = canvas_by_id(&config.overlay_canvas_id)?;
        let overlay_ctx = overlay
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            container: by_selector(&config.container_selector)?,
            canvas: canvas_by_id(&config.canvas_id)?,
            overlay,
            overlay_ctx,
            popup: by_selector(&config.popup_selector)?,
            popup_label: None,
            cursor: "auto",
        })
    }

    fn apply_layout(&self, layout: SurfaceLayout) -> Result<(), JsValue> {
        let side = format!("{}px", layout.side_css);
        for el in [&self.container, &*self.canvas, &*self.overlay] {
            let style = el.style();
            style.set_property("width", &side)?;
            style.set_property("height", &side)?;
        }
        self.canvas.set_width(layout.side_px);
        self.canvas.set_height(layout.side_px);
        let overlay_side = layout.side_css.round().max(1.0) as u32;
        self.overlay.set_width(overlay_side);
        self.overlay.set_height(overlay_side);
        Ok(())
    }

    fn rect(&self) -> ViewportRect {
        let r = self.canvas.get_bounding_client_rect();
        ViewportRect {
            left: r.left(),
            top: r.top(),
            width: r.width(),
            height: r.height(),
        }
    }
}

fn apply_dom(dom: &mut Dom, out: &FrameOutput) -> Result<(), JsValue> {
    let cursor = out.cursor.as_str();
    if dom.cursor != cursor {
        dom.canvas.style().set_property("cursor", cursor)?;
        dom.cursor = cursor;
    }

    let ctx = &dom.overlay_ctx;
    let w = f64::from(dom.overlay.width());
    let h = f64::from(dom.overlay.height());
    ctx.clear_rect(0.0, 0.0, w, h);
    dom.overlay
        .style()
        .set_property("opacity", &out.appearance.overlay_opacity.to_string())?;

    let popup_style = dom.popup.style();
    let Some(popup) = &out.popup else {
        popup_style.set_property("visibility", "hidden")?;
        return Ok(());
    };

    let curve = popup.placement.connector;
    ctx.set_stroke_style_str(CONNECTOR_COLOR);
    ctx.set_line_width(CONNECTOR_WIDTH_PX);
    ctx.set_line_cap("round");
    ctx.begin_path();
    ctx.move_to(curve.start.x, curve.start.y);
    ctx.quadratic_curve_to(curve.control.x, curve.control.y, curve.end.x, curve.end.y);
    ctx.stroke();

    if dom.popup_label.as_deref() != Some(popup.label.as_str()) {
        dom.popup.set_inner_html(&popup.label);
        dom.popup_label = Some(popup.label.clone());
    }
    popup_style.set_property("visibility", "visible")?;
    popup_style.set_property(
        "transform",
        &popup.placement.css_transform(popup.appearance.popup_scale),
    )?;
    popup_style.set_property("opacity", &popup.appearance.popup_opacity.to_string())?;
    Ok(())
}

fn listen<E>(
    target: &EventTarget,
    kind: &str,
    handler: impl FnMut(E) + 'static,
) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
{
    let closure = Closure::<dyn FnMut(E)>::new(handler);
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn canvas_rect() -> Option<ViewportRect> {
    with_state(|state| state.borrow().dom.as_ref().map(Dom::rect))
}

fn install_listeners(window: &web_sys::Window) -> Result<(), JsValue> {
    let canvas: EventTarget = with_state(|state| {
        state
            .borrow()
            .dom
            .as_ref()
            .map(|dom| dom.canvas.clone().into())
    })
    .ok_or_else(|| JsValue::from_str("globe canvas missing"))?;

    listen(&canvas, "pointerdown", |e: PointerEvent| {
        let pos = [f64::from(e.client_x()), f64::from(e.client_y())];
        with_state(|state| {
            if let Some(app) = state.borrow_mut().app.as_mut() {
                app.pointer_down(pos, event_time(&e));
            }
        });
    })?;

    listen(window, "pointermove", |e: PointerEvent| {
        let pos = [f64::from(e.client_x()), f64::from(e.client_y())];
        let Some(rect) = canvas_rect() else {
            return;
        };
        with_state(|state| {
            if let Some(app) = state.borrow_mut().app.as_mut() {
                app.pointer_move(pos, pos, rect);
            }
        });
    })?;

    listen(window, "pointerup", |e: PointerEvent| {
        with_state(|state| {
            if let Some(app) = state.borrow_mut().app.as_mut() {
                app.pointer_up(event_time(&e));
            }
        });
    })?;

    listen(&canvas, "click", |e: MouseEvent| {
        let client = [f64::from(e.client_x()), f64::from(e.client_y())];
        let Some(rect) = canvas_rect() else {
            return;
        };
        let result = with_state(|state| {
            let mut s = state.borrow_mut();
            s.app.as_mut()?.click(client, rect, event_time(&e))
        });
        if let Some((_, Err(err))) = result {
            log_error(&format!("marker not persisted: {err}"));
        }
    })?;

    listen(window, "resize", |_e: web_sys::Event| {
        if let Err(err) = on_resize() {
            log_error(&format!("resize failed: {err:?}"));
        }
    })?;

    Ok(())
}

fn on_resize() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let (w, h) = viewport_size(&window)?;
    STATE
        .try_with(|state| {
            let mut s = state.borrow_mut();
            let WebState { app, dom, wgpu, .. } = &mut *s;
            let Some(app) = app.as_mut() else {
                return Ok(());
            };
            let layout = app.resize(w, h);
            if let Some(dom) = dom.as_ref() {
                dom.apply_layout(layout)?;
            }
            if let Some(ctx) = wgpu.as_mut() {
                resize_wgpu(ctx, layout.side_px, layout.side_px);
            }
            Ok(())
        })
        .unwrap_or(Ok(()))
}

fn start_frame_loop(window: &web_sys::Window) -> Result<(), JsValue> {
    let callback = Closure::<dyn FnMut(f64)>::new(|now_ms: f64| {
        if let Err(err) = advance_frame(now_ms) {
            log_error(&format!("frame failed: {err:?}"));
        }
        request_next_frame();
    });
    window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    with_state(|state| state.borrow_mut().frame_callback = Some(callback));
    Ok(())
}

fn request_next_frame() {
    with_state(|state| {
        let s = state.borrow();
        let (Some(window), Some(callback)) = (web_sys::window(), s.frame_callback.as_ref()) else {
            return;
        };
        if let Err(err) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
            log_error(&format!("requestAnimationFrame failed: {err:?}"));
        }
    });
}

fn start_feed(config: &GlobeConfig) {
    let feed = FeedConnection::new(config.feed.clone(), |locations| {
        let errors: Vec<String> = with_state(|state| {
            let mut s = state.borrow_mut();
            let Some(app) = s.app.as_mut() else {
                return Vec::new();
            };
            let at = now();
            locations
                .into_iter()
                .filter_map(|location| app.add_location(location, at).err())
                .map(|err| err.to_string())
                .collect()
        });
        for err in errors {
            log_error(&format!("feed marker not persisted: {err}"));
        }
    });
    with_state(|state| state.borrow_mut().feed = Some(feed.clone()));
    feed.connect();
}

/// Stops reconnecting to the telemetry feed after the current connection.
#[wasm_bindgen]
pub fn stop_feed() {
    if let Some(feed) = with_state(|state| state.borrow().feed.clone()) {
        feed.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{CONSOLE_LOG_LEVEL, init_logging};
    use pretty_assertions::assert_eq;

    #[test]
    fn console_logger_is_installed_once() {
        init_logging();
        init_logging();
        assert_eq!(log::max_level(), CONSOLE_LOG_LEVEL.to_level_filter());
    }
}
