//! Globe interaction and per-frame state, independent of the DOM.

use foundation::math::{GeoPoint, Vec2, Vec3, ViewportRect, pointer_to_ndc, to_lat_long};
use foundation::time::Time;
use markers::{MarkerStore, MarkerStoreError};
use overlay::{Appearance, ClickGate, PopupFsm, PopupPlacement, PopupState, place_popup};
use runtime::{ElapsedClock, FrameClock};
use scene::prefabs::IcoSphere;
use scene::{GlobeScene, MARKER_SIZE, OrbitController, PICK_MAX_DISTANCE, POINTER_SIZE, pick_mesh};
use telemetry::Location;

use crate::config::{GlobeConfig, SurfaceLayout};
use crate::wgpu::{FrameUniforms, SpriteVertex, sprite_quad, sprite_vertices};

/// Ripple time reported before the first click; far past the fade-out.
const NO_RIPPLE_S: f64 = 1.0e3;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum ReadyState {
    #[default]
    Loading,
    Ready,
    Failed,
}

impl ReadyState {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Loading => "loading",
            ReadyState::Ready => "ready",
            ReadyState::Failed => "failed",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Pointer,
    Auto,
}

impl Cursor {
    pub fn as_str(self) -> &'static str {
        match self {
            Cursor::Pointer => "pointer",
            Cursor::Auto => "auto",
        }
    }
}

/// Popup content and layout for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupFrame {
    pub label: String,
    pub placement: PopupPlacement,
    pub appearance: Appearance,
}

/// Everything the DOM and GPU layers apply for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub uniforms: FrameUniforms,
    pub pointer_sprite: Option<[SpriteVertex; 6]>,
    /// Present while the popup is shown.
    pub popup: Option<PopupFrame>,
    pub appearance: Appearance,
    pub cursor: Cursor,
    /// Marker sprites to upload, when markers changed since the last frame.
    pub markers: Option<Vec<SpriteVertex>>,
}

pub struct GlobeApp {
    config: GlobeConfig,
    scene: GlobeScene,
    orbit: OrbitController,
    popup: PopupFsm,
    click_gate: ClickGate,
    ripple: Option<ElapsedClock>,
    frames: FrameClock,
    layout: SurfaceLayout,
    store: Box<dyn MarkerStore>,
    /// Last pointer position over the canvas, for cursor styling.
    hover_ndc: Option<Vec2>,
    markers_dirty: bool,
}

impl GlobeApp {
    /// Builds the scene and places every stored marker. Stored markers are
    /// not written back.
    pub fn new(config: GlobeConfig, store: Box<dyn MarkerStore>, pick: IcoSphere) -> Self {
        let mut scene = GlobeScene::new(pick);
        for point in store.load_all() {
            scene.add_marker(point, None);
        }
        let mut orbit = OrbitController::new(config.orbit());
        let layout = config.layout(1.0, 1.0);
        orbit.set_canvas_height(layout.side_css);
        Self {
            config,
            scene,
            orbit,
            popup: PopupFsm::new(),
            click_gate: ClickGate::default(),
            ripple: None,
            frames: FrameClock::new(),
            layout,
            store,
            hover_ndc: None,
            markers_dirty: true,
        }
    }

    pub fn popup_state(&self) -> PopupState {
        self.popup.state()
    }

    pub fn pointer_label(&self) -> Option<&str> {
        self.scene.pointer().map(|p| p.label.as_str())
    }

    /// Globe dots whose geographic position passes `is_land`.
    pub fn land_dots<F>(&self, is_land: F) -> Vec<SpriteVertex>
    where
        F: FnMut(GeoPoint) -> bool,
    {
        let dots = self.scene.pick_mesh().filtered_vertices(is_land);
        sprite_vertices(dots, 0.0, self.config.dot_color)
    }

    pub fn resize(&mut self, viewport_width: f64, viewport_height: f64) -> SurfaceLayout {
        self.layout = self.config.layout(viewport_width, viewport_height);
        self.orbit.set_canvas_height(self.layout.side_css);
        self.layout
    }

    pub fn pointer_down(&mut self, pos_px: [f64; 2], now: Time) {
        self.orbit.on_pointer_down(pos_px, now);
    }

    pub fn pointer_move(&mut self, pos_px: [f64; 2], client: [f64; 2], rect: ViewportRect) {
        self.orbit.on_pointer_move(pos_px);
        self.hover_ndc = pointer_to_ndc(client[0], client[1], rect);
    }

    pub fn pointer_up(&mut self, now: Time) {
        if let Some(gesture) = self.orbit.on_pointer_up(now) {
            self.click_gate.on_gesture_end(gesture.duration_s);
        }
    }

    fn pick(&self, ndc: Vec2) -> Option<Vec3> {
        let ray = self.orbit.camera().ray_from_ndc(ndc, PICK_MAX_DISTANCE);
        pick_mesh(self.scene.pick_mesh(), ray).map(|hit| hit.face_normal)
    }

    /// A `click` on the canvas. Returns the new pointer label when the click
    /// is confirmed and hits the globe. The picked point is stored even if
    /// persisting fails; the error is returned alongside.
    pub fn click(
        &mut self,
        client: [f64; 2],
        rect: ViewportRect,
        now: Time,
    ) -> Option<(String, Result<(), MarkerStoreError>)> {
        if !self.click_gate.is_click_confirmed() {
            return None;
        }
        let ndc = pointer_to_ndc(client[0], client[1], rect)?;
        let normal = self.pick(ndc)?;

        let label = self.scene.place_pointer(normal, now, true).to_string();
        self.popup.open();
        match self.ripple.as_mut() {
            Some(clock) => clock.restart(now),
            None => self.ripple = Some(ElapsedClock::starting_at(now)),
        }

        let (lat, lon) = to_lat_long(normal);
        let persisted = match GeoPoint::new(lat, lon) {
            Ok(point) => {
                self.scene.add_marker(point, None);
                self.markers_dirty = true;
                self.store.append(point)
            }
            Err(err) => Err(MarkerStoreError::Corrupt(err.to_string())),
        };
        Some((label, persisted))
    }

    /// Plots a feed location and persists it. The popup moves to the new
    /// marker only while it is hidden.
    pub fn add_location(&mut self, location: Location, now: Time) -> Result<(), MarkerStoreError> {
        self.scene.add_marker(location.point, location.name);
        self.markers_dirty = true;
        if self.popup.state() == PopupState::Hidden {
            self.scene.place_pointer(location.point.to_vector(1.0), now, false);
            self.popup.open();
        }
        self.store.append(location.point)
    }

    pub fn marker_count(&self) -> usize {
        self.scene.markers().len()
    }

    /// Advances camera, popup and ripple to `now_ms`, a
    /// `requestAnimationFrame` timestamp.
    pub fn frame(&mut self, now_ms: f64) -> FrameOutput {
        let frame = self.frames.tick(now_ms);
        self.orbit.update(frame.dt_s);
        let camera = self.orbit.camera();

        let pointer_position = self
            .scene
            .pointer()
            .map(|p| p.animated_position(frame.time));
        if let Some(position) = pointer_position {
            self.popup.track(camera.view_depth(position));
        }
        self.popup.tick(frame.dt_s);
        let appearance = self.popup.appearance();

        let popup = match (self.scene.pointer(), pointer_position) {
            (Some(pointer), Some(position)) if self.popup.is_shown() => {
                let side = self.layout.side_css;
                Some(PopupFrame {
                    label: pointer.label.clone(),
                    placement: place_popup(camera.project(position), side, side),
                    appearance,
                })
            }
            _ => None,
        };

        let [r, g, b] = self.config.pointer_color;
        let pointer_sprite = pointer_position.map(|position| {
            sprite_quad(
                position,
                POINTER_SIZE as f32,
                [r, g, b, appearance.pointer_opacity as f32],
            )
        });

        let cursor = match self.hover_ndc.and_then(|ndc| self.pick(ndc)) {
            Some(_) => Cursor::Pointer,
            None => Cursor::Auto,
        };

        let markers = if std::mem::take(&mut self.markers_dirty) {
            Some(sprite_vertices(
                self.scene.markers().iter().map(|m| m.position),
                MARKER_SIZE as f32,
                self.config.marker_color,
            ))
        } else {
            None
        };

        let time_since_click = self
            .ripple
            .map(|clock| clock.elapsed(frame.time))
            .unwrap_or(NO_RIPPLE_S);

        FrameOutput {
            uniforms: FrameUniforms {
                view_proj: camera.view_proj_matrix(),
                camera_back: camera.basis().back.as_f32(),
                half_extent: camera.half_extent as f32,
                dot_size_px: self.layout.dot_size_px(),
                pointer: self
                    .scene
                    .pointer()
                    .map(|p| p.position.as_f32())
                    .unwrap_or([0.0; 3]),
                time_since_click: time_since_click as f32,
            },
            pointer_sprite,
            popup,
            appearance,
            cursor,
            markers,
        }
    }
}
