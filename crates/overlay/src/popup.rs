use foundation::time::Tween;

/// Camera-space depth beyond which the pointer counts as turned away.
pub const FACING_MAX_DEPTH: f64 = 1.0;
pub const OPEN_DURATION_S: f64 = 0.45;
pub const CLOSE_DURATION_S: f64 = 0.3;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PopupState {
    Hidden,
    Opening,
    Visible,
    Closing,
}

impl PopupState {
    pub fn as_str(self) -> &'static str {
        match self {
            PopupState::Hidden => "hidden",
            PopupState::Opening => "opening",
            PopupState::Visible => "visible",
            PopupState::Closing => "closing",
        }
    }
}

/// Visual properties of the pointer, the overlay canvas and the popup element.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Appearance {
    pub pointer_opacity: f64,
    pub overlay_opacity: f64,
    pub popup_opacity: f64,
    pub popup_scale: f64,
}

impl Appearance {
    pub const INITIAL: Appearance = Appearance {
        pointer_opacity: 0.0,
        overlay_opacity: 0.0,
        popup_opacity: 0.0,
        popup_scale: 0.9,
    };

    pub const SHOWN: Appearance = Appearance {
        pointer_opacity: 1.0,
        overlay_opacity: 1.0,
        popup_opacity: 1.0,
        popup_scale: 1.0,
    };

    /// Resting look after a close: the pointer stays faintly visible.
    pub const DIMMED: Appearance = Appearance {
        pointer_opacity: 0.2,
        overlay_opacity: 0.0,
        popup_opacity: 0.0,
        popup_scale: 0.9,
    };
}

/// Popup lifecycle for one pointer.
///
/// Transitions are driven by `open` (a confirmed click or a feed retarget),
/// by `track` (whether the pointer faces the camera this frame) and by `tick`
/// (timeline progress).
#[derive(Debug, Clone, PartialEq)]
pub struct PopupFsm {
    state: PopupState,
    elapsed: f64,
    /// Appearance when the running timeline started.
    from: Appearance,
    /// Appearance while no timeline runs.
    rest: Appearance,
}

impl Default for PopupFsm {
    fn default() -> Self {
        Self {
            state: PopupState::Hidden,
            elapsed: 0.0,
            from: Appearance::INITIAL,
            rest: Appearance::INITIAL,
        }
    }
}

impl PopupFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Starts the opening timeline from the current look, whatever the state.
    pub fn open(&mut self) {
        self.from = self.appearance();
        self.state = PopupState::Opening;
        self.elapsed = 0.0;
    }

    /// Starts the closing timeline. No-op unless opening or visible.
    pub fn close(&mut self) {
        if !matches!(self.state, PopupState::Opening | PopupState::Visible) {
            return;
        }
        self.from = self.appearance();
        self.state = PopupState::Closing;
        self.elapsed = 0.0;
    }

    /// Per-frame visibility check; `depth` is the pointer's camera-space depth.
    pub fn track(&mut self, depth: f64) {
        let facing = depth < FACING_MAX_DEPTH;
        match (facing, self.state) {
            (true, PopupState::Hidden | PopupState::Closing) => self.open(),
            (false, PopupState::Opening | PopupState::Visible) => self.close(),
            _ => {}
        }
    }

    pub fn tick(&mut self, dt: f64) {
        match self.state {
            PopupState::Opening => {
                self.elapsed += dt.max(0.0);
                if self.elapsed >= OPEN_DURATION_S {
                    self.settle(PopupState::Visible, Appearance::SHOWN);
                }
            }
            PopupState::Closing => {
                self.elapsed += dt.max(0.0);
                if self.elapsed >= CLOSE_DURATION_S {
                    self.settle(PopupState::Hidden, Appearance::DIMMED);
                }
            }
            PopupState::Hidden | PopupState::Visible => {}
        }
    }

    fn settle(&mut self, state: PopupState, rest: Appearance) {
        self.state = state;
        self.elapsed = 0.0;
        self.rest = rest;
        self.from = rest;
    }

    /// Whether the popup and connector should be drawn at all.
    pub fn is_shown(&self) -> bool {
        self.state != PopupState::Hidden
    }

    pub fn appearance(&self) -> Appearance {
        let t = self.elapsed;
        let from = self.from;
        match self.state {
            PopupState::Hidden | PopupState::Visible => self.rest,
            PopupState::Opening => Appearance {
                pointer_opacity: Tween::new(from.pointer_opacity, 1.0, 0.0, 0.2).value_at(t),
                overlay_opacity: Tween::new(0.0, 1.0, 0.15, 0.3).value_at(t),
                popup_opacity: Tween::new(0.0, 1.0, 0.25, 0.1).value_at(t),
                popup_scale: Tween::new(0.9, 1.0, 0.25, 0.1).value_at(t),
            },
            PopupState::Closing => Appearance {
                pointer_opacity: Tween::new(from.pointer_opacity, 0.2, 0.0, 0.3).value_at(t),
                overlay_opacity: Tween::new(from.overlay_opacity, 0.0, 0.0, 0.3).value_at(t),
                popup_opacity: Tween::new(from.popup_opacity, 0.0, 0.0, 0.3).value_at(t),
                popup_scale: Tween::new(from.popup_scale, 0.9, 0.0, 0.3).value_at(t),
            },
        }
    }
}
