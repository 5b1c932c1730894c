use foundation::math::Vec2;

/// Connector stroke color on the overlay canvas.
pub const CONNECTOR_COLOR: &str = "#00ffb2";
pub const CONNECTOR_WIDTH_PX: f64 = 3.0;

/// Above this NDC height the popup hangs below the pointer instead of above.
pub const FLIP_BELOW_NDC_Y: f64 = 0.6;

/// Quadratic curve in overlay pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadCurve {
    pub start: Vec2,
    pub control: Vec2,
    pub end: Vec2,
}

/// Where the popup element and its connector go for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PopupPlacement {
    /// Pointer position in container pixels.
    pub anchor: Vec2,
    /// Popup translation in container pixels, before the percentage shift.
    pub popup: Vec2,
    /// CSS translate percentages applied after `popup`.
    pub shift_percent: Vec2,
    pub below: bool,
    pub connector: QuadCurve,
}

impl PopupPlacement {
    /// CSS `transform` for the popup element.
    pub fn css_transform(&self, scale: f64) -> String {
        format!(
            "translate({:.2}px, {:.2}px) translate({}%, {}%) scale({:.3})",
            self.popup.x, self.popup.y, self.shift_percent.x, self.shift_percent.y, scale
        )
    }
}

/// Lays out the popup next to a pointer at `ndc` inside a `width × height`
/// container.
///
/// The popup is pushed toward the globe center horizontally so it does not
/// cover the pointer, and sits above the pointer unless the pointer is close
/// to the top edge.
pub fn place_popup(ndc: Vec2, width: f64, height: f64) -> PopupPlacement {
    let anchor = Vec2::new((ndc.x + 1.0) * width * 0.5, (1.0 - ndc.y) * height * 0.5);
    let below = ndc.y > FLIP_BELOW_NDC_Y;

    let (gap, inset, bend) = if below {
        (20.0, -5.0, -0.5)
    } else {
        (-20.0, 5.0, 0.1)
    };

    let popup_x = anchor.x - ndc.x * width * 0.3;
    let popup_y = anchor.y + gap;

    let end = Vec2::new(popup_x, popup_y + inset);
    let control = Vec2::new(popup_x + ndc.x * 100.0, end.y + bend * anchor.y);

    PopupPlacement {
        anchor,
        popup: Vec2::new(popup_x, popup_y),
        shift_percent: Vec2::new(-35.0, if below { 0.0 } else { -100.0 }),
        below,
        connector: QuadCurve {
            start: anchor,
            control,
            end,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{PopupPlacement, QuadCurve, place_popup};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    #[test]
    fn centered_pointer_gets_popup_above() {
        let placement = place_popup(Vec2::new(0.0, 0.0), 500.0, 500.0);
        assert_eq!(
            placement,
            PopupPlacement {
                anchor: Vec2::new(250.0, 250.0),
                popup: Vec2::new(250.0, 230.0),
                shift_percent: Vec2::new(-35.0, -100.0),
                below: false,
                connector: QuadCurve {
                    start: Vec2::new(250.0, 250.0),
                    control: Vec2::new(250.0, 260.0),
                    end: Vec2::new(250.0, 235.0),
                },
            }
        );
    }

    #[test]
    fn pointer_near_the_top_flips_popup_below() {
        let placement = place_popup(Vec2::new(0.5, 0.75), 400.0, 400.0);
        assert!(placement.below);
        assert_eq!(placement.anchor, Vec2::new(300.0, 50.0));
        assert_eq!(placement.popup, Vec2::new(240.0, 70.0));
        assert_eq!(placement.shift_percent, Vec2::new(-35.0, 0.0));
        assert_eq!(placement.connector.end, Vec2::new(240.0, 65.0));
        assert_eq!(placement.connector.control, Vec2::new(290.0, 40.0));
    }

    #[test]
    fn flip_threshold_is_exclusive() {
        assert!(!place_popup(Vec2::new(0.0, 0.6), 100.0, 100.0).below);
        assert!(place_popup(Vec2::new(0.0, 0.61), 100.0, 100.0).below);
    }

    #[test]
    fn css_transform_includes_shift_and_scale() {
        let placement = place_popup(Vec2::new(0.0, 0.0), 500.0, 500.0);
        assert_eq!(
            placement.css_transform(0.9),
            "translate(250.00px, 230.00px) translate(-35%, -100%) scale(0.900)"
        );
    }
}
