//! Viewport controller: pan and zoom over the match extent.

use pw_engine::coords::{Rect, Vec2};

/// Share of the viewbox width added or removed per wheel notch.
const ZOOM_STEP: f32 = 0.1;

/// Owns the visible world rectangle.
///
/// Pointer coordinates come in as logical pixels with the origin top-left and
/// are flipped so world y grows upwards. Every mutation ends with a clamp
/// that keeps the view inside the original extent.
#[derive(Debug, Clone)]
pub struct Resizer {
    orig: Rect,
    viewbox: Rect,
    el_size: Vec2,

    hovering: bool,
    dragging: bool,
    last_drag: Vec2,
    mouse_pos: Vec2,
}

impl Resizer {
    /// `viewbox` is `[x, y, w, h]`; `el_size` the element size in pixels.
    pub fn new(viewbox: [f32; 4], el_size: (f32, f32), keep_aspect_ratio: bool) -> Self {
        let el_size = Vec2::new(el_size.0.max(1.0), el_size.1.max(1.0));
        let mut orig = Rect::from_array(viewbox);

        if keep_aspect_ratio {
            let width_pct = orig.size.x / el_size.x;
            let height_pct = orig.size.y / el_size.y;
            let (w0, h0) = (orig.size.x, orig.size.y);

            if width_pct < height_pct {
                orig.size.x = height_pct * el_size.x;
            } else {
                orig.size.y = width_pct * el_size.y;
            }
            orig.origin.x -= (orig.size.x - w0) / 2.0;
            orig.origin.y -= (orig.size.y - h0) / 2.0;
        }

        Self {
            orig,
            viewbox: orig,
            el_size,
            hovering: false,
            dragging: false,
            last_drag: Vec2::new(0.0, 0.0),
            mouse_pos: Vec2::new(0.0, 0.0),
        }
    }

    /// Current `[x, y, w, h]`, as the shaders take it.
    pub fn viewbox(&self) -> [f32; 4] {
        self.viewbox.to_array()
    }

    pub fn rect(&self) -> Rect {
        self.viewbox
    }

    /// The clamp bounds (after aspect correction).
    pub fn original(&self) -> Rect {
        self.orig
    }

    /// Last pointer position in flipped pixel coordinates.
    pub fn mouse_pos(&self) -> [f32; 2] {
        [self.mouse_pos.x, self.mouse_pos.y]
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn mouse_move(&mut self, x: f32, y: f32) {
        self.hovering = true;
        self.mouse_pos = Vec2::new(x, self.el_size.y - y);

        if self.dragging {
            let scale_x = self.viewbox.size.x / self.el_size.x;
            let scale_y = self.viewbox.size.y / self.el_size.y;
            self.viewbox.origin.x += (self.last_drag.x - self.mouse_pos.x) * scale_x;
            self.viewbox.origin.y += (self.last_drag.y - self.mouse_pos.y) * scale_y;
            self.last_drag = self.mouse_pos;
            self.clip();
        }
    }

    pub fn mouse_down(&mut self) {
        self.dragging = true;
        self.last_drag = self.mouse_pos;
    }

    pub fn mouse_up(&mut self) {
        self.dragging = false;
    }

    pub fn mouse_leave(&mut self) {
        self.hovering = false;
        self.dragging = false;
    }

    /// Zooms toward the cursor; positive `delta_y` zooms out.
    ///
    /// Ignored while the pointer is outside the element, and over an empty
    /// extent where there is nothing to zoom.
    pub fn wheel(&mut self, delta_y: f32) {
        if !self.hovering || delta_y == 0.0 || !(self.viewbox.size.x > 0.0) {
            return;
        }

        let step = ZOOM_STEP * self.viewbox.size.x;
        let dx = if delta_y > 0.0 { step } else { -step };
        let dy = dx * self.viewbox.size.y / self.viewbox.size.x;

        self.zoom(dx, dy, self.mouse_pos.x / self.el_size.x, self.mouse_pos.y / self.el_size.y);
    }

    fn zoom(&mut self, dx: f32, dy: f32, cx: f32, cy: f32) {
        let vb = &mut self.viewbox;

        vb.size.x += dx;
        vb.origin.x -= dx * cx;
        vb.size.x = vb.size.x.min(self.orig.size.x);

        vb.size.y += dy;
        vb.origin.y -= dy * cy;
        vb.size.y = vb.size.y.min(self.orig.size.y);

        self.clip();
    }

    fn clip(&mut self) {
        let (o, vb) = (self.orig, &mut self.viewbox);

        vb.origin.x = vb.origin.x.max(o.origin.x);
        vb.origin.y = vb.origin.y.max(o.origin.y);
        vb.origin.x = (vb.origin.x + vb.size.x).min(o.origin.x + o.size.x) - vb.size.x;
        vb.origin.y = (vb.origin.y + vb.size.y).min(o.origin.y + o.size.y) - vb.size.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resizer() -> Resizer {
        Resizer::new([0.0, 0.0, 100.0, 100.0], (400.0, 400.0), true)
    }

    fn assert_inside(r: &Resizer) {
        assert!(
            r.original().contains_rect(r.rect(), 1e-3),
            "{:?} escaped {:?}",
            r.rect(),
            r.original()
        );
    }

    // ── aspect ────────────────────────────────────────────────────────────

    #[test]
    fn aspect_widens_the_narrow_axis() {
        let r = Resizer::new([0.0, 0.0, 10.0, 10.0], (200.0, 100.0), true);
        assert_eq!(r.viewbox(), [-5.0, 0.0, 20.0, 10.0]);

        let r = Resizer::new([0.0, 0.0, 10.0, 10.0], (100.0, 200.0), true);
        assert_eq!(r.viewbox(), [0.0, -5.0, 10.0, 20.0]);
    }

    #[test]
    fn aspect_can_be_disabled() {
        let r = Resizer::new([1.0, 2.0, 10.0, 10.0], (200.0, 100.0), false);
        assert_eq!(r.viewbox(), [1.0, 2.0, 10.0, 10.0]);
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_extent_stays_finite() {
        let mut r = Resizer::new([0.0; 4], (800.0, 600.0), true);
        r.mouse_move(400.0, 300.0);
        r.wheel(1.0);
        r.wheel(-1.0);
        r.mouse_down();
        r.mouse_move(420.0, 310.0);
        assert!(r.viewbox().iter().all(|v| v.is_finite()), "{:?}", r.viewbox());
        assert_eq!(r.viewbox(), [0.0; 4]);
    }

    #[test]
    fn wheel_ignored_while_not_hovering() {
        let mut r = resizer();
        r.wheel(-1.0);
        assert_eq!(r.viewbox(), [0.0, 0.0, 100.0, 100.0]);
    }

    #[test]
    fn zoom_in_toward_cursor() {
        let mut r = resizer();
        r.mouse_move(400.0, 0.0);
        r.wheel(-1.0);

        let [x, y, w, h] = r.viewbox();
        assert_eq!((w, h), (90.0, 90.0));
        assert_eq!((x, y), (10.0, 10.0));
    }

    #[test]
    fn zoom_out_never_exceeds_extent() {
        let mut r = resizer();
        r.mouse_move(200.0, 200.0);
        for _ in 0..5 {
            r.wheel(1.0);
        }
        assert_eq!(r.viewbox(), [0.0, 0.0, 100.0, 100.0]);
    }

    // ── pan ───────────────────────────────────────────────────────────────

    #[test]
    fn drag_moves_view_against_pointer() {
        let mut r = resizer();
        r.mouse_move(200.0, 200.0);
        for _ in 0..3 {
            r.wheel(-1.0);
        }
        let before = r.rect();

        r.mouse_down();
        r.mouse_move(190.0, 200.0);
        r.mouse_up();

        let after = r.rect();
        assert!(after.origin.x > before.origin.x);
        assert_eq!(after.origin.y, before.origin.y);
        assert_inside(&r);
    }

    #[test]
    fn pointer_y_is_flipped() {
        let mut r = resizer();
        r.mouse_move(10.0, 30.0);
        assert_eq!(r.mouse_pos(), [10.0, 370.0]);
    }

    #[test]
    fn leaving_stops_drag_and_hover() {
        let mut r = resizer();
        r.mouse_move(10.0, 10.0);
        r.mouse_down();
        r.mouse_leave();
        assert!(!r.is_dragging());
        assert!(!r.is_hovering());
    }

    #[test]
    fn stays_inside_after_any_sequence() {
        let mut r = Resizer::new([-30.0, 10.0, 80.0, 40.0], (640.0, 480.0), true);
        let moves = [(0.0, 0.0), (640.0, 480.0), (320.0, 12.0), (5.0, 470.0), (600.0, 100.0)];

        for (i, &(x, y)) in moves.iter().cycle().take(40).enumerate() {
            r.mouse_move(x, y);
            match i % 4 {
                0 => r.wheel(-1.0),
                1 => r.mouse_down(),
                2 => r.wheel(1.0),
                _ => r.mouse_up(),
            }
            assert_inside(&r);
        }
    }
}
