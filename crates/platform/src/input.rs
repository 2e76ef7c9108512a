//! Mouse and keyboard navigation mapped onto [`WorldCamera`] operations.
//! Kept free of winit types so the mapping can be tested headless.

use corelib::WorldCamera;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 20.0;
/// Zoom factor per wheel line.
pub const WHEEL_STEP: f64 = 1.1;
/// Orbit step for one arrow-key press, in degrees.
pub const NUDGE_DEG: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nudge {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug)]
pub struct OrbitControls {
    /// Orbit degrees per dragged pixel at zoom 1.
    pub drag_deg_per_px: f64,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    zoom: f64,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            drag_deg_per_px: 0.25,
            dragging: false,
            last_cursor: None,
            zoom: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    #[inline]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_dragging(&mut self, pressed: bool) {
        self.dragging = pressed;
    }

    pub fn cursor_left(&mut self) {
        self.last_cursor = None;
    }

    /// Tracks the cursor; while dragging, orbits so the globe follows it.
    /// Returns `true` when the camera moved.
    pub fn cursor_moved(&mut self, camera: &mut WorldCamera, x: f64, y: f64) -> bool {
        let last = self.last_cursor.replace((x, y));
        let Some((lx, ly)) = last.filter(|_| self.dragging) else {
            return false;
        };
        let (dx, dy) = (x - lx, y - ly);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        // Finer steps when zoomed in.
        let k = self.drag_deg_per_px / self.zoom;
        camera.rotate_around_globe(-dx * k, dy * k);
        true
    }

    /// Zooms by [`WHEEL_STEP`] per line, clamped to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    pub fn scroll(&mut self, camera: &mut WorldCamera, lines: f64) {
        self.zoom = (self.zoom * WHEEL_STEP.powf(lines)).clamp(MIN_ZOOM, MAX_ZOOM);
        camera.set_zoom(self.zoom);
    }

    pub fn nudge(&mut self, camera: &mut WorldCamera, dir: Nudge) {
        let step = NUDGE_DEG / self.zoom;
        let (h, v) = match dir {
            Nudge::Left => (-step, 0.0),
            Nudge::Right => (step, 0.0),
            Nudge::Up => (0.0, step),
            Nudge::Down => (0.0, -step),
        };
        camera.rotate_around_globe(h, v);
    }

    pub fn reset(&mut self, camera: &mut WorldCamera, lon_deg: f64, lat_deg: f64, dist: f64) {
        self.zoom = 1.0;
        self.dragging = false;
        camera.set_zoom(1.0);
        camera.set_pose_by_lon_lat(lon_deg, lat_deg, dist);
    }
}
