//! The viewport collaborator the heat layer renders for

use crate::points::HeatPoint;

/// Services the heat layer needs from whatever owns the view: visible size,
/// logical -> surface conversion, frame scheduling and attachment hooks.
pub trait ViewportHost {
    /// Visible area in pixels
    fn size(&self) -> (u32, u32);

    /// Surface-local position of a logical point, `None` if it can't be represented
    fn project(&self, point: &HeatPoint) -> Option<(f64, f64)>;

    /// Ask for a frame callback at the next display refresh
    fn request_frame(&mut self);

    /// Redraws are suppressed while the host animates (e.g. a zoom transition)
    fn is_animating(&self) -> bool {
        false
    }

    /// The layer acquired its surface
    fn attach_surface(&mut self, _pane: Option<&str>) {}

    /// The layer released its surface
    fn detach_surface(&mut self, _pane: Option<&str>) {}
}

/// Linear viewport: logical `(lat, lng)` map to pixels by a uniform scale of
/// `2^zoom` around a center. No geographic projection.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarViewport {
    width: u32,
    height: u32,
    center_lat: f64,
    center_lng: f64,
    zoom: f64,
    animating: bool,
    frame_requested: bool,
    frame_requests: u64,
    attached_pane: Option<Option<String>>,
}

impl PlanarViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            center_lat: 0.0,
            center_lng: 0.0,
            zoom: 0.0,
            animating: false,
            frame_requested: false,
            frame_requests: 0,
            attached_pane: None,
        }
    }

    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.center_lat = lat;
        self.center_lng = lng;
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Pixels per logical unit
    pub fn scale(&self) -> f64 {
        self.zoom.exp2()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn center(&self) -> (f64, f64) {
        (self.center_lat, self.center_lng)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Move the view so content follows a drag of (dx, dy) pixels
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let scale = self.scale();
        self.center_lng -= dx / scale;
        self.center_lat += dy / scale;
    }

    /// Change zoom by `delta`, keeping the logical point under `anchor` fixed
    pub fn zoom_about(&mut self, delta: f64, anchor: (f64, f64)) {
        let before = self.unproject(anchor.0, anchor.1);
        self.zoom += delta;
        let after = self.unproject(anchor.0, anchor.1);
        self.center_lat += before.0 - after.0;
        self.center_lng += before.1 - after.1;
    }

    /// Logical `(lat, lng)` under a surface pixel
    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.scale();
        let lng = (x - self.width as f64 / 2.0) / scale + self.center_lng;
        let lat = self.center_lat - (y - self.height as f64 / 2.0) / scale;
        (lat, lng)
    }

    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
    }

    /// Consume a pending frame request; the driving loop then calls the
    /// layer's frame callback
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    /// Total frames requested so far
    pub fn frame_requests(&self) -> u64 {
        self.frame_requests
    }

    /// `Some(pane)` while a layer surface is attached
    pub fn attached_pane(&self) -> Option<Option<&str>> {
        self.attached_pane.as_ref().map(Option::as_deref)
    }
}

impl ViewportHost for PlanarViewport {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn project(&self, point: &HeatPoint) -> Option<(f64, f64)> {
        let scale = self.scale();
        let x = (point.lng - self.center_lng) * scale + self.width as f64 / 2.0;
        let y = (self.center_lat - point.lat) * scale + self.height as f64 / 2.0;
        let representable = |v: f64| v.is_finite() && v.abs() <= i32::MAX as f64;
        (representable(x) && representable(y)).then_some((x, y))
    }

    fn request_frame(&mut self) {
        self.frame_requested = true;
        self.frame_requests += 1;
    }

    fn is_animating(&self) -> bool {
        self.animating
    }

    fn attach_surface(&mut self, pane: Option<&str>) {
        self.attached_pane = Some(pane.map(str::to_string));
    }

    fn detach_surface(&mut self, _pane: Option<&str>) {
        self.attached_pane = None;
    }
}
