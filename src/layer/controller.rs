//! Heat layer orchestration: reacts to data, option and viewport changes by
//! scheduling (and coalescing) aggregate + render passes onto its surface.

use super::{FrameSlot, HeatLayerState, HeatOptions, ViewportHost};
use crate::display::PixelBuffer;
use crate::heat::{aggregate, DensityRenderer, WeightedPoint};
use crate::points::HeatPoint;
use std::time::Instant;

/// Counters from one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassStats {
    /// Points in the layer state
    pub input: usize,
    /// Points the host could not project
    pub unprojected: usize,
    /// Points projected outside the surface plus stamp bleed
    pub culled: usize,
    /// Points rejected by the grid (non-finite, non-positive weight)
    pub dropped: usize,
    /// Aggregated points stamped
    pub cells: usize,
    /// Normalizing maximum used
    pub max: f64,
}

/// Capability interface a viewport framework drives a heat layer through
pub trait HeatLayer {
    type Host: ViewportHost;

    /// Take the host, acquire a surface sized to it and draw
    fn attach(&mut self, host: Self::Host);

    /// Release the surface and hand the host back
    fn detach(&mut self) -> Option<Self::Host>;

    /// The view moved or resized: fit the surface and redraw now
    fn on_viewport_changed(&mut self);

    /// Points or options changed: redraw at the next frame
    fn on_data_changed(&mut self);
}

/// One full pass over `state`: project, cull to the bleed bounds, aggregate,
/// stamp and colorize into `surface`. A zero-area surface is skipped.
pub fn render_pass<H: ViewportHost + ?Sized>(
    state: &HeatLayerState,
    host: &H,
    renderer: &DensityRenderer,
    surface: &mut PixelBuffer,
) -> PassStats {
    let mut stats = PassStats {
        input: state.points().len(),
        ..PassStats::default()
    };
    if surface.is_empty() {
        log::debug!("render pass skipped: zero-area surface");
        return stats;
    }

    let r = renderer.stamp().extent();
    let (w, h) = (surface.width() as f64, surface.height() as f64);
    let mut projected = Vec::with_capacity(state.points().len());
    for point in state.points() {
        let Some((x, y)) = host.project(point) else {
            stats.unprojected += 1;
            continue;
        };
        if x < -r || y < -r || x > w + r || y > h + r {
            stats.culled += 1;
            continue;
        }
        projected.push(WeightedPoint::new(x, y, point.weight_or_default()));
    }
    if stats.unprojected > 0 {
        log::trace!("dropped {} unprojectable point(s)", stats.unprojected);
    }

    let options = state.options();
    let aggregation = aggregate(&projected, renderer.cell_size(), options.max_intensity);
    renderer.render(surface, &aggregation.points, aggregation.max, options.min_opacity);

    stats.dropped = aggregation.dropped;
    stats.cells = aggregation.points.len();
    stats.max = aggregation.max;
    stats
}

/// Owns the layer state, the renderer and (while attached) the host and surface
pub struct HeatLayerController<H: ViewportHost> {
    state: HeatLayerState,
    renderer: DensityRenderer,
    host: Option<H>,
    surface: Option<PixelBuffer>,
    frame: FrameSlot,
    last_stats: Option<PassStats>,
}

impl<H: ViewportHost> HeatLayerController<H> {
    pub fn new(points: Vec<HeatPoint>, options: HeatOptions) -> Self {
        let state = HeatLayerState::new(points, options);
        let mut renderer = DensityRenderer::default();
        apply_options(&mut renderer, state.options(), None);
        Self {
            state,
            renderer,
            host: None,
            surface: None,
            frame: FrameSlot::new(),
            last_stats: None,
        }
    }

    /// Replace the whole point set
    pub fn set_points(&mut self, points: Vec<HeatPoint>) {
        self.state = self.state.with_points(points);
        self.on_data_changed();
    }

    /// Append one point
    pub fn add_point(&mut self, point: HeatPoint) {
        self.state = std::mem::take(&mut self.state).with_point(point);
        self.on_data_changed();
    }

    /// Append many points with a single redraw request
    pub fn extend_points(&mut self, points: impl IntoIterator<Item = HeatPoint>) {
        let mut state = std::mem::take(&mut self.state);
        for p in points {
            state = state.with_point(p);
        }
        self.state = state;
        self.on_data_changed();
    }

    /// Replace the options; the stamp and gradient are rebuilt only if they changed
    pub fn set_options(&mut self, options: HeatOptions) {
        let previous = self.state.options().clone();
        self.state = self.state.with_options(options);
        apply_options(&mut self.renderer, self.state.options(), Some(&previous));
        self.on_data_changed();
    }

    /// Schedule a pass for the next frame unless one is already pending,
    /// the layer is detached, or the host is animating
    pub fn request_redraw(&mut self) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if host.is_animating() {
            return;
        }
        if self.frame.schedule() {
            host.request_frame();
        }
    }

    /// Frame callback from the host. Runs one pass with the current state if
    /// a frame was pending.
    pub fn on_frame(&mut self) -> Option<PassStats> {
        if !self.frame.take() {
            return None;
        }
        self.redraw_now()
    }

    fn redraw_now(&mut self) -> Option<PassStats> {
        let host = self.host.as_ref()?;
        let surface = self.surface.as_mut()?;
        let started = Instant::now();
        let stats = render_pass(&self.state, host, &self.renderer, surface);
        log::debug!(
            "render pass: {} points, {} unprojected, {} culled, {} dropped, {} cells, max {:.3}, {:.2}ms",
            stats.input,
            stats.unprojected,
            stats.culled,
            stats.dropped,
            stats.cells,
            stats.max,
            started.elapsed().as_secs_f64() * 1000.0
        );
        self.last_stats = Some(stats);
        Some(stats)
    }

    pub fn state(&self) -> &HeatLayerState {
        &self.state
    }

    pub fn options(&self) -> &HeatOptions {
        self.state.options()
    }

    pub fn renderer(&self) -> &DensityRenderer {
        &self.renderer
    }

    /// Current surface, `None` while detached
    pub fn surface(&self) -> Option<&PixelBuffer> {
        self.surface.as_ref()
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.host.is_some()
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame.is_pending()
    }

    pub fn last_stats(&self) -> Option<PassStats> {
        self.last_stats
    }
}

impl<H: ViewportHost> HeatLayer for HeatLayerController<H> {
    type Host = H;

    fn attach(&mut self, mut host: H) {
        if self.host.is_some() {
            log::warn!("heat layer attached twice, releasing previous host");
            self.detach();
        }
        let (width, height) = host.size();
        host.attach_surface(self.state.options().pane.as_deref());
        log::info!("heat layer attached ({}x{})", width, height);
        self.surface = Some(PixelBuffer::with_size(width, height));
        self.host = Some(host);
        self.frame.take();
        self.redraw_now();
    }

    fn detach(&mut self) -> Option<H> {
        let mut host = self.host.take()?;
        host.detach_surface(self.state.options().pane.as_deref());
        self.surface = None;
        self.frame.take();
        self.last_stats = None;
        log::info!("heat layer detached");
        Some(host)
    }

    fn on_viewport_changed(&mut self) {
        let (Some(host), Some(surface)) = (self.host.as_ref(), self.surface.as_mut()) else {
            return;
        };
        let (width, height) = host.size();
        if surface.resize(width, height) {
            log::info!("heat surface resized to {}x{}", width, height);
        }
        // The immediate pass supersedes any scheduled one
        self.frame.take();
        self.redraw_now();
    }

    fn on_data_changed(&mut self) {
        self.request_redraw();
    }
}

/// Push option changes into the renderer, skipping rebuilds that aren't needed
fn apply_options(renderer: &mut DensityRenderer, options: &HeatOptions, previous: Option<&HeatOptions>) {
    if renderer.set_radius(options.radius, options.blur) {
        log::debug!("stamp rebuilt: radius={} blur={}", options.radius, options.blur);
    }
    let gradient_changed = previous.map_or(true, |p| p.gradient != options.gradient);
    if gradient_changed {
        renderer.set_gradient(options.gradient_stops());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::heat::{ColorStop, MaxIntensity};
    use crate::layer::PlanarViewport;

    fn controller(points: Vec<HeatPoint>) -> HeatLayerController<PlanarViewport> {
        HeatLayerController::new(points, HeatOptions::default())
    }

    #[test]
    fn test_detached_layer_does_not_schedule() {
        let mut layer = controller(Vec::new());
        layer.add_point(HeatPoint::new(0.0, 0.0));
        assert!(!layer.is_attached());
        assert!(!layer.is_frame_pending());
        assert!(layer.surface().is_none());
        assert_eq!(layer.on_frame(), None);
    }

    #[test]
    fn test_attach_renders_immediately() {
        let mut layer = controller(vec![HeatPoint::new(0.0, 0.0)]);
        layer.attach(PlanarViewport::new(100, 80));
        assert!(layer.is_attached());
        let surface = layer.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (100, 80));
        assert!(surface.alpha_at(50, 40) > 0);
        assert_eq!(layer.last_stats().unwrap().cells, 1);
        assert_eq!(layer.host().unwrap().attached_pane(), Some(None));
    }

    #[test]
    fn test_redraw_requests_coalesce() {
        let mut layer = controller(Vec::new());
        layer.attach(PlanarViewport::new(64, 64));
        for i in 0..10 {
            layer.add_point(HeatPoint::new(i as f64, 0.0));
        }
        layer.set_points(vec![HeatPoint::new(0.0, 0.0)]);
        assert!(layer.is_frame_pending());
        assert_eq!(layer.host().unwrap().frame_requests(), 1);

        assert!(layer.host_mut().unwrap().take_frame_request());
        let stats = layer.on_frame().unwrap();
        // The frame reads the latest state
        assert_eq!(stats.input, 1);
        assert!(!layer.is_frame_pending());
        assert_eq!(layer.on_frame(), None);

        layer.add_point(HeatPoint::new(1.0, 1.0));
        assert_eq!(layer.host().unwrap().frame_requests(), 2);
    }

    #[test]
    fn test_animating_host_suppresses_redraw() {
        let mut layer = controller(Vec::new());
        let mut vp = PlanarViewport::new(32, 32);
        vp.set_animating(true);
        layer.attach(vp);
        layer.add_point(HeatPoint::new(0.0, 0.0));
        assert!(!layer.is_frame_pending());
        assert_eq!(layer.host().unwrap().frame_requests(), 0);
    }

    #[test]
    fn test_viewport_resize_preserves_stamp() {
        let mut layer = controller(vec![HeatPoint::new(0.0, 0.0)]);
        layer.attach(PlanarViewport::new(50, 50));
        let stamp_before = layer.renderer().stamp().clone();
        layer.host_mut().unwrap().resize(120, 40);
        layer.on_viewport_changed();
        let surface = layer.surface().unwrap();
        assert_eq!((surface.width(), surface.height()), (120, 40));
        assert_eq!(layer.renderer().stamp(), &stamp_before);
        assert!(surface.alpha_at(60, 20) > 0);
    }

    #[test]
    fn test_viewport_change_consumes_pending_frame() {
        let mut layer = controller(Vec::new());
        layer.attach(PlanarViewport::new(50, 50));
        layer.add_point(HeatPoint::new(0.0, 0.0));
        assert!(layer.is_frame_pending());
        layer.on_viewport_changed();
        assert!(!layer.is_frame_pending());
        assert_eq!(layer.on_frame(), None);
        assert_eq!(layer.last_stats().unwrap().input, 1);
    }

    #[test]
    fn test_zero_area_viewport_is_noop() {
        let mut layer = controller(vec![HeatPoint::new(0.0, 0.0)]);
        layer.attach(PlanarViewport::new(0, 0));
        let stats = layer.last_stats().unwrap();
        assert_eq!(stats.cells, 0);
        assert!(layer.surface().unwrap().is_empty());
    }

    #[test]
    fn test_detach_releases_surface_and_host() {
        let mut layer = HeatLayerController::new(
            vec![HeatPoint::new(0.0, 0.0)],
            HeatOptions {
                pane: Some("overlay".into()),
                ..HeatOptions::default()
            },
        );
        let mut vp = PlanarViewport::new(40, 40);
        layer.attach(vp.clone());
        assert_eq!(layer.host().unwrap().attached_pane(), Some(Some("overlay")));
        layer.add_point(HeatPoint::new(1.0, 1.0));
        vp = layer.detach().unwrap();
        assert_eq!(vp.attached_pane(), None);
        assert!(layer.surface().is_none());
        assert!(!layer.is_attached());
        assert!(!layer.is_frame_pending());
        assert!(layer.detach().is_none());
        // Data survives, render state does not
        assert_eq!(layer.state().points().len(), 2);
        assert!(layer.last_stats().is_none());
    }

    #[test]
    fn test_points_outside_bleed_are_culled() {
        let mut layer = controller(vec![
            HeatPoint::new(0.0, 0.0),
            HeatPoint::new(0.0, 1000.0),
            HeatPoint::new(f64::NAN, 0.0),
        ]);
        layer.attach(PlanarViewport::new(100, 100));
        let stats = layer.last_stats().unwrap();
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.unprojected, 1);
        assert_eq!(stats.cells, 1);
    }

    #[test]
    fn test_set_options_rebuilds_renderer() {
        let mut layer = controller(vec![HeatPoint::new(0.0, 0.0)]);
        layer.attach(PlanarViewport::new(60, 60));
        layer.set_options(HeatOptions {
            radius: 5.0,
            blur: 2.0,
            gradient: Some(vec![ColorStop::new(0.0, Rgba::rgb(1, 2, 3))]),
            max_intensity: MaxIntensity::LegacyFixed,
            ..HeatOptions::default()
        });
        assert_eq!(layer.renderer().stamp().side(), 14);
        assert!(layer.is_frame_pending());
        let stats = layer.on_frame().unwrap();
        assert_eq!(stats.max, 5.0);
        let (r, g, b, a) = layer.surface().unwrap().get_pixel_rgba(30, 30).unwrap();
        assert!(a > 0);
        assert_eq!((r, g, b), (1, 2, 3));
    }

    #[test]
    fn test_invalid_options_fall_back_to_defaults() {
        let mut layer = controller(Vec::new());
        layer.set_options(HeatOptions {
            radius: f64::NAN,
            blur: -2.0,
            ..HeatOptions::default()
        });
        assert_eq!(layer.options().radius, 25.0);
        assert_eq!(layer.renderer().stamp().extent(), 40.0);
    }
}
