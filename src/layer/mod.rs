//! The heat layer: options, immutable state, frame coalescing, the viewport
//! collaborator and the controller tying them to the renderer

mod controller;
mod frame;
mod options;
mod state;
mod viewport;

pub use controller::{render_pass, HeatLayer, HeatLayerController, PassStats};
pub use frame::FrameSlot;
pub use options::HeatOptions;
pub use state::HeatLayerState;
pub use viewport::{PlanarViewport, ViewportHost};
