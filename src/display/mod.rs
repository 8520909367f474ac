mod pixel_buffer;
#[cfg(feature = "viewer")]
mod window;

pub use pixel_buffer::PixelBuffer;
#[cfg(feature = "viewer")]
pub use window::{Display, InputEvent, MouseButtonKind, RenderTarget};

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;
