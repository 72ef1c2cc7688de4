//! Control BlinkStick USB RGB LED controllers.
//!
//! [`BlinkStick`] speaks the device's HID feature-report protocol over plain USB control
//! transfers: single colors, indexed colors on the multi-LED models, whole WS2812 frames,
//! the output mode and the two user info blocks. [`Matrix`] is a frame buffer for a grid
//! of LEDs wired across the three output channels.
//!
//! ```no_run
//! use blinkstick::{BlinkStick, Rgb};
//!
//! let mut stick = BlinkStick::find_first()?;
//! stick.set_color(0, 0, Rgb::new(255, 0, 64))?;
//! # Ok::<(), blinkstick::Error>(())
//! ```

mod animation;
mod color;
mod device;
mod error;
mod matrix;
mod registry;
pub mod transport;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use color::{
	remap,
	remap_reverse,
	resolve_or_black,
	ColorFormat,
	ColorResolver,
	FormattedColor,
	HexColorResolver,
	Rgb,
};
pub use device::{BlinkStick, Config, Mode, Serial, Variant};
pub use error::{Error, Result, TransportError};
pub use matrix::{Channel, LedSink, Matrix, MatrixConfig};
pub use registry::DeviceRegistry;
pub use transport::{Backend, DefaultBackend, DeviceTransport, Handle, UsbBackend};
