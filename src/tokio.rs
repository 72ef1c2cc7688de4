//! Animations that yield to the runtime instead of blocking the thread while they wait.
//!
//! The transfers themselves are short control transfers and still run inline, only the
//! pauses between them are `tokio::time::sleep`s.

use std::{
	ops::{Deref, DerefMut},
	time::Duration,
};

use tracing::trace;

use crate::{
	animation::{blink_steps, morph_steps, Step},
	color::Rgb,
	transport::{Backend, DefaultBackend},
	BlinkStick,
	Result,
};

/// A [`BlinkStick`] whose animations are `async`. Everything else is reachable through
/// `Deref`.
pub struct AsyncBlinkStick<B: Backend = DefaultBackend> {
	inner: BlinkStick<B>,
}

impl AsyncBlinkStick<DefaultBackend> {
	/// Finds the first available BlinkStick.
	///
	/// If more than one device is connected the returned device will be the first the OS lists.
	pub fn find_first() -> Result<Self> {
		BlinkStick::find_first().map(Self::new)
	}

	pub fn find_by_serial(serial: &str) -> Result<Self> {
		BlinkStick::find_by_serial(serial).map(Self::new)
	}
}

impl<B: Backend> AsyncBlinkStick<B> {
	pub fn new(inner: BlinkStick<B>) -> Self {
		Self { inner }
	}

	pub fn inner(&self) -> &BlinkStick<B> {
		&self.inner
	}

	pub fn into_inner(self) -> BlinkStick<B> {
		self.inner
	}

	pub async fn blink(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		repeats: u32,
		delay: Duration,
	) -> Result<()> {
		self.play(channel, index, blink_steps(color, repeats, delay))
			.await
	}

	pub async fn morph(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		duration: Duration,
		steps: u32,
	) -> Result<()> {
		let start = self.inner.get_color(index)?;
		self.play(channel, index, morph_steps(start, color, steps, duration))
			.await
	}

	pub async fn pulse(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		repeats: u32,
		duration: Duration,
		steps: u32,
	) -> Result<()> {
		self.inner.set_color(channel, index, Rgb::BLACK)?;
		for _ in 0..repeats {
			self.morph(channel, index, color, duration, steps).await?;
			self.morph(channel, index, Rgb::BLACK, duration, steps)
				.await?;
		}
		Ok(())
	}

	async fn play(
		&mut self,
		channel: u8,
		index: u8,
		steps: impl IntoIterator<Item = Step>,
	) -> Result<()> {
		trace!(serial = self.inner.serial(), "playing animation");
		for step in steps {
			match step {
				Step::Set(color) => self.inner.set_color(channel, index, color)?,
				Step::Wait(delay) => tokio::time::sleep(delay).await,
			}
		}
		Ok(())
	}
}

impl<B: Backend> From<BlinkStick<B>> for AsyncBlinkStick<B> {
	fn from(inner: BlinkStick<B>) -> Self {
		Self::new(inner)
	}
}

impl<B: Backend> Deref for AsyncBlinkStick<B> {
	type Target = BlinkStick<B>;

	fn deref(&self) -> &Self::Target {
		&self.inner
	}
}

impl<B: Backend> DerefMut for AsyncBlinkStick<B> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.inner
	}
}

#[cfg(test)]
mod tests {
	use blinkstick_shared::COLOR_REPORT_ID;

	use super::*;
	use crate::transport::mock::MockBackend;

	fn stick() -> (
		AsyncBlinkStick<MockBackend>,
		std::rc::Rc<std::cell::RefCell<crate::transport::mock::MockDevice>>,
	) {
		let backend = MockBackend::default();
		let device = backend.add("BS000001-3.0");
		let handle = backend.enumerate().unwrap().remove(0).unwrap();
		(BlinkStick::open(backend, handle).unwrap().into(), device)
	}

	#[tokio::test]
	async fn blink_matches_the_blocking_version() {
		let (mut stick, device) = stick();
		stick
			.blink(0, 0, Rgb::new(1, 2, 3), 2, Duration::from_millis(1))
			.await
			.unwrap();

		assert_eq!(device.borrow().writes_to(COLOR_REPORT_ID), vec![
			vec![0, 1, 2, 3],
			vec![0, 0, 0, 0],
			vec![0, 1, 2, 3],
			vec![0, 0, 0, 0],
		]);
	}

	#[tokio::test]
	async fn pulse_ends_dark() {
		let (mut stick, device) = stick();
		stick
			.pulse(0, 0, Rgb::WHITE, 2, Duration::ZERO, 3)
			.await
			.unwrap();

		let writes = device.borrow().writes_to(COLOR_REPORT_ID);
		// off, then two rounds of (1 + 3 + 1) up and down
		assert_eq!(writes.len(), 21);
		assert_eq!(writes[5], vec![0, 255, 255, 255]);
		assert_eq!(writes.last(), Some(&vec![0, 0, 0, 0]));
	}

	#[tokio::test]
	async fn sync_methods_are_reachable() {
		let (mut stick, _device) = stick();
		stick.set_color(0, 0, Rgb::new(9, 8, 7)).unwrap();

		assert_eq!(stick.get_color(0).unwrap(), Rgb::new(9, 8, 7));
		assert_eq!(stick.into_inner().serial(), "BS000001-3.0");
	}
}
