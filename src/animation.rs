//! Blink, morph and pulse. None of these have their own wire format: each one is a
//! sequence of plain color writes with pauses in between, planned here and played back by
//! either the blocking [`BlinkStick`] or the async wrapper.

use std::{iter, thread, time::Duration};

use crate::{color::Rgb, transport::Backend, BlinkStick, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Step {
	Set(Rgb),
	Wait(Duration),
}

pub(crate) fn blink_steps(
	color: Rgb,
	repeats: u32,
	delay: Duration,
) -> impl Iterator<Item = Step> {
	(0..repeats).flat_map(move |i| {
		let gap = (i > 0).then_some(Step::Wait(delay));
		gap.into_iter()
			.chain([Step::Set(color), Step::Wait(delay), Step::Set(Rgb::BLACK)])
	})
}

/// `start`, then `steps` evenly spaced blends towards `end` (each followed by a pause),
/// then `end` itself so rounding never leaves the LED short of the target.
pub(crate) fn morph_steps(
	start: Rgb,
	end: Rgb,
	steps: u32,
	duration: Duration,
) -> impl Iterator<Item = Step> {
	let divisions = u64::from(steps) + 1;
	let delay = split(duration, divisions);

	let blends = (1..divisions)
		.flat_map(move |n| [Step::Set(start.blend(end, n, divisions)), Step::Wait(delay)]);

	iter::once(Step::Set(start))
		.chain(blends)
		.chain(iter::once(Step::Set(end)))
}

/// `duration / parts`, truncated to whole nanoseconds.
fn split(duration: Duration, parts: u64) -> Duration {
	const NANOS_PER_SEC: u128 = 1_000_000_000;

	let nanos = duration.as_nanos() / u128::from(parts.max(1));
	Duration::new((nanos / NANOS_PER_SEC) as u64, (nanos % NANOS_PER_SEC) as u32)
}

impl<B: Backend> BlinkStick<B> {
	/// Flashes `color` `repeats` times, `delay` on and `delay` off.
	pub fn blink(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		repeats: u32,
		delay: Duration,
	) -> Result<()> {
		self.play(channel, index, blink_steps(color, repeats, delay))
	}

	/// Fades from the current color of `index` to `color` over `duration`.
	pub fn morph(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		duration: Duration,
		steps: u32,
	) -> Result<()> {
		let start = self.get_color(index)?;
		self.play(channel, index, morph_steps(start, color, steps, duration))
	}

	/// Fades from black to `color` and back, `repeats` times. Each fade takes `duration`.
	pub fn pulse(
		&mut self,
		channel: u8,
		index: u8,
		color: Rgb,
		repeats: u32,
		duration: Duration,
		steps: u32,
	) -> Result<()> {
		self.set_color(channel, index, Rgb::BLACK)?;
		for _ in 0..repeats {
			self.morph(channel, index, color, duration, steps)?;
			self.morph(channel, index, Rgb::BLACK, duration, steps)?;
		}
		Ok(())
	}

	fn play(
		&mut self,
		channel: u8,
		index: u8,
		steps: impl IntoIterator<Item = Step>,
	) -> Result<()> {
		for step in steps {
			match step {
				Step::Set(color) => self.set_color(channel, index, color)?,
				Step::Wait(delay) => thread::sleep(delay),
			}
		}
		Ok(())
	}
}
