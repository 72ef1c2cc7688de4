use std::{fmt, str::FromStr};

use nanorand::{Rng, WyRand};
use tracing::warn;

use crate::{Error, Result};

/// An 8 bit per channel color as the caller sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Rgb {
	pub const BLACK: Rgb = Rgb::new(0, 0, 0);
	pub const WHITE: Rgb = Rgb::new(255, 255, 255);

	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// A uniformly random color.
	pub fn random() -> Self {
		let mut rng = WyRand::new();
		Self::new(rng.generate(), rng.generate(), rng.generate())
	}

	/// `255 - v` on every channel, for common-anode wiring.
	pub const fn complement(self) -> Self {
		Self::new(255 - self.r, 255 - self.g, 255 - self.b)
	}

	/// Scales every channel from `0..=255` into `0..=max`.
	pub const fn remap(self, max: u8) -> Self {
		Self::new(remap(self.r, max), remap(self.g, max), remap(self.b, max))
	}

	/// Expands every channel from `0..=max` back into `0..=255`.
	pub const fn remap_reverse(self, max: u8) -> Self {
		Self::new(
			remap_reverse(self.r, max),
			remap_reverse(self.g, max),
			remap_reverse(self.b, max),
		)
	}

	/// The point `n / d` of the way from `self` to `other`, in exact integer steps. Every
	/// channel stays between its two endpoints, so a channel both colors share never moves.
	/// `n` is clamped to `d`, and `d = 0` yields `other`.
	pub fn blend(self, other: Rgb, n: u64, d: u64) -> Rgb {
		if d == 0 {
			return other;
		}
		let n = n.min(d) as i128;
		let d = d as i128;
		let mix = |a: u8, b: u8| (a as i128 + (b as i128 - a as i128) * n / d) as u8;
		Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
	}

	/// Parses `#rrggbb`, `rrggbb`, `#rgb` or `rgb`.
	pub fn from_hex(s: &str) -> Option<Rgb> {
		let digits = s.strip_prefix('#').unwrap_or(s);
		if !digits.is_ascii() {
			return None;
		}

		let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
		match digits.len() {
			6 => Some(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
			3 => {
				let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
				Some(Rgb::new(short(0)?, short(1)?, short(2)?))
			}
			_ => None,
		}
	}

	/// Lowercase `#rrggbb`.
	pub fn to_hex(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl From<(u8, u8, u8)> for Rgb {
	fn from((r, g, b): (u8, u8, u8)) -> Self {
		Self::new(r, g, b)
	}
}

impl From<Rgb> for (u8, u8, u8) {
	fn from(color: Rgb) -> Self {
		(color.r, color.g, color.b)
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_hex())
	}
}

/// Scales `value` from `0..=255` into `0..=max`, truncating.
pub const fn remap(value: u8, max: u8) -> u8 {
	(value as u32 * max as u32 / 255) as u8
}

/// Expands `value` from `0..=max` into `0..=255`, truncating. Values above `max` saturate.
pub const fn remap_reverse(value: u8, max: u8) -> u8 {
	if max == 0 {
		return 0;
	}
	let expanded = value as u32 * 255 / max as u32;
	if expanded > 255 {
		255
	} else {
		expanded as u8
	}
}

/// How [`BlinkStick::get_color_formatted`](crate::BlinkStick::get_color_formatted) reports a
/// color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
	#[default]
	Rgb,
	Hex,
}

impl FromStr for ColorFormat {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"rgb" => Ok(ColorFormat::Rgb),
			"hex" => Ok(ColorFormat::Hex),
			other => Err(Error::UnsupportedColorFormat(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedColor {
	Rgb(Rgb),
	Hex(String),
}

impl FormattedColor {
	pub fn new(color: Rgb, format: ColorFormat) -> Self {
		match format {
			ColorFormat::Rgb => FormattedColor::Rgb(color),
			ColorFormat::Hex => FormattedColor::Hex(color.to_hex()),
		}
	}
}

/// Turns a symbolic color into a triple.
pub trait ColorResolver {
	fn resolve(&self, spec: &str) -> Result<Rgb>;
}

/// Understands hex notation and `random`. Named colors need a resolver with a name table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexColorResolver;

impl ColorResolver for HexColorResolver {
	fn resolve(&self, spec: &str) -> Result<Rgb> {
		let spec = spec.trim();
		if spec == "random" {
			return Ok(Rgb::random());
		}
		Rgb::from_hex(spec).ok_or_else(|| Error::ColorResolution(spec.to_string()))
	}
}

/// Resolves `spec`, falling back to black when the resolver can't make sense of it.
pub fn resolve_or_black(resolver: &impl ColorResolver, spec: &str) -> Rgb {
	resolver.resolve(spec).unwrap_or_else(|err| {
		warn!(error = %err, "using black instead");
		Rgb::BLACK
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remap_round_trip_stays_close() {
		for max in 1..=255u8 {
			let tolerance = (255 + max as u32 - 1) / max as u32;
			for v in 0..=255u8 {
				let back = remap_reverse(remap(v, max), max);
				assert!(
					(v as i32 - back as i32).unsigned_abs() <= tolerance,
					"v={v} max={max} back={back}"
				);
			}
		}
	}

	#[test]
	fn remap_is_identity_at_full_range() {
		for v in 0..=255u8 {
			assert_eq!(remap(v, 255), v);
			assert_eq!(remap_reverse(v, 255), v);
		}
	}

	#[test]
	fn remap_reverse_saturates_above_max() {
		assert_eq!(remap_reverse(200, 100), 255);
		assert_eq!(remap_reverse(10, 0), 0);
	}

	#[test]
	fn hex_parsing() {
		assert_eq!(Rgb::from_hex("#ff3366"), Some(Rgb::new(0xff, 0x33, 0x66)));
		assert_eq!(Rgb::from_hex("00FF00"), Some(Rgb::new(0, 255, 0)));
		assert_eq!(Rgb::from_hex("#f00"), Some(Rgb::new(255, 0, 0)));
		assert_eq!(Rgb::from_hex("#ff33"), None);
		assert_eq!(Rgb::from_hex("#gg0000"), None);
		assert_eq!(Rgb::from_hex("#ff00é"), None);
		assert_eq!(Rgb::new(255, 16, 0).to_hex(), "#ff1000");
	}

	#[test]
	fn color_format_rejects_unknown_names() {
		assert_eq!("hex".parse::<ColorFormat>().unwrap(), ColorFormat::Hex);
		assert!(matches!(
			"hsv".parse::<ColorFormat>(),
			Err(Error::UnsupportedColorFormat(name)) if name == "hsv"
		));
	}

	#[test]
	fn resolver_falls_back_to_black() {
		assert_eq!(resolve_or_black(&HexColorResolver, "#102030"), Rgb::new(16, 32, 48));
		assert_eq!(resolve_or_black(&HexColorResolver, "octarine"), Rgb::BLACK);
		assert!(HexColorResolver.resolve("random").is_ok());
	}

	#[test]
	fn blend_endpoints() {
		let a = Rgb::new(0, 100, 255);
		let b = Rgb::new(255, 0, 0);
		assert_eq!(a.blend(b, 0, 2), a);
		assert_eq!(a.blend(b, 2, 2), b);
		assert_eq!(a.blend(b, 1, 2), Rgb::new(127, 50, 128));
		assert_eq!(a.blend(b, 7, 0), b);
		assert_eq!(a.blend(b, 9, 2), b);
	}

	#[test]
	fn blend_keeps_shared_channels_fixed() {
		for v in 0..=255u8 {
			let start = Rgb::new(v, 0, 255);
			let end = Rgb::new(v, 255, 0);
			for d in 2..=61u64 {
				for n in 0..=d {
					let mid = start.blend(end, n, d);
					assert_eq!(mid.r, v, "r drifted at {n}/{d}");
				}
			}
		}
	}

	#[test]
	fn blend_stays_between_endpoints() {
		let start = Rgb::new(3, 250, 17);
		let end = Rgb::new(200, 1, 17);
		for n in 0..=9 {
			let mid = start.blend(end, n, 9);
			assert!((3..=200).contains(&mid.r));
			assert!((1..=250).contains(&mid.g));
			assert_eq!(mid.b, 17);
		}
	}
}
