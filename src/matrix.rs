//! A pixel grid spread over up to three LED strips, one per output channel.
//!
//! The strips sit side by side: the R channel owns the leftmost `r_columns` columns, G the
//! next `g_columns`, B the rest. Every channel's frame is its sub-rectangle flattened row
//! by row, so a frame buffer of `rows x cols` turns into three independent LED data frames.

use std::{ops::Range, thread, time::Duration};

use blinkstick_shared::{BYTES_PER_LED, MAX_LEDS_PER_CHANNEL};
use tracing::{trace, warn};

use crate::{color::Rgb, transport::Backend, BlinkStick, Error, Result};

/// Anything that accepts a GRB LED frame for a channel.
pub trait LedSink {
	fn set_led_data(&mut self, channel: u8, data: &[u8]) -> Result<()>;
}

impl<B: Backend> LedSink for BlinkStick<B> {
	fn set_led_data(&mut self, channel: u8, data: &[u8]) -> Result<()> {
		BlinkStick::set_led_data(self, channel, data)
	}
}

impl<S: LedSink + ?Sized> LedSink for &mut S {
	fn set_led_data(&mut self, channel: u8, data: &[u8]) -> Result<()> {
		(**self).set_led_data(channel, data)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
	R = 0,
	G = 1,
	B = 2,
}

impl Channel {
	pub const ALL: [Channel; 3] = [Channel::R, Channel::G, Channel::B];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixConfig {
	pub r_columns:     usize,
	pub r_rows:        usize,
	pub g_columns:     usize,
	pub g_rows:        usize,
	pub b_columns:     usize,
	pub b_rows:        usize,
	/// Pause after each channel in [`Matrix::send_all`].
	pub delay:         Duration,
	pub max_rgb_value: u8,
}

impl Default for MatrixConfig {
	fn default() -> Self {
		Self {
			r_columns:     0,
			r_rows:        0,
			g_columns:     0,
			g_rows:        0,
			b_columns:     0,
			b_rows:        0,
			delay:         Duration::from_millis(2),
			max_rgb_value: 255,
		}
	}
}

/// 3 wide, 5 tall, top row first, bit 2 is the left column.
const DIGITS: [[u8; 5]; 10] = [
	[0b111, 0b101, 0b101, 0b101, 0b111],
	[0b010, 0b110, 0b010, 0b010, 0b111],
	[0b111, 0b001, 0b111, 0b100, 0b111],
	[0b111, 0b001, 0b111, 0b001, 0b111],
	[0b101, 0b101, 0b111, 0b001, 0b001],
	[0b111, 0b100, 0b111, 0b001, 0b111],
	[0b111, 0b100, 0b111, 0b101, 0b111],
	[0b111, 0b001, 0b001, 0b001, 0b001],
	[0b111, 0b101, 0b111, 0b101, 0b111],
	[0b111, 0b101, 0b111, 0b001, 0b111],
];

pub struct Matrix<S> {
	config: MatrixConfig,
	rows:   usize,
	cols:   usize,
	/// `(g, r, b)` per cell, row major.
	data:   Vec<u8>,
	device: Option<S>,
}

impl<S> Matrix<S> {
	/// A blank frame buffer with no device attached.
	///
	/// Every channel spans all `rows` of the grid, so each one must fit
	/// `rows * columns` LEDs into a single LED data frame.
	pub fn new(config: MatrixConfig) -> Result<Self> {
		let rows = config.r_rows.max(config.g_rows).max(config.b_rows);
		for columns in [config.r_columns, config.g_columns, config.b_columns] {
			let leds = rows.checked_mul(columns).unwrap_or(usize::MAX);
			if leds > MAX_LEDS_PER_CHANNEL {
				return Err(Error::TooManyLeds(leds));
			}
		}
		let cols = config
			.r_columns
			.checked_add(config.g_columns)
			.and_then(|cols| cols.checked_add(config.b_columns))
			.ok_or(Error::TooManyLeds(usize::MAX))?;

		Ok(Self {
			config,
			rows,
			cols,
			data: vec![0; rows * cols * BYTES_PER_LED],
			device: None,
		})
	}

	pub fn with_device(config: MatrixConfig, device: S) -> Result<Self> {
		let mut matrix = Self::new(config)?;
		matrix.device = Some(device);
		Ok(matrix)
	}

	/// Returns the previously attached device, if any.
	pub fn attach(&mut self, device: S) -> Option<S> {
		self.device.replace(device)
	}

	pub fn detach(&mut self) -> Option<S> {
		self.device.take()
	}

	pub fn rows(&self) -> usize {
		self.rows
	}

	pub fn cols(&self) -> usize {
		self.cols
	}

	pub fn config(&self) -> &MatrixConfig {
		&self.config
	}

	fn offset(&self, x: usize, y: usize) -> Option<usize> {
		(x < self.cols && y < self.rows).then(|| (y * self.cols + x) * BYTES_PER_LED)
	}

	/// Stores `color` at `(x, y)`, scaled into `0..=max_rgb_value` when `remap` is set.
	/// Returns `false` if the coordinate is outside the grid.
	pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb, remap: bool) -> bool {
		let Some(offset) = self.offset(x, y) else {
			return false;
		};
		let Rgb { r, g, b } = if remap {
			color.remap(self.config.max_rgb_value)
		} else {
			color
		};

		self.data[offset..offset + BYTES_PER_LED].copy_from_slice(&[g, r, b]);
		true
	}

	pub fn get_pixel(&self, x: usize, y: usize) -> Option<Rgb> {
		let offset = self.offset(x, y)?;
		let cell = &self.data[offset..offset + BYTES_PER_LED];
		Some(Rgb::new(cell[1], cell[0], cell[2]))
	}

	pub fn clear(&mut self) {
		self.data.fill(0);
	}

	/// Draws a Bresenham line and returns the plotted points from `(x1, y1)` to `(x2, y2)`.
	pub fn line(
		&mut self,
		x1: usize,
		y1: usize,
		x2: usize,
		y2: usize,
		color: Rgb,
	) -> Vec<(usize, usize)> {
		let points = line_points(x1, y1, x2, y2);
		for &(x, y) in &points {
			self.set_pixel(x, y, color, true);
		}
		points
	}

	/// Outline only.
	pub fn rectangle(&mut self, x1: usize, y1: usize, x2: usize, y2: usize, color: Rgb) {
		self.line(x1, y1, x2, y1, color);
		self.line(x2, y1, x2, y2, color);
		self.line(x2, y2, x1, y2, color);
		self.line(x1, y2, x1, y1, color);
	}

	/// Draws `digit` in a 3x5 glyph with its top left corner at `(x, y)`.
	pub fn number(&mut self, x: usize, y: usize, digit: u8, color: Rgb) -> Result<()> {
		let glyph = DIGITS
			.get(digit as usize)
			.ok_or(Error::InvalidDigit(digit))?;

		for (dy, row) in glyph.iter().enumerate() {
			for dx in 0..3 {
				if row & (0b100 >> dx) == 0 {
					continue;
				}
				if let (Some(px), Some(py)) = (x.checked_add(dx), y.checked_add(dy)) {
					self.set_pixel(px, py, color, true);
				}
			}
		}
		Ok(())
	}

	/// Moves everything one column left. The rightmost column gets the old leftmost one,
	/// or black when `remove` is set.
	pub fn shift_left(&mut self, remove: bool) {
		if self.cols == 0 {
			return;
		}
		let last = self.cols - 1;
		for y in 0..self.rows {
			let wrapped = self.cell(0, y);
			for x in 0..last {
				self.copy_cell((x + 1, y), (x, y));
			}
			self.put_cell(last, y, if remove { [0; 3] } else { wrapped });
		}
	}

	pub fn shift_right(&mut self, remove: bool) {
		if self.cols == 0 {
			return;
		}
		let last = self.cols - 1;
		for y in 0..self.rows {
			let wrapped = self.cell(last, y);
			for x in (1..=last).rev() {
				self.copy_cell((x - 1, y), (x, y));
			}
			self.put_cell(0, y, if remove { [0; 3] } else { wrapped });
		}
	}

	pub fn shift_up(&mut self, remove: bool) {
		if self.rows == 0 {
			return;
		}
		let last = self.rows - 1;
		for x in 0..self.cols {
			let wrapped = self.cell(x, 0);
			for y in 0..last {
				self.copy_cell((x, y + 1), (x, y));
			}
			self.put_cell(x, last, if remove { [0; 3] } else { wrapped });
		}
	}

	pub fn shift_down(&mut self, remove: bool) {
		if self.rows == 0 {
			return;
		}
		let last = self.rows - 1;
		for x in 0..self.cols {
			let wrapped = self.cell(x, last);
			for y in (1..=last).rev() {
				self.copy_cell((x, y - 1), (x, y));
			}
			self.put_cell(x, 0, if remove { [0; 3] } else { wrapped });
		}
	}

	// raw cell access for shifting, callers stay in bounds
	fn cell(&self, x: usize, y: usize) -> [u8; 3] {
		let offset = (y * self.cols + x) * BYTES_PER_LED;
		[self.data[offset], self.data[offset + 1], self.data[offset + 2]]
	}

	fn put_cell(&mut self, x: usize, y: usize, cell: [u8; 3]) {
		let offset = (y * self.cols + x) * BYTES_PER_LED;
		self.data[offset..offset + BYTES_PER_LED].copy_from_slice(&cell);
	}

	fn copy_cell(&mut self, (from_x, from_y): (usize, usize), (to_x, to_y): (usize, usize)) {
		let cell = self.cell(from_x, from_y);
		self.put_cell(to_x, to_y, cell);
	}

	fn columns(&self, channel: Channel) -> Range<usize> {
		let MatrixConfig {
			r_columns,
			g_columns,
			b_columns,
			..
		} = self.config;

		match channel {
			Channel::R => 0..r_columns,
			Channel::G => r_columns..r_columns + g_columns,
			Channel::B => r_columns + g_columns..r_columns + g_columns + b_columns,
		}
	}

	/// The GRB frame for `channel`: its columns of every row, top to bottom.
	pub fn channel_frame(&self, channel: Channel) -> Vec<u8> {
		let columns = self.columns(channel);
		let mut frame = Vec::with_capacity(self.rows * columns.len() * BYTES_PER_LED);
		for y in 0..self.rows {
			let row = y * self.cols;
			frame.extend_from_slice(
				&self.data[(row + columns.start) * BYTES_PER_LED..(row + columns.end) * BYTES_PER_LED],
			);
		}
		frame
	}
}

impl<S: LedSink> Matrix<S> {
	/// Pushes one channel to the device. Failures are logged, never returned.
	pub fn send_channel(&mut self, channel: Channel) {
		let frame = self.channel_frame(channel);
		let Some(device) = self.device.as_mut() else {
			warn!(?channel, "no device attached, dropping frame");
			return;
		};

		trace!(?channel, bytes = frame.len(), "sending frame");
		if let Err(err) = device.set_led_data(channel as u8, &frame) {
			warn!(?channel, error = %err, "failed to send frame");
		}
	}

	/// Sends every channel that has columns, R then G then B, pausing after each.
	pub fn send_all(&mut self) {
		for channel in Channel::ALL {
			if self.columns(channel).is_empty() {
				continue;
			}
			self.send_channel(channel);
			thread::sleep(self.config.delay);
		}
	}

	/// Clears the buffer and sends it.
	pub fn off(&mut self) {
		self.clear();
		self.send_all();
	}
}

/// Integer Bresenham, in the order the endpoints were given. Works in `i128` so any pair of
/// `usize` coordinates has a representable difference.
fn line_points(x1: usize, y1: usize, x2: usize, y2: usize) -> Vec<(usize, usize)> {
	let (mut x1, mut y1, mut x2, mut y2) = (x1 as i128, y1 as i128, x2 as i128, y2 as i128);

	let steep = (y2 - y1).abs() > (x2 - x1).abs();
	if steep {
		(x1, y1) = (y1, x1);
		(x2, y2) = (y2, x2);
	}

	let reversed = x1 > x2;
	if reversed {
		(x1, x2) = (x2, x1);
		(y1, y2) = (y2, y1);
	}

	let dx = x2 - x1;
	let dy = (y2 - y1).abs();
	let y_step = if y1 < y2 { 1 } else { -1 };
	let mut error = dx / 2;
	let mut y = y1;

	let mut points = Vec::new();
	for x in x1..=x2 {
		let (px, py) = if steep { (y, x) } else { (x, y) };
		points.push((px as usize, py as usize));

		error -= dy;
		if error < 0 {
			y += y_step;
			error += dx;
		}
	}

	if reversed {
		points.reverse();
	}
	points
}
