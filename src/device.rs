use blinkstick_shared::{
	led_data_bucket,
	BYTES_PER_LED,
	CHANNELS,
	COLOR_REPORT_ID,
	COLOR_REPORT_LEN,
	GET_REPORT,
	INDEXED_COLOR_REPORT_ID,
	INFO_BLOCK_1_REPORT_ID,
	INFO_BLOCK_2_REPORT_ID,
	INFO_BLOCK_LEN,
	INFO_BLOCK_PREFIX,
	INFO_BLOCK_REPORT_LEN,
	LED_DATA_HEADER_LEN,
	MAX_LEDS_PER_CHANNEL,
	MODE_REPORT_ID,
	MODE_REPORT_LEN,
	REQUEST_TYPE_IN,
	REQUEST_TYPE_OUT,
	SET_REPORT,
};
use tracing::{debug, warn};

use crate::{
	color::{ColorFormat, FormattedColor, Rgb},
	transport::{Backend, DefaultBackend, DeviceTransport},
	DeviceRegistry,
	Error,
	Result,
};

/// Per-device settings. Nothing here touches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// Complement every channel on the wire, for common-anode LEDs.
	pub inverse:         bool,
	/// When `false`, failed writes are logged and otherwise ignored.
	pub error_reporting: bool,
	/// Caller values `0..=255` are scaled into `0..=max_rgb_value` before sending.
	pub max_rgb_value:   u8,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			inverse:         false,
			error_reporting: true,
			max_rgb_value:   255,
		}
	}
}

/// What the device does with its R, G and B outputs. Stored on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
	/// One RGB LED driven directly by the three outputs.
	Normal       = 0,
	/// Like `Normal`, with inverted outputs.
	Inverse      = 1,
	/// Up to 64 addressable LEDs on each output.
	Ws2812       = 2,
	/// Addressable LEDs, every output mirrors channel 0.
	Ws2812Mirror = 3,
}

impl Mode {
	pub fn from_byte(byte: u8) -> Option<Mode> {
		match byte {
			0 => Some(Mode::Normal),
			1 => Some(Mode::Inverse),
			2 => Some(Mode::Ws2812),
			3 => Some(Mode::Ws2812Mirror),
			_ => None,
		}
	}
}

/// A parsed `BSnnnnnn-X.Y` serial. `X.Y` is the firmware version, which decides what the
/// device can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Serial {
	pub number: u32,
	pub major:  u8,
	pub minor:  u8,
}

impl Serial {
	pub fn parse(serial: &str) -> Option<Serial> {
		let rest = serial.strip_prefix("BS")?;
		let (number, version) = rest.split_once('-')?;
		let (major, minor) = version.split_once('.')?;

		Some(Serial {
			number: number.parse().ok()?,
			major:  major.parse().ok()?,
			minor:  minor.parse().ok()?,
		})
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
	/// The original single LED BlinkStick.
	BlinkStick,
	/// Three independent channels of addressable LEDs.
	Pro,
	/// Square, Strip, Nano and Flex boards.
	MultiLed,
	Unknown,
}

/// One attached BlinkStick.
pub struct BlinkStick<B: Backend = DefaultBackend> {
	transport: DeviceTransport<B>,
	config:    Config,
}

impl BlinkStick<DefaultBackend> {
	/// Opens the first BlinkStick the OS lists.
	pub fn find_first() -> Result<Self> {
		DeviceRegistry::new()?.find_first()?.ok_or(Error::DeviceNotFound)
	}

	/// Opens the BlinkStick with the given serial.
	pub fn find_by_serial(serial: &str) -> Result<Self> {
		DeviceRegistry::new()?
			.find_by_serial(serial)?
			.ok_or(Error::DeviceNotFound)
	}
}

impl<B: Backend> BlinkStick<B> {
	pub fn open(backend: B, handle: B::Handle) -> Result<Self> {
		Self::with_config(backend, handle, Config::default())
	}

	pub fn with_config(backend: B, handle: B::Handle, config: Config) -> Result<Self> {
		let transport = DeviceTransport::open(backend, handle)?;
		debug!(serial = transport.serial(), "opened BlinkStick");

		Ok(Self { transport, config })
	}

	/// The serial read when the device was opened, e.g. `BS000001-1.0`.
	pub fn serial(&self) -> &str {
		self.transport.serial()
	}

	pub fn variant(&self) -> Variant {
		match Serial::parse(self.serial()).map(|serial| serial.major) {
			Some(1) => Variant::BlinkStick,
			Some(2) => Variant::Pro,
			Some(3) => Variant::MultiLed,
			_ => Variant::Unknown,
		}
	}

	pub fn manufacturer(&mut self) -> Result<String> {
		self.transport.manufacturer()
	}

	pub fn description(&mut self) -> Result<String> {
		self.transport.product()
	}

	pub fn config(&self) -> Config {
		self.config
	}

	pub fn inverse(&self) -> bool {
		self.config.inverse
	}

	pub fn set_inverse(&mut self, inverse: bool) {
		self.config.inverse = inverse;
	}

	pub fn max_rgb_value(&self) -> u8 {
		self.config.max_rgb_value
	}

	pub fn set_max_rgb_value(&mut self, max_rgb_value: u8) {
		self.config.max_rgb_value = max_rgb_value;
	}

	pub fn error_reporting(&self) -> bool {
		self.config.error_reporting
	}

	pub fn set_error_reporting(&mut self, error_reporting: bool) {
		self.config.error_reporting = error_reporting;
	}

	/// Sets LED `index` on `channel`. Channel 0 index 0 uses the short single LED report.
	pub fn set_color(&mut self, channel: u8, index: u8, color: Rgb) -> Result<()> {
		check_channel(channel)?;
		if index as usize >= MAX_LEDS_PER_CHANNEL {
			return Err(Error::TooManyLeds(index as usize + 1));
		}

		let Rgb { r, g, b } = self.encode(color);
		if channel == 0 && index == 0 {
			self.write(COLOR_REPORT_ID, &[0, r, g, b])
		} else {
			self.write(INDEXED_COLOR_REPORT_ID, &[
				INDEXED_COLOR_REPORT_ID,
				channel,
				index,
				r,
				g,
				b,
			])
		}
	}

	pub fn turn_off(&mut self) -> Result<()> {
		self.set_color(0, 0, Rgb::BLACK)
	}

	pub fn set_random_color(&mut self) -> Result<()> {
		self.set_color(0, 0, Rgb::random())
	}

	/// Reads LED `index`. Index 0 comes from the single LED report, anything else from an LED
	/// data frame.
	pub fn get_color(&mut self, index: u8) -> Result<Rgb> {
		let raw = if index == 0 {
			let bytes = self.read(COLOR_REPORT_ID, COLOR_REPORT_LEN)?;
			if bytes.len() < 4 {
				return Err(Error::ShortResponse {
					expected: 4,
					received: bytes.len(),
				});
			}
			Rgb::new(bytes[1], bytes[2], bytes[3])
		} else {
			let data = self.get_led_data(index as usize + 1)?;
			let offset = index as usize * BYTES_PER_LED;
			// frames are green, red, blue
			Rgb::new(data[offset + 1], data[offset], data[offset + 2])
		};

		Ok(self.decode(raw))
	}

	pub fn get_color_formatted(&mut self, index: u8, format: ColorFormat) -> Result<FormattedColor> {
		Ok(FormattedColor::new(self.get_color(index)?, format))
	}

	/// Sends a frame of GRB triples for `channel`, zero padded to the next bucket size.
	pub fn set_led_data(&mut self, channel: u8, data: &[u8]) -> Result<()> {
		check_channel(channel)?;
		let count = data.len().div_ceil(BYTES_PER_LED);
		let (leds, report_id) = led_data_bucket(count).ok_or(Error::TooManyLeds(count))?;

		let mut report = Vec::with_capacity(LED_DATA_HEADER_LEN + leds * BYTES_PER_LED);
		report.extend_from_slice(&[0, channel]);
		report.extend_from_slice(data);
		report.resize(LED_DATA_HEADER_LEN + leds * BYTES_PER_LED, 0);

		self.write(report_id, &report)
	}

	/// Reads the first `count` LEDs of the frame as GRB triples.
	pub fn get_led_data(&mut self, count: usize) -> Result<Vec<u8>> {
		let (leds, report_id) = led_data_bucket(count).ok_or(Error::TooManyLeds(count))?;
		let bytes = self.read(report_id, LED_DATA_HEADER_LEN + leds * BYTES_PER_LED)?;

		let end = LED_DATA_HEADER_LEN + count * BYTES_PER_LED;
		if bytes.len() < end {
			return Err(Error::ShortResponse {
				expected: end,
				received: bytes.len(),
			});
		}
		Ok(bytes[LED_DATA_HEADER_LEN..end].to_vec())
	}

	pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
		self.write(MODE_REPORT_ID, &[MODE_REPORT_ID, mode as u8])
	}

	/// `None` when the device answers too briefly or with a mode this crate doesn't know.
	pub fn get_mode(&mut self) -> Result<Option<Mode>> {
		let bytes = self.read(MODE_REPORT_ID, MODE_REPORT_LEN)?;
		let Some(&byte) = bytes.get(1) else {
			return Ok(None);
		};

		let mode = Mode::from_byte(byte);
		if mode.is_none() {
			warn!(serial = self.serial(), mode = byte, "device reported unknown mode");
		}
		Ok(mode)
	}

	/// The free-form name block.
	pub fn get_info_block1(&mut self) -> Result<String> {
		self.get_info_block(INFO_BLOCK_1_REPORT_ID)
	}

	pub fn get_info_block2(&mut self) -> Result<String> {
		self.get_info_block(INFO_BLOCK_2_REPORT_ID)
	}

	/// Stores at most 32 bytes of `text`. Longer text is rejected.
	pub fn set_info_block1(&mut self, text: &str) -> Result<()> {
		self.set_info_block(INFO_BLOCK_1_REPORT_ID, text)
	}

	pub fn set_info_block2(&mut self, text: &str) -> Result<()> {
		self.set_info_block(INFO_BLOCK_2_REPORT_ID, text)
	}

	fn get_info_block(&mut self, report_id: u8) -> Result<String> {
		let bytes = self.read(report_id, INFO_BLOCK_REPORT_LEN)?;
		let text = bytes.get(1..).unwrap_or_default();
		let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());

		Ok(String::from_utf8_lossy(&text[..end]).into_owned())
	}

	fn set_info_block(&mut self, report_id: u8, text: &str) -> Result<()> {
		self.write(report_id, &info_block_message(text)?)
	}

	fn encode(&self, color: Rgb) -> Rgb {
		let color = color.remap(self.config.max_rgb_value);
		if self.config.inverse {
			color.complement()
		} else {
			color
		}
	}

	fn decode(&self, raw: Rgb) -> Rgb {
		let raw = if self.config.inverse { raw.complement() } else { raw };
		raw.remap_reverse(self.config.max_rgb_value)
	}

	fn write(&mut self, report_id: u8, data: &[u8]) -> Result<()> {
		match self
			.transport
			.control_write(REQUEST_TYPE_OUT, SET_REPORT, report_id as u16, 0, data)
		{
			Err(err @ Error::Communication { .. }) if !self.config.error_reporting => {
				warn!(error = %err, report_id, "ignoring failed write");
				Ok(())
			}
			res => res,
		}
	}

	fn read(&mut self, report_id: u8, length: usize) -> Result<Vec<u8>> {
		self.transport
			.control_read(REQUEST_TYPE_IN, GET_REPORT, report_id as u16, 0, length)
	}
}

fn check_channel(channel: u8) -> Result<()> {
	if channel as usize >= CHANNELS {
		return Err(Error::InvalidChannel(channel));
	}
	Ok(())
}

/// `[1, text.., 0..]`, 33 bytes in total.
fn info_block_message(text: &str) -> Result<Vec<u8>> {
	let bytes = text.as_bytes();
	if bytes.len() > INFO_BLOCK_LEN {
		return Err(Error::InfoBlockTooLong(bytes.len()));
	}

	let mut message = Vec::with_capacity(INFO_BLOCK_REPORT_LEN);
	message.push(INFO_BLOCK_PREFIX);
	message.extend_from_slice(bytes);
	message.resize(INFO_BLOCK_REPORT_LEN, 0);
	Ok(message)
}
