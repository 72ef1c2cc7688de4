use blinkstick_shared::{INFO_BLOCK_LEN, MAX_LEDS_PER_CHANNEL};

/// A failure of the raw USB or HID primitive, before any retry logic.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
	#[error("usb transfer failed: {0}")]
	Usb(#[from] nusb::transfer::TransferError),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[cfg(feature = "hid")]
	#[error("hid error: {0}")]
	Hid(#[from] hidapi::HidError),
	#[error("device has no string descriptor {0}")]
	MissingDescriptor(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no BlinkStick device found")]
	DeviceNotFound,
	#[error("could not communicate with BlinkStick {serial} - it may have been removed")]
	Communication {
		serial: String,
		#[source]
		source: TransportError,
	},
	#[error("could not enumerate usb devices: {0}")]
	Enumeration(#[source] TransportError),
	#[error("unsupported color format {0:?}")]
	UnsupportedColorFormat(String),
	#[error("could not resolve color {0:?}")]
	ColorResolution(String),
	#[error("{0} leds do not fit in one channel (max {MAX_LEDS_PER_CHANNEL})")]
	TooManyLeds(usize),
	#[error("channel {0} does not exist (expected 0, 1 or 2)")]
	InvalidChannel(u8),
	#[error("info block text is {0} bytes long (max {INFO_BLOCK_LEN})")]
	InfoBlockTooLong(usize),
	#[error("{0} is not a single decimal digit")]
	InvalidDigit(u8),
	#[error("device answered with {received} bytes (expected {expected})")]
	ShortResponse { expected: usize, received: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
