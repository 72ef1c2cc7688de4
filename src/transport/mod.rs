//! The raw control-transfer primitive and the retry-by-serial wrapper around it.
//!
//! A [`Backend`] lists attached BlinkSticks and hands out [`Handle`]s. A
//! [`DeviceTransport`] owns one handle and, when a transfer fails, looks the
//! device up again by its serial and retries exactly once.

use tracing::{debug, info, warn};

use crate::{Error, Result, TransportError};

mod usb;
pub use usb::{UsbBackend, UsbHandle};

#[cfg(feature = "hid")]
mod hid;
#[cfg(feature = "hid")]
pub use hid::{HidBackend, HidHandle};

#[cfg(test)]
pub(crate) mod mock;

/// The backend used when none is named: HID feature reports on Windows (with the `hid`
/// feature), USB control transfers everywhere else.
#[cfg(all(windows, feature = "hid"))]
pub type DefaultBackend = HidBackend;
#[cfg(not(all(windows, feature = "hid")))]
pub type DefaultBackend = UsbBackend;

#[cfg(all(windows, feature = "hid"))]
pub fn default_backend() -> std::result::Result<DefaultBackend, TransportError> {
	HidBackend::new()
}

#[cfg(not(all(windows, feature = "hid")))]
pub fn default_backend() -> std::result::Result<DefaultBackend, TransportError> {
	Ok(UsbBackend)
}

/// One live connection to a single device.
pub trait Handle {
	fn write(
		&self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		data: &[u8],
	) -> std::result::Result<(), TransportError>;

	/// Reads up to `length` bytes. Devices may answer with less.
	fn read(
		&self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		length: usize,
	) -> std::result::Result<Vec<u8>, TransportError>;

	fn serial(&self) -> std::result::Result<String, TransportError>;
	fn manufacturer(&self) -> std::result::Result<String, TransportError>;
	fn product(&self) -> std::result::Result<String, TransportError>;
}

/// Enumerates attached devices with the BlinkStick vendor and product id.
pub trait Backend: Clone {
	type Handle: Handle;

	/// The outer error means enumeration itself failed, an inner one that a single device
	/// could not be opened.
	fn enumerate(
		&self,
	) -> std::result::Result<Vec<std::result::Result<Self::Handle, TransportError>>, TransportError>;
}

pub struct DeviceTransport<B: Backend> {
	backend: B,
	handle:  B::Handle,
	serial:  String,
}

impl<B: Backend> DeviceTransport<B> {
	/// Binds `handle` and reads its serial, which is used to find the device again later.
	pub fn open(backend: B, handle: B::Handle) -> Result<Self> {
		let serial = handle.serial().map_err(|source| Error::Communication {
			serial: String::from("<unknown>"),
			source,
		})?;

		Ok(Self {
			backend,
			handle,
			serial,
		})
	}

	pub fn serial(&self) -> &str {
		&self.serial
	}

	pub fn control_write(
		&mut self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		data: &[u8],
	) -> Result<()> {
		self.with_retry(|handle| handle.write(request_type, request, value, index, data))
	}

	pub fn control_read(
		&mut self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		length: usize,
	) -> Result<Vec<u8>> {
		self.with_retry(|handle| handle.read(request_type, request, value, index, length))
	}

	pub fn manufacturer(&mut self) -> Result<String> {
		self.with_retry(Handle::manufacturer)
	}

	pub fn product(&mut self) -> Result<String> {
		self.with_retry(Handle::product)
	}

	fn with_retry<T>(
		&mut self,
		mut op: impl FnMut(&B::Handle) -> std::result::Result<T, TransportError>,
	) -> Result<T> {
		let err = match op(&self.handle) {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};

		debug!(serial = %self.serial, error = %err, "transfer failed, looking for device again");
		if !self.reacquire() {
			return Err(Error::Communication {
				serial: self.serial.clone(),
				source: err,
			});
		}

		op(&self.handle).map_err(|source| Error::Communication {
			serial: self.serial.clone(),
			source,
		})
	}

	/// Swaps in a fresh handle for the device with our serial. Returns `false` if it is gone.
	fn reacquire(&mut self) -> bool {
		let candidates = match self.backend.enumerate() {
			Ok(candidates) => candidates,
			Err(err) => {
				warn!(error = %err, "enumeration failed during re-acquisition");
				return false;
			}
		};

		for handle in candidates.into_iter().flatten() {
			match handle.serial() {
				Ok(serial) if serial == self.serial => {
					info!(serial = %self.serial, "re-acquired device");
					self.handle = handle;
					return true;
				}
				_ => continue,
			}
		}

		false
	}
}

#[cfg(test)]
mod tests {
	use blinkstick_shared::{COLOR_REPORT_ID, REQUEST_TYPE_OUT, SET_REPORT};

	use super::{mock::MockBackend, *};

	fn open(backend: &MockBackend) -> DeviceTransport<MockBackend> {
		let handle = backend.enumerate().unwrap().remove(0).unwrap();
		DeviceTransport::open(backend.clone(), handle).unwrap()
	}

	#[test]
	fn caches_serial_on_open() {
		let backend = MockBackend::default();
		backend.add("BS000001-3.0");

		assert_eq!(open(&backend).serial(), "BS000001-3.0");
	}

	#[test]
	fn retries_once_after_replug() {
		let backend = MockBackend::default();
		let device = backend.add("BS000001-3.0");
		let mut transport = open(&backend);

		// the old handle goes stale, enumeration hands out a working one
		device.borrow_mut().replug();

		transport
			.control_write(REQUEST_TYPE_OUT, SET_REPORT, COLOR_REPORT_ID as u16, 0, &[0, 1, 2, 3])
			.unwrap();
		assert_eq!(device.borrow().writes, vec![(COLOR_REPORT_ID, vec![0, 1, 2, 3])]);
	}

	#[test]
	fn fails_when_device_is_gone() {
		let backend = MockBackend::default();
		let device = backend.add("BS000001-3.0");
		let mut transport = open(&backend);

		device.borrow_mut().unplugged = true;

		let err = transport
			.control_write(REQUEST_TYPE_OUT, SET_REPORT, COLOR_REPORT_ID as u16, 0, &[0, 1, 2, 3])
			.unwrap_err();
		assert!(matches!(err, Error::Communication { ref serial, .. } if serial == "BS000001-3.0"));
	}

	#[test]
	fn does_not_pick_up_another_device() {
		let backend = MockBackend::default();
		let device = backend.add("BS000001-3.0");
		let other = backend.add("BS000002-3.0");
		let mut transport = open(&backend);

		device.borrow_mut().unplugged = true;

		assert!(transport
			.control_write(REQUEST_TYPE_OUT, SET_REPORT, COLOR_REPORT_ID as u16, 0, &[0, 1, 2, 3])
			.is_err());
		assert!(other.borrow().writes.is_empty());
	}

	#[test]
	fn second_failure_is_not_retried_again() {
		let backend = MockBackend::default();
		let device = backend.add("BS000001-3.0");
		let mut transport = open(&backend);

		device.borrow_mut().fail_next = 2;

		assert!(transport
			.control_read(0xA0, 0x01, COLOR_REPORT_ID as u16, 0, 33)
			.is_err());
		assert_eq!(device.borrow().fail_next, 0);
	}
}
