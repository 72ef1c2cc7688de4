use std::{
	io,
	sync::{Arc, Mutex},
};

use blinkstick_shared::{
	MANUFACTURER_STRING_INDEX,
	PRODUCT_ID,
	PRODUCT_STRING_INDEX,
	SERIAL_STRING_INDEX,
	VENDOR_ID,
};
use hidapi::{HidApi, HidDevice};
use tracing::debug;

use super::{Backend, Handle};
use crate::TransportError;

/// HID feature reports through `hidapi`, for platforms where the HID driver owns the
/// device. The report id travels in byte 0 of every report instead of `wValue`.
#[derive(Clone)]
pub struct HidBackend {
	api: Arc<Mutex<HidApi>>,
}

impl HidBackend {
	pub fn new() -> Result<Self, TransportError> {
		Ok(Self {
			api: Arc::new(Mutex::new(HidApi::new()?)),
		})
	}
}

impl Backend for HidBackend {
	type Handle = HidHandle;

	fn enumerate(&self) -> Result<Vec<Result<HidHandle, TransportError>>, TransportError> {
		let mut api = self
			.api
			.lock()
			.map_err(|_| io::Error::new(io::ErrorKind::Other, "hid api lock poisoned"))?;
		api.refresh_devices()?;

		let candidates = api
			.device_list()
			.filter(|info| info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID)
			.map(|info| -> Result<HidHandle, TransportError> {
				debug!("found BlinkStick at {:?}", info.path());
				Ok(HidHandle {
					device:       info.open_device(&api)?,
					serial:       info.serial_number().map(str::to_string),
					manufacturer: info.manufacturer_string().map(str::to_string),
					product:      info.product_string().map(str::to_string),
				})
			})
			.collect();

		Ok(candidates)
	}
}

pub struct HidHandle {
	device:       HidDevice,
	serial:       Option<String>,
	manufacturer: Option<String>,
	product:      Option<String>,
}

impl Handle for HidHandle {
	fn write(
		&self,
		_request_type: u8,
		_request: u8,
		value: u16,
		_index: u16,
		data: &[u8],
	) -> Result<(), TransportError> {
		let mut report = data.to_vec();
		match report.first_mut() {
			Some(first) => *first = value as u8,
			None => report.push(value as u8),
		}
		self.device.send_feature_report(&report)?;
		Ok(())
	}

	fn read(
		&self,
		_request_type: u8,
		_request: u8,
		value: u16,
		_index: u16,
		length: usize,
	) -> Result<Vec<u8>, TransportError> {
		let mut buf = vec![0u8; length.max(1)];
		buf[0] = value as u8;
		let n = self.device.get_feature_report(&mut buf)?;
		buf.truncate(n);
		Ok(buf)
	}

	fn serial(&self) -> Result<String, TransportError> {
		self.serial
			.clone()
			.ok_or(TransportError::MissingDescriptor(SERIAL_STRING_INDEX))
	}

	fn manufacturer(&self) -> Result<String, TransportError> {
		self.manufacturer
			.clone()
			.ok_or(TransportError::MissingDescriptor(MANUFACTURER_STRING_INDEX))
	}

	fn product(&self) -> Result<String, TransportError> {
		self.product
			.clone()
			.ok_or(TransportError::MissingDescriptor(PRODUCT_STRING_INDEX))
	}
}
