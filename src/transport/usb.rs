use std::time::Duration;

use blinkstick_shared::{PRODUCT_ID, VENDOR_ID};
use nusb::{
	transfer::{Control, ControlType, Recipient},
	Device,
	DeviceInfo,
};
use tracing::debug;

use super::{Backend, Handle};
use crate::TransportError;

const TIMEOUT: Duration = Duration::from_millis(1000);

/// Plain USB control transfers through `nusb`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbBackend;

impl Backend for UsbBackend {
	type Handle = UsbHandle;

	fn enumerate(&self) -> Result<Vec<Result<UsbHandle, TransportError>>, TransportError> {
		let candidates: Vec<_> = nusb::list_devices()?
			.filter(|info| info.vendor_id() == VENDOR_ID && info.product_id() == PRODUCT_ID)
			.map(|info| -> Result<UsbHandle, TransportError> {
				debug!(
					"found BlinkStick on bus {} addr {}",
					info.bus_number(),
					info.device_address()
				);
				let device = info.open()?;
				Ok(UsbHandle { info, device })
			})
			.collect();

		Ok(candidates)
	}
}

pub struct UsbHandle {
	info:   DeviceInfo,
	device: Device,
}

/// Splits a `bmRequestType` byte into what `nusb` wants. The direction bit is implied
/// by the call.
fn control(request_type: u8, request: u8, value: u16, index: u16) -> Control {
	let control_type = match (request_type >> 5) & 0b11 {
		0 => ControlType::Standard,
		1 => ControlType::Class,
		_ => ControlType::Vendor,
	};
	let recipient = match request_type & 0b1_1111 {
		0 => Recipient::Device,
		1 => Recipient::Interface,
		2 => Recipient::Endpoint,
		_ => Recipient::Other,
	};

	Control {
		control_type,
		recipient,
		request,
		value,
		index,
	}
}

impl Handle for UsbHandle {
	fn write(
		&self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		data: &[u8],
	) -> Result<(), TransportError> {
		self.device
			.control_out_blocking(control(request_type, request, value, index), data, TIMEOUT)?;
		Ok(())
	}

	fn read(
		&self,
		request_type: u8,
		request: u8,
		value: u16,
		index: u16,
		length: usize,
	) -> Result<Vec<u8>, TransportError> {
		let mut buf = vec![0u8; length];
		let n = self.device.control_in_blocking(
			control(request_type, request, value, index),
			&mut buf,
			TIMEOUT,
		)?;
		buf.truncate(n);
		Ok(buf)
	}

	fn serial(&self) -> Result<String, TransportError> {
		self.info
			.serial_number()
			.map(str::to_string)
			.ok_or(TransportError::MissingDescriptor(blinkstick_shared::SERIAL_STRING_INDEX))
	}

	fn manufacturer(&self) -> Result<String, TransportError> {
		self.info
			.manufacturer_string()
			.map(str::to_string)
			.ok_or(TransportError::MissingDescriptor(
				blinkstick_shared::MANUFACTURER_STRING_INDEX,
			))
	}

	fn product(&self) -> Result<String, TransportError> {
		self.info
			.product_string()
			.map(str::to_string)
			.ok_or(TransportError::MissingDescriptor(blinkstick_shared::PRODUCT_STRING_INDEX))
	}
}
