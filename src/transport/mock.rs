//! In-memory devices for unit tests. Reads echo back whatever was last written to the
//! same report id.

use std::{cell::RefCell, collections::HashMap, io, rc::Rc};

use super::{Backend, Handle};
use crate::TransportError;

#[derive(Debug, Default)]
pub(crate) struct MockDevice {
	pub serial:            String,
	pub manufacturer:      String,
	pub product:           String,
	/// Every write as `(report id, payload)`.
	pub writes:            Vec<(u8, Vec<u8>)>,
	/// Canned or echoed contents per report id.
	pub reports:           HashMap<u8, Vec<u8>>,
	/// Upcoming transfers that fail.
	pub fail_next:         usize,
	/// Gone from the bus: every transfer fails and enumeration skips it.
	pub unplugged:         bool,
	/// Opening the device during enumeration fails.
	pub fail_open:         bool,
	/// Reads return at most this many bytes.
	pub short_reads:       Option<usize>,
	/// The serial string descriptor cannot be read.
	pub no_serial:         bool,
	/// Serial reads that succeed before it behaves like `no_serial`.
	pub serial_reads_left: Option<usize>,
	generation:            usize,
}

impl MockDevice {
	/// Invalidates every handle handed out so far.
	pub fn replug(&mut self) {
		self.generation += 1;
	}

	pub fn writes_to(&self, report_id: u8) -> Vec<Vec<u8>> {
		self.writes
			.iter()
			.filter(|(id, _)| *id == report_id)
			.map(|(_, data)| data.clone())
			.collect()
	}

	fn check(&mut self, generation: usize) -> Result<(), TransportError> {
		if self.unplugged || generation != self.generation {
			return Err(broken_pipe());
		}
		if self.fail_next > 0 {
			self.fail_next -= 1;
			return Err(broken_pipe());
		}
		Ok(())
	}
}

fn broken_pipe() -> TransportError {
	io::Error::new(io::ErrorKind::BrokenPipe, "mock transfer failed").into()
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend {
	devices: Rc<RefCell<Vec<Rc<RefCell<MockDevice>>>>>,
}

impl MockBackend {
	pub fn add(&self, serial: &str) -> Rc<RefCell<MockDevice>> {
		let device = Rc::new(RefCell::new(MockDevice {
			serial: serial.to_string(),
			manufacturer: String::from("Agile Innovative Ltd"),
			product: String::from("BlinkStick"),
			..Default::default()
		}));
		self.devices.borrow_mut().push(device.clone());
		device
	}
}

impl Backend for MockBackend {
	type Handle = MockHandle;

	fn enumerate(&self) -> Result<Vec<Result<MockHandle, TransportError>>, TransportError> {
		Ok(self
			.devices
			.borrow()
			.iter()
			.filter(|device| !device.borrow().unplugged)
			.map(|device| {
				let state = device.borrow();
				if state.fail_open {
					return Err(broken_pipe());
				}
				Ok(MockHandle {
					device:     device.clone(),
					generation: state.generation,
				})
			})
			.collect())
	}
}

pub(crate) struct MockHandle {
	device:     Rc<RefCell<MockDevice>>,
	generation: usize,
}

impl Handle for MockHandle {
	fn write(
		&self,
		_request_type: u8,
		_request: u8,
		value: u16,
		_index: u16,
		data: &[u8],
	) -> Result<(), TransportError> {
		let mut device = self.device.borrow_mut();
		device.check(self.generation)?;
		device.writes.push((value as u8, data.to_vec()));
		device.reports.insert(value as u8, data.to_vec());
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
		let mut device = self.device.borrow_mut();
		device.check(self.generation)?;

		let mut buf = vec![0u8; length];
		if let Some(report) = device.reports.get(&(value as u8)) {
			let n = report.len().min(length);
			buf[..n].copy_from_slice(&report[..n]);
		}
		if let Some(first) = buf.first_mut() {
			*first = value as u8;
		}
		if let Some(limit) = device.short_reads {
			buf.truncate(limit);
		}
		Ok(buf)
	}

	fn serial(&self) -> Result<String, TransportError> {
		let mut device = self.device.borrow_mut();
		match device.serial_reads_left {
			Some(0) => return Err(TransportError::MissingDescriptor(3)),
			Some(ref mut left) => *left -= 1,
			None => {}
		}
		if device.no_serial {
			return Err(TransportError::MissingDescriptor(3));
		}
		Ok(device.serial.clone())
	}

	fn manufacturer(&self) -> Result<String, TransportError> {
		Ok(self.device.borrow().manufacturer.clone())
	}

	fn product(&self) -> Result<String, TransportError> {
		Ok(self.device.borrow().product.clone())
	}
}
