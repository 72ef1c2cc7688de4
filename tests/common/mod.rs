use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
};

use blinkstick::{Backend, Handle, TransportError};

/// A device that remembers every report written to it and reads it back.
#[derive(Debug, Default)]
pub struct EchoDevice {
	pub serial:  String,
	pub writes:  Vec<(u8, Vec<u8>)>,
	pub reports: HashMap<u8, Vec<u8>>,
}

#[derive(Clone, Default)]
pub struct EchoBackend {
	pub devices: Arc<Mutex<Vec<Arc<Mutex<EchoDevice>>>>>,
}

impl EchoBackend {
	pub fn with_serials(serials: &[&str]) -> Self {
		let backend = Self::default();
		for serial in serials {
			backend.add(serial);
		}
		backend
	}

	pub fn add(&self, serial: &str) -> Arc<Mutex<EchoDevice>> {
		let device = Arc::new(Mutex::new(EchoDevice {
			serial: serial.to_string(),
			..EchoDevice::default()
		}));
		self.devices.lock().unwrap().push(device.clone());
		device
	}
}

impl Backend for EchoBackend {
	type Handle = EchoHandle;

	fn enumerate(&self) -> Result<Vec<Result<EchoHandle, TransportError>>, TransportError> {
		Ok(self
			.devices
			.lock()
			.unwrap()
			.iter()
			.map(|device| Ok(EchoHandle(device.clone())))
			.collect())
	}
}

pub struct EchoHandle(Arc<Mutex<EchoDevice>>);

impl Handle for EchoHandle {
	fn write(
		&self,
		_request_type: u8,
		_request: u8,
		value: u16,
		_index: u16,
		data: &[u8],
	) -> Result<(), TransportError> {
		let mut device = self.0.lock().unwrap();
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
		let device = self.0.lock().unwrap();
		let mut buf = vec![0; length];
		if let Some(report) = device.reports.get(&(value as u8)) {
			let n = report.len().min(length);
			buf[..n].copy_from_slice(&report[..n]);
		}
		buf[0] = value as u8;
		Ok(buf)
	}

	fn serial(&self) -> Result<String, TransportError> {
		Ok(self.0.lock().unwrap().serial.clone())
	}

	fn manufacturer(&self) -> Result<String, TransportError> {
		Ok(String::from("Agile Innovative Ltd"))
	}

	fn product(&self) -> Result<String, TransportError> {
		Ok(String::from("BlinkStick Flex"))
	}
}
