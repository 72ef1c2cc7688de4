//! Finding BlinkSticks on the bus.

use tracing::{debug, warn};

use crate::{
	transport::{default_backend, Backend, DefaultBackend, Handle},
	BlinkStick,
	Error,
	Result,
};

/// Lists and opens the BlinkSticks a [`Backend`] can see. A device that fails to open is
/// logged and skipped, it never hides the others.
#[derive(Debug, Clone)]
pub struct DeviceRegistry<B: Backend = DefaultBackend> {
	backend: B,
}

impl DeviceRegistry<DefaultBackend> {
	pub fn new() -> Result<Self> {
		let backend = default_backend().map_err(Error::Enumeration)?;
		Ok(Self { backend })
	}
}

impl<B: Backend> DeviceRegistry<B> {
	pub fn with_backend(backend: B) -> Self {
		Self { backend }
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	fn handles(&self) -> Result<Vec<B::Handle>> {
		let candidates = self.backend.enumerate().map_err(Error::Enumeration)?;
		let total = candidates.len();

		let handles: Vec<_> = candidates
			.into_iter()
			.filter_map(|candidate| match candidate {
				Ok(handle) => Some(handle),
				Err(err) => {
					warn!(error = %err, "skipping BlinkStick that could not be opened");
					None
				}
			})
			.collect();

		debug!("opened {} of {} BlinkSticks", handles.len(), total);
		Ok(handles)
	}

	/// Every attached device, in enumeration order.
	pub fn find_all(&self) -> Result<Vec<BlinkStick<B>>> {
		let mut sticks = Vec::new();
		for handle in self.handles()? {
			match BlinkStick::open(self.backend.clone(), handle) {
				Ok(stick) => sticks.push(stick),
				Err(err) => warn!(error = %err, "skipping BlinkStick without a readable serial"),
			}
		}
		Ok(sticks)
	}

	pub fn find_first(&self) -> Result<Option<BlinkStick<B>>> {
		for handle in self.handles()? {
			match BlinkStick::open(self.backend.clone(), handle) {
				Ok(stick) => return Ok(Some(stick)),
				Err(err) => warn!(error = %err, "skipping BlinkStick without a readable serial"),
			}
		}
		Ok(None)
	}

	/// The device whose serial matches exactly.
	pub fn find_by_serial(&self, serial: &str) -> Result<Option<BlinkStick<B>>> {
		for handle in self.handles()? {
			match handle.serial() {
				Ok(found) if found == serial => {
					match BlinkStick::open(self.backend.clone(), handle) {
						Ok(stick) => return Ok(Some(stick)),
						Err(err) => warn!(serial, error = %err, "skipping BlinkStick that failed to open"),
					}
				}
				Ok(_) => {}
				Err(err) => debug!(error = %err, "could not read serial, skipping"),
			}
		}
		Ok(None)
	}
}
