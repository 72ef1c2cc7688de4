use std::{thread, time::Duration};

use blinkstick::{BlinkStick, Matrix, MatrixConfig, Mode, Rgb};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let mut stick = BlinkStick::find_first()?;
	stick.set_mode(Mode::Ws2812)?;

	let mut matrix = Matrix::with_device(
		MatrixConfig {
			r_columns: 8,
			r_rows: 8,
			max_rgb_value: 64,
			..MatrixConfig::default()
		},
		&mut stick,
	)?;

	for n in 0..=99u8 {
		matrix.clear();
		matrix.number(0, 1, n / 10, Rgb::new(255, 128, 0))?;
		matrix.number(4, 1, n % 10, Rgb::new(0, 128, 255))?;
		matrix.line(0, 7, (n as usize * 8) / 100, 7, Rgb::WHITE);
		matrix.send_all();

		thread::sleep(Duration::from_millis(100));
	}

	matrix.off();
	Ok(())
}
