use std::time::Duration;

use blinkstick::{ColorFormat, DeviceRegistry, Rgb};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let registry = DeviceRegistry::new()?;
	let mut sticks = registry.find_all()?;
	if sticks.is_empty() {
		eyre::bail!("no BlinkStick found");
	}

	for stick in &mut sticks {
		println!("{} ({:?})", stick.serial(), stick.variant());
		println!("  manufacturer: {}", stick.manufacturer()?);
		println!("  description:  {}", stick.description()?);
		println!("  color:        {:?}", stick.get_color_formatted(0, ColorFormat::Hex)?);
		println!("  mode:         {:?}", stick.get_mode()?);
		println!("  info block 1: {:?}", stick.get_info_block1()?);
		println!("  info block 2: {:?}", stick.get_info_block2()?);
	}

	let stick = &mut sticks[0];
	stick.blink(0, 0, Rgb::new(255, 0, 0), 3, Duration::from_millis(200))?;
	stick.morph(0, 0, Rgb::new(0, 0, 255), Duration::from_secs(1), 50)?;
	stick.morph(0, 0, Rgb::BLACK, Duration::from_secs(1), 50)?;

	Ok(())
}
