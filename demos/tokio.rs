use std::time::Duration;

use blinkstick::{resolve_or_black, tokio::AsyncBlinkStick, HexColorResolver};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let color = std::env::args().nth(1).unwrap_or_else(|| String::from("#00ff80"));
	let color = resolve_or_black(&HexColorResolver, &color);

	let mut stick = AsyncBlinkStick::find_first()?;
	println!("pulsing {} on {}", color, stick.serial());

	stick
		.pulse(0, 0, color, 3, Duration::from_millis(500), 25)
		.await?;

	Ok(())
}
