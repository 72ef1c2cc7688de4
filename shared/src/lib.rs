#![no_std]

pub const VENDOR_ID: u16 = 0x20a0;
pub const PRODUCT_ID: u16 = 0x41e5;

/// Class request, device recipient, host to device.
pub const REQUEST_TYPE_OUT: u8 = 0x20;
/// Class request, device recipient, device to host.
pub const REQUEST_TYPE_IN: u8 = 0x80 | 0x20;

pub const SET_REPORT: u8 = 0x09;
pub const GET_REPORT: u8 = 0x01;

pub const COLOR_REPORT_ID: u8 = 1;
pub const INFO_BLOCK_1_REPORT_ID: u8 = 2;
pub const INFO_BLOCK_2_REPORT_ID: u8 = 3;
pub const MODE_REPORT_ID: u8 = 4;
pub const INDEXED_COLOR_REPORT_ID: u8 = 5;

pub const COLOR_REPORT_LEN: usize = 33;
pub const INFO_BLOCK_REPORT_LEN: usize = 33;
pub const MODE_REPORT_LEN: usize = 2;

pub const INFO_BLOCK_LEN: usize = 32;
/// First byte of every info block write.
pub const INFO_BLOCK_PREFIX: u8 = 1;

pub const BYTES_PER_LED: usize = 3;
pub const MAX_LEDS_PER_CHANNEL: usize = 64;
pub const CHANNELS: usize = 3;

/// Report id and channel byte in front of every LED data frame.
pub const LED_DATA_HEADER_LEN: usize = 2;

/// `(leds, report id)` pairs, smallest first.
pub const LED_DATA_BUCKETS: [(usize, u8); 4] = [(8, 6), (16, 7), (32, 8), (64, 9)];

pub const MANUFACTURER_STRING_INDEX: u8 = 1;
pub const PRODUCT_STRING_INDEX: u8 = 2;
pub const SERIAL_STRING_INDEX: u8 = 3;

/// Smallest bucket able to hold `count` LEDs, as `(leds, report id)`.
///
/// Returns `None` when `count` exceeds [`MAX_LEDS_PER_CHANNEL`].
pub const fn led_data_bucket(count: usize) -> Option<(usize, u8)> {
	let mut i = 0;
	while i < LED_DATA_BUCKETS.len() {
		if count <= LED_DATA_BUCKETS[i].0 {
			return Some(LED_DATA_BUCKETS[i]);
		}
		i += 1;
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bucket_is_smallest_fit() {
		assert_eq!(led_data_bucket(0), Some((8, 6)));
		assert_eq!(led_data_bucket(1), Some((8, 6)));
		assert_eq!(led_data_bucket(8), Some((8, 6)));
		assert_eq!(led_data_bucket(9), Some((16, 7)));
		assert_eq!(led_data_bucket(16), Some((16, 7)));
		assert_eq!(led_data_bucket(24), Some((32, 8)));
		assert_eq!(led_data_bucket(33), Some((64, 9)));
		assert_eq!(led_data_bucket(64), Some((64, 9)));
	}

	#[test]
	fn bucket_rejects_more_than_a_channel_holds() {
		assert_eq!(led_data_bucket(65), None);
		assert_eq!(led_data_bucket(usize::MAX), None);
	}
}
