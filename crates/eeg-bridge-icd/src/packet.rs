//! Outbound sample packet layout.
//!
//! A packet is `block_count` blocks back to back. Each block is one rolling
//! counter byte followed by the raw frame: a 3-byte status word and a
//! 3-byte big-endian sample per channel.

use ads1299::{SampleRate, BYTES_PER_CHANNEL, MAX_CHANNELS, STATUS_LEN};

pub const COUNTER_LEN: usize = 1;

/// Largest block count the rate table can produce (16 kSPS, normal mode).
pub const MAX_BLOCKS: usize = 1600;

pub const MAX_BLOCK_LEN: usize = block_len(MAX_CHANNELS as u8);

pub const MAX_PACKET_LEN: usize = MAX_BLOCKS * MAX_BLOCK_LEN;

pub const fn block_len(channels: u8) -> usize {
    COUNTER_LEN + STATUS_LEN + BYTES_PER_CHANNEL * channels as usize
}

pub const fn packet_len(blocks: u16, channels: u8) -> usize {
    blocks as usize * block_len(channels)
}

/// Blocks per packet for a rate. Above 1 kSPS a packet carries 100 ms of
/// data (about 33 ms in low-latency mode), otherwise 200 ms (40 ms).
pub const fn block_count(rate: SampleRate, low_latency: bool) -> u16 {
    let hz = rate.hz();
    let blocks = if hz > 1000 {
        if low_latency {
            hz.div_ceil(30)
        } else {
            hz / 10
        }
    } else if low_latency {
        hz / 25
    } else {
        hz / 5
    };
    blocks as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_counts() {
        let expected: [(u16, u16); 7] = [
            (50, 10),
            (100, 20),
            (200, 40),
            (200, 67),
            (400, 134),
            (800, 267),
            (1600, 534),
        ];
        for (rate, (normal, low)) in SampleRate::ALL.iter().zip(expected) {
            assert_eq!(block_count(*rate, false), normal, "{rate:?}");
            assert_eq!(block_count(*rate, true), low, "{rate:?}");
            assert!(block_count(*rate, false) as usize <= MAX_BLOCKS);
        }
    }

    #[test]
    fn lengths() {
        assert_eq!(block_len(8), 28);
        assert_eq!(block_len(4), 16);
        assert_eq!(packet_len(50, 8), 1400);
        assert_eq!(MAX_PACKET_LEN, 44_800);
    }
}
