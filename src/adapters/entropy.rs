//! Entropy adapter backed by the platform RNG (`esp_fill_random` on the
//! device, the OS source on the host) through `getrandom`.

use log::warn;

use crate::app::ports::EntropyPort;

#[derive(Default)]
pub struct HwEntropy {
    /// Fallback state if the platform source ever fails.
    fallback: u32,
}

impl HwEntropy {
    pub fn new() -> Self {
        Self { fallback: 0x9E37_79B9 }
    }
}

impl EntropyPort for HwEntropy {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        match getrandom::fill(&mut buf) {
            Ok(()) => u32::from_le_bytes(buf),
            Err(e) => {
                warn!("Entropy: platform RNG failed ({}), using xorshift", e);
                // xorshift32
                let mut x = self.fallback.max(1);
                x ^= x << 13;
                x ^= x >> 17;
                x ^= x << 5;
                self.fallback = x;
                x
            }
        }
    }
}
