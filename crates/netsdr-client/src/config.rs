use std::time::Duration;

/// Configuration applied when a session connects and streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// I/Q output sample rate requested from the device. Default: 100 kHz.
    pub sample_rate_hz: u32,
    /// RF filter mode. Default: 0 (automatic selection).
    pub rf_filter_mode: u16,
    /// A/D modes parameters: channel followed by mode flags. Default: dither + gain.
    pub ad_mode: [u8; 2],
    /// Width of one streamed sample in bits. Default: 16.
    pub sample_bits: u32,
    /// How long to wait for a control acknowledgement. Default: forever.
    ///
    /// Without a timeout a silent device keeps the caller waiting until
    /// `disconnect` is called.
    pub request_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 100_000,
            rf_filter_mode: 0,
            ad_mode: [0x00, 0x03],
            sample_bits: 16,
            request_timeout: None,
        }
    }
}
