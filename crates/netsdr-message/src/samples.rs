//! Integer sample decoding for data-item bodies.

use crate::error::{MessageError, Result};

/// Widest sample the decoder accepts.
// TODO: confirm the device ceiling against the NetSDR interface spec; 32 bits
// covers every capture mode this client enables.
pub const MAX_SAMPLE_BITS: u32 = 32;

/// Lazily decode `body` into little-endian integer samples of `bit_width` bits.
///
/// Each sample occupies `ceil(bit_width / 8)` bytes and is zero-extended to
/// `u32`. A trailing partial sample is dropped. The iterator is `Clone`, so it
/// can be restarted from the beginning.
pub fn decode_samples(bit_width: u32, body: &[u8]) -> Result<Samples<'_>> {
    if bit_width == 0 || bit_width > MAX_SAMPLE_BITS {
        return Err(MessageError::UnsupportedSampleWidth(bit_width));
    }
    let sample_size = bit_width.div_ceil(8) as usize;
    Ok(Samples {
        chunks: body.chunks_exact(sample_size),
        sample_size,
    })
}

/// Iterator returned by [`decode_samples`].
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    chunks: std::slice::ChunksExact<'a, u8>,
    sample_size: usize,
}

impl Samples<'_> {
    /// Bytes occupied by one sample on the wire.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

impl Iterator for Samples<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let chunk = self.chunks.next()?;
        let mut padded = [0u8; 4];
        padded[..chunk.len()].copy_from_slice(chunk);
        Some(u32::from_le_bytes(padded))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Samples<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixteen_bit_little_endian() {
        let samples: Vec<u32> = decode_samples(16, &[1, 0, 2, 0]).unwrap().collect();
        assert_eq!(samples, vec![1, 2]);

        let samples: Vec<u32> = decode_samples(16, &[0x01, 0x02, 0x03, 0x04])
            .unwrap()
            .collect();
        assert_eq!(samples, vec![0x0201, 0x0403]);
    }

    #[test]
    fn eight_bit_samples() {
        let samples: Vec<u32> = decode_samples(8, &[10, 20, 30]).unwrap().collect();
        assert_eq!(samples, vec![10, 20, 30]);
    }

    #[test]
    fn odd_widths_round_up_to_whole_bytes() {
        // 24-bit samples use 3 bytes; the trailing byte is dropped.
        let decoded = decode_samples(24, &[1, 0, 0, 0xFF, 0xFF, 0xFF, 9]).unwrap();
        assert_eq!(decoded.sample_size(), 3);
        assert_eq!(decoded.collect::<Vec<_>>(), vec![1, 0x00FF_FFFF]);

        let decoded = decode_samples(12, &[0x34, 0x12, 0x01]).unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn thirty_two_bit_is_the_ceiling() {
        let samples: Vec<u32> = decode_samples(32, &[0xFF, 0xFF, 0xFF, 0xFF])
            .unwrap()
            .collect();
        assert_eq!(samples, vec![u32::MAX]);

        assert_eq!(
            decode_samples(33, &[0; 8]).unwrap_err(),
            MessageError::UnsupportedSampleWidth(33)
        );
    }

    #[test]
    fn rejects_unsupported_widths() {
        assert!(matches!(
            decode_samples(64, &[1, 2, 3]),
            Err(MessageError::UnsupportedSampleWidth(64))
        ));
        assert!(matches!(
            decode_samples(0, &[1, 2, 3]),
            Err(MessageError::UnsupportedSampleWidth(0))
        ));
    }

    #[test]
    fn short_body_yields_nothing() {
        assert_eq!(decode_samples(16, &[7]).unwrap().count(), 0);
        assert_eq!(decode_samples(16, &[]).unwrap().count(), 0);
    }

    #[test]
    fn iterator_can_be_restarted() {
        let body = [5, 0, 6, 0];
        let samples = decode_samples(16, &body).unwrap();
        let first: Vec<u32> = samples.clone().collect();
        let second: Vec<u32> = samples.collect();
        assert_eq!(first, second);
    }
}
