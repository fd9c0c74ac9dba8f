//! DEFLATE decoding adapter.
//!
//! Analyzers see the decoder only through [`Inflater`]: hand it compressed
//! bytes, get back the decoded bytes and how much of the input the stream
//! actually used. Whatever follows `consumed` (an Adler-32, junk) belongs to
//! the caller.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Scratch buffer size for one decompress call.
const INFLATE_BUF_SIZE: usize = 32 * 1024;

/// Default cap on decoded output (64 MiB)
pub const DEFAULT_MAX_OUTPUT: usize = 64 * 1024 * 1024;

/// Number of DEFLATE blocks of each type in a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockCounts {
    /// Stored (uncompressed) blocks
    pub stored: usize,
    /// Blocks using the fixed Huffman code
    pub fixed: usize,
    /// Blocks carrying their own Huffman code
    pub dynamic: usize,
}

impl BlockCounts {
    /// Total number of blocks
    pub fn total(&self) -> usize {
        self.stored + self.fixed + self.dynamic
    }
}

/// Successful decode of a raw DEFLATE stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflated {
    /// Decoded bytes
    pub data: Vec<u8>,
    /// Input bytes the stream occupied
    pub consumed: usize,
    /// Block statistics, when the decoder tracks them
    pub blocks: Option<BlockCounts>,
}

/// Inflate failure taxonomy
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InflateError {
    /// The input ended before the final block did
    #[error("truncated DEFLATE stream")]
    Truncated,
    /// The decoder rejected the data
    #[error("invalid DEFLATE data: {0}")]
    Invalid(String),
    /// Decoded output grew past the configured limit
    #[error("decoded output exceeds {limit} bytes")]
    LimitExceeded {
        /// The configured limit
        limit: usize,
    },
    /// The decoder made no progress
    #[error("inflate stalled")]
    Stalled,
}

/// Black-box raw DEFLATE decoder
///
/// Implementations must not panic on arbitrary input.
pub trait Inflater: Send + Sync {
    /// Decodes one raw DEFLATE stream from the start of `input`
    fn inflate(&self, input: &[u8]) -> Result<Inflated, InflateError>;
}

/// [`Inflater`] backed by `flate2`
///
/// `flate2` does not expose block headers, so `blocks` is always `None`.
#[derive(Debug, Clone)]
pub struct DeflateInflater {
    max_output: usize,
}

impl Default for DeflateInflater {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT)
    }
}

impl DeflateInflater {
    /// Creates a decoder that refuses to produce more than `max_output` bytes
    pub fn new(max_output: usize) -> Self {
        Self { max_output }
    }
}

impl Inflater for DeflateInflater {
    fn inflate(&self, input: &[u8]) -> Result<Inflated, InflateError> {
        let mut de = Decompress::new(false);
        let mut buf = vec![0u8; INFLATE_BUF_SIZE];
        let mut out = Vec::new();
        let mut in_pos = 0usize;

        loop {
            let before_in = de.total_in() as usize;
            let before_out = de.total_out() as usize;

            let status = de
                .decompress(&input[in_pos..], &mut buf, FlushDecompress::None)
                .map_err(|e| InflateError::Invalid(e.to_string()))?;

            let consumed = de.total_in() as usize - before_in;
            let produced = de.total_out() as usize - before_out;
            in_pos += consumed;

            if produced != 0 {
                if out.len() + produced > self.max_output {
                    return Err(InflateError::LimitExceeded {
                        limit: self.max_output,
                    });
                }
                out.extend_from_slice(&buf[..produced]);
            }

            match status {
                Status::StreamEnd => {
                    return Ok(Inflated {
                        data: out,
                        consumed: in_pos,
                        blocks: None,
                    })
                }
                Status::Ok | Status::BufError => {
                    if consumed == 0 && produced == 0 {
                        if in_pos >= input.len() {
                            return Err(InflateError::Truncated);
                        }
                        return Err(InflateError::Stalled);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_reports_consumed() {
        let mut input = deflate(b"hello hello hello");
        let stream_len = input.len();
        input.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let inflated = DeflateInflater::default().inflate(&input).unwrap();
        assert_eq!(inflated.data, b"hello hello hello");
        assert_eq!(inflated.consumed, stream_len);
        assert_eq!(inflated.blocks, None);
    }

    #[test]
    fn test_inflate_stored_block() {
        // Final stored block holding "abc"
        let input = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
        let inflated = DeflateInflater::default().inflate(&input).unwrap();
        assert_eq!(inflated.data, b"abc");
        assert_eq!(inflated.consumed, input.len());
    }

    #[test]
    fn test_inflate_truncated() {
        let input = deflate(&[7u8; 4096]);
        let result = DeflateInflater::default().inflate(&input[..input.len() / 2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inflate_garbage() {
        // Block type 3 is reserved
        assert!(DeflateInflater::default().inflate(&[0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_inflate_limit() {
        let input = deflate(&[0u8; 10_000]);
        let result = DeflateInflater::new(100).inflate(&input);
        assert_eq!(result, Err(InflateError::LimitExceeded { limit: 100 }));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            DeflateInflater::default().inflate(&[]),
            Err(InflateError::Truncated)
        );
    }
}
