//! Format detection and the top-level entry point.
//!
//! ## Extensibility
//!
//! The DEFLATE decoder is pluggable through [`Inflater`]:
//!
//! ```no_run
//! use dissekt_core::{Dissector, Inflated, InflateError, Inflater};
//!
//! struct Refuse;
//!
//! impl Inflater for Refuse {
//!     fn inflate(&self, _input: &[u8]) -> Result<Inflated, InflateError> {
//!         Err(InflateError::Stalled)
//!     }
//! }
//!
//! let analysis = Dissector::new().with_inflater(Refuse).analyze(b"\x89PNG\r\n\x1a\n");
//! println!("{} fields", analysis.fields.len());
//! ```

use crate::context::{Context, UNRECOGNIZED};
use crate::field::{ColorId, Field};
use crate::formats::{elf, png, tar, tiff};
use crate::inflate::{DeflateInflater, Inflater, DEFAULT_MAX_OUTPUT};
use crate::report::Analysis;
use std::fmt;
use tracing::debug;

/// File formats the dispatcher recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Executable and Linkable Format
    Elf,
    /// Portable Network Graphics
    Png,
    /// TIFF, including Exif and GPSInfo directories
    Tiff,
    /// POSIX ustar archive
    Tar,
    /// None of the above
    Unknown,
}

impl Format {
    /// Detects the format from the start of the buffer
    ///
    /// ELF, PNG and TIFF are matched by their magic bytes at offset 0. TAR
    /// has no magic at offset 0 and is recognized by a first 512-byte header
    /// whose checksum holds.
    pub fn detect(data: &[u8]) -> Format {
        if elf::matches(data) {
            Format::Elf
        } else if png::matches(data) {
            Format::Png
        } else if tiff::matches(data) {
            Format::Tiff
        } else if tar::matches(data) {
            Format::Tar
        } else {
            Format::Unknown
        }
    }

    /// Short label for display
    pub fn label(self) -> &'static str {
        match self {
            Format::Elf => "ELF",
            Format::Png => "PNG",
            Format::Tiff => "TIFF",
            Format::Tar => "TAR",
            Format::Unknown => "unknown",
        }
    }

    /// Whether the analyzer jumps around by offsets, so gaps and overlaps
    /// have to be reconstructed afterwards
    pub fn reconciles(self) -> bool {
        matches!(self, Format::Elf | Format::Tiff)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configuration for the dissector
#[derive(Debug, Clone)]
pub struct DissectorConfig {
    /// Cap on bytes produced by one DEFLATE stream
    pub max_inflate_output: usize,
    /// Maximum number of linked TIFF IFDs to follow
    pub max_ifd_chain: usize,
    /// Verify PNG chunk CRCs and TAR header checksums
    pub verify_checksums: bool,
    /// How deep [`Dissector::analyze_embedded`] recurses
    pub max_embedded_depth: usize,
}

impl Default for DissectorConfig {
    fn default() -> Self {
        Self {
            max_inflate_output: DEFAULT_MAX_OUTPUT,
            max_ifd_chain: 256,
            verify_checksums: true,
            max_embedded_depth: 2,
        }
    }
}

impl DissectorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cap on decoded DEFLATE output
    pub fn max_inflate_output(mut self, max: usize) -> Self {
        self.max_inflate_output = max;
        self
    }

    /// Sets the maximum number of linked IFDs
    pub fn max_ifd_chain(mut self, max: usize) -> Self {
        self.max_ifd_chain = max;
        self
    }

    /// Sets whether checksums are verified
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Sets the embedded-file recursion depth
    pub fn max_embedded_depth(mut self, depth: usize) -> Self {
        self.max_embedded_depth = depth;
        self
    }
}

/// Analysis of one embedded file, with its own embedded files
#[derive(Debug, Clone)]
pub struct EmbeddedAnalysis {
    /// Offset of the embedded file in its parent buffer
    pub offset: usize,
    /// The embedded file's own analysis
    pub analysis: Analysis,
    /// Analyses of files embedded in this one
    pub children: Vec<EmbeddedAnalysis>,
}

/// Entry point: detects the format and runs its analyzer
pub struct Dissector {
    config: DissectorConfig,
    inflater: Box<dyn Inflater>,
}

impl fmt::Debug for Dissector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dissector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Dissector {
    fn default() -> Self {
        Self::new()
    }
}

impl Dissector {
    /// Creates a dissector with default configuration
    pub fn new() -> Self {
        Self::with_config(DissectorConfig::default())
    }

    /// Creates a dissector with custom configuration
    pub fn with_config(config: DissectorConfig) -> Self {
        let inflater = Box::new(DeflateInflater::new(config.max_inflate_output));
        Self { config, inflater }
    }

    /// Replaces the DEFLATE decoder
    pub fn with_inflater(mut self, inflater: impl Inflater + 'static) -> Self {
        self.inflater = Box::new(inflater);
        self
    }

    /// The active configuration
    pub fn config(&self) -> &DissectorConfig {
        &self.config
    }

    /// Analyzes one buffer
    ///
    /// Never panics on malformed input and always returns some fields: an
    /// unrecognized buffer comes back as a single "Unrecognized data" field.
    pub fn analyze(&self, data: &[u8]) -> Analysis {
        let format = Format::detect(data);
        debug!("Detected {} in {} bytes", format, data.len());

        let mut ctx = Context::new(data, self.inflater.as_ref(), &self.config);
        match format {
            Format::Elf => elf::analyze(&mut ctx),
            Format::Png => png::analyze(&mut ctx),
            Format::Tiff => tiff::analyze(&mut ctx),
            Format::Tar => tar::analyze(&mut ctx),
            Format::Unknown => {
                if !data.is_empty() {
                    ctx.emit(Field::new(0, data.len(), UNRECOGNIZED, ColorId::Error));
                }
            }
        }
        ctx.finish(format, format.reconciles())
    }

    /// Analyzes every embedded file of `analysis`, recursively up to
    /// `max_embedded_depth` levels
    pub fn analyze_embedded(&self, data: &[u8], analysis: &Analysis) -> Vec<EmbeddedAnalysis> {
        self.embedded_level(data, analysis, 1)
    }

    fn embedded_level(
        &self,
        data: &[u8],
        analysis: &Analysis,
        depth: usize,
    ) -> Vec<EmbeddedAnalysis> {
        if depth > self.config.max_embedded_depth {
            return Vec::new();
        }
        analysis
            .embedded
            .iter()
            .filter_map(|file| {
                let bytes = data.get(file.range())?;
                let nested = self.analyze(bytes);
                let children = self.embedded_level(bytes, &nested, depth + 1);
                Some(EmbeddedAnalysis {
                    offset: file.offset,
                    analysis: nested,
                    children,
                })
            })
            .collect()
    }
}

/// Analyzes a buffer with the default [`Dissector`]
pub fn analyze(data: &[u8]) -> Analysis {
    Dissector::new().analyze(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_magic() {
        assert_eq!(Format::detect(b"\x7fELF\x02\x01\x01"), Format::Elf);
        assert_eq!(Format::detect(b"\x89PNG\r\n\x1a\n"), Format::Png);
        assert_eq!(Format::detect(b"II\x2a\x00\x08\x00\x00\x00"), Format::Tiff);
        assert_eq!(Format::detect(b"MM\x00\x2a\x00\x00\x00\x08"), Format::Tiff);
        assert_eq!(Format::detect(b"II\x00\x2a"), Format::Unknown);
        assert_eq!(Format::detect(b""), Format::Unknown);
        assert_eq!(Format::detect(&[0u8; 1024]), Format::Unknown);
    }

    #[test]
    fn test_unknown_buffer_is_one_field() {
        let analysis = analyze(b"just some text");
        assert_eq!(analysis.format, Format::Unknown);
        assert_eq!(analysis.fields.len(), 1);
        assert_eq!(analysis.fields[0].range(), 0..14);
        assert!(!analysis.reconciled);
    }

    #[test]
    fn test_empty_buffer() {
        let analysis = analyze(&[]);
        assert!(analysis.fields.is_empty());
        assert!(analysis.uncovered().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = DissectorConfig::new()
            .max_inflate_output(10)
            .max_ifd_chain(3)
            .verify_checksums(false)
            .max_embedded_depth(0);

        assert_eq!(config.max_inflate_output, 10);
        assert_eq!(config.max_ifd_chain, 3);
        assert!(!config.verify_checksums);
        assert_eq!(config.max_embedded_depth, 0);
    }

    #[test]
    fn test_reconciling_formats() {
        assert!(Format::Elf.reconciles());
        assert!(Format::Tiff.reconciles());
        assert!(!Format::Png.reconciles());
        assert!(!Format::Tar.reconciles());
    }
}
