//! # dissekt-core
//!
//! A library that annotates binary files byte by byte.
//!
//! Given the raw bytes of an ELF, PNG, TIFF (with Exif and GPSInfo) or TAR
//! file, it produces:
//! - an ordered list of named, colored [`Field`]s covering the buffer
//! - description tabs with the decoded values of every structure
//! - the byte ranges of embedded files (such as a JPEG thumbnail in a TIFF)
//!
//! ## Architecture
//!
//! - [`dispatch`]: format detection and the [`Dissector`] entry point
//! - [`formats`]: one analyzer per format
//! - [`cursor`], [`field`], [`sink`]: the byte cursor and field output
//! - [`inflate`]: the DEFLATE adapter used by PNG
//! - [`reconcile`]: unused and overlapping byte detection for ELF and TIFF
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use dissekt_core::Dissector;
//! use std::fs;
//!
//! let data = fs::read("image.png")?;
//! let analysis = Dissector::new().analyze(&data);
//!
//! for field in &analysis.fields {
//!     println!("{:>8} {:>6}  {}", field.offset, field.length, field.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

mod context;
pub mod cursor;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod formats;
pub mod inflate;
pub mod reconcile;
pub mod report;
pub mod sink;
pub mod theme;

// Re-export primary types for convenience
pub use cursor::{Cursor, Endian, Offset};
pub use dispatch::{analyze, Dissector, DissectorConfig, EmbeddedAnalysis, Format};
pub use error::{Error, Result};
pub use field::{ColorId, Field};
pub use inflate::{BlockCounts, DeflateInflater, InflateError, Inflated, Inflater};
pub use report::{Analysis, EmbeddedFile, Line, Tab};
pub use theme::{Palette, Rgb};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
