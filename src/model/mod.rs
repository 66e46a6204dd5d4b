//! Core data types for deprecation findings and scan results.
//!
//! This module contains the fundamental types used throughout the scanner:
//!
//! - [`Position`] / [`Range`] - Zero-based locations inside one file
//! - [`Usage`] - One reference to a deprecated declaration
//! - [`FileFindings`] - All surviving usages of one file
//! - [`ScanResult`] - Complete, sorted scan results
//!
//! # Example
//!
//! ```
//! use deprecation_scanner::{FileFindings, Position, Range, ScanResult, Usage};
//!
//! let usage = Usage::new(
//!     "/repo/src/index.ts",
//!     Range::new(Position::new(3, 0), Position::new(3, 11)),
//!     "'oldFunction' is deprecated.",
//! );
//! let result = ScanResult::from_files(vec![FileFindings::new("/repo/src/index.ts", vec![usage])], 1);
//!
//! assert_eq!(result.total_usages, 1);
//! ```

mod usage;

pub use usage::*;
