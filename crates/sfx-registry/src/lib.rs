//! Recent presentations registry for SlideshowFX.
//!
//! The registry is an XML context file listing every presentation opened
//! recently, used to build the "Open recent" menu. This crate provides:
//!
//! - [`RecentPresentation`]: a presentation path with its derived id and
//!   opened date
//! - [`registry`]: stream-level operations (`read_all`, `save`, `update`,
//!   `exists`, `purge`) that read a whole document and write a whole new one
//! - [`ContextFile`]: the same operations on a file, with atomic replacement
//! - [`RecentPresentations`]: the application-level list with a retention
//!   count
//!
//! Returned collections use [`PathOrder`]. Purging selects survivors with
//! [`RecencyRank`] instead.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use sfx_registry::{RecentPresentation, registry};
//!
//! let opened = NaiveDate::from_ymd_opt(2024, 1, 15)
//!     .unwrap()
//!     .and_hms_opt(10, 0, 0)
//!     .unwrap();
//! let presentation = RecentPresentation::new("talk.sfx", Some(opened)).unwrap();
//!
//! let mut output = Vec::new();
//! registry::save(&b""[..], &mut output, &presentation).unwrap();
//!
//! let stored = registry::read_all(output.as_slice()).unwrap();
//! assert!(stored.contains(&presentation));
//! ```

pub mod document;
mod error;
mod file;
mod ordering;
mod path;
mod presentation;
mod recents;
pub mod registry;
pub mod tree;

pub use error::{RegistryError, TreeError};
pub use file::ContextFile;
pub use ordering::{PathOrder, RecencyRank};
pub use path::normalize_path;
pub use presentation::{
    RecentPresentation, format_opened_date_time, parse_opened_date_time, presentation_id,
};
pub use recents::RecentPresentations;
