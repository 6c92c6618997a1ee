//! # Relmap Format
//!
//! Text-level model of release map files.
//!
//! A map file lists the component projects of a build and the
//! version-control tag each one should be built from, one entry per line:
//!
//! ```text
//! # comment
//! org.example.core=v20260801,extra,fields,preserved
//! org.example.ui=v20260815
//! ```
//!
//! Everything in this crate is a pure function of bytes: parsing map
//! content into [`MapEntry`] records and computing the minimal edit that
//! changes a single entry's tag ([`MapContentDocument`]). Reading and
//! writing the backing files is the index layer's job.

mod document;
mod entry;
mod parse;

pub use document::MapContentDocument;
pub use entry::{MapEntry, DEFAULT_TAG};
pub use parse::{parse_entries, ParseError};

/// Fixed extension of map files inside a watched map directory.
pub const MAP_FILE_EXTENSION: &str = "map";
