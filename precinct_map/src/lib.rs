//! Precinct-level election results: merging of the tabular sources into one
//! record per geographic unit, and derivation of the map encodings (fill
//! colors, arrow glyphs, tooltips, legend totals and the detail table).
//!
//! The crate does no IO. Rows are pulled through [`RowSource`] and features
//! are handed over already parsed.

mod aggregate;
mod color;
mod config;
mod geometry;
mod map;
mod style;
mod table;
mod totals;

pub mod builder;

pub use crate::aggregate::*;
pub use crate::color::*;
pub use crate::config::*;
pub use crate::geometry::*;
pub use crate::map::*;
pub use crate::style::*;
pub use crate::table::*;
pub use crate::totals::*;
