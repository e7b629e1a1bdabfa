//! Object model and serializer.
//!
//! - `objects`: [`Value`], [`Dict`], [`StreamState`], [`PdfString`]
//! - `writer`: PDF syntax output

pub mod objects;
pub mod writer;

pub use objects::{Dict, ObjNum, ObjectTable, PdfString, StreamState, Value};
pub use writer::{Renumber, write_indirect};
