//! pdfgraft - recovering PDF object loader, resource collector and
//! content-stream interpreter.
//!
//! A file is loaded into an object table through the structural index when
//! it can be trusted and through a sequential scan when it cannot. Resources
//! a page uses can then be pulled into a [`ResourceStore`] together with
//! everything they reference, and content streams can be replayed against a
//! [`DrawingSink`].

pub mod codec;
pub mod document;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;
pub mod resources;
pub mod source;
pub mod utils;

pub use document::{LoadOptions, PdfFile, Strategy};
pub use error::{PdfError, Result};
pub use interp::{DrawingSink, InterpOptions, Interpreter, NullSink};
pub use model::{Dict, ObjNum, ObjectTable, PdfString, StreamState, Value};
pub use resources::{FileResources, ResourceLookup, ResourceStore};
pub use source::{BufferSource, DataSource, FileSource};
