//! File loading: cross-reference index, object streams, page tree.
//!
//! - `file`: [`PdfFile`], the three loading strategies and the object table
//! - `xref`: classic table and cross-reference stream parsing
//! - `objstm`: object-stream decoding
//! - `page`: page-tree walk and inherited attributes

pub mod file;
pub mod objstm;
pub mod page;
pub mod xref;

pub use file::{LoadOptions, PdfFile, Strategy};
