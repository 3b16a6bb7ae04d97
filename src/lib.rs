//! Purpose: Render materialized query results as a box-drawn table or as CSV.
//! Exports: `core` (value codecs, result model, decoder, renderers, errors) and top-level re-exports.
//! Role: Presentation layer behind the `sstable-results` CLI; storage and query execution live elsewhere.
//! Invariants: Renderers read their inputs only; no state survives a render call.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod core;

pub use crate::core::csv_records::CsvRenderer;
pub use crate::core::decode::{CellRenderer, ValueDecoder, decode_value};
pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::options::RenderOptions;
pub use crate::core::palette::Palette;
pub use crate::core::result::{
    ColumnSpec, KeyRole, ResultFlag, ResultFlags, ResultSet, Row, SchemaRoles,
};
pub use crate::core::table::TableRenderer;
pub use crate::core::value::ValueKind;
