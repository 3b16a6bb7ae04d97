// Core modules: value codecs, result model, decoding, and the two renderers.
pub mod csv_records;
pub mod decode;
pub mod error;
pub mod options;
pub mod palette;
pub mod result;
pub mod table;
pub mod value;
