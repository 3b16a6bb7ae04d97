//! Purpose: Stream a result set as CSV records, one per row.
//! Exports: `CsvRenderer`.
//! Role: Machine-facing output path; same decoded cells as the table, no header, no color.
//! Invariants: Fields are quoted only when they contain a comma, quote, or line break.
//! Invariants: Records end in CRLF; a failed write stops the remaining rows.
//! Invariants: The sink is flushed only per record, and only when `flush_after_line` is set.
use std::io::Write;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::core::decode::ValueDecoder;
use crate::core::error::{Error, write_error};
use crate::core::options::RenderOptions;
use crate::core::result::ResultSet;

#[derive(Clone, Copy, Debug, Default)]
pub struct CsvRenderer {
    options: RenderOptions,
}

impl CsvRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn render<W: Write>(&self, result: &ResultSet, mut out: W) -> Result<(), Error> {
        tracing::debug!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            flush_after_line = self.options.flush_after_line,
            "rendering csv"
        );
        let decoder = ValueDecoder::new(&result.columns, result.flags, self.options);
        // Records are encoded into a scratch buffer and handed to the sink one at a time.
        let mut builder = WriterBuilder::new();
        builder
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .quote_style(QuoteStyle::Necessary);

        for (idx, row) in result.rows.iter().enumerate() {
            let record = decoder.decode_row(idx, row)?;
            let mut encoder = builder.from_writer(Vec::new());
            encoder.write_record(&record).map_err(write_error)?;
            let encoded = encoder
                .into_inner()
                .map_err(|err| write_error(err.into_error()))?;
            out.write_all(encoded.as_slice()).map_err(write_error)?;
            if self.options.flush_after_line {
                out.flush().map_err(write_error)?;
            }
        }
        Ok(())
    }
}
