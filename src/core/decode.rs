//! Purpose: Turn one cell payload into its display string.
//! Exports: `ValueDecoder`, `CellRenderer`, `decode_value`.
//! Role: Shared decoding path for the table and CSV renderers.
//! Invariants: Rule order is fixed: null, no-metadata hex, collection, raw timestamp, canonical.
//! Invariants: The renderer for each column is chosen once, before any row is visited.
//! Invariants: Decode failures carry the row and column of the offending cell.
use crate::core::error::Error;
use crate::core::options::RenderOptions;
use crate::core::result::{ColumnSpec, ResultFlag, ResultFlags};
use crate::core::value::{ValueKind, hex_string};

const NULL_TEXT: &str = "null";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CellRenderer {
    Hex,
    Collection(ValueKind),
    RawInteger(ValueKind),
    Canonical(ValueKind),
}

impl CellRenderer {
    pub fn select(kind: &ValueKind, flags: ResultFlags, raw_timestamps: bool) -> Self {
        if flags.contains(ResultFlag::NoMetadata) {
            CellRenderer::Hex
        } else if kind.is_collection() {
            CellRenderer::Collection(kind.clone())
        } else if kind.is_timestamp_compatible() && raw_timestamps {
            CellRenderer::RawInteger(kind.clone())
        } else {
            CellRenderer::Canonical(kind.clone())
        }
    }

    pub fn render(&self, payload: Option<&[u8]>) -> Result<String, Error> {
        let Some(payload) = payload else {
            return Ok(NULL_TEXT.to_string());
        };
        match self {
            CellRenderer::Hex => Ok(format!("0x{}", hex_string(payload))),
            CellRenderer::Collection(kind) | CellRenderer::Canonical(kind) => kind.render(payload),
            CellRenderer::RawInteger(kind) => kind.raw_integer(payload),
        }
    }
}

/// Decodes a single value without building a per-column decoder.
pub fn decode_value(
    payload: Option<&[u8]>,
    kind: &ValueKind,
    flags: ResultFlags,
    raw_timestamps: bool,
) -> Result<String, Error> {
    CellRenderer::select(kind, flags, raw_timestamps).render(payload)
}

#[derive(Clone, Debug)]
pub struct ValueDecoder {
    renderers: Vec<CellRenderer>,
}

impl ValueDecoder {
    pub fn new(columns: &[ColumnSpec], flags: ResultFlags, options: RenderOptions) -> Self {
        let renderers = columns
            .iter()
            .map(|column| {
                let renderer = CellRenderer::select(&column.kind, flags, options.raw_timestamps);
                tracing::trace!(column = %column.name, kind = %column.kind, ?renderer, "selected cell renderer");
                renderer
            })
            .collect();
        Self { renderers }
    }

    pub fn column_count(&self) -> usize {
        self.renderers.len()
    }

    pub fn decode(&self, row: usize, column: usize, payload: Option<&[u8]>) -> Result<String, Error> {
        self.renderers[column]
            .render(payload)
            .map_err(|err| err.with_row(row).with_column(column))
    }

    pub fn decode_row(&self, row: usize, payloads: &[Option<Vec<u8>>]) -> Result<Vec<String>, Error> {
        debug_assert_eq!(payloads.len(), self.renderers.len(), "row width mismatch");
        payloads
            .iter()
            .enumerate()
            .map(|(column, payload)| self.decode(row, column, payload.as_deref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRenderer, ValueDecoder, decode_value};
    use crate::core::error::ErrorKind;
    use crate::core::options::RenderOptions;
    use crate::core::result::{ColumnSpec, ResultFlag, ResultFlags};
    use crate::core::value::ValueKind;

    fn all_kinds() -> Vec<ValueKind> {
        vec![
            ValueKind::Int,
            ValueKind::Text,
            ValueKind::Timestamp,
            ValueKind::Blob,
            ValueKind::List(Box::new(ValueKind::Int)),
        ]
    }

    #[test]
    fn absent_payload_is_null_for_every_kind_and_flag() {
        let flag_sets = [
            ResultFlags::empty(),
            ResultFlags::empty().with(ResultFlag::NoMetadata),
        ];
        for kind in all_kinds() {
            for flags in flag_sets {
                for raw in [false, true] {
                    assert_eq!(decode_value(None, &kind, flags, raw).unwrap(), "null");
                }
            }
        }
    }

    #[test]
    fn no_metadata_hex_dumps_regardless_of_type() {
        let flags = ResultFlags::empty().with(ResultFlag::NoMetadata);
        let payload = [0x00u8, 0x00, 0x00, 0x2a];
        for kind in all_kinds() {
            assert_eq!(
                decode_value(Some(&payload), &kind, flags, false).unwrap(),
                "0x0000002a"
            );
        }
        // Ill-formed for the declared type, but never interpreted.
        assert_eq!(
            decode_value(Some(&[0xc3, 0x28]), &ValueKind::Text, flags, true).unwrap(),
            "0xc328"
        );
        assert_eq!(decode_value(Some(&[]), &ValueKind::Int, flags, false).unwrap(), "0x");
    }

    #[test]
    fn raw_timestamps_only_affect_timestamp_compatible_columns() {
        let ts = 1_700_000_000_000i64.to_be_bytes();
        let flags = ResultFlags::empty();
        assert_eq!(
            decode_value(Some(&ts), &ValueKind::Timestamp, flags, false).unwrap(),
            "2023-11-14 22:13:20.000Z"
        );
        assert_eq!(
            decode_value(Some(&ts), &ValueKind::Timestamp, flags, true).unwrap(),
            "1700000000000"
        );

        let int = 7i32.to_be_bytes();
        assert_eq!(decode_value(Some(&int), &ValueKind::Int, flags, true).unwrap(), "7");
        let text = "2023".as_bytes();
        assert_eq!(decode_value(Some(text), &ValueKind::Text, flags, true).unwrap(), "2023");
    }

    #[test]
    fn collections_win_over_raw_timestamps() {
        let kind = ValueKind::List(Box::new(ValueKind::Timestamp));
        assert!(matches!(
            CellRenderer::select(&kind, ResultFlags::empty(), true),
            CellRenderer::Collection(_)
        ));
        assert_eq!(
            CellRenderer::select(&ValueKind::BigInt, ResultFlags::empty(), true),
            CellRenderer::RawInteger(ValueKind::BigInt)
        );
    }

    #[test]
    fn decoder_attaches_cell_coordinates() {
        let columns = vec![
            ColumnSpec::new("id", ValueKind::Int),
            ColumnSpec::new("name", ValueKind::Text),
        ];
        let decoder = ValueDecoder::new(&columns, ResultFlags::empty(), RenderOptions::default());
        assert_eq!(decoder.column_count(), 2);

        let row = vec![Some(42i32.to_be_bytes().to_vec()), Some(b"Alice".to_vec())];
        assert_eq!(decoder.decode_row(0, &row).unwrap(), vec!["42", "Alice"]);

        let bad = vec![Some(vec![0, 1]), None];
        let err = decoder.decode_row(3, &bad).expect_err("short int");
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.row(), Some(3));
        assert_eq!(err.column(), Some(0));
    }
}
