//! Purpose: Load a JSON result dump into the renderer's in-memory model.
//! Exports: `ResultDump`, `load_dump`, `parse_dump`.
//! Role: CLI input boundary; the library itself never opens files.
//! Invariants: Every malformed dump is a usage error raised before any rendering starts.
//! Invariants: Payloads are hex strings (optionally `0x`-prefixed) or JSON null.
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use sstable_results::{
    ColumnSpec, Error, ErrorKind, KeyRole, ResultFlag, ResultFlags, ResultSet, Row, SchemaRoles,
    ValueKind,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpFile {
    #[serde(default)]
    flags: Vec<DumpFlag>,
    columns: Vec<DumpColumn>,
    #[serde(default)]
    rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DumpFlag {
    GlobalTablesSpec,
    HasMorePages,
    NoMetadata,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DumpColumn {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    role: Option<DumpRole>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DumpRole {
    PartitionKey,
    Clustering,
    Regular,
}

impl From<DumpFlag> for ResultFlag {
    fn from(flag: DumpFlag) -> Self {
        match flag {
            DumpFlag::GlobalTablesSpec => ResultFlag::GlobalTablesSpec,
            DumpFlag::HasMorePages => ResultFlag::HasMorePages,
            DumpFlag::NoMetadata => ResultFlag::NoMetadata,
        }
    }
}

impl From<DumpRole> for KeyRole {
    fn from(role: DumpRole) -> Self {
        match role {
            DumpRole::PartitionKey => KeyRole::PartitionKey,
            DumpRole::Clustering => KeyRole::Clustering,
            DumpRole::Regular => KeyRole::Regular,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ResultDump {
    pub(crate) result: ResultSet,
    pub(crate) roles: SchemaRoles,
}

pub(crate) fn load_dump(input: &Path) -> Result<ResultDump, Error> {
    let text = if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read dump from stdin")
                .with_source(err)
        })?;
        text
    } else {
        std::fs::read_to_string(input).map_err(|err| {
            let kind = if err.kind() == std::io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message(format!("failed to read dump {}", input.display()))
                .with_source(err)
        })?
    };
    parse_dump(&text)
}

pub(crate) fn parse_dump(text: &str) -> Result<ResultDump, Error> {
    let dump: DumpFile = serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid result dump: {err}"))
            .with_hint("Expected {\"columns\": [{\"name\", \"type\"}], \"rows\": [[\"<hex>\" | null]]}.")
            .with_source(err)
    })?;

    let mut roles = SchemaRoles::new();
    let mut columns = Vec::with_capacity(dump.columns.len());
    for column in dump.columns {
        let kind = column.kind.parse::<ValueKind>()?;
        if let Some(role) = column.role {
            roles = roles.with_role(column.name.clone(), role.into());
        }
        columns.push(ColumnSpec::new(column.name, kind));
    }

    let flags = dump
        .flags
        .into_iter()
        .map(ResultFlag::from)
        .collect::<ResultFlags>();

    let mut rows = Vec::with_capacity(dump.rows.len());
    for (idx, cells) in dump.rows.into_iter().enumerate() {
        if cells.len() != columns.len() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "row has {} cells but there are {} columns",
                    cells.len(),
                    columns.len()
                ))
                .with_row(idx));
        }
        let row = cells
            .iter()
            .enumerate()
            .map(|(column, cell)| {
                cell.as_deref()
                    .map(parse_hex)
                    .transpose()
                    .map_err(|err| err.with_row(idx).with_column(column))
            })
            .collect::<Result<Row, _>>()?;
        rows.push(row);
    }

    Ok(ResultDump {
        result: ResultSet::new(columns, flags, rows),
        roles,
    })
}

fn parse_hex(text: &str) -> Result<Vec<u8>, Error> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() % 2 != 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("odd number of hex digits in payload `{text}`")));
    }
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(high), Some(low)) => Ok((high << 4) | low),
            _ => Err(Error::new(ErrorKind::Usage)
                .with_message(format!("invalid hex digit in payload `{text}`"))),
        })
        .collect()
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
