//! Purpose: Render a result set as an aligned, colorized, box-drawn grid.
//! Exports: `TableRenderer`, `BorderLine`, `column_widths`.
//! Role: Human-facing output path; shares cell decoding with the CSV renderer.
//! Invariants: An empty result writes zero bytes.
//! Invariants: Column width >= 3 + header length and >= every decoded cell in the column.
//! Invariants: All cells decode before the first byte is written; the sink is flushed once.
use std::io::Write;

use crate::core::decode::ValueDecoder;
use crate::core::error::{Error, write_error};
use crate::core::options::RenderOptions;
use crate::core::palette::Palette;
use crate::core::result::{ColumnSpec, KeyRole, ResultSet, resolve_role};

const HEADER_PADDING: usize = 3;

/// The four horizontal rules of the grid; glyphs depend only on position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BorderLine {
    Top,
    Header,
    Row,
    Bottom,
}

impl BorderLine {
    // (left, fill, cross, right)
    fn glyphs(self) -> (char, char, char, char) {
        match self {
            BorderLine::Top => ('┌', '─', '┬', '┐'),
            BorderLine::Header => ('╞', '═', '╪', '╡'),
            BorderLine::Row => ('├', '─', '┼', '┤'),
            BorderLine::Bottom => ('└', '─', '┴', '┘'),
        }
    }

    pub fn draw(self, widths: &[usize]) -> String {
        let (left, fill, cross, right) = self.glyphs();
        let mut line = String::from(" ");
        line.push(left);
        for (idx, width) in widths.iter().enumerate() {
            line.extend(std::iter::repeat_n(fill, *width));
            line.push(if idx + 1 == widths.len() { right } else { cross });
        }
        line
    }
}

pub fn column_widths(columns: &[ColumnSpec], cells: &[Vec<String>]) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .map(|column| HEADER_PADDING + column.name.chars().count())
        .collect::<Vec<_>>();
    for row in cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TableRenderer {
    palette: Palette,
    options: RenderOptions,
}

impl TableRenderer {
    pub fn new(palette: Palette, options: RenderOptions) -> Self {
        Self { palette, options }
    }

    pub fn render<W, F>(&self, result: &ResultSet, role_of: F, out: &mut W) -> Result<(), Error>
    where
        W: Write,
        F: Fn(&str) -> Option<KeyRole>,
    {
        if result.rows.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            "rendering table"
        );

        let decoder = ValueDecoder::new(&result.columns, result.flags, self.options);
        let cells = result
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| decoder.decode_row(idx, row))
            .collect::<Result<Vec<_>, _>>()?;
        let widths = column_widths(&result.columns, &cells);
        let palette = self.palette;

        write_line(out, &format!("{}{}", palette.border, BorderLine::Top.draw(&widths)))?;
        let mut header = String::from(" ");
        for (column, &width) in result.columns.iter().zip(&widths) {
            let accent = palette.for_role(resolve_role(&role_of, &column.name));
            header.push_str(&format!(
                "{}│{}{accent}{:<width$}{}",
                palette.border, palette.reset, column.name, palette.reset
            ));
        }
        header.push_str(palette.border);
        header.push('│');
        write_line(out, &header)?;
        write_line(
            out,
            &format!("{}{}", BorderLine::Header.draw(&widths), palette.reset),
        )?;

        let last = cells.len() - 1;
        for (idx, row) in cells.iter().enumerate() {
            let mut line = String::from(" ");
            for (cell, &width) in row.iter().zip(&widths) {
                line.push_str(&format!("{}│{}{cell:<width$}", palette.border, palette.reset));
            }
            line.push_str(palette.border);
            line.push('│');
            write_line(out, &line)?;

            let rule = if idx == last {
                BorderLine::Bottom
            } else {
                BorderLine::Row
            };
            write_line(out, &format!("{}{}", rule.draw(&widths), palette.reset))?;
        }

        out.flush().map_err(write_error)?;
        tracing::debug!(rows = cells.len(), "table rendered");
        Ok(())
    }
}

fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), Error> {
    out.write_all(line.as_bytes())
        .and_then(|()| out.write_all(b"\n"))
        .map_err(write_error)
}
