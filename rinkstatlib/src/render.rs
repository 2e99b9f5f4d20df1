//! Column-aligned plain text rendering of a [`TabularResult`].
//!
//! Rendering happens in three steps:
//!
//! 1. The rows are already materialized in the `TabularResult`.
//! 2. Column widths are measured from the headers and from the rows that will
//!    actually be displayed (at most `row_cap` of them). Rows past the cap
//!    never influence alignment.
//! 3. A header line, a dash separator line and one line per displayed row
//!    are written. Every column but the last is left-justified and padded to
//!    `width + padding`; the last column is written bare so lines carry no
//!    trailing padding.
//!
//! The ranked variant prepends a synthetic 1-based rank column whose width is
//! fixed at `len(rank_header) + 1`.
//!
//! ## Example
//!
//! ```rust
//! use rinkstatlib::{RenderPolicy, TableRenderer, TabularResult};
//!
//! let teams = TabularResult::new(["ID", "City", "Team Name"])
//!     .with_row(["1", "Winnipeg", "Jets"])
//!     .with_row(["2", "Calgary", "Flames"]);
//!
//! let text = TableRenderer::new()
//!     .render_to_string(&teams, &RenderPolicy::new())
//!     .unwrap();
//! assert_eq!(text.lines().next(), Some("ID   City       Team Name"));
//! assert_eq!(text.lines().count(), 4);
//! ```

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RinkstatError;
use crate::table::{check_arity, Row, TabularResult};
use crate::Result;

/// Gap between columns, in characters.
pub const DEFAULT_PADDING: usize = 3;

/// Header used for the rank column when none is configured.
pub const DEFAULT_RANK_HEADER: &str = "Rank";

/// Presentation choices for one render call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPolicy {
    /// Maximum number of rows to display; `None` displays every row
    pub row_cap: Option<usize>,
    /// Header of the synthetic rank column; `None` renders without ranks
    pub rank_header: Option<String>,
}

impl RenderPolicy {
    /// Display every row, no rank column
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: cap the number of displayed rows
    pub fn cap(mut self, row_cap: usize) -> Self {
        self.row_cap = Some(row_cap);
        self
    }

    /// Builder: prepend a rank column with the given header
    pub fn ranked(mut self, rank_header: impl Into<String>) -> Self {
        self.rank_header = Some(rank_header.into());
        self
    }

    pub fn is_ranked(&self) -> bool {
        self.rank_header.is_some()
    }

    /// Number of rows displayed out of `row_count` materialized rows.
    pub fn displayed(&self, row_count: usize) -> usize {
        displayed_rows(self.row_cap, row_count)
    }

    /// The displayed rows as data: capped, with the rank column prepended
    /// when ranked. Used for structured output.
    pub fn apply(&self, result: &TabularResult) -> TabularResult {
        let shown = result.truncated(self.row_cap);
        match &self.rank_header {
            None => shown,
            Some(rank_header) => {
                let headers = std::iter::once(rank_header.clone()).chain(shown.headers);
                let rows = shown.rows.into_iter().enumerate().map(|(index, row)| {
                    std::iter::once((index + 1).to_string())
                        .chain(row)
                        .collect::<Row>()
                });
                TabularResult::collect(headers, rows)
            }
        }
    }
}

fn displayed_rows(row_cap: Option<usize>, row_count: usize) -> usize {
    row_cap.map_or(row_count, |cap| cap.min(row_count))
}

/// Per-column widths derived for a single render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    widths: Vec<usize>,
}

impl ColumnLayout {
    /// Measure widths from the headers and the first `limit` rows.
    ///
    /// Cells beyond the header count are ignored here; arity is enforced when
    /// the row is emitted.
    pub fn measure(headers: &[String], rows: &[Row], limit: usize) -> Self {
        let mut widths: Vec<usize> = headers.iter().map(|h| text_width(h)).collect();
        for row in rows.iter().take(limit) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(text_width(cell));
            }
        }
        Self { widths }
    }

    /// Prepend a rank column of width `len(rank_header) + 1`.
    pub fn with_rank_column(mut self, rank_header: &str) -> Self {
        self.widths.insert(0, text_width(rank_header) + 1);
        self
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }
}

/// Renders tabular results as aligned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRenderer {
    padding: usize,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Renderer with the standard three-character column gap.
    pub fn new() -> Self {
        Self {
            padding: DEFAULT_PADDING,
        }
    }

    /// Renderer with a custom column gap.
    pub fn with_padding(padding: usize) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Render according to `policy`, dispatching to the plain or ranked variant.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        result: &TabularResult,
        policy: &RenderPolicy,
    ) -> Result<()> {
        match (&policy.rank_header, policy.row_cap) {
            (Some(rank_header), Some(row_cap)) => {
                self.render_with_rank(out, result, rank_header, row_cap)
            }
            (Some(_), None) => Err(RinkstatError::InvalidRowCap(0)),
            (None, row_cap) => self.render_plain(out, result, row_cap),
        }
    }

    /// Render into a string.
    pub fn render_to_string(&self, result: &TabularResult, policy: &RenderPolicy) -> Result<String> {
        let mut buf = Vec::new();
        self.render(&mut buf, result, policy)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Render headers, separator and up to `row_cap` rows.
    pub fn render_plain<W: Write>(
        &self,
        out: &mut W,
        result: &TabularResult,
        row_cap: Option<usize>,
    ) -> Result<()> {
        if row_cap == Some(0) {
            return Err(RinkstatError::InvalidRowCap(0));
        }
        let shown = displayed_rows(row_cap, result.row_count());
        let layout = ColumnLayout::measure(&result.headers, &result.rows, shown);
        debug!(
            columns = layout.len(),
            shown,
            total = result.row_count(),
            "measured column layout"
        );
        self.emit(out, result, &layout, shown, None)
    }

    /// Render the first `row_cap` rows with a 1-based rank column in front.
    pub fn render_with_rank<W: Write>(
        &self,
        out: &mut W,
        result: &TabularResult,
        rank_header: &str,
        row_cap: usize,
    ) -> Result<()> {
        if row_cap == 0 {
            return Err(RinkstatError::InvalidRowCap(row_cap));
        }
        let shown = displayed_rows(Some(row_cap), result.row_count());
        let layout = ColumnLayout::measure(&result.headers, &result.rows, shown)
            .with_rank_column(rank_header);
        debug!(
            columns = layout.len(),
            shown,
            total = result.row_count(),
            rank_header,
            "measured ranked column layout"
        );
        self.emit(out, result, &layout, shown, Some(rank_header))
    }

    fn emit<W: Write>(
        &self,
        out: &mut W,
        result: &TabularResult,
        layout: &ColumnLayout,
        shown: usize,
        rank_header: Option<&str>,
    ) -> Result<()> {
        let widths = layout.widths();

        let headers: Vec<&str> = rank_header
            .into_iter()
            .chain(result.headers.iter().map(String::as_str))
            .collect();
        writeln!(out, "{}", self.format_line(&headers, widths))?;

        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(out, "{}", self.format_line(&dashes, widths))?;

        for (index, row) in result.rows.iter().take(shown).enumerate() {
            check_arity(index, row, result.headers.len())?;
            let rank = rank_header.map(|_| (index + 1).to_string());
            let cells: Vec<&str> = rank
                .as_deref()
                .into_iter()
                .chain(row.iter().map(String::as_str))
                .collect();
            writeln!(out, "{}", self.format_line(&cells, widths))?;
        }

        Ok(())
    }

    fn format_line<S: AsRef<str>>(&self, cells: &[S], widths: &[usize]) -> String {
        let last = cells.len().saturating_sub(1);
        let mut line = String::new();
        for (j, (cell, width)) in cells.iter().zip(widths).enumerate() {
            let cell = cell.as_ref();
            line.push_str(cell);
            if j < last {
                let fill = (width + self.padding).saturating_sub(text_width(cell));
                line.extend(std::iter::repeat(' ').take(fill));
            }
        }
        line
    }
}

/// Display width of a cell, assuming single-width characters.
fn text_width(s: &str) -> usize {
    s.chars().count()
}
