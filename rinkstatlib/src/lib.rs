//! # rinkstatlib
//!
//! Canned hockey statistics reports rendered as column-aligned text tables.
//!
//! ## Overview
//!
//! The library is organised around one small, generic piece: the table
//! renderer. It takes any rectangular result (headers plus rows of display
//! strings), measures column widths from the rows that will actually be
//! shown, and writes a header line, a dash separator and one line per row.
//! Reports can be capped to the first N rows and can carry a synthetic
//! 1-based rank column.
//!
//! Around it:
//!
//! - **Query service**: a [`QueryService`] trait with one operation, run a
//!   catalog query and return a [`TabularResult`]. [`SqliteQueryService`]
//!   implements it over the hockey schema.
//! - **Sources**: load a [`TabularResult`] from CSV or JSON files.
//! - **Config**: TOML settings for the database path and rendering.
//!
//! ## Example
//!
//! ```rust
//! use rinkstatlib::{QueryId, QueryParams, Report, SqliteQueryService, TableRenderer};
//!
//! let mut service = SqliteQueryService::open_in_memory().unwrap();
//! service.init_schema().unwrap();
//! service
//!     .load_batch("INSERT INTO teams VALUES (1, 'Winnipeg', 'Jets'), (2, 'Calgary', 'Flames');")
//!     .unwrap();
//!
//! let report = Report::run(&service, QueryId::Teams, &QueryParams::new(), "Rank").unwrap();
//! let text = TableRenderer::new()
//!     .render_to_string(&report.result, &report.policy)
//!     .unwrap();
//!
//! assert_eq!(
//!     text,
//!     "ID   City       Team Name\n--   --------   ---------\n1    Winnipeg   Jets\n2    Calgary    Flames\n"
//! );
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod render;
pub mod source;
pub mod table;

pub use config::{Config, RenderConfig};
pub use error::RinkstatError;
pub use query::{
    QueryId, QueryParams, QueryService, Report, Season, SqliteQueryService, StatKind,
};
pub use render::{ColumnLayout, RenderPolicy, TableRenderer, DEFAULT_PADDING};
pub use source::SourceFormat;
pub use table::{Row, TabularResult};

/// Result type for rinkstatlib operations
pub type Result<T> = std::result::Result<T, RinkstatError>;
