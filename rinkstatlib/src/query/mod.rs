//! Canned report queries.
//!
//! The renderer only needs one capability from the database side: run a
//! named query with parameters and get back a [`TabularResult`]. That is the
//! [`QueryService`] trait. [`SqliteQueryService`] implements it over the
//! hockey schema; tests and other front ends can supply their own.
//!
//! [`Report`] ties a query run to its banner title and presentation policy.

pub mod catalog;
pub mod params;
pub mod sqlite;

use serde::Serialize;

pub use catalog::{QueryId, Statement, TOP_PLAYERS_CAP};
pub use params::{QueryParams, Season, StatKind};
pub use sqlite::SqliteQueryService;

use crate::render::RenderPolicy;
use crate::table::TabularResult;
use crate::Result;

/// Produces tabular results for catalog queries.
pub trait QueryService {
    /// Run `query` and materialize every resulting row.
    fn run(&self, query: QueryId, params: &QueryParams) -> Result<TabularResult>;
}

/// A query result ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub query: QueryId,
    pub title: String,
    pub policy: RenderPolicy,
    pub result: TabularResult,
}

impl Report {
    /// Validate parameters, run the query and attach its presentation.
    ///
    /// Parameters are checked before the service is called.
    pub fn run<S: QueryService + ?Sized>(
        service: &S,
        query: QueryId,
        params: &QueryParams,
        rank_header: &str,
    ) -> Result<Self> {
        let title = query.title(params)?;
        let policy = query.policy(params, rank_header)?;
        let result = service.run(query, params)?;
        Ok(Self {
            query,
            title,
            policy,
            result,
        })
    }

    /// Rows as displayed: capped, and ranked for ranked reports.
    pub fn displayed(&self) -> TabularResult {
        self.policy.apply(&self.result)
    }
}
