//! Data provider trait for financial data retrieval.
//!
//! The provider is an external collaborator: given a query it returns
//! already-structured records or fails with not-found/unavailable.
//! Records are untrusted string maps - fields may be missing and
//! consumers must tolerate that without crashing.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SeerError;

/// An opaque record returned by the provider.
///
/// Keys and values are provider-defined; a missing field is valid.
pub type Record = HashMap<String, String>;

/// Date range metadata for weekly transaction queries.
#[derive(Debug, Clone, Default)]
pub struct WeekWindow {
    /// ISO week number of the returned window
    pub week: u32,
    /// Start date of the current week (provider-formatted)
    pub current_start: String,
    /// Start date of the requested (possibly past) week
    pub target_start: String,
}

/// Financial data provider (companies, SEC filings, insider trading).
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Look up a company by ticker symbol.
    async fn company_by_ticker(&self, ticker: &str) -> Result<Record, SeerError>;

    /// Search companies by ticker or name.
    async fn search_companies(&self, query: &str, limit: usize) -> Result<Vec<Record>, SeerError>;

    /// Recent SEC filings for one company.
    async fn company_filings(&self, ticker: &str, limit: usize) -> Result<Vec<Record>, SeerError>;

    /// Recent SEC filings across all companies.
    async fn recent_filings(&self, limit: usize) -> Result<Vec<Record>, SeerError>;

    /// Insider transactions for one company.
    async fn insider_transactions(
        &self,
        ticker: &str,
        limit: usize,
    ) -> Result<Vec<Record>, SeerError>;

    /// Recent insider activity across all companies.
    async fn recent_insider_activity(&self, limit: usize) -> Result<Vec<Record>, SeerError>;

    /// Largest insider transactions for the current day.
    ///
    /// `kind` is `"buyers"` or `"sellers"`.
    async fn largest_daily_transactions(
        &self,
        kind: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Record>, SeerError>;

    /// Largest insider transactions for a week.
    ///
    /// `week_offset` counts back from the current week (0 = current).
    async fn largest_weekly_transactions(
        &self,
        kind: &str,
        week_offset: usize,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Record>, WeekWindow), SeerError>;

    /// Whether the provider can currently serve queries.
    async fn is_healthy(&self) -> bool;
}
