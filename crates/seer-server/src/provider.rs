//! Placeholder data provider.
//!
//! The real provider queries the filings database and is wired in by the
//! deployment. This stub keeps the server bootable without one: every
//! query reports the data source as unavailable, while the access layer
//! in front of it runs for real.

use async_trait::async_trait;

use seer_traits::{DataProvider, Record, SeerError, WeekWindow};

/// Provider stub that reports the data source as unavailable.
pub struct UnavailableProvider;

fn unavailable() -> SeerError {
    SeerError::SourceNotAvailable("financial data source is not configured".to_string())
}

#[async_trait]
impl DataProvider for UnavailableProvider {
    async fn company_by_ticker(&self, _ticker: &str) -> Result<Record, SeerError> {
        Err(unavailable())
    }

    async fn search_companies(
        &self,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn company_filings(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn recent_filings(&self, _limit: usize) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn insider_transactions(
        &self,
        _ticker: &str,
        _limit: usize,
    ) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn recent_insider_activity(&self, _limit: usize) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn largest_daily_transactions(
        &self,
        _kind: &str,
        _offset: usize,
        _limit: usize,
    ) -> Result<Vec<Record>, SeerError> {
        Err(unavailable())
    }

    async fn largest_weekly_transactions(
        &self,
        _kind: &str,
        _week_offset: usize,
        _offset: usize,
        _limit: usize,
    ) -> Result<(Vec<Record>, WeekWindow), SeerError> {
        Err(unavailable())
    }

    async fn is_healthy(&self) -> bool {
        false
    }
}
