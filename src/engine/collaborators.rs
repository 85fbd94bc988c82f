use crate::debtor::DebtorRecord;
use crate::error::BoxError;
use crate::portfolio::PortfolioRequest;

use std::future::Future;

/// Keeps the raw uploaded file.
pub trait ObjectStore {
    /// Returns the path the file was stored under.
    fn store(
        &self,
        bytes: &[u8],
        owner_id: &str,
        extension: &str,
    ) -> impl Future<Output = Result<String, BoxError>> + Send;
}

/// Where portfolios and their debtors are persisted.
pub trait PortfolioStore {
    /// Returns the new portfolio id.
    fn create_portfolio(
        &self,
        request: &PortfolioRequest,
    ) -> impl Future<Output = Result<String, BoxError>> + Send;

    fn bulk_insert_debtors(
        &self,
        debtors: &[DebtorRecord],
        portfolio_id: &str,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;

    fn delete_portfolio(
        &self,
        portfolio_id: &str,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Receives progress percentages. Best effort; cannot fail a run.
pub trait ProgressSink {
    fn report(&self, percentage: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(u8),
{
    fn report(&self, percentage: u8) {
        self(percentage)
    }
}

/// Discards progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percentage: u8) {}
}

impl<T: ObjectStore + Sync> ObjectStore for &T {
    async fn store(
        &self,
        bytes: &[u8],
        owner_id: &str,
        extension: &str,
    ) -> Result<String, BoxError> {
        (**self).store(bytes, owner_id, extension).await
    }
}

impl<T: PortfolioStore + Sync> PortfolioStore for &T {
    async fn create_portfolio(&self, request: &PortfolioRequest) -> Result<String, BoxError> {
        (**self).create_portfolio(request).await
    }

    async fn bulk_insert_debtors(
        &self,
        debtors: &[DebtorRecord],
        portfolio_id: &str,
    ) -> Result<(), BoxError> {
        (**self).bulk_insert_debtors(debtors, portfolio_id).await
    }

    async fn delete_portfolio(&self, portfolio_id: &str) -> Result<(), BoxError> {
        (**self).delete_portfolio(portfolio_id).await
    }
}
