use crate::debtor::DebtorRecord;
use crate::engine::collaborators::{ObjectStore, PortfolioStore};
use crate::error::BoxError;
use crate::portfolio::PortfolioRequest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A stored portfolio as written to `portfolios/{id}.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPortfolio {
    pub id: String,
    #[serde(flatten)]
    pub request: PortfolioRequest,
    pub created_at: DateTime<Utc>,
}

/// Filesystem-backed object storage and portfolio store.
///
/// Layout under the root directory:
/// - `uploads/{owner}-{millis}.{ext}` raw files
/// - `portfolios/{id}.json` one portfolio per file
/// - `debtors/{id}.jsonl` one debtor per line
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    seq: Arc<AtomicU64>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn portfolio_path(&self, id: &str) -> PathBuf {
        self.root.join("portfolios").join(format!("{}.json", id))
    }

    fn debtors_path(&self, id: &str) -> PathBuf {
        self.root.join("debtors").join(format!("{}.jsonl", id))
    }

    pub async fn load_portfolio(&self, id: &str) -> Result<StoredPortfolio, BoxError> {
        let text = fs::read_to_string(self.portfolio_path(id)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn load_debtors(&self, id: &str) -> Result<Vec<DebtorRecord>, BoxError> {
        let text = fs::read_to_string(self.debtors_path(id)).await?;
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(BoxError::from))
            .collect()
    }
}

impl ObjectStore for LocalStore {
    async fn store(
        &self,
        bytes: &[u8],
        owner_id: &str,
        extension: &str,
    ) -> Result<String, BoxError> {
        if owner_id.is_empty() || owner_id.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(format!("invalid owner id '{}'", owner_id).into());
        }

        let dir = self.root.join("uploads");
        fs::create_dir_all(&dir).await?;

        let file_name = format!(
            "{}-{}.{}",
            owner_id,
            Utc::now().timestamp_millis(),
            extension
        );
        fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("uploads/{}", file_name))
    }
}

impl PortfolioStore for LocalStore {
    async fn create_portfolio(&self, request: &PortfolioRequest) -> Result<String, BoxError> {
        fs::create_dir_all(self.root.join("portfolios")).await?;

        let id = format!(
            "port-{}-{}",
            Utc::now().timestamp_millis(),
            self.seq.fetch_add(1, Ordering::Relaxed)
        );
        let stored = StoredPortfolio {
            id: id.clone(),
            request: request.clone(),
            created_at: Utc::now(),
        };

        fs::write(self.portfolio_path(&id), serde_json::to_vec_pretty(&stored)?).await?;
        debug!(%id, "wrote portfolio");

        Ok(id)
    }

    async fn bulk_insert_debtors(
        &self,
        debtors: &[DebtorRecord],
        portfolio_id: &str,
    ) -> Result<(), BoxError> {
        if !fs::try_exists(self.portfolio_path(portfolio_id)).await? {
            return Err(format!("portfolio {} does not exist", portfolio_id).into());
        }
        fs::create_dir_all(self.root.join("debtors")).await?;

        // Serialize everything first so a bad record writes nothing.
        let mut buf = Vec::new();
        for debtor in debtors {
            serde_json::to_writer(&mut buf, debtor)?;
            buf.push(b'\n');
        }

        let mut file = fs::File::create(self.debtors_path(portfolio_id)).await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        debug!(%portfolio_id, count = debtors.len(), "wrote debtors");

        Ok(())
    }

    async fn delete_portfolio(&self, portfolio_id: &str) -> Result<(), BoxError> {
        for path in [self.debtors_path(portfolio_id), self.portfolio_path(portfolio_id)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
