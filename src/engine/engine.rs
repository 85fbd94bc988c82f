use crate::debtor::{DebtorRecord, RowRecord};
use crate::engine::collaborators::{ObjectStore, PortfolioStore, ProgressSink};
use crate::engine::lease::Leases;
use crate::engine::state::PipelineState;
use crate::error::IngestError;
use crate::header::SynonymTable;
use crate::portfolio::{aggregate, PortfolioSummary};
use crate::reader::{check_size, decode, FileKind};
use crate::validate::{validate, Rejection, Validation};

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_FILE_MB: u64 = 10;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_file_mb: u64,
    pub synonyms: SynonymTable,
    /// Delete the created portfolio when its debtors cannot be inserted.
    pub rollback_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_mb: DEFAULT_MAX_FILE_MB,
            synonyms: SynonymTable::default(),
            rollback_on_failure: true,
        }
    }
}

/// A file handed in by an institution.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub owner_id: String,
    pub portfolio_name: Option<String>,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub portfolio_id: String,
    pub storage_path: String,
    pub summary: PortfolioSummary,
    pub rejected: Vec<Rejection>,
}

/// State of a single ingestion attempt.
pub struct Run<'a> {
    state: PipelineState,
    history: Vec<PipelineState>,
    progress: &'a dyn ProgressSink,
}

impl<'a> Run<'a> {
    pub fn new(progress: &'a dyn ProgressSink) -> Self {
        Self {
            state: PipelineState::Idle,
            history: vec![PipelineState::Idle],
            progress,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    fn advance(&mut self, to: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "illegal transition {} -> {}",
            self.state,
            to
        );
        info!(from = %self.state, to = %to, "pipeline transition");

        self.state = to;
        self.history.push(to);
        if let Some(percentage) = to.checkpoint() {
            self.progress.report(percentage);
        }
    }

    fn fail(&mut self, err: &IngestError) {
        if self.state.can_fail() {
            error!(state = %self.state, error = %err, "ingestion failed");
            self.advance(PipelineState::Failed);
        }
    }
}

pub struct Engine<S, P> {
    storage: S,
    portfolios: P,
    config: EngineConfig,
    leases: Leases,
    today: Option<NaiveDate>,
}

impl<S, P> Engine<S, P>
where
    S: ObjectStore + Sync,
    P: PortfolioStore + Sync,
{
    pub fn new(storage: S, portfolios: P, config: EngineConfig) -> Self {
        Self {
            storage,
            portfolios,
            config,
            leases: Leases::new(),
            today: None,
        }
    }

    /// Pins the ingestion date instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn leases(&self) -> &Leases {
        &self.leases
    }

    pub fn portfolios(&self) -> &P {
        &self.portfolios
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub async fn ingest(
        &self,
        upload: &Upload,
        progress: &dyn ProgressSink,
    ) -> Result<IngestOutcome, IngestError> {
        let mut run = Run::new(progress);
        self.ingest_run(upload, &mut run).await
    }

    /// Like [`Engine::ingest`] but leaves the run available for inspection.
    pub async fn ingest_run(
        &self,
        upload: &Upload,
        run: &mut Run<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        // Pre-flight checks leave the run idle.
        let kind = FileKind::from_file_name(&upload.file_name)?;
        check_size(upload.bytes.len() as u64, self.config.max_file_mb)?;
        let _lease = self.leases.acquire(&upload.owner_id)?;

        let result = self.execute(upload, kind, run).await;
        if let Err(e) = &result {
            run.fail(e);
        }
        result
    }

    async fn execute(
        &self,
        upload: &Upload,
        kind: FileKind,
        run: &mut Run<'_>,
    ) -> Result<IngestOutcome, IngestError> {
        let today = self.today();

        run.advance(PipelineState::Uploading);
        let storage_path = self
            .storage
            .store(&upload.bytes, &upload.owner_id, kind.extension())
            .await
            .map_err(IngestError::Storage)?;
        info!(%storage_path, owner = %upload.owner_id, "stored upload");

        run.advance(PipelineState::Parsing);
        let validation = parse_debtors(kind, &upload.bytes, &self.config.synonyms, today)?;
        info!(
            valid = validation.valid.len(),
            rejected = validation.rejected.len(),
            "parsed debtor file"
        );

        run.advance(PipelineState::CreatingPortfolio);
        let request = aggregate(
            &validation.valid,
            upload.portfolio_name.as_deref(),
            &upload.owner_id,
            today,
        )?;
        let portfolio_id = self
            .portfolios
            .create_portfolio(&request)
            .await
            .map_err(IngestError::Persistence)?;
        info!(%portfolio_id, name = %request.name, "created portfolio");

        run.advance(PipelineState::PersistingRecords);
        let debtors: Vec<DebtorRecord> = validation
            .valid
            .into_iter()
            .map(|d| d.with_portfolio(&portfolio_id))
            .collect();

        if let Err(e) = self
            .portfolios
            .bulk_insert_debtors(&debtors, &portfolio_id)
            .await
        {
            if self.config.rollback_on_failure {
                self.compensate(&portfolio_id).await;
            }
            return Err(IngestError::Persistence(e));
        }

        run.advance(PipelineState::Done);

        Ok(IngestOutcome {
            portfolio_id,
            storage_path,
            summary: request.summary(),
            rejected: validation.rejected,
        })
    }

    async fn compensate(&self, portfolio_id: &str) {
        match self.portfolios.delete_portfolio(portfolio_id).await {
            Ok(()) => warn!(%portfolio_id, "rolled back portfolio after failed debtor insert"),
            Err(e) => error!(%portfolio_id, error = %e, "failed to roll back portfolio"),
        }
    }
}

/// Decodes a debtor file and runs header inference, normalization and
/// validation over it.
pub fn parse_debtors(
    kind: FileKind,
    bytes: &[u8],
    synonyms: &SynonymTable,
    today: NaiveDate,
) -> Result<Validation, IngestError> {
    let mut rows = decode(kind, bytes)?.into_iter();

    let Some(header) = rows.next() else {
        return Err(IngestError::NoValidRecords {
            rejected: Vec::new(),
        });
    };

    let mapping = synonyms.resolve(&header.cells);
    debug!(?mapping, line = header.line, "resolved header");

    validate(rows.map(|row| (row.line, RowRecord::from_row(&row.cells, &mapping, today))))
}
