use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Uploading,
    Parsing,
    CreatingPortfolio,
    PersistingRecords,
    Done,
    Failed,
}

impl PipelineState {
    /// Progress percentage reported when the state is entered.
    pub fn checkpoint(&self) -> Option<u8> {
        match self {
            PipelineState::Uploading => Some(10),
            PipelineState::Parsing => Some(40),
            PipelineState::CreatingPortfolio => Some(60),
            PipelineState::PersistingRecords => Some(90),
            PipelineState::Done => Some(100),
            PipelineState::Idle | PipelineState::Failed => None,
        }
    }

    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Idle => Some(PipelineState::Uploading),
            PipelineState::Uploading => Some(PipelineState::Parsing),
            PipelineState::Parsing => Some(PipelineState::CreatingPortfolio),
            PipelineState::CreatingPortfolio => Some(PipelineState::PersistingRecords),
            PipelineState::PersistingRecords => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }

    pub fn can_fail(&self) -> bool {
        !matches!(
            self,
            PipelineState::Idle | PipelineState::Done | PipelineState::Failed
        )
    }

    pub fn can_transition_to(&self, to: PipelineState) -> bool {
        match to {
            PipelineState::Failed => self.can_fail(),
            _ => self.next() == Some(to),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Uploading => "uploading",
            PipelineState::Parsing => "parsing",
            PipelineState::CreatingPortfolio => "creating_portfolio",
            PipelineState::PersistingRecords => "persisting_records",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}
