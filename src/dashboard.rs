use serde_json::Value;
use tracing::{debug, info};

use crate::client::{response, FetchError, Fetched, SubscriberSource};
use crate::subscriber::{project_rows, DisplayRow, Kpis, COLUMNS};

/// Everything derived from one successful response. Rebuilt from scratch on
/// every refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub document: Value,
    pub rows: Vec<DisplayRow>,
    pub kpis: Kpis,
}

impl Snapshot {
    pub fn from_document(document: Value) -> Self {
        let records = response::records_from_document(&document);
        let rows = project_rows(&records, &COLUMNS);
        let kpis = Kpis::from_rows(&rows);
        Self {
            document,
            rows,
            kpis,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Failure {
    pub message: String,
    pub document: Option<Value>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DashboardState {
    #[default]
    Idle,
    Loading,
    Loaded(Snapshot),
    Failed(Failure),
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            Self::Loaded(snapshot) => &snapshot.rows,
            _ => &[],
        }
    }

    pub fn kpis(&self) -> Kpis {
        match self {
            Self::Loaded(snapshot) => snapshot.kpis,
            _ => Kpis::default(),
        }
    }

    pub fn document(&self) -> Option<&Value> {
        match self {
            Self::Loaded(snapshot) => Some(&snapshot.document),
            Self::Failed(failure) => failure.document.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(failure) => Some(failure.message.as_str()),
            _ => None,
        }
    }
}

/// Request/response state for one account's subscriber list.
#[derive(Debug)]
pub struct Dashboard<S> {
    source: S,
    account_id: u64,
    state: DashboardState,
    refreshes: u64,
}

impl<S: SubscriberSource> Dashboard<S> {
    pub fn new(source: S, account_id: u64) -> Self {
        Self {
            source,
            account_id,
            state: DashboardState::Idle,
            refreshes: 0,
        }
    }

    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    pub fn begin_refresh(&mut self) {
        self.refreshes += 1;
        debug!(refresh = self.refreshes, "dashboard loading");
        self.state = DashboardState::Loading;
    }

    pub fn finish_refresh(&mut self, result: Result<Fetched, FetchError>) {
        self.state = match result {
            Ok(fetched) => {
                let snapshot = Snapshot::from_document(fetched.document);
                info!(
                    total = snapshot.kpis.total,
                    active = snapshot.kpis.active,
                    "dashboard loaded"
                );
                DashboardState::Loaded(snapshot)
            }
            Err(err) => {
                info!(error = %err, "dashboard refresh failed");
                let document = err.document().cloned();
                DashboardState::Failed(Failure {
                    message: err.to_string(),
                    document,
                })
            }
        };
    }

    /// Fetch once and replace the current state with the outcome.
    pub async fn refresh(&mut self) -> &DashboardState {
        self.begin_refresh();
        let result = self.source.list_subscribers(self.account_id).await;
        self.finish_refresh(result);
        &self.state
    }
}
