use kalita_types::api::UpsertResidentRequest;
use kalita_types::directory::{DirectoryStats, distinct_blocks, filter_residents};
use kalita_types::models::ResidentInfo;

use crate::client::KalitaClient;
use crate::state::FetchState;

/// The public resident directory.
pub struct ResidentDirectory {
    client: KalitaClient,
    pub residents: Vec<ResidentInfo>,
    pub blocks: Vec<String>,
    pub state: FetchState,
}

impl ResidentDirectory {
    pub fn new(client: KalitaClient) -> Self {
        Self {
            client,
            residents: Vec::new(),
            blocks: Vec::new(),
            state: FetchState::default(),
        }
    }

    pub async fn mount(&mut self) {
        self.state.clear_error();
        self.fetch_residents().await;
        self.fetch_blocks().await;
    }

    pub async fn refetch(&mut self) {
        self.mount().await;
    }

    pub async fn fetch_residents(&mut self) {
        self.state.begin();
        let result = self.client.public_residents().await;
        if let Some(residents) = self.state.finish(result) {
            self.residents = residents;
        }
    }

    pub async fn fetch_blocks(&mut self) {
        let result = self.client.blocks().await;
        if let Some(blocks) = self.state.record(result) {
            self.blocks = blocks;
        }
    }

    pub async fn fetch_residents_by_block(&mut self, block: &str) {
        self.state.begin();
        let result = self.client.residents_by_block(block).await;
        if let Some(residents) = self.state.finish(result) {
            self.residents = residents;
        }
    }

    /// Loaded residents matching the search box.
    pub fn filtered(&self, term: &str) -> Vec<&ResidentInfo> {
        filter_residents(&self.residents, term)
    }

    /// Blocks present in the loaded rows, for when the block list itself
    /// could not be fetched.
    pub fn loaded_blocks(&self) -> Vec<String> {
        distinct_blocks(&self.residents)
    }

    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats::from_residents(&self.residents)
    }
}

/// Result of saving the signed-in user's own record.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome {
    pub success: bool,
    pub data: Option<ResidentInfo>,
    pub error: Option<String>,
}

/// The signed-in user's own resident record.
pub struct CurrentResident {
    client: KalitaClient,
    pub resident: Option<ResidentInfo>,
    pub state: FetchState,
}

impl CurrentResident {
    pub fn new(client: KalitaClient) -> Self {
        Self {
            client,
            resident: None,
            state: FetchState::default(),
        }
    }

    /// A missing record is the normal state for a new member, not an error.
    pub async fn mount(&mut self) {
        self.state.clear_error();
        self.state.begin();
        let result = match self.client.current_resident().await {
            Err(e) if e.is_not_found() => Ok(None),
            other => other.map(Some),
        };
        if let Some(resident) = self.state.finish(result) {
            self.resident = resident;
        }
    }

    pub async fn refetch(&mut self) {
        self.mount().await;
    }

    pub async fn save_resident(&mut self, resident: &UpsertResidentRequest) -> SaveOutcome {
        self.state.begin();
        let result = self.client.upsert_resident(resident).await;
        self.state.loading = false;
        match result {
            Ok(saved) => {
                self.resident = Some(saved.clone());
                SaveOutcome { success: true, data: Some(saved), error: None }
            }
            Err(e) => {
                let message = e.to_string();
                self.state.error = Some(message.clone());
                SaveOutcome { success: false, data: None, error: Some(message) }
            }
        }
    }
}
