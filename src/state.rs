use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::engine::ranking::PriorityRanker;
use crate::models::claim::{Claim, ClaimEvent};
use crate::models::donation::Donation;
use crate::models::ngo::NgoProfile;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub donations: DashMap<Uuid, Donation>,
    pub ngos: DashMap<Uuid, NgoProfile>,
    pub claims: DashMap<Uuid, Claim>,
    pub claim_events_tx: broadcast::Sender<ClaimEvent>,
    pub ranker: PriorityRanker,
    pub overview_limit: usize,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize, overview_limit: usize) -> Self {
        let (claim_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            donations: DashMap::new(),
            ngos: DashMap::new(),
            claims: DashMap::new(),
            claim_events_tx,
            ranker: PriorityRanker::new(),
            overview_limit,
            metrics: Metrics::new(),
        }
    }
}
