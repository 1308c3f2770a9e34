use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub ngo_id: Uuid,
    pub priority_score: f64,
    pub claimed_at: DateTime<Utc>,
    /// Set once the NGO confirms the food was collected.
    pub verified_at: Option<DateTime<Utc>>,
}

impl Claim {
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimEventKind {
    Claimed,
    PickupVerified,
}

/// What the claim feed publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvent {
    pub kind: ClaimEventKind,
    pub claim: Claim,
}
