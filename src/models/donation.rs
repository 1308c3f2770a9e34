use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::geo_point::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    Pending,
    Allocated,
    PickedUp,
    Rejected,
}

impl DonationStatus {
    /// Status changes a donor or admin may make directly.
    ///
    /// `Allocated` is reachable only through a claim, and nothing returns
    /// to `Pending` once it has left.
    pub fn can_transition_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (DonationStatus::Pending, DonationStatus::Rejected)
                | (DonationStatus::Allocated, DonationStatus::PickedUp)
                | (DonationStatus::Allocated, DonationStatus::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub donor_name: String,
    pub food_type: String,
    pub quantity: String,
    pub expiry_hours: f64,
    pub distance_km: f64,
    pub pickup_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup: Option<GeoPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: DonationStatus,
    pub allocated_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    pub fn is_eligible(&self) -> bool {
        self.status == DonationStatus::Pending
    }

    pub fn matches_food_type(&self, needle: &str) -> bool {
        let needle = needle.trim();
        needle.is_empty()
            || self
                .food_type
                .to_lowercase()
                .contains(&needle.to_lowercase())
    }
}
