use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::geo_point::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NgoProfile {
    pub id: Uuid,
    pub name: String,
    pub area: Option<String>,
    pub capacity_kg_per_day: u32,
    /// Historical fulfillment rating in `[0, 100]`. `None` ranks as 50.
    pub performance_score: Option<f64>,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
}

impl NgoProfile {
    /// Case-insensitive match on name or area.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&needle)
            || self
                .area
                .as_deref()
                .is_some_and(|area| area.to_lowercase().contains(&needle))
    }
}
