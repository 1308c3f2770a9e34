pub mod claims;
pub mod marketplace;
pub mod ranking;
pub mod reports;
