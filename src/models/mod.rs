pub mod claim;
pub mod donation;
pub mod geo_point;
pub mod ngo;
