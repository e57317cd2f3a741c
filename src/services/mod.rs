//! Business logic independent of storage and transport.
//!
//! - `advisor`: rule-based farm-health advice from the latest soil reading
//! - `export`: CSV serialization of the full dataset
//! - `weather`: upstream weather API client and payload mapping

pub mod advisor;
pub mod export;
pub mod weather;
