//! Cleans OpenStreetMap XML extracts into newline-delimited JSON records for a
//! document store.
//!
//! Each `node` and `way` becomes one record: provenance attributes go under
//! `created`, coordinates into `pos`, `addr:*` tags into a cleaned `address`
//! sub-record and other `prefix:suffix` tags into nested objects. The work is
//! done by the ETLs in [`etl`]; [`etl::process_data::ProcessDataEtl`] writes the
//! records and [`etl::audit_streets::AuditStreetsEtl`] reports which street
//! abbreviations occur in the data.

pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
