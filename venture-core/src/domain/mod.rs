//! Domain model
//!
//! `run` holds the lifecycle types (status, pipeline stage), `dossier` the
//! accumulating analysis record and its per-stage section schemas.

pub mod dossier;
pub mod run;
