//! Core domain types for VentureForge
//!
//! Shared between the orchestrator (persists and mutates) and
//! clients (read-only consumers).

pub mod domain;
pub mod dto;
