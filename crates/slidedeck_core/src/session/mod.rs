//! Session wiring: deck sources and the editing session facade.
//!
//! # Responsibility
//! - Seed one editing session per opened presentation.
//! - Hand the surrounding app render projections and export snapshots.

pub mod editing_session;
pub mod source;
