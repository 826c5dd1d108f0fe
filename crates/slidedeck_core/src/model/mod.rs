//! Presentation document model.
//!
//! # Responsibility
//! - Define canonical slide/element data structures.
//! - Provide the single structural-mutation surface (`Patch`) used by the
//!   history engine.
//!
//! # Invariants
//! - Every element has exactly one closed variant.
//! - Snapshots are immutable from the perspective of external holders.

pub mod document;
pub mod element;
pub mod length;
pub mod patch;
pub mod slide;
