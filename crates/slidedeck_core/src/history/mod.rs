//! Undo/redo history over the document model.
//!
//! # Responsibility
//! - Record every structural mutation as a reversible action.
//! - Be the only caller of `Document::apply_patch`.
//!
//! # Invariants
//! - Direct document mutation outside the engine is not possible from
//!   outside this crate.

pub mod action;
pub mod engine;
