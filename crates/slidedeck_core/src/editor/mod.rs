//! Editor-facing glue: the single rich-text surface context and the
//! toolbar projection.
//!
//! # Invariants
//! - Neither module mutates the document; drafts go through history.

pub mod context;
pub mod toolbar;
