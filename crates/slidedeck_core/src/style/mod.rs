//! Pure style resolution used on every render path.
//!
//! # See also
//! - `model::length` for the stored length representation.

pub mod resolver;
