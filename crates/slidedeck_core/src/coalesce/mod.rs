//! Input coalescing for noisy editing surfaces.

pub mod coalescer;
