//! Carton and pallet packing calculator.
//!
//! Given an item, a container and optionally an outer container (pallet), the
//! engine finds how many items fit per container and how many containers fit
//! per outer container, searching axis-aligned orientations for the best yield.

pub mod api;
pub mod config;
pub mod export;
pub mod geometry;
pub mod model;
pub mod optimizer;
pub mod types;
