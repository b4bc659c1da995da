// src/services/mod.rs

pub mod feedback;
pub mod results;
pub mod scoring;
pub mod stats;
pub mod streak;
