//! Data model for resolutions, learned patterns, and batch runs.

pub mod attempt;
pub mod batch;
pub mod config;
pub mod patterns;
