//! Concrete registry backends.

pub mod dadata;

pub use dadata::DadataRegistry;
