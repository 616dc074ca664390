//! Capability traits at the seams of the resolution core.
//!
//! Concrete browser, inference, and registry backends implement these
//! interfaces; tests substitute the mocks in [`crate::testing`].

pub mod candidates;
pub mod inference;
pub mod page;
pub mod registry;
