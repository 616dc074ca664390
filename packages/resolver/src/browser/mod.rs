//! Concrete browser backends.

pub mod chromium;

pub use chromium::ChromiumBrowser;
