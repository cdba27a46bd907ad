pub mod setup;

// Re-export main utilities for use by test files
pub use setup::{TestApp, TestAppBuilder, ADMIN_PASSWORD};
