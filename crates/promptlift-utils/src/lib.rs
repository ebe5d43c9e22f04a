pub mod error;
pub mod logging;
pub mod paths;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
