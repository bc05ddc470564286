//! Shared E2E test helpers.
//!
//! Provides a mock component test bed, a configuration builder with
//! template files, and call-order assertions.

pub mod assertions;
pub mod testbed;
