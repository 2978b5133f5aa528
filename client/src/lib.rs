//! Quest progression client.
//!
//! The [`domain::ProgressionController`] keeps a session's user and quest
//! list in step with a remote quest service. Adapters for that service live
//! in [`outbound`]; [`config`] loads the settings that pick and tune them.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
