//! Larder Testing Infrastructure
//!
//! Fixtures and test doubles shared by the Larder crates' integration
//! suites: a manual clock, a storage backend that fails on demand, and an
//! in-memory remote store that runs the access policy and enforces one
//! pending claim per donation the way the hosted document store does.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! larder-testkit = { workspace = true }
//! ```

pub mod clock;
pub mod fixtures;
pub mod remote;
pub mod storage;

pub use clock::ManualClock;
pub use fixtures::*;
pub use remote::MemoryRemoteStore;
pub use storage::FailingStorage;
