//! Public surface for the `recallwire-node` crate.
//!
//! Exposes the router builder, config and storage types so that external
//! crates (e.g. the conformance test suite) can spin up an in-process
//! service without spawning a subprocess.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod storage;

pub use config::NodeConfig;
pub use router::build_router;
pub use storage::{memory::MemoryStorage, Storage};
