//! Offline cache service for the application shell.
//!
//! This module keeps named cache generations of shell assets and answers
//! intercepted requests with one of two policies:
//! - API requests (URL contains the API marker) go to the network first and
//!   fall back to the cache when the network is unreachable
//! - everything else is served from the cache first and fetched on a miss
//!
//! Installing a generation stores the whole manifest or nothing; activating it
//! deletes every other generation.

mod context;
mod network;
mod request;
mod storage;
mod worker;

pub use context::{spawn, Registration, WorkerHandle};
pub use network::HttpNetwork;
pub use request::AssetRequest;
pub use storage::SqliteCacheStorage;
pub use worker::{OfflineSettings, OfflineWorker};

#[cfg(test)]
pub(crate) use worker::tests::{settings as test_settings, shell as test_shell};
