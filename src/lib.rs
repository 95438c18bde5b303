// Hoverscan hover analysis library
//
// Leaves first: resolver, cache, request_coalescing, normalizer, backend;
// then scheduler, coordinator and presenter; session wires them together.

pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod metrics; // Prometheus counters for cache, backend and overlay
pub mod normalizer;
pub mod presenter;
pub mod request_coalescing;
pub mod resolver;
pub mod scheduler;
pub mod session;
