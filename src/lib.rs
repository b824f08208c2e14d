pub mod interface;
pub mod service;
pub mod shared;

// Backward-compatible re-exports (transitional).
pub use interface::{db, engine, http, identity, storage};
pub use shared::{config, entities, error, logging, ports, utils};
