#![warn(clippy::all, missing_docs)]

//! Core domain logic for gamevault.
//!
//! This crate hosts the game record model, the collection store and its
//! storage backends, derived statistics and views, the catalog cover
//! lookup, and configuration handling used by the terminal front-end.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod seed;
pub mod stats;
pub mod store;
pub mod views;

pub use catalog::{CatalogCandidate, CatalogClient};
pub use config::{AppConfig, CatalogConfig};
pub use error::{BackendError, StoreError};
pub use models::{CoverSource, GamePatch, GameRecord, GameStatus, NewGame};
pub use stats::{stats, CollectionStats};
pub use store::{CollectionEvent, CollectionStore, FileBackend, MemoryBackend, StorageBackend};
