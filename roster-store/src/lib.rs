//! roster-store: student records and the document-store adapters behind them
//!
//! - [`record`]: schema-less record model and its `{id, ...fields}` rendering
//! - [`store`]: the [`DocumentStore`] trait every backend implements
//! - [`firestore`]: Firestore v1 REST adapter with service-account auth
//! - [`memory`]: in-process adapter for local runs and tests
//! - [`settings`]: environment-driven connection settings

pub mod error;
pub mod firestore;
pub mod memory;
pub mod record;
pub mod settings;
pub mod store;

pub use error::{Result, StoreError};
pub use firestore::{FirestoreClient, FirestoreCollection};
pub use memory::{MemoryCollection, MemoryStore};
pub use record::{Fields, Record};
pub use settings::FirestoreSettings;
pub use store::{DocumentStore, SharedStore};

/// Collection holding student records
pub const STUDENTS_COLLECTION: &str = "students";

/// Collection counted by the connectivity probe
pub const PROBE_COLLECTION: &str = "test";
