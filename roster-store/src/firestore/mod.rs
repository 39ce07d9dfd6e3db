//! Firestore REST adapter
//!
//! Talks to the v1 REST API directly with `reqwest`. One [`FirestoreClient`]
//! holds the HTTP client and token source; each [`FirestoreCollection`] is a
//! cheap handle onto it scoped to one collection.

pub mod auth;
pub mod client;
pub mod value;

#[cfg(test)]
mod fake;

pub use auth::TokenSource;
pub use client::{FirestoreClient, FirestoreCollection};
