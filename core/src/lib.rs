//! Steward core - routes model-proposed operations onto the user-record store.
//!
//! The model service is strictly a translator: it picks one operation from a
//! fixed catalog and fills in its arguments. Everything it returns is
//! untrusted text until the router has validated it against the catalog.

pub mod catalog;
pub mod client;
pub mod error;
pub mod llm;
pub mod router;
