pub mod api;
pub mod coerce;
pub mod config;
pub mod digest;
pub mod document;
pub mod error;
pub mod file_store;
pub mod rag;
pub mod search;
