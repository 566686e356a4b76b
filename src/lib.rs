//! Scheduling core for a shared meeting-room booking dashboard.
//!
//! The crate covers the parts of the system with real invariants: calendar
//! grid construction (month and week views), half-open interval conflict
//! detection, and a validated write path over an injected booking store.
//! Rendering, authentication, and admin screens live in the embedding
//! application.

pub mod calendar;
pub mod config;
pub mod engine;
pub mod model;
pub mod notify;
pub mod store;
