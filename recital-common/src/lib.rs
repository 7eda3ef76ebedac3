//! # Recital Common Library
//!
//! Shared code for the recital display, admin and check-in clients:
//! - Program and performer data models
//! - CSV line parsing and program loading
//! - API request/response types
//! - Configuration loading
//! - Local cache (persisted fallback state)
//! - Timestamp utilities

pub mod api;
pub mod cache;
pub mod checkin;
pub mod config;
pub mod csv;
pub mod error;
pub mod index;
pub mod program;
pub mod time;

pub use cache::LocalCache;
pub use checkin::{CheckinField, PerformerCheckinRecord};
pub use error::{Error, FetchError, LoadError, MutationError, ParseError, Result};
pub use index::ProgramIndex;
pub use program::{Performers, Presentation, ProgramFormat, ProgramItem};
