//! Wire types shared by the recital clients
//!
//! Pure serde types for the remote API. The HTTP transport itself lives in
//! `recital-ui`.

pub mod types;

pub use types::{CheckinUpdateRequest, CurrentProgramResponse, SetCurrentProgramRequest};
