//! Client for the reels backend.
//!
//! The backend is an opaque JSON-over-HTTP service:
//!
//! - [`client`] - async `reqwest` wrappers for every endpoint
//! - [`types`] - request and response bodies
//!
//! Every response carries a `success` flag. A missing or false flag becomes
//! [`ApiError::Application`] with the backend's `error` text, while network
//! failures and non-2xx statuses are transport errors.

mod client;
mod types;

pub use client::{ApiError, ReelsClient, DEFAULT_TIMEOUT};
pub use types::{
    AuthStatus, Credentials, NewReel, Reel, ReelsPage, TrackViewResponse, UserStatus,
};
