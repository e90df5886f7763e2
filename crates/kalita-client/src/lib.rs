//! Typed client for the Kalita community API, plus state bindings that keep
//! the last fetched data, a loading flag and the last error message for a
//! view to render.

pub mod auth;
pub mod client;
pub mod error;
pub mod news;
pub mod residents;
pub mod state;

pub use auth::AuthSession;
pub use client::{ClientConfig, KalitaClient};
pub use error::ClientError;
pub use news::{NewsDetailView, NewsFeed};
pub use residents::{CurrentResident, ResidentDirectory, SaveOutcome};
pub use state::FetchState;
