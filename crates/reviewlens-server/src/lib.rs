//! ReviewLens HTTP server
//!
//! Serves review sentiment classification, reviewer feedback that updates the
//! active model in place, keyword statistics over stored reviews, and hot
//! model switching.

pub mod config;
pub mod errors;
pub mod routes;
pub mod state;
pub mod store;

pub use config::{ConfigOverrides, ServerConfig};
pub use errors::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use store::{FeedbackRecord, InMemoryStore, ModelSwitch, NewFeedback, ReviewStore, StoredReview};
