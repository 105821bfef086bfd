//! Axum extractors for CareGrid requests.
//!
//! - [`ActorExtractor`] - The acting practitioner or patient, from headers
//! - [`ListingParams`] - Filters and paging of the appointment list

mod actor;
mod listing;

pub use actor::{ActorExtractor, X_ACTOR_ID, X_ACTOR_TYPE, actor_from_headers};
pub use listing::{ListingParams, ListingQuery};
