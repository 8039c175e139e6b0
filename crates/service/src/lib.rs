//! Business layer of the marketplace on top of `models`.
//! - Auth (registration, login, token gate) behind a repository trait.
//! - Technician discovery and profile management.
//! - Bookings with slot conflict checking, reviews with the rating aggregator.
//! - Admin moderation with transactional cascade deletes.

pub mod errors;
pub mod auth;
pub mod technician_service;
pub mod booking_service;
pub mod review_service;
pub mod admin_service;
#[cfg(test)]
pub mod test_support;
