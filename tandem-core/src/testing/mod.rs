//! Testing utilities for unit and integration tests
//!
//! Provides:
//! - MockVenue: answers recorded gateway commands with lifecycle events
//! - Event and book builders
//! - Engines wired to a recording gateway

pub mod helpers;
pub mod mock_venue;

pub use helpers::*;
pub use mock_venue::{MockVenue, VenueOrder};
