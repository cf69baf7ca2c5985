//! School join requests.
//!
//! Two ways into a school:
//!
//! - a join request (self-submitted, seeded by the school, or created by a
//!   join code when the school wants to verify) that the named person later
//!   accepts, which creates the membership and returns a membership token;
//! - joining directly with the school username and the per-role join code,
//!   which skips the request when no verification is required.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
