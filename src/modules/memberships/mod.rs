//! Teacher, student and staff memberships.
//!
//! Memberships are only ever created by the join workflows, so this module
//! has no routes of its own.

pub mod model;
pub mod service;
