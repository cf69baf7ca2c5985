//! # Schoolhub Auth
//!
//! Authentication claims and JWT utilities for the schoolhub API.
//!
//! Two kinds of token are issued:
//!
//! - **Access token** ([`Claims`]): returned by login, identifies a user.
//! - **Membership token** ([`MembershipClaims`]): returned when a user becomes
//!   a teacher, student or staff member of a school. Its subject is the
//!   membership record, not the user, and its payload depends on the role.

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{ACCESS_AUDIENCE, Claims, MEMBERSHIP_AUDIENCE, MembershipClaims, MembershipScope};
pub use jwt::{create_access_token, create_membership_token, verify_membership_token, verify_token};
