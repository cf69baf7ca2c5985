pub mod academics;
pub mod auth;
pub mod join_requests;
pub mod memberships;
pub mod schools;
pub mod users;
