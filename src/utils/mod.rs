//! Small helpers shared by the feature modules.

pub mod db;
pub mod ids;
