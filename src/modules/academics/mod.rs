//! Academic structure generation.
//!
//! A school declares its curriculum per education tier and gets concrete
//! classes and modules for the current academic year. [`plan`] decides what
//! to create; [`service`] writes it in one transaction.

pub mod controller;
pub mod model;
pub mod plan;
pub mod service;
