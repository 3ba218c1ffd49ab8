//! Request handlers, one module per resource. Routes live in
//! [`crate::routes`].

pub mod area;
pub mod client;
pub mod control;
pub mod inspection;
pub mod organization;
pub mod report;
pub mod schedule;
pub mod user;
