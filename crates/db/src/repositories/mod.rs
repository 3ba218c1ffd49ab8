//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Organization-scoped
//! repositories take the caller's organization id and never return rows
//! from another tenant.

pub mod area_repo;
pub mod client_repo;
pub mod control_repo;
pub mod organization_repo;
pub mod report_repo;
pub mod user_repo;

pub use area_repo::{AreaRepo, DepartmentRepo};
pub use client_repo::ClientRepo;
pub use control_repo::ControlRepo;
pub use organization_repo::OrganizationRepo;
pub use report_repo::ReportRepo;
pub use user_repo::UserRepo;
