//! Kontrol domain core.
//!
//! Pure inspection-workflow logic with zero internal dependencies so it can
//! be shared by the persistence layer, the HTTP server, and tests:
//!
//! - [`schedule`] -- interval arithmetic and due-tier classification.
//! - [`checklist`] -- checklist item definitions and per-item result state.
//! - [`session`] -- the in-progress inspection session.
//! - [`report`] -- report finalization and aggregate results.
//! - [`follow_up`] -- the mutable follow-up sidecar on finalized reports.
//! - [`store`], [`photos`], [`export`] -- collaborator contracts.

pub mod checklist;
pub mod controls;
pub mod directory;
pub mod error;
pub mod export;
pub mod follow_up;
pub mod photos;
pub mod report;
pub mod roles;
pub mod schedule;
pub mod session;
pub mod store;
pub mod types;
