//! Extraction stages
//!
//! Each stage reads today's slice of its upstream table, calls the source,
//! and lands raw payloads. Per-entity failures are caught at the smallest
//! enclosing loop and never abort sibling units.

pub mod blobs;
pub mod commit_details;
pub mod commits;
pub mod repos;
