//! Core domain concepts shared across all subdomains.
//!
//! - [`ids::RunId`] - run identity and store keys
//! - [`error::DomainError`] - domain-level errors
//! - [`string`] - text helpers used by fallback synthesis

pub mod error;
pub mod ids;
pub mod string;
