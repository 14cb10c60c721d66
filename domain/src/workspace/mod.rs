//! The run record: contributions, syntheses, artifacts and audit log.

pub mod artifact;
pub mod audit;
pub mod contribution;
pub mod entities;
pub mod run;
pub mod synthesis;
