//! The two subsystems with real algorithmic content: asynchronous grade
//! extraction from scanned documents and competitive ranking of the
//! resulting applications.

pub mod extraction;
pub mod profile;
pub mod ranking;
