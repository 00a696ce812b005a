//! Application services layer.

pub mod blog;
pub mod error;
pub mod language;
pub mod pagination;
pub mod repos;
pub mod urls;
pub mod viewer;
