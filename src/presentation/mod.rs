//! HTML rendering with askama.

pub mod views;
