//! Centralized constants for the pixelhat installer.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod packages;
pub mod paths;
pub mod service;
