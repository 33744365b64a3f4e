//! Shared model and JSON API definitions for Taskboard.

pub mod analytics;
pub mod api;
pub mod envelope;
pub mod model;
