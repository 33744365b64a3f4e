//! Taskboard server library.
//!
//! A multi-tenant task board over a document store: workspaces with members,
//! projects and tasks on a kanban board, comments, month-over-month
//! analytics and an axum JSON API. Exposed as a library for the binary,
//! tests and embedding.

pub mod analytics;
pub mod bulk;
pub mod cascade;
pub mod config;
pub mod error;
pub mod guard;
pub mod identity;
pub mod images;
pub mod notify;
pub mod position;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
