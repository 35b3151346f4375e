//! BorNet: member registration and deferred profile completion.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod notify;
pub mod profile;
pub mod reconcile;
pub mod registration;
pub mod staging;
