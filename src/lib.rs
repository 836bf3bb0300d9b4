//! Library exports for the link shortener
//!
//! Exposes the core components for integration tests and embedding.

pub mod auth;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod password;
pub mod route;
pub mod shortener;
pub mod store;
pub mod token;
