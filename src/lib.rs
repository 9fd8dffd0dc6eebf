//! codeassist: stateless code intelligence over HTTP.
//!
//! Each request carries a full source buffer and a list of references. The
//! references select a cached analysis context; the buffer is compiled fresh
//! against it and answered by one provider.

pub mod api;
pub mod cache;
pub mod config;
pub mod document;
pub mod engine;
pub mod ide;
pub mod server;
pub mod service;
pub mod syntax;
pub mod text;

pub use server::{build_router, AppState};
