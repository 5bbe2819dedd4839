//! HTTP layer of FileLink.
//!
//! This module owns everything between the TCP listener and the
//! filesystem: the route registry and dispatch, the file and directory
//! responses, and the server lifecycle.

pub mod asset_router;
pub mod file_router;
pub mod route;
pub mod serve_file;
pub mod server;
pub mod state;
