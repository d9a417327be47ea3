//! Token-based routing for the gatekeeper.
//!
//! This module provides:
//! - JWT decision token minting and verification
//! - Identity recovery from unverified tokens
//! - Token extraction from cookies and bearer headers
//! - The `check_status` handler

mod extract;
mod handlers;
pub mod jwt;
pub mod types;

pub use extract::{build_auth_cookie, token_from_headers};
pub use handlers::check_status;
