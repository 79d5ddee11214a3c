//! Admin API handlers and shared response shapes.
pub mod error;
pub mod openapi;
pub mod principals;
pub mod roles;
pub mod system;
pub mod types;
