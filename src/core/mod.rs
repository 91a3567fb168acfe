//! Session lifecycle and role-based route authorization

pub mod config;
pub mod routing;
pub mod session;
