pub mod auth;
pub mod pages;
pub mod routing;

pub use routing::{RoleRedirect, SessionGate};
