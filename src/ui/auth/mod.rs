//! Authentication UI module
//!
//! This module provides the reactive auth context and the sign-in and
//! registration forms for the clinic frontend.

mod context;
mod login_form;
mod register_form;

pub use context::{AuthContext, provide_auth_context, use_auth_context};
pub use login_form::LoginForm;
pub use register_form::RegisterForm;
