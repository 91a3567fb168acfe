//! Application pages module
//!
//! - Landing page (home)
//! - Login and register pages
//! - Portal page for each role area
//! - Not found page

mod landing;
mod login;
mod not_found;
mod portal;
mod register;

pub use landing::LandingPage;
pub use login::LoginPage;
pub use not_found::NotFoundPage;
pub use portal::PortalPage;
pub use register::RegisterPage;
