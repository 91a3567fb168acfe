//! ClinicDesk - clinic web client
//!
//! Session lifecycle and role-based route authorization for the clinic
//! frontend, built with Leptos and WebAssembly.
//!
//! - [`core::session`]: credential storage, token refresh and the session state machine
//! - [`core::routing`]: route permissions, guards and role redirects
//! - [`ui`]: the Leptos context and components wiring both into the app

#![recursion_limit = "512"]

pub mod app;
pub mod core;
pub mod ui;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
