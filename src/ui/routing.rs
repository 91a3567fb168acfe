//! Role redirect component
//!
//! Watches the session status, the actor's role and the current location,
//! and performs the navigation the redirect controller asks for. Must be
//! rendered inside the `<Router>`.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};

use crate::core::routing::{RedirectController, normalize_path};
use crate::ui::auth::use_auth_context;

#[component]
pub fn RoleRedirect() -> impl IntoView {
    let auth = use_auth_context();
    let location = use_location();
    let navigate = use_navigate();
    let controller = StoredValue::new(RedirectController::new(auth.config().login_route));

    Effect::new(move |_| {
        let status = auth.status.get();
        let role = auth.role();
        let path = location.pathname.get();

        let (target, reverify) = controller
            .try_update_value(|c| (c.on_change(status, role, &path), c.reverify_on(status, &path)))
            .unwrap_or((None, false));

        // A cached session is re-checked when it opens another protected page
        if reverify {
            auth.ensure_verified();
        }
        if let Some(target) = target
            && target != normalize_path(&path)
        {
            tracing::debug!(from = %path, to = %target, %status, "role redirect");
            navigate(
                &target,
                NavigateOptions {
                    replace: true,
                    ..Default::default()
                },
            );
        }
    });
}

/// Placeholder rendered while the stored session is being verified
#[component]
pub fn SessionGate(children: ChildrenFn) -> impl IntoView {
    let auth = use_auth_context();

    view! {
        <Show
            when=move || !auth.is_loading()
            fallback=|| view! { <p class="p-8 text-center text-theme-secondary">"Checking your session..."</p> }
        >
            {children()}
        </Show>
    }
}
