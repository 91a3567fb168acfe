//! Login form component
//!
//! Sign-in form with an email or phone identifier and a password. Errors
//! from the session service surface through the auth context.

use leptos::prelude::*;
use leptos::task::spawn_local;

use super::context::use_auth_context;

/// Login form component
#[component]
pub fn LoginForm(
    /// Callback when login is successful
    #[prop(optional, into)]
    on_success: Option<Callback<()>>,
) -> impl IntoView {
    let auth = use_auth_context();

    // Form state
    let identifier = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let pending = RwSignal::new(false);

    // Form validation
    let identifier_error = RwSignal::new(None::<String>);
    let password_error = RwSignal::new(None::<String>);

    let validate_identifier = move || {
        if identifier.with(|v| v.trim().is_empty()) {
            identifier_error.set(Some("Email or phone is required".to_string()));
            false
        } else {
            identifier_error.set(None);
            true
        }
    };

    let validate_password = move || {
        if password.with(String::is_empty) {
            password_error.set(Some("Password is required".to_string()));
            false
        } else {
            password_error.set(None);
            true
        }
    };

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        auth.clear_error();

        let identifier_valid = validate_identifier();
        let password_valid = validate_password();
        if !identifier_valid || !password_valid || pending.get_untracked() {
            return;
        }

        let identifier_val = identifier.get_untracked().trim().to_string();
        let password_val = password.get_untracked();

        pending.set(true);
        spawn_local(async move {
            let result = auth.login(&identifier_val, &password_val).await;
            pending.set(false);
            // Failures are already published to auth.error
            if result.is_ok()
                && let Some(callback) = on_success
            {
                callback.run(());
            }
        });
    };

    view! {
        <form on:submit=on_submit class="space-y-6">
            <div class="text-center">
                <h2 class="text-2xl font-bold text-theme-primary">"Sign in"</h2>
                <p class="mt-2 text-sm text-theme-secondary">
                    "Use the email or phone number registered with the clinic"
                </p>
            </div>

            // Global error message
            {move || {
                auth.error.get().map(|error| {
                    view! {
                        <div class="p-3 bg-red-100 border border-red-300 rounded-lg" role="alert">
                            <p class="text-sm text-red-700">{error}</p>
                        </div>
                    }
                })
            }}

            <div>
                <label for="identifier" class="block text-sm font-medium text-theme-primary mb-1">
                    "Email or phone"
                </label>
                <input
                    type="text"
                    id="identifier"
                    name="identifier"
                    autocomplete="username"
                    class="w-full px-3 py-2 bg-theme-secondary border border-theme rounded-lg"
                    class:border-red-500=move || identifier_error.get().is_some()
                    prop:value=move || identifier.get()
                    on:input=move |ev| {
                        identifier.set(event_target_value(&ev));
                        identifier_error.set(None);
                    }
                    on:blur=move |_| { validate_identifier(); }
                />
                {move || {
                    identifier_error.get().map(|error| {
                        view! { <p class="mt-1 text-sm text-red-500">{error}</p> }
                    })
                }}
            </div>

            <div>
                <label for="password" class="block text-sm font-medium text-theme-primary mb-1">
                    "Password"
                </label>
                <input
                    type="password"
                    id="password"
                    name="password"
                    autocomplete="current-password"
                    class="w-full px-3 py-2 bg-theme-secondary border border-theme rounded-lg"
                    class:border-red-500=move || password_error.get().is_some()
                    prop:value=move || password.get()
                    on:input=move |ev| {
                        password.set(event_target_value(&ev));
                        password_error.set(None);
                    }
                    on:blur=move |_| { validate_password(); }
                />
                {move || {
                    password_error.get().map(|error| {
                        view! { <p class="mt-1 text-sm text-red-500">{error}</p> }
                    })
                }}
            </div>

            <button
                type="submit"
                class="w-full py-2.5 px-4 bg-accent-primary text-white font-medium rounded-lg disabled:opacity-50"
                disabled=move || pending.get()
            >
                {move || if pending.get() { "Signing in..." } else { "Sign In" }}
            </button>
        </form>
    }
}
