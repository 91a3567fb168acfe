//! Registration form component

use leptos::prelude::*;
use leptos::task::spawn_local;

use super::context::use_auth_context;
use crate::core::session::RegistrationForm;

const MIN_PASSWORD_LEN: usize = 8;

#[component]
pub fn RegisterForm() -> impl IntoView {
    let auth = use_auth_context();

    let first_name = RwSignal::new(String::new());
    let last_name = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let phone = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let pending = RwSignal::new(false);
    let form_error = RwSignal::new(None::<String>);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        auth.clear_error();
        form_error.set(None);
        if pending.get_untracked() {
            return;
        }

        let form = RegistrationForm {
            email: email.get_untracked().trim().to_string(),
            password: password.get_untracked(),
            first_name: first_name.get_untracked().trim().to_string(),
            last_name: last_name.get_untracked().trim().to_string(),
            phone: Some(phone.get_untracked().trim().to_string()).filter(|p| !p.is_empty()),
        };

        if form.email.is_empty() || form.first_name.is_empty() || form.last_name.is_empty() {
            form_error.set(Some("Name and email are required".to_string()));
            return;
        }
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            form_error.set(Some(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
            return;
        }

        pending.set(true);
        spawn_local(async move {
            match auth.register(&form).await {
                // RoleRedirect moves the new actor to their dashboard
                Ok(actor) => tracing::debug!(role = %actor.role, "account created"),
                // Already published to auth.error
                Err(err) => tracing::debug!(error = %err, "registration failed"),
            }
            pending.set(false);
        });
    };

    let field = move |id: &'static str, label: &'static str, kind: &'static str, value: RwSignal<String>| {
        view! {
            <div>
                <label for=id class="block text-sm font-medium text-theme-primary mb-1">{label}</label>
                <input
                    type=kind
                    id=id
                    name=id
                    class="w-full px-3 py-2 bg-theme-secondary border border-theme rounded-lg"
                    prop:value=move || value.get()
                    on:input=move |ev| value.set(event_target_value(&ev))
                />
            </div>
        }
    };

    view! {
        <form on:submit=on_submit class="space-y-4">
            <h2 class="text-2xl font-bold text-theme-primary text-center">"Create account"</h2>

            {move || {
                form_error.get().or_else(|| auth.error.get()).map(|error| {
                    view! {
                        <div class="p-3 bg-red-100 border border-red-300 rounded-lg" role="alert">
                            <p class="text-sm text-red-700">{error}</p>
                        </div>
                    }
                })
            }}

            {field("first_name", "First name", "text", first_name)}
            {field("last_name", "Last name", "text", last_name)}
            {field("email", "Email", "email", email)}
            {field("phone", "Phone (optional)", "tel", phone)}
            {field("password", "Password", "password", password)}

            <button
                type="submit"
                class="w-full py-2.5 px-4 bg-accent-primary text-white font-medium rounded-lg disabled:opacity-50"
                disabled=move || pending.get()
            >
                {move || if pending.get() { "Creating account..." } else { "Create account" }}
            </button>
        </form>
    }
}
