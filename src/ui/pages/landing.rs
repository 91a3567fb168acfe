//! Landing page component

use leptos::prelude::*;
use leptos_meta::Meta;
use leptos_router::components::A;

use crate::ui::auth::use_auth_context;

#[component]
pub fn LandingPage() -> impl IntoView {
    let auth = use_auth_context();

    view! {
        <Meta name="description" content="Book appointments and manage your visits at the clinic." />

        <div class="min-h-screen bg-theme-primary flex flex-col items-center justify-center p-4 text-center">
            <h1 class="text-5xl font-bold text-theme-primary mb-6">"ClinicDesk"</h1>
            <p class="text-xl text-theme-secondary max-w-2xl mb-10">
                "Appointments, schedules and patient records in one place."
            </p>
            <Show
                when=move || !auth.is_authenticated()
                fallback=|| view! { <p class="text-theme-secondary">"Taking you to your dashboard..."</p> }
            >
                <div class="flex gap-4">
                    <A href="/login" attr:class="px-6 py-3 bg-accent-primary text-white rounded-lg">"Sign in"</A>
                    <A href="/register" attr:class="px-6 py-3 border border-theme rounded-lg">"Create account"</A>
                </div>
            </Show>
        </div>
    }
}
