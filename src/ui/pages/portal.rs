//! Portal page component
//!
//! Shell for the role areas (`/client/*`, `/doctor/*` and so on). Shows
//! who is signed in and offers sign-out.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_location;

use crate::ui::auth::use_auth_context;
use crate::ui::routing::SessionGate;

#[component]
pub fn PortalPage() -> impl IntoView {
    let auth = use_auth_context();
    let pathname = use_location().pathname;

    let on_logout = move |_| {
        spawn_local(async move {
            auth.logout().await;
        });
    };

    view! {
        <SessionGate>
            <div class="min-h-screen bg-theme-primary">
                <header class="border-b border-theme flex items-center justify-between px-6 h-16">
                    <span class="font-bold text-theme-primary">"ClinicDesk"</span>
                    <div class="flex items-center gap-4">
                        {move || {
                            auth.actor.get().map(|actor| {
                                view! {
                                    <span class="text-sm text-theme-secondary">
                                        {actor.name} " (" {actor.role.to_string()} ")"
                                    </span>
                                }
                            })
                        }}
                        <button class="text-sm text-accent-primary" on:click=on_logout>"Sign out"</button>
                    </div>
                </header>

                <main class="p-6">
                    <h1 class="text-2xl font-semibold text-theme-primary">{move || pathname.get()}</h1>
                </main>
            </div>
        </SessionGate>
    }
}
