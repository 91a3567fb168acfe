//! Login page component
//!
//! Navigation after a successful sign-in is left to `RoleRedirect`, which
//! knows the destination captured before the visitor was bounced here.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::ui::auth::LoginForm;

#[component]
pub fn LoginPage() -> impl IntoView {
    view! {
        <div class="min-h-screen bg-theme-primary flex flex-col">
            <header class="border-b border-theme">
                <div class="max-w-7xl mx-auto px-4 flex items-center h-16">
                    <A href="/" attr:class="text-xl font-bold text-theme-primary">"ClinicDesk"</A>
                </div>
            </header>

            <main class="flex-1 flex flex-col items-center justify-center p-4">
                <div class="w-full max-w-md bg-theme-primary rounded-xl shadow-lg p-6 border border-theme">
                    <LoginForm />
                </div>
                <p class="mt-4 text-sm text-theme-secondary">
                    "Don't have an account? "
                    <A href="/register" attr:class="text-accent-primary font-medium">"Sign up"</A>
                </p>
            </main>
        </div>
    }
}
