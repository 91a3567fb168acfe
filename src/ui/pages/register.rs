//! Register page component

use leptos::prelude::*;
use leptos_router::components::A;

use crate::ui::auth::RegisterForm;

#[component]
pub fn RegisterPage() -> impl IntoView {
    view! {
        <div class="min-h-screen bg-theme-primary flex flex-col items-center justify-center p-4">
            <div class="w-full max-w-md bg-theme-primary rounded-xl shadow-lg p-6 border border-theme">
                <RegisterForm />
            </div>
            <p class="mt-4 text-sm text-theme-secondary">
                "Already registered? "
                <A href="/login" attr:class="text-accent-primary font-medium">"Sign in"</A>
            </p>
        </div>
    }
}
