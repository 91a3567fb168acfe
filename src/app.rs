use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

use crate::core::config::SessionConfig;
use crate::ui::RoleRedirect;
use crate::ui::auth::provide_auth_context;
use crate::ui::pages::{LandingPage, LoginPage, NotFoundPage, PortalPage, RegisterPage};

pub fn shell(options: LeptosOptions) -> impl IntoView {
    // Session settings travel to the browser as <meta> tags
    #[cfg(feature = "ssr")]
    let session_meta = SessionConfig::from_env().meta_tags();
    #[cfg(not(feature = "ssr"))]
    let session_meta = SessionConfig::default().meta_tags();

    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                {session_meta
                    .into_iter()
                    .map(|(name, content)| view! { <meta name=name content=content/> })
                    .collect_view()}
                <AutoReload options=options.clone() />
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    #[cfg(feature = "ssr")]
    let config = SessionConfig::from_env();
    #[cfg(not(feature = "ssr"))]
    let config = SessionConfig::from_document();
    provide_auth_context(config);

    view! {
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/clinicdesk.css"/>

        <Title text="ClinicDesk"/>

        <Router>
            <RoleRedirect/>
            <Routes fallback=NotFoundPage>
                <Route path=path!("/") view=LandingPage/>
                <Route path=path!("/login") view=LoginPage/>
                <Route path=path!("/register") view=RegisterPage/>
                <Route path=path!("/client/*any") view=PortalPage/>
                <Route path=path!("/doctor/*any") view=PortalPage/>
                <Route path=path!("/secretary/*any") view=PortalPage/>
                <Route path=path!("/admin/*any") view=PortalPage/>
                <Route path=path!("/superadmin/*any") view=PortalPage/>
            </Routes>
        </Router>
    }
}
