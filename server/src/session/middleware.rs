//! Axum middleware attaching a session to every request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::api::AppState;
use crate::session::Session;

/// Loads the session named by the request cookie, exposes it through request
/// extensions, and persists it after the handler runs. Fresh sessions (new or
/// rotated) get a Set-Cookie on the way out.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.sessions.config().cookie_name.clone();
    let sid = jar.get(&cookie_name).map(|c| c.value().to_string());

    let session = state.sessions.open(sid.as_deref()).await;
    request.extensions_mut().insert(session.clone());

    let response = next.run(request).await;

    // Saving is also what ages flash data out of the record.
    state.sessions.save(&session).await;

    if session.is_fresh() {
        let mut cookie = Cookie::new(cookie_name, session.id());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(time::Duration::seconds(
            state.sessions.config().ttl_secs as i64,
        ));
        return (jar.add(cookie), response).into_response();
    }

    response
}
