//! Personal access token sign-in
//!
//! A `Session` lives for one sign-in/sign-out pair. `with_session` is the
//! scoped form used by the pipeline: it signs in, runs the body, and signs
//! out on every exit path of the body (success or error).

use super::client::{ensure_success, TableauClient, AUTH_HEADER};
use super::error::TableauError;
use super::types::{SignInCredentials, SignInRequest, SignInResponse, SiteRef};
use crate::config::ServerConfig;
use std::future::Future;

/// Authenticated session handle
#[derive(Clone)]
pub struct Session {
    pub token: String,
    /// Site LUID issued at sign-in (used in site-scoped REST paths)
    pub site_id: String,
    pub user_id: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("site_id", &self.site_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

pub async fn sign_in(client: &TableauClient, config: &ServerConfig) -> Result<Session, TableauError> {
    let request = SignInRequest {
        credentials: SignInCredentials {
            personal_access_token_name: &config.token_name,
            personal_access_token_secret: &config.token_secret,
            site: SiteRef {
                content_url: &config.site_id,
            },
        },
    };

    let response = client
        .http()
        .post(client.rest_url("auth/signin"))
        .json(&request)
        .send()
        .await?;
    let response = ensure_success(response, "Sign in").await?;
    let body: SignInResponse = response.json().await?;

    log::info!(
        "🔐 Signed in to {} (site: {})",
        config.server_name,
        if config.site_id.is_empty() { "<default>" } else { config.site_id.as_str() }
    );

    Ok(Session {
        token: body.credentials.token,
        site_id: body.credentials.site.id,
        user_id: body.credentials.user.id,
    })
}

pub async fn sign_out(client: &TableauClient, session: &Session) -> Result<(), TableauError> {
    let response = client
        .http()
        .post(client.rest_url("auth/signout"))
        .header(AUTH_HEADER, &session.token)
        .send()
        .await?;
    ensure_success(response, "Sign out").await?;
    log::info!("🔒 Signed out");
    Ok(())
}

/// Sign in, run `body` with the session, then sign out.
///
/// Sign-out runs whether `body` succeeded or failed. A sign-out failure is
/// only logged; the body's own result is returned unchanged.
pub async fn with_session<T, E, F, Fut>(
    client: &TableauClient,
    config: &ServerConfig,
    body: F,
) -> Result<T, E>
where
    F: FnOnce(Session) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<TableauError>,
{
    let session = sign_in(client, config).await?;

    let outcome = body(session.clone()).await;

    if let Err(e) = sign_out(client, &session).await {
        log::warn!("Failed to sign out: {}", e);
    }

    outcome
}
