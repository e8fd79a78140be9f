//! Session gating for protected screens.
//!
//! Every protected route runs the same decision: no session sends the viewer to the
//! login screen, a session without the admin role sends them to the general dashboard
//! when the screen needs it, and everything else proceeds. The extractors below apply
//! that decision before the handler body, so a redirected request never reaches a
//! data fetch.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::Redirect,
};

use crate::{
    auth::Session,
    config::AppConfig,
    models::AdminToken,
    repository::{Repository, RepositoryState},
};

pub const LOGIN_PATH: &str = "/auth/login";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// What a screen demands of its viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    SignedIn,
    Admin,
}

/// GuardDecision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the screen. `admin` is present only when the role was verified.
    Allow {
        session: Session,
        admin: Option<AdminToken>,
    },
    /// Send the viewer elsewhere; the screen is not rendered.
    Redirect(&'static str),
}

/// check
///
/// Applies `requirement` to `session`. The profile is only looked up for admin screens.
/// A profile that is missing, or a lookup that fails, counts as non-admin.
pub async fn check(
    repo: &dyn Repository,
    session: Option<Session>,
    requirement: Requirement,
) -> GuardDecision {
    let Some(session) = session else {
        return GuardDecision::Redirect(LOGIN_PATH);
    };

    if requirement == Requirement::SignedIn {
        return GuardDecision::Allow {
            session,
            admin: None,
        };
    }

    let token = match AdminToken::verify(repo, session.user_id).await {
        Ok(token) => token,
        Err(e) => {
            // No retry: a failed lookup falls through to non-admin handling.
            tracing::warn!(user = %session.user_id, error = %e, "profile lookup failed");
            None
        }
    };

    match token {
        Some(token) => GuardDecision::Allow {
            session,
            admin: Some(token),
        },
        None => {
            tracing::debug!(user = %session.user_id, "non-admin viewer redirected");
            GuardDecision::Redirect(DASHBOARD_PATH)
        }
    }
}

/// SignedIn Extractor
///
/// Resolves the viewer's session or redirects to the login screen.
#[derive(Debug, Clone)]
pub struct SignedIn(pub Session);

impl<S> FromRequestParts<S> for SignedIn
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        let session = Session::from_headers(&parts.headers, &config);

        match check(repo.as_ref(), session, Requirement::SignedIn).await {
            GuardDecision::Allow { session, .. } => Ok(SignedIn(session)),
            GuardDecision::Redirect(to) => Err(Redirect::to(to)),
        }
    }
}

/// AdminViewer Extractor
///
/// Resolves a session whose profile has the admin role, together with the capability
/// token that privileged repository calls require.
#[derive(Debug, Clone)]
pub struct AdminViewer {
    pub session: Session,
    pub token: AdminToken,
}

impl<S> FromRequestParts<S> for AdminViewer
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);
        let session = Session::from_headers(&parts.headers, &config);

        match check(repo.as_ref(), session, Requirement::Admin).await {
            GuardDecision::Allow {
                session,
                admin: Some(token),
            } => Ok(AdminViewer { session, token }),
            GuardDecision::Allow { admin: None, .. } => Err(Redirect::to(DASHBOARD_PATH)),
            GuardDecision::Redirect(to) => Err(Redirect::to(to)),
        }
    }
}
