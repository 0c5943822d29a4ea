//! Account registration, login, and the session gate.
//!
//! Sessions live server-side in a token → session map; the cookie carries
//! `token.signature` where the signature is a SHA-256 digest keyed with the
//! configured session secret, so a tampered token never reaches the map.
//! Session lifetime is fixed at one day and is not refreshed on activity.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tera::Context;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::templates::render;
use super::SharedState;
use crate::error::Result;
use crate::validation::{self, StrengthPolicy};

pub const SESSION_COOKIE: &str = "intake_session";
const SESSION_TTL_SECS: i64 = 86_400;

/// Proof that the request carries a valid, unexpired session. Resolved once
/// per request by the extractor below and passed into handlers explicitly.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedIdentity {
    pub name: String,
    pub email: String,
}

struct UserRecord {
    name: String,
    salt: String,
    password_digest: String,
}

#[derive(Debug, Clone)]
struct Session {
    identity: AuthenticatedIdentity,
    expires_at: DateTime<Utc>,
}

/// In-process account and session tables.
pub struct AuthState {
    secret: String,
    users: RwLock<HashMap<String, UserRecord>>,
    sessions: RwLock<HashMap<String, Session>>,
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex(&hasher.finalize())
}

fn sign(secret: &str, token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(token.as_bytes());
    hex(&hasher.finalize())
}

/// Pull one cookie value out of a `Cookie:` header.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}

fn session_cookie(value: &str) -> String {
    format!("{SESSION_COOKIE}={value}; Path=/; HttpOnly; Max-Age={SESSION_TTL_SECS}")
}

fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

impl AuthState {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create an account. Returns false when the email is already taken.
    pub async fn register_user(&self, name: &str, email: &str, password: &str) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return false;
        }
        let mut salt_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = hex(&salt_bytes);
        let password_digest = digest_password(&salt, password);
        users.insert(
            email.to_string(),
            UserRecord {
                name: name.to_string(),
                salt,
                password_digest,
            },
        );
        true
    }

    pub async fn verify_login(&self, email: &str, password: &str) -> Option<AuthenticatedIdentity> {
        let users = self.users.read().await;
        let user = users.get(email)?;
        if digest_password(&user.salt, password) != user.password_digest {
            return None;
        }
        Some(AuthenticatedIdentity {
            name: user.name.clone(),
            email: email.to_string(),
        })
    }

    /// Start an Authenticated session; returns the signed cookie value.
    pub async fn create_session(&self, identity: AuthenticatedIdentity) -> String {
        let token = Uuid::new_v4().to_string();
        let signature = sign(&self.secret, &token);
        self.sessions.write().await.insert(
            token.clone(),
            Session {
                identity,
                expires_at: Utc::now() + Duration::seconds(SESSION_TTL_SECS),
            },
        );
        format!("{token}.{signature}")
    }

    /// Resolve the identity behind a request's `Cookie` header, if any.
    /// Expired sessions are dropped on the way through.
    pub async fn resolve(&self, cookie_header: Option<&str>) -> Option<AuthenticatedIdentity> {
        let raw = cookie_value(cookie_header?, SESSION_COOKIE)?;
        let (token, signature) = raw.split_once('.')?;
        if sign(&self.secret, token) != signature {
            return None;
        }
        let mut sessions = self.sessions.write().await;
        match sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => Some(session.identity.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Back to Anonymous: forget the session behind the cookie, if valid.
    pub async fn destroy(&self, cookie_header: Option<&str>) {
        let Some(raw) = cookie_header.and_then(|h| cookie_value(h, SESSION_COOKIE)) else {
            return;
        };
        if let Some((token, _)) = raw.split_once('.') {
            self.sessions.write().await.remove(token);
        }
    }
}

/// Gate for page routes: Anonymous callers are redirected to the login
/// entry point instead of reaching the handler.
impl FromRequestParts<SharedState> for AuthenticatedIdentity {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let cookie = parts
            .headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok());
        state
            .auth
            .resolve(cookie)
            .await
            .ok_or_else(|| Redirect::to("/login"))
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn register_context(errors: &HashMap<&'static str, String>, form: &RegisterForm) -> Context {
    let mut ctx = Context::new();
    ctx.insert("errors", errors);
    ctx.insert(
        "values",
        &HashMap::from([("name", form.name.as_str()), ("email", form.email.as_str())]),
    );
    ctx
}

pub async fn register_page() -> Result<Response> {
    let mut ctx = Context::new();
    ctx.insert("errors", &HashMap::<&str, String>::new());
    ctx.insert("values", &HashMap::<&str, String>::new());
    Ok(render("register.html", &ctx)?.into_response())
}

pub async fn register(
    State(state): State<SharedState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let mut errors = validation::validate_submission(&form.name, &form.email);
    errors.merge(validation::validate_password(
        &form.password,
        &form.confirm_password,
        StrengthPolicy::Blocking,
    ));
    if !errors.is_empty() {
        let ctx = register_context(&errors.field_map(), &form);
        return Ok((StatusCode::BAD_REQUEST, render("register.html", &ctx)?).into_response());
    }

    let name = form.name.trim();
    let email = form.email.trim();
    if !state.auth.register_user(name, email, &form.password).await {
        let taken = HashMap::from([(
            "account",
            "An account with that email already exists.".to_string(),
        )]);
        let ctx = register_context(&taken, &form);
        return Ok((StatusCode::BAD_REQUEST, render("register.html", &ctx)?).into_response());
    }

    info!("registered account for {}", email);
    let cookie = state
        .auth
        .create_session(AuthenticatedIdentity {
            name: name.to_string(),
            email: email.to_string(),
        })
        .await;
    Ok((
        [(header::SET_COOKIE, session_cookie(&cookie))],
        Redirect::to("/dashboard"),
    )
        .into_response())
}

pub async fn login_page() -> Result<Response> {
    let mut ctx = Context::new();
    ctx.insert("values", &HashMap::<&str, String>::new());
    Ok(render("login.html", &ctx)?.into_response())
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match state.auth.verify_login(form.email.trim(), &form.password).await {
        Some(identity) => {
            let cookie = state.auth.create_session(identity).await;
            Ok((
                [(header::SET_COOKIE, session_cookie(&cookie))],
                Redirect::to("/dashboard"),
            )
                .into_response())
        }
        None => {
            let mut ctx = Context::new();
            ctx.insert("error", "Invalid email or password.");
            ctx.insert("values", &HashMap::from([("email", form.email.as_str())]));
            Ok((StatusCode::BAD_REQUEST, render("login.html", &ctx)?).into_response())
        }
    }
}

pub async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Response {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    state.auth.destroy(cookie).await;
    ([(header::SET_COOKIE, clear_cookie())], Redirect::to("/")).into_response()
}
