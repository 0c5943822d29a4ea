//! HTML page handlers: landing page, submission form, confirmation, and
//! the session-gated dashboard.
//!
//! Validation failures re-render the page with a field→message map and
//! status 400; the store is only reached when validation passes.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use tera::Context;
use tracing::debug;

use super::auth::AuthenticatedIdentity;
use super::templates::render;
use super::SharedState;
use crate::error::Result;
use crate::store::NewSubmission;
use crate::validation::{self, StrengthPolicy};

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    password: String,
    #[serde(default, rename = "confirmPassword")]
    confirm_password: String,
}

pub async fn index(State(state): State<SharedState>) -> Result<Html<String>> {
    let submissions = state.store.list(None).await?;
    let mut ctx = Context::new();
    ctx.insert("submissions", &submissions);
    render("index.html", &ctx)
}

pub async fn form() -> Result<Html<String>> {
    let mut ctx = Context::new();
    ctx.insert("errors", &HashMap::<&str, String>::new());
    ctx.insert("values", &HashMap::<&str, String>::new());
    render("form.html", &ctx)
}

pub async fn submit(
    State(state): State<SharedState>,
    Form(form): Form<SubmitForm>,
) -> Result<Response> {
    let mut errors = validation::validate_submission(&form.name, &form.email);
    errors.merge(validation::validate_password(
        &form.password,
        &form.confirm_password,
        StrengthPolicy::Advisory,
    ));
    if !errors.is_empty() {
        let mut ctx = Context::new();
        ctx.insert("errors", &errors.field_map());
        ctx.insert(
            "values",
            &HashMap::from([
                ("name", form.name.as_str()),
                ("email", form.email.as_str()),
                ("message", form.message.as_str()),
            ]),
        );
        return Ok((StatusCode::BAD_REQUEST, render("form.html", &ctx)?).into_response());
    }

    let score = validation::password_strength(&form.password);
    if score < validation::MIN_STRENGTH_SCORE {
        debug!("accepting weak password (score {score}) on the public form");
    }

    let entry = state
        .store
        .create(NewSubmission {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            message: validation::sanitize_message(&form.message),
        })
        .await?;

    let mut ctx = Context::new();
    ctx.insert("entry", &entry);
    Ok(render("thankyou.html", &ctx)?.into_response())
}

pub async fn dashboard(
    identity: AuthenticatedIdentity,
    State(state): State<SharedState>,
) -> Result<Html<String>> {
    let submissions = state.store.list(None).await?;
    let mut ctx = Context::new();
    ctx.insert("identity", &identity);
    ctx.insert("submissions", &submissions);
    render("dashboard.html", &ctx)
}
