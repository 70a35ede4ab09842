use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use super::page::{render_login, render_main, PageView};
use super::state::AppState;
use super::submit::{submit, SubmitError, SubmitForm, Upload};
use crate::auth::AuthState;
use crate::session::SessionId;

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "transcribe_session";

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value))
}

/// The caller's live session, if any. Read-only views use this so that anonymous
/// traffic does not open sessions.
fn existing_session(state: &AppState, headers: &HeaderMap) -> Option<SessionId> {
    state.sessions.lookup(session_from_headers(headers))
}

/// Looks up the caller's session, opening one if the cookie is missing or stale.
fn resolve_session(state: &AppState, headers: &HeaderMap) -> (SessionId, bool) {
    state.sessions.resolve(session_from_headers(headers))
}

fn with_cookie(mut response: Response, session: SessionId, created: bool) -> Response {
    if created {
        let cookie = format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Invalid session cookie"),
        }
    }
    response
}

/// Page state that survives a submission round trip.
struct FormEcho {
    language_known: bool,
    language: Option<String>,
}

fn render_page(
    state: &AppState,
    session: Option<SessionId>,
    status: StatusCode,
    error: Option<&str>,
    echo: Option<&FormEcho>,
) -> Response {
    let (auth, result) = session
        .map(|id| state.sessions.with(id, |s| (s.auth, s.result.get().cloned())))
        .unwrap_or_default();

    if state.options.require_auth && !auth.is_authenticated() {
        let status = if status.is_success() {
            StatusCode::OK
        } else {
            StatusCode::UNAUTHORIZED
        };
        return (status, Html(render_login(auth == AuthState::Rejected))).into_response();
    }

    let selected_language = echo
        .and_then(|e| e.language.as_deref())
        .and_then(|code| state.catalog.resolve(code))
        .unwrap_or(state.options.default_language.as_str());

    let view = PageView {
        options: &state.options,
        catalog: &state.catalog,
        result: result.as_ref(),
        error,
        selected_language,
        language_known: echo.is_some_and(|e| e.language_known),
    };

    (status, Html(render_main(&view))).into_response()
}

#[tracing::instrument(skip(state, headers))]
pub async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = existing_session(&state, &headers);
    render_page(&state, session, StatusCode::OK, None, None)
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[tracing::instrument(skip(state, headers, form))]
pub async fn login_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let (session, created) = resolve_session(&state, &headers);
    state.sessions.with(session, |s| {
        s.auth = s.auth.submit(&state.gate, &form.username, &form.password);
    });
    with_cookie(Redirect::to("/").into_response(), session, created)
}

async fn read_submit_form(multipart: &mut Multipart) -> Result<SubmitForm, MultipartError> {
    let mut form = SubmitForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                tracing::debug!(file_name = %file_name, bytes = bytes.len(), "Audio received");
                form.upload = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "language_known" => {
                let value = field.text().await?;
                form.language_known = !matches!(value.trim(), "" | "off" | "false");
            }
            "language" => {
                form.language = Some(field.text().await?);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn transcribe_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (session, created) = resolve_session(&state, &headers);

    let form = match read_submit_form(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read multipart upload");
            let message = format!("Failed to read upload: {e}");
            let response = render_page(&state, Some(session), e.status(), Some(&message), None);
            return with_cookie(response, session, created);
        }
    };

    let echo = FormEcho {
        language_known: form.language_known,
        language: form.language.clone(),
    };

    let response = match submit(&state, session, form).await {
        Ok(()) => render_page(&state, Some(session), StatusCode::OK, None, Some(&echo)),
        Err(SubmitError::Unauthenticated) => {
            render_page(&state, Some(session), StatusCode::UNAUTHORIZED, None, None)
        }
        Err(e) => {
            if !matches!(e, SubmitError::Remote(_)) {
                tracing::warn!(session = %session, "Submission rejected: {e}");
            }
            render_page(&state, Some(session), e.status(), Some(&e.user_message()), Some(&echo))
        }
    };

    with_cookie(response, session, created)
}

#[tracing::instrument(skip(state, headers))]
pub async fn download_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = existing_session(&state, &headers);
    let clear = state.options.clear_after_download;
    let require_auth = state.options.require_auth;

    let text = session.and_then(|id| {
        state.sessions.with(id, |s| {
            if require_auth && !s.auth.is_authenticated() {
                return None;
            }
            let result = if clear {
                s.result.take()
            } else {
                s.result.get().cloned()
            };
            result.map(|r| r.transcription)
        })
    });

    match text {
        Some(text) => {
            tracing::info!(cleared = clear, "Transcription downloaded");
            (
                [
                    (CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (CONTENT_DISPOSITION, "attachment; filename=\"transcription.txt\""),
                ],
                text,
            )
                .into_response()
        }
        None => render_page(
            &state,
            session,
            StatusCode::NOT_FOUND,
            Some("There is no transcription to download yet."),
            None,
        ),
    }
}

#[tracing::instrument(skip(state, headers))]
pub async fn clear_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(session) = existing_session(&state, &headers) {
        state.sessions.with(session, |s| s.result.clear());
    }
    Redirect::to("/").into_response()
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

#[derive(Serialize)]
pub struct LanguagesResponse {
    pub default: String,
    pub languages: Vec<&'static str>,
}

pub async fn languages_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(LanguagesResponse {
        default: state.options.default_language.clone(),
        languages: state.catalog.codes().to_vec(),
    })
}
