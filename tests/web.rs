use std::collections::HashMap;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use transcribe::auth::{CredentialGate, REJECTED_MESSAGE};
use transcribe::transcription::{
    MockTranscriber, Preset, TranscriberOptions, TranscriptionResult,
};
use transcribe::web::{create_router, AppState, SESSION_COOKIE};

const BOUNDARY: &str = "transcribe-test-boundary";
const MAX_UPLOAD: usize = 1024 * 1024;

fn state(mock: Arc<MockTranscriber>, preset: Preset) -> AppState {
    let mut passwords = HashMap::new();
    passwords.insert("alice".to_string(), "secret".to_string());
    AppState::new(
        mock,
        TranscriberOptions::preset(preset),
        CredentialGate::new(passwords),
    )
}

fn app(mock: Arc<MockTranscriber>, preset: Preset) -> Router {
    create_router(state(mock, preset), MAX_UPLOAD)
}

struct Part<'a> {
    name: &'a str,
    file_name: Option<&'a str>,
    data: &'a [u8],
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.file_name {
            Some(file_name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    part.name, file_name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn transcribe_request(parts: &[Part<'_>], cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// `name=value` from the response's Set-Cookie header.
fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    let pair = header.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn audio(file_name: &str) -> Part<'_> {
    Part {
        name: "audio",
        file_name: Some(file_name),
        data: b"RIFF....WAVEfmt fake audio",
    }
}

#[tokio::test]
async fn given_new_visitor_when_index_then_shows_upload_form_without_session() {
    let app = app(Arc::new(MockTranscriber::replying("unused")), Preset::Translate);

    let response = app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());

    let html = body_text(response).await;
    assert!(html.contains("An Audio-To-Text Transcription Application"));
    assert!(html.contains("Translate to English"));
    assert!(html.contains("accept=\".mp3,.mp4,.ogg,.wav\""));
    assert!(!html.contains("id=\"transcription\""));
}

#[tokio::test]
async fn given_uploaded_audio_when_transcribe_then_page_shows_result() {
    let mock = Arc::new(MockTranscriber::replying("hello world"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let html = body_text(response).await;
    assert!(html.contains("<pre id=\"transcription\">hello world</pre>"));
    assert_eq!(mock.calls(), 1);

    let request = mock.last_request().unwrap();
    assert_eq!(request.file_name, "memo.wav");
    assert!(request.translate);
    assert_eq!(request.language, None);

    // The result survives a reload within the same session
    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("hello world"));

    // but not in a different one
    let html = body_text(app.oneshot(get("/", None)).await.unwrap()).await;
    assert!(!html.contains("hello world"));
}

#[tokio::test]
async fn given_known_language_when_transcribe_then_language_is_forwarded() {
    let mock = Arc::new(MockTranscriber::replying("guten tag"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(
            &[
                Part { name: "language_known", file_name: None, data: b"on" },
                Part { name: "language", file_name: None, data: b"DE" },
                audio("memo.mp3"),
            ],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mock.last_request().unwrap().language.as_deref(), Some("de"));
}

#[tokio::test]
async fn given_unknown_language_when_transcribe_then_rejected_without_remote_call() {
    let mock = Arc::new(MockTranscriber::replying("unused"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(
            &[
                Part { name: "language_known", file_name: None, data: b"on" },
                Part { name: "language", file_name: None, data: b"klingon" },
                audio("memo.mp3"),
            ],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn given_no_file_when_transcribe_then_prompts_for_upload() {
    let mock = Arc::new(MockTranscriber::replying("unused"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(
            &[Part { name: "language_known", file_name: None, data: b"off" }],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_text(response).await;
    assert!(html.contains("Please upload an audio file first."));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn given_empty_file_when_transcribe_then_prompts_for_upload() {
    let mock = Arc::new(MockTranscriber::replying("unused"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(
            &[Part { name: "audio", file_name: Some(""), data: b"" }],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn given_unaccepted_extension_when_transcribe_then_unsupported_media_type() {
    let mock = Arc::new(MockTranscriber::replying("unused"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(&[audio("notes.flac")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn given_remote_failure_when_transcribe_then_bad_gateway_and_no_result() {
    let mock = Arc::new(MockTranscriber::failing("CUDA out of memory"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(&[audio("memo.ogg")], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("CUDA out of memory"));
    assert!(!html.contains("id=\"transcription\""));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn given_earlier_result_when_next_submission_fails_then_old_text_is_gone() {
    let mock = Arc::new(MockTranscriber::replying("hello world").then_failing("GPU lost"));
    let app = app(mock.clone(), Preset::Translate);

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("first.wav")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(body_text(response).await.contains("hello world"));

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("second.wav")], Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_text(response).await;
    assert!(html.contains("GPU lost"));
    assert!(!html.contains("hello world"));

    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("hello world"));

    let response = app.oneshot(get("/download", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn given_anonymous_traffic_when_browsing_then_no_sessions_are_kept() {
    let state = state(Arc::new(MockTranscriber::replying("unused")), Preset::Translate);
    let sessions = state.sessions.clone();
    let app = create_router(state, MAX_UPLOAD);

    for _ in 0..500 {
        app.clone().oneshot(get("/", None)).await.unwrap();
    }
    for _ in 0..50 {
        let unknown = format!("{SESSION_COOKIE}={}", uuid::Uuid::new_v4());
        for uri in ["/", "/download"] {
            app.clone().oneshot(get(uri, Some(&unknown))).await.unwrap();
        }
    }

    assert!(sessions.is_empty());
}

#[tokio::test]
async fn given_translation_in_result_when_transcribe_then_both_texts_are_shown() {
    let result = TranscriptionResult {
        transcription: "hallo welt".to_string(),
        translation: Some("hello world".to_string()),
        detected_language: Some("german".to_string()),
    };
    let app = app(Arc::new(MockTranscriber::with_result(result)), Preset::Translate);

    let response = app
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("<pre id=\"transcription\">hallo welt</pre>"));
    assert!(html.contains("hello world"));
    assert!(html.contains("german"));
}

#[tokio::test]
async fn given_html_in_transcription_when_rendered_then_escaped() {
    let app = app(
        Arc::new(MockTranscriber::replying("<script>alert(1)</script>")),
        Preset::Translate,
    );

    let response = app
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();

    let html = body_text(response).await;
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert(1)"));
}

#[tokio::test]
async fn given_auth_required_when_not_logged_in_then_login_form_and_no_remote_call() {
    let mock = Arc::new(MockTranscriber::replying("unused"));
    let app = app(mock.clone(), Preset::Transcribe);

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("action=\"/login\""));
    assert!(!html.contains("action=\"/transcribe\""));

    let response = app
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(mock.calls(), 0);
}

async fn login(app: &Router, cookie: Option<&str>, username: &str, password: &str) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    app.clone()
        .oneshot(
            builder
                .body(Body::from(format!("username={username}&password={password}")))
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn given_wrong_password_when_login_then_rejection_message_shown() {
    let app = app(Arc::new(MockTranscriber::replying("unused")), Preset::Transcribe);

    let response = login(&app, None, "alice", "wrong").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
    let cookie = session_cookie(&response);

    let html = body_text(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains(REJECTED_MESSAGE));
    assert!(html.contains("action=\"/login\""));
}

#[tokio::test]
async fn given_logged_in_when_download_then_result_is_cleared() {
    let mock = Arc::new(MockTranscriber::replying("hello world"));
    let app = app(mock.clone(), Preset::Transcribe);
    let cookie = session_cookie(&login(&app, None, "alice", "secret").await);

    // a second login on the same session sets no new cookie
    let again = login(&app, Some(&cookie), "alice", "wrong").await;
    assert!(again.headers().get(SET_COOKIE).is_none());

    let html = body_text(app.clone().oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(html.contains("Transcribe Original"));

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("memo.m4a")], Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("hello world"));
    assert!(!mock.last_request().unwrap().translate);

    let response = app.clone().oneshot(get("/download", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"transcription.txt\""
    );
    assert_eq!(body_text(response).await, "hello world");

    let response = app.oneshot(get("/download", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn given_translate_preset_when_download_then_result_is_kept() {
    let app = app(Arc::new(MockTranscriber::replying("hello world")), Preset::Translate);

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/download", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "hello world");
    }
}

#[tokio::test]
async fn given_result_when_clear_then_page_no_longer_shows_it() {
    let app = app(Arc::new(MockTranscriber::replying("hello world")), Preset::Translate);

    let response = app
        .clone()
        .oneshot(transcribe_request(&[audio("memo.wav")], None))
        .await
        .unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clear")
                .header(COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let html = body_text(app.oneshot(get("/", Some(&cookie))).await.unwrap()).await;
    assert!(!html.contains("hello world"));
}

#[tokio::test]
async fn given_running_server_when_health_check_then_returns_ok() {
    let app = app(Arc::new(MockTranscriber::replying("unused")), Preset::Translate);

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, r#"{"status":"healthy"}"#);
}

#[tokio::test]
async fn given_languages_endpoint_then_lists_catalog_with_default() {
    let app = app(Arc::new(MockTranscriber::replying("unused")), Preset::Translate);

    let response = app.oneshot(get("/api/languages", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["default"], "de");
    assert_eq!(json["languages"].as_array().unwrap().len(), 99);
    assert_eq!(json["languages"][16], "de");
}
