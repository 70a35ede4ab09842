//! Replicate predictions API.
//!
//! A transcription is one prediction against a pinned `openai/whisper` version:
//! 1. Small audio is inlined as a base64 data URI, larger audio is uploaded to the
//!    files endpoint first and referenced by URL
//! 2. Create the prediction with the Whisper inputs
//! 3. Poll the prediction until it reaches a terminal status
//!
//! There is no retry: the first failure is returned to the caller.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use super::{Transcriber, TranscriptionError};
use crate::transcription::model::ModelVersion;
use crate::transcription::request::{TranscriptionRequest, TranscriptionResult};

/// Audio up to this size is sent inline as a data URI.
const INLINE_AUDIO_LIMIT: usize = 1024 * 1024;

/// Client-side knobs for talking to Replicate.
#[derive(Debug, Clone)]
pub struct ReplicateSettings {
    /// API root without the `/v1` suffix
    pub base_url: String,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ReplicateSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".to_string(),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 600,
            request_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct WhisperInput<'a> {
    audio: String,
    model: &'a str,
    translate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: WhisperInput<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

#[derive(Debug, Default, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

/// Prediction as returned by both create and poll
#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: PredictionUrls,
}

#[derive(Debug, Deserialize)]
struct WhisperOutput {
    transcription: String,
    #[serde(default)]
    translation: Option<String>,
    #[serde(default)]
    detected_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileUrls {
    get: String,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    urls: FileUrls,
}

/// Metadata of a model version, fetched to check that the pinned hash exists.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub cog_version: Option<String>,
}

/// Handle to one hosted model version, authenticated with one API token.
pub struct ReplicateClient {
    http: reqwest::Client,
    api_token: String,
    version: ModelVersion,
    settings: ReplicateSettings,
}

impl ReplicateClient {
    /// Builds the HTTP client. No request is made until the first call.
    pub fn connect(
        api_token: &str,
        version: ModelVersion,
        settings: ReplicateSettings,
    ) -> Result<Self, TranscriptionError> {
        if api_token.trim().is_empty() {
            return Err(TranscriptionError::Request(
                "Replicate API token is empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|e| TranscriptionError::Request(format!("Failed to create HTTP client: {e}")))?;

        tracing::debug!(model = %version.short(), base_url = %settings.base_url, "Replicate client created");

        Ok(Self {
            http,
            api_token: api_token.trim().to_string(),
            version,
            settings,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Fetches metadata for the pinned version.
    pub async fn fetch_version(&self) -> Result<VersionInfo, TranscriptionError> {
        let url = self.url(&format!(
            "models/{}/{}/versions/{}",
            self.version.owner, self.version.name, self.version.version
        ));

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(TranscriptionError::from_transport)?;
        let response = check_status(response).await?;

        response
            .json::<VersionInfo>()
            .await
            .map_err(|e| TranscriptionError::MalformedOutput(format!("version metadata: {e}")))
    }

    /// Returns the value for the `audio` input: inline data URI or uploaded file URL.
    async fn audio_input(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        if request.audio.len() <= INLINE_AUDIO_LIMIT {
            let encoded = general_purpose::STANDARD.encode(&request.audio);
            return Ok(format!("data:{};base64,{encoded}", request.mime_type()));
        }

        tracing::debug!(bytes = request.audio.len(), "Audio too large to inline, uploading");

        let part = reqwest::multipart::Part::bytes(request.audio.clone())
            .file_name(request.file_name.clone())
            .mime_str(request.mime_type())
            .map_err(|e| TranscriptionError::Request(format!("Failed to create file part for upload: {e}")))?;
        let form = reqwest::multipart::Form::new().part("content", part);

        let response = self
            .http
            .post(self.url("files"))
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(TranscriptionError::from_transport)?;
        let response = check_status(response).await?;

        let uploaded: UploadedFile = response
            .json()
            .await
            .map_err(|e| TranscriptionError::MalformedOutput(format!("file upload: {e}")))?;
        Ok(uploaded.urls.get)
    }

    async fn create_prediction(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<Prediction, TranscriptionError> {
        let body = PredictionRequest {
            version: &self.version.version,
            input: WhisperInput {
                audio: self.audio_input(request).await?,
                model: request.model.id(),
                translate: request.translate,
                language: request.language.as_deref(),
            },
        };

        tracing::debug!(
            "Replicate API Call:\n  URL: {}\n  Method: POST\n  Headers:\n    Authorization: Bearer <redacted>\n  Body parameters: model={}, translate={}, language={:?}",
            self.url("predictions"),
            body.input.model,
            body.input.translate,
            body.input.language,
        );

        let response = self
            .http
            .post(self.url("predictions"))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(TranscriptionError::from_transport)?;
        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| TranscriptionError::MalformedOutput(format!("prediction: {e}")))
    }

    /// Polls until the prediction leaves `starting`/`processing`.
    async fn wait(&self, mut prediction: Prediction) -> Result<Prediction, TranscriptionError> {
        let poll_url = prediction
            .urls
            .get
            .clone()
            .unwrap_or_else(|| self.url(&format!("predictions/{}", prediction.id)));
        let mut attempts: u32 = 0;

        while matches!(
            prediction.status,
            PredictionStatus::Starting | PredictionStatus::Processing
        ) {
            attempts += 1;
            if attempts > self.settings.max_poll_attempts {
                let waited = self.settings.poll_interval * self.settings.max_poll_attempts;
                return Err(TranscriptionError::PollTimeout(waited.as_secs()));
            }

            tokio::time::sleep(self.settings.poll_interval).await;

            let response = self
                .http
                .get(&poll_url)
                .bearer_auth(&self.api_token)
                .send()
                .await
                .map_err(TranscriptionError::from_transport)?;
            let response = check_status(response).await?;

            prediction = response
                .json()
                .await
                .map_err(|e| TranscriptionError::MalformedOutput(format!("poll: {e}")))?;

            tracing::debug!(
                "Poll attempt {}/{}: status={:?}, id={}",
                attempts,
                self.settings.max_poll_attempts,
                prediction.status,
                prediction.id
            );
        }

        Ok(prediction)
    }
}

#[async_trait]
impl Transcriber for ReplicateClient {
    async fn transcribe(
        &self,
        request: &TranscriptionRequest,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        tracing::info!(
            model = %self.version.short(),
            whisper = request.model.id(),
            translate = request.translate,
            language = ?request.language,
            bytes = request.audio.len(),
            "Transcribing with Replicate"
        );

        let prediction = self.create_prediction(request).await?;
        tracing::debug!(id = %prediction.id, "Prediction created");

        let prediction = self.wait(prediction).await?;
        let result = finish(prediction)?;

        tracing::info!(chars = result.transcription.len(), "Transcription completed");
        Ok(result)
    }
}

/// Converts a terminal prediction into a result or an error.
fn finish(prediction: Prediction) -> Result<TranscriptionResult, TranscriptionError> {
    match prediction.status {
        PredictionStatus::Succeeded => {
            let output = prediction.output.ok_or_else(|| {
                TranscriptionError::MalformedOutput("succeeded without output".to_string())
            })?;
            let output: WhisperOutput = serde_json::from_value(output)
                .map_err(|e| TranscriptionError::MalformedOutput(e.to_string()))?;

            Ok(TranscriptionResult {
                transcription: output.transcription.trim().to_string(),
                translation: output
                    .translation
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
                detected_language: output.detected_language,
            })
        }
        PredictionStatus::Failed => {
            let reason = match prediction.error {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => "unknown error".to_string(),
            };
            Err(TranscriptionError::PredictionFailed(reason))
        }
        PredictionStatus::Canceled => Err(TranscriptionError::Canceled),
        PredictionStatus::Starting | PredictionStatus::Processing => Err(
            TranscriptionError::MalformedOutput(format!("prediction {} still running", prediction.id)),
        ),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranscriptionError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::warn!(status, body = %body, "Replicate returned an error");
    Err(TranscriptionError::from_status(status, &body))
}
