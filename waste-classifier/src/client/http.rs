//! HTTP client for the inference endpoint.
//!
//! Wire contract:
//! - `GET /labels` -> `{"labels": [..]}`
//! - `POST /predict` (multipart, field `file`) ->
//!   `{"filename": .., "prediction": {"label": .., "score": ..}, "inference_time_ms": ..}`
//! - `GET /health` -> `{"status": .., "model_loaded": .., "model_name": ..}`

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::traits::{ClassificationClient, ClientError};
use crate::config::ClientConfig;
use crate::types::{ImageHandle, LabelScore, Prediction};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Client for a remote classification endpoint.
pub struct HttpClassificationClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClassificationClient {
    /// Create a new client for the configured endpoint.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a client pointing at a base address with default settings.
    pub fn for_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url))
    }

    /// The configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Probe the endpoint's health route.
    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let body = self.get(&self.config.endpoint("/health")).await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    async fn get(&self, url: &str) -> Result<Bytes, ClientError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        read_success(response).await
    }

    fn image_part(&self, image: &ImageHandle) -> Part {
        let file_name = self.config.upload_file_name.clone();
        let part = Part::bytes(image.data.to_vec()).file_name(file_name.clone());

        match part.mime_str(&image.mime_type) {
            Ok(part) => part,
            Err(e) => {
                warn!(mime_type = %image.mime_type, error = %e, "Invalid MIME type, sending untyped part");
                Part::bytes(image.data.to_vec()).file_name(file_name)
            }
        }
    }
}

/// Health report from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub model_name: Option<String>,
}

impl HealthReport {
    /// Whether the endpoint is up with a model loaded.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy" && self.model_loaded
    }
}

#[derive(Debug, Deserialize)]
struct LabelsResponse {
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    filename: Option<String>,
    prediction: PredictionBody,
    inference_time_ms: u64,
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    label: String,
    score: f64,
    #[serde(default)]
    top2: Option<TopCandidates>,
}

#[derive(Debug, Deserialize)]
struct TopCandidates {
    labels: Vec<String>,
    scores: Vec<f64>,
}

/// Turn a non-success status into [`ClientError::Service`].
async fn read_success(response: Response) -> Result<Bytes, ClientError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Service {
            status: status.as_u16(),
            body,
        });
    }

    response
        .bytes()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))
}

fn valid_score(score: f64) -> bool {
    score.is_finite() && (0.0..=1.0).contains(&score)
}

/// Parse a `/predict` response body.
pub(crate) fn parse_prediction(body: &[u8]) -> Result<Prediction, ClientError> {
    let response: PredictResponse =
        serde_json::from_slice(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

    let PredictionBody { label, score, top2 } = response.prediction;

    if label.trim().is_empty() {
        return Err(ClientError::MalformedResponse("empty label".to_string()));
    }
    if !valid_score(score) {
        return Err(ClientError::MalformedResponse(format!(
            "score {} outside [0, 1]",
            score
        )));
    }

    let alternatives = match top2 {
        None => Vec::new(),
        Some(TopCandidates { labels, scores }) => {
            if labels.len() != scores.len() {
                return Err(ClientError::MalformedResponse(format!(
                    "top2 has {} labels but {} scores",
                    labels.len(),
                    scores.len()
                )));
            }
            labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore { label, score })
                .collect()
        }
    };

    debug!(
        filename = response.filename.as_deref().unwrap_or("-"),
        label = %label,
        score,
        inference_time_ms = response.inference_time_ms,
        "Parsed prediction"
    );

    Ok(Prediction::new(label, score, response.inference_time_ms).with_alternatives(alternatives))
}

#[async_trait]
impl ClassificationClient for HttpClassificationClient {
    fn id(&self) -> &str {
        &self.config.base_url
    }

    async fn classify(&self, image: &ImageHandle) -> Result<Prediction, ClientError> {
        let url = self.config.endpoint("/predict");
        debug!(url = %url, bytes = image.len(), mime_type = %image.mime_type, "Submitting image");

        let form = Form::new().part(FILE_FIELD, self.image_part(image));

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let body = read_success(response).await?;
        parse_prediction(&body)
    }

    async fn list_labels(&self) -> Result<Vec<String>, ClientError> {
        let body = self.get(&self.config.endpoint("/labels")).await?;
        let response: LabelsResponse = serde_json::from_slice(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        Ok(response.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prediction() {
        let body = br#"{
            "filename": "upload.jpg",
            "prediction": {"label": "glass", "score": 0.93},
            "inference_time_ms": 120
        }"#;

        let prediction = parse_prediction(body).unwrap();
        assert_eq!(prediction.label(), "glass");
        assert_eq!(prediction.score(), 0.93);
        assert_eq!(prediction.inference_time_ms(), 120);
        assert!(prediction.alternatives().is_empty());
    }

    #[test]
    fn test_parse_prediction_with_top2() {
        let body = br#"{
            "success": true,
            "filename": "bottle.jpg",
            "prediction": {
                "label": "Plastic",
                "score": 0.41,
                "top2": {"labels": ["Glass", "Plastic"], "scores": [0.52, 0.41]}
            },
            "inference_time_ms": 87
        }"#;

        let prediction = parse_prediction(body).unwrap();
        assert_eq!(prediction.label(), "Plastic");
        assert_eq!(prediction.alternatives().len(), 2);
        assert_eq!(prediction.alternatives()[0].label, "Glass");
    }

    #[test]
    fn test_parse_missing_timing_is_malformed() {
        let body = br#"{"filename": "a.jpg", "prediction": {"label": "glass", "score": 0.9}}"#;
        assert!(matches!(
            parse_prediction(body),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_score() {
        let body = br#"{"prediction": {"label": "glass", "score": 1.7}, "inference_time_ms": 3}"#;
        assert!(matches!(
            parse_prediction(body),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_label() {
        let body = br#"{"prediction": {"label": "  ", "score": 0.5}, "inference_time_ms": 3}"#;
        assert!(matches!(
            parse_prediction(body),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_mismatched_top2() {
        let body = br#"{
            "prediction": {"label": "glass", "score": 0.5, "top2": {"labels": ["glass"], "scores": [0.5, 0.3]}},
            "inference_time_ms": 3
        }"#;
        assert!(matches!(
            parse_prediction(body),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_not_json() {
        assert!(matches!(
            parse_prediction(b"<html>Bad Gateway</html>"),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_health_report() {
        let report: HealthReport = serde_json::from_str(
            r#"{"status": "healthy", "model_loaded": true, "model_name": "yangy50/garbage-classification"}"#,
        )
        .unwrap();
        assert!(report.is_healthy());

        let report: HealthReport = serde_json::from_str(r#"{"status": "healthy"}"#).unwrap();
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_client_id_is_base_url() {
        let client = HttpClassificationClient::for_base_url("http://localhost:9000/").unwrap();
        assert_eq!(client.id(), "http://localhost:9000");
    }
}
