// src/client/mod.rs
//! Typed client for the equipment analytics REST API.
//!
//! Everything the API needs (base URL, timeouts, token) is held by an
//! [`ApiClient`] value; there is no shared global state.

pub mod report;
pub mod types;

use reqwest::{
    header::AUTHORIZATION,
    multipart::{Form, Part},
    Client, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::intake::{RawFile, ValidationOutcome};
pub use types::{
    AverageDiff, ChartSeries, Comparison, DatasetSummary, LoginResponse, Visualization,
};
use types::{CompareRequest, ErrorBody, LoginRequest};

/// Failure after a file left validation: the server or the transport said no.
/// Never a [`crate::intake::IntakeError`]; these surface as post-submission
/// errors.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("file has not passed validation")]
    NotAccepted,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("not found: {path}")]
    NotFound { path: String },
    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API, e.g. `http://127.0.0.1:8000/api/`.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Uploads and report downloads carry whole files; they get longer.
    pub upload_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            timeout_secs: 30,
            upload_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
    upload_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, SubmitError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_http(http, config)
    }

    /// Use a caller-built `reqwest::Client` (shared pools, custom TLS).
    pub fn with_http(http: Client, config: &ApiConfig) -> Result<Self, SubmitError> {
        // `Url::join` drops the last segment unless the base ends in '/'
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            http,
            base: Url::parse(&base)?,
            token: None,
            upload_timeout: Duration::from_secs(config.upload_timeout_secs),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, SubmitError> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.header(AUTHORIZATION, format!("Token {}", t)),
            None => req,
        }
    }

    /// Send `req` and return the body of a 2xx response. Other statuses are
    /// mapped onto [`SubmitError`].
    async fn send(&self, req: RequestBuilder) -> Result<Vec<u8>, SubmitError> {
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        let path = resp.url().path().to_string();
        let body = resp.bytes().await?.to_vec();
        debug!(%path, status = status.as_u16(), bytes = body.len(), "api response");

        if status.is_success() {
            return Ok(body);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(SubmitError::Unauthorized),
            StatusCode::NOT_FOUND => Err(SubmitError::NotFound { path }),
            _ => {
                let message = serde_json::from_slice::<ErrorBody>(&body)
                    .ok()
                    .and_then(|b| b.error)
                    .unwrap_or_else(|| "Request failed".to_string());
                warn!(%path, status = status.as_u16(), %message, "api error");
                Err(SubmitError::Server {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, SubmitError> {
        let body = self.send(req).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `POST login/`; returns a client carrying the issued token.
    pub async fn login(&self, username: &str, password: &str) -> Result<(Self, LoginResponse), SubmitError> {
        let req = self
            .http
            .post(self.endpoint("login/")?)
            .json(&LoginRequest { username, password });
        let resp: LoginResponse = self.send_json(req).await?;
        info!(username, "logged in");
        Ok((self.clone().with_token(resp.token.clone()), resp))
    }

    /// Upload the original bytes of `file`. Only an `Accepted` outcome may be
    /// submitted; the parsed preview is never what gets sent.
    pub async fn submit(
        &self,
        file: &RawFile,
        outcome: &ValidationOutcome,
    ) -> Result<DatasetSummary, SubmitError> {
        if !outcome.is_accepted() {
            return Err(SubmitError::NotAccepted);
        }
        self.upload(file).await
    }

    /// Multipart `POST upload/` of the file as-is. Callers guarantee the file
    /// was accepted.
    #[tracing::instrument(level = "info", skip(self, file), fields(name = %file.name()))]
    pub(crate) async fn upload(&self, file: &RawFile) -> Result<DatasetSummary, SubmitError> {
        let part = Part::bytes(file.content().to_vec())
            .file_name(file.name().to_string())
            .mime_str("text/csv")?;
        let req = self
            .http
            .post(self.endpoint("upload/")?)
            .timeout(self.upload_timeout)
            .multipart(Form::new().part("file", part));
        let summary: DatasetSummary = self.send_json(req).await?;
        info!(id = summary.id, rows = summary.total_count, "upload stored");
        Ok(summary)
    }

    /// `GET history/`: the most recent uploads, newest first.
    pub async fn history(&self) -> Result<Vec<DatasetSummary>, SubmitError> {
        self.send_json(self.http.get(self.endpoint("history/")?)).await
    }

    pub async fn dataset(&self, id: i64) -> Result<DatasetSummary, SubmitError> {
        let url = self.endpoint(&format!("dataset/{}/", id))?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn visualization(&self, id: i64) -> Result<Visualization, SubmitError> {
        let url = self.endpoint(&format!("dataset/{}/visualization/", id))?;
        self.send_json(self.http.get(url)).await
    }

    /// `POST compare/` for two distinct datasets.
    pub async fn compare(&self, dataset1: i64, dataset2: i64) -> Result<Comparison, SubmitError> {
        if dataset1 == dataset2 {
            return Err(SubmitError::InvalidRequest(
                "Select two different datasets".to_string(),
            ));
        }
        let req = self
            .http
            .post(self.endpoint("compare/")?)
            .json(&CompareRequest { dataset1, dataset2 });
        self.send_json(req).await
    }

    /// `GET report/{id}/`: the PDF report as raw bytes.
    pub async fn report_bytes(&self, id: i64) -> Result<Vec<u8>, SubmitError> {
        let url = self.endpoint(&format!("report/{}/", id))?;
        self.send(self.http.get(url).timeout(self.upload_timeout)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::{config::IntakeConfig, intake::validate};

    const CSV: &[u8] = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nPump-1,Pump,100.0,5.0,25.0\n";

    fn summary_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "filename": "plant.csv",
            "uploaded_at": "2025-01-15T10:20:30Z",
            "total_count": 1,
            "avg_flowrate": 100.0,
            "avg_pressure": 5.0,
            "avg_temperature": 25.0,
            "type_distribution": {"Pump": 1}
        })
    }

    fn client_for(server: &MockServer) -> ApiClient {
        let cfg = ApiConfig {
            base_url: format!("{}/api", server.uri()),
            ..ApiConfig::default()
        };
        ApiClient::new(&cfg).unwrap().with_token("abc123")
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let cfg = ApiConfig {
            base_url: "http://localhost:8000/api".into(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&cfg).unwrap();
        assert_eq!(
            client.endpoint("history/").unwrap().as_str(),
            "http://localhost:8000/api/history/"
        );
    }

    #[test]
    fn test_bad_base_url() {
        let cfg = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(ApiClient::new(&cfg), Err(SubmitError::Url(_))));
    }

    #[tokio::test]
    async fn test_submit_sends_original_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload/"))
            .and(header("authorization", "Token abc123"))
            .and(body_string_contains("filename=\"plant.csv\""))
            .and(body_string_contains("Pump-1,Pump,100.0,5.0,25.0"))
            .respond_with(ResponseTemplate::new(201).set_body_json(summary_json(42)))
            .expect(1)
            .mount(&server)
            .await;

        let file = RawFile::from_bytes("plant.csv", CSV.to_vec());
        let outcome = validate(&file, &IntakeConfig::default());
        let summary = client_for(&server).submit(&file, &outcome).await.unwrap();
        assert_eq!(summary.id, 42);
        assert_eq!(summary.type_distribution.get("Pump"), Some(&1));
    }

    #[tokio::test]
    async fn test_rejected_outcome_never_reaches_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let file = RawFile::from_bytes("plant.txt", CSV.to_vec());
        let outcome = validate(&file, &IntakeConfig::default());
        let err = client_for(&server).submit(&file, &outcome).await.unwrap_err();
        assert!(matches!(err, SubmitError::NotAccepted));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/history/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "no"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/dataset/999/visualization/"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "gone"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/upload/"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "CSV file is empty."})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/report/1/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.history().await,
            Err(SubmitError::Unauthorized)
        ));
        match client.visualization(999).await {
            Err(SubmitError::NotFound { path }) => {
                assert_eq!(path, "/api/dataset/999/visualization/")
            }
            other => panic!("unexpected: {other:?}"),
        }

        let file = RawFile::from_bytes("plant.csv", CSV.to_vec());
        let outcome = validate(&file, &IntakeConfig::default());
        match client.submit(&file, &outcome).await {
            Err(SubmitError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "CSV file is empty.");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match client.report_bytes(1).await {
            Err(SubmitError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Request failed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_attaches_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/login/"))
            .and(body_json(json!({"username": "op", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t0k"})))
            .mount(&server)
            .await;

        let cfg = ApiConfig {
            base_url: format!("{}/api/", server.uri()),
            ..ApiConfig::default()
        };
        let anonymous = ApiClient::new(&cfg).unwrap();
        assert_eq!(anonymous.token(), None);
        let (client, resp) = anonymous.login("op", "secret").await.unwrap();
        assert_eq!(resp.token, "t0k");
        assert_eq!(client.token(), Some("t0k"));
    }

    #[tokio::test]
    async fn test_history_and_compare() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/history/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([summary_json(2), summary_json(1)])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/compare/"))
            .and(body_json(json!({"dataset1": 1, "dataset2": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dataset1": summary_json(1),
                "dataset2": summary_json(2),
                "comparison": {"flowrate_diff": 12.5, "pressure_diff": -1.0, "temperature_diff": 0.0}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let history = client.history().await.unwrap();
        assert_eq!(history.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 1]);

        let cmp = client.compare(1, 2).await.unwrap();
        assert_eq!(cmp.comparison.flowrate_diff, 12.5);
        assert_eq!(cmp.dataset2.id, 2);

        assert!(matches!(
            client.compare(3, 3).await,
            Err(SubmitError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_visualization_decodes_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dataset/5/visualization/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type_distribution": {"labels": ["Pump", "Valve"], "data": [2, 1]},
                "averages": {"labels": ["Flowrate", "Pressure", "Temperature"], "data": [1.0, 2.0, 3.0]}
            })))
            .mount(&server)
            .await;

        let viz = client_for(&server).visualization(5).await.unwrap();
        assert_eq!(viz.type_distribution.labels, vec!["Pump", "Valve"]);
        assert_eq!(viz.averages.data, vec![1.0, 2.0, 3.0]);
    }
}
