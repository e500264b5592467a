// src/client/report.rs

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use super::{ApiClient, SubmitError};

/// File name used when the caller gives a directory instead of a file path.
pub fn default_report_name(id: i64) -> String {
    format!("report_{}.pdf", id)
}

/// Download the PDF report for dataset `id` and save it at `dest`.
/// If `dest` is an existing directory the file is named `report_{id}.pdf`
/// inside it. Returns the full path of the saved file.
pub async fn download_report(
    client: &ApiClient,
    id: i64,
    dest: impl AsRef<Path>,
) -> Result<PathBuf, SubmitError> {
    let dest = dest.as_ref();
    let dest_path = if fs::metadata(dest).await.map(|m| m.is_dir()).unwrap_or(false) {
        dest.join(default_report_name(id))
    } else {
        dest.to_path_buf()
    };

    let bytes = client.report_bytes(id).await?;

    if let Some(parent) = dest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&dest_path, &bytes).await?;
    info!(id, path = %dest_path.display(), bytes = bytes.len(), "report saved");

    Ok(dest_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiConfig;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PDF: &[u8] = b"%PDF-1.4\n%fake\n";

    async fn server_with_report(id: i64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/report/{}/", id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(PDF),
            )
            .mount(&server)
            .await;
        server
    }

    fn client(server: &MockServer) -> ApiClient {
        let cfg = ApiConfig {
            base_url: format!("{}/api/", server.uri()),
            ..ApiConfig::default()
        };
        ApiClient::new(&cfg).unwrap().with_token("t")
    }

    #[tokio::test]
    async fn test_download_into_directory() {
        let server = server_with_report(3).await;
        let tmp = tempdir().unwrap();

        let saved = download_report(&client(&server), 3, tmp.path()).await.unwrap();
        assert_eq!(saved, tmp.path().join("report_3.pdf"));
        assert_eq!(std::fs::read(&saved).unwrap(), PDF);
    }

    #[tokio::test]
    async fn test_download_to_explicit_path_creates_parents() {
        let server = server_with_report(8).await;
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("exports").join("plant.pdf");

        let saved = download_report(&client(&server), 8, &dest).await.unwrap();
        assert_eq!(saved, dest);
        assert!(dest.is_file());
    }

    #[tokio::test]
    async fn test_missing_report_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let tmp = tempdir().unwrap();

        let err = download_report(&client(&server), 999, tmp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::NotFound { .. }));
        assert!(!tmp.path().join("report_999.pdf").exists());
    }
}
