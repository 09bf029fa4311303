//! Where a template package comes from and how it is fetched.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use biddoc_shared::{BidDocError, Result};
use tracing::{debug, instrument};
use url::Url;

/// A template package location: a local path or an `http(s)` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Path(PathBuf),
    Url(Url),
}

impl TemplateSource {
    /// `http://` and `https://` locations become URLs (non-ASCII characters
    /// are percent-encoded); anything else is a filesystem path.
    pub fn parse(location: &str) -> Result<Self> {
        let trimmed = location.trim();
        if trimmed.is_empty() {
            return Err(BidDocError::config("template location is empty"));
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| BidDocError::config(format!("invalid template URL {trimmed}: {e}")))?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::Path(PathBuf::from(trimmed)))
        }
    }

    /// Read the whole package. Each call fetches afresh.
    #[instrument(skip_all, fields(source = %self))]
    pub async fn load(&self, timeout: Duration) -> Result<Vec<u8>> {
        let bytes = match self {
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| BidDocError::io(path, e))?,
            Self::Url(url) => fetch(url, timeout).await?,
        };
        debug!(bytes = bytes.len(), "template loaded");
        Ok(bytes)
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

async fn fetch(url: &Url, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("biddoc/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| BidDocError::Network(format!("client build: {e}")))?;

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| BidDocError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BidDocError::Network(format!("{url}: HTTP {status}")));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| BidDocError::Network(format!("{url}: {e}")))?;
    Ok(body.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths_and_urls() {
        assert_eq!(
            TemplateSource::parse("templates/招标文件模板.docx").expect("path"),
            TemplateSource::Path(PathBuf::from("templates/招标文件模板.docx"))
        );

        let source = TemplateSource::parse("https://files.example.com/模板/招标文件模板.docx")
            .expect("url");
        match source {
            TemplateSource::Url(url) => {
                assert!(url.path().starts_with("/%E6%A8%A1%E6%9D%BF/"));
                assert!(url.as_str().is_ascii());
            }
            other => panic!("expected URL, got {other:?}"),
        }

        assert!(matches!(
            TemplateSource::parse("HTTP://example.com/t.docx"),
            Ok(TemplateSource::Url(_))
        ));
        assert!(TemplateSource::parse("  ").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let source = TemplateSource::Path(std::env::temp_dir().join(format!(
            "biddoc-missing-{}.docx",
            uuid::Uuid::now_v7()
        )));
        let err = source.load(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, BidDocError::Io { .. }));
    }

    #[tokio::test]
    async fn fetches_from_http() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/templates/bid.docx"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(b"PK-bytes".to_vec()))
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/templates/gone.docx"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ok = TemplateSource::parse(&format!("{}/templates/bid.docx", server.uri()))
            .expect("parse");
        assert_eq!(
            ok.load(Duration::from_secs(5)).await.expect("fetch"),
            b"PK-bytes".to_vec()
        );

        let missing = TemplateSource::parse(&format!("{}/templates/gone.docx", server.uri()))
            .expect("parse");
        let err = missing.load(Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, BidDocError::Network(_)));
        assert!(err.to_string().contains("404"));
    }
}
