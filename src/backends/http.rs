//! JSON-over-HTTP collaborator.
//!
//! `POST {base_url}/{operation}` with the arguments as the JSON body. The
//! decoded response body is returned untouched; a non-2xx status is a failure
//! carrying the status and body text.

use async_trait::async_trait;
use serde_json::Value;

use super::{Backend, BackendKind};
use crate::tools::Arguments;
use crate::types::{Error, Result};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    kind: BackendKind,
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(kind: BackendKind, client: reqwest::Client, base_url: &str) -> Self {
        Self {
            kind,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn call(&self, operation: &str, args: &Arguments) -> Result<Value> {
        let url = self.url(operation);
        tracing::debug!(backend = %self.kind, %url, "calling backend");

        let response = self.client.post(&url).json(args).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::adapter(format!(
                "{} backend returned {}: {}",
                self.kind,
                status,
                body.trim()
            )));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpBackend::new(
            BackendKind::WebSearch,
            reqwest::Client::new(),
            "http://search.internal/v1/",
        );
        assert_eq!(backend.url("web_search"), "http://search.internal/v1/web_search");
    }
}
