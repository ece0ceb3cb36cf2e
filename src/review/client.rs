//! Review clients
//!
//! The spelling-review collaborator takes a free-text prompt and returns a
//! free-text reply. No schema is assumed for the reply.

use std::time::Duration;

use async_trait::async_trait;

use super::types::ReviewError;

/// Spelling-review service trait
#[async_trait]
pub trait SpellReviewer: Send + Sync {
    /// Check if the service is reachable
    async fn is_available(&self) -> bool;

    /// Send one prompt, returning the reply body on success
    async fn review(&self, prompt: &str) -> Result<String, ReviewError>;

    /// Human-readable name used in diagnostics
    fn describe(&self) -> String;
}

/// Ollama text-generation reviewer
pub struct OllamaReviewer {
    /// Ollama API URL
    base_url: String,
    /// Model name
    model: String,
    client: reqwest::Client,
}

impl OllamaReviewer {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }
}

#[async_trait]
impl SpellReviewer for OllamaReviewer {
    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn review(&self, prompt: &str) -> Result<String, ReviewError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ReviewError::NotAvailable(self.describe())
                } else {
                    ReviewError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReviewError::Status { status, body });
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ReviewError::InvalidResponse(e.to_string()))?;

        Ok(result["response"].as_str().unwrap_or("").to_string())
    }

    fn describe(&self) -> String {
        format!("Ollama ({}) with model {}", self.base_url, self.model)
    }
}

/// Mock reviewer for testing
#[cfg(test)]
pub struct MockReviewer {
    pub available: bool,
    /// Reply per prompt, chosen by the method name the prompt mentions
    pub replies: std::collections::HashMap<String, Result<String, u16>>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockReviewer {
    pub fn new() -> Self {
        Self {
            available: true,
            replies: std::collections::HashMap::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn reply(mut self, method: &str, body: &str) -> Self {
        self.replies.insert(method.to_string(), Ok(body.to_string()));
        self
    }

    pub fn fail(mut self, method: &str, status: u16) -> Self {
        self.replies.insert(method.to_string(), Err(status));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl SpellReviewer for MockReviewer {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn review(&self, prompt: &str) -> Result<String, ReviewError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let reply = self
            .replies
            .iter()
            .find(|(method, _)| prompt.contains(&format!("the {} method", method)))
            .map(|(_, reply)| reply.clone());
        match reply {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(ReviewError::Status {
                status,
                body: "mock failure".to_string(),
            }),
            None => Ok(String::new()),
        }
    }

    fn describe(&self) -> String {
        "mock reviewer".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_ollama_is_not_available() {
        let reviewer = OllamaReviewer::new("http://127.0.0.1:9/", "llama3", Duration::from_secs(1));
        assert!(!reviewer.is_available().await);

        let result = reviewer.review("ERROR: teh").await;
        assert!(matches!(result, Err(ReviewError::NotAvailable(_))));
        assert!(reviewer.describe().contains("(http://127.0.0.1:9)"));
    }
}
