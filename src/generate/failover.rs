//! Credential failover dispatch.
//!
//! An ordered failover chain, not a load balancer: credentials are attempted
//! in pool order, the first success wins, and a permanent failure advances to
//! the next credential without retrying the current one. Transient failures
//! get a small fixed number of retries with a fixed delay.
//!
//! This client's correctness property: it **never raises**. Every failure
//! path resolves to a returned string — the pipeline has no error channel
//! back to the user other than the delivered message itself.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::GenerateError;
use crate::generate::GenerationBackend;

/// Ordered sequence of interchangeable backend credentials.
///
/// No implied priority beyond order; first-successful semantics.
#[derive(Clone)]
pub struct CredentialPool {
    credentials: Vec<SecretString>,
}

impl CredentialPool {
    pub fn new(credentials: Vec<SecretString>) -> Self {
        Self { credentials }
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn first(&self) -> Option<&SecretString> {
        self.credentials.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SecretString> {
        self.credentials.iter()
    }
}

/// Dispatch tuning.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Attempts per credential for transient failures.
    pub attempts_per_credential: u32,
    /// Fixed delay between attempts on the same credential.
    pub retry_delay: Duration,
    /// Model used when per-run discovery fails.
    pub default_model: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            attempts_per_credential: 3,
            retry_delay: Duration::from_secs(5),
            default_model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// Turns a prompt into generated text via the backend, rotating the pool.
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
    pool: CredentialPool,
    config: DispatchConfig,
}

impl GenerationClient {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        pool: CredentialPool,
        config: DispatchConfig,
    ) -> Self {
        Self {
            backend,
            pool,
            config,
        }
    }

    /// Resolve which model variant to use for this run.
    ///
    /// One discovery call with the first credential; the result is reused for
    /// every credential in the run. Falls back to the configured default when
    /// discovery fails or returns nothing.
    async fn resolve_model(&self) -> String {
        let Some(credential) = self.pool.first() else {
            return self.config.default_model.clone();
        };

        match self.backend.list_models(credential).await {
            Ok(models) => match models.into_iter().next() {
                Some(model) => {
                    tracing::info!(model = %model, "Model discovery succeeded");
                    model
                }
                None => {
                    tracing::warn!(
                        default = %self.config.default_model,
                        "Model discovery returned no models; using default"
                    );
                    self.config.default_model.clone()
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default = %self.config.default_model,
                    "Model discovery failed; using default"
                );
                self.config.default_model.clone()
            }
        }
    }

    /// Generate text for `prompt`, trying credentials in pool order.
    ///
    /// Exhausting the pool returns a clearly marked failure text rather than
    /// an error, so the pipeline can still deliver a diagnostic message.
    pub async fn generate(&self, prompt: &str) -> String {
        if self.pool.is_empty() {
            tracing::error!("Credential pool is empty");
            return failure_text("no credentials configured");
        }

        let model = self.resolve_model().await;
        let mut last_error = String::new();

        for (index, credential) in self.pool.iter().enumerate() {
            match self.try_credential(&model, credential, index, prompt).await {
                Ok(text) => return text,
                Err(e) => last_error = e.to_string(),
            }
        }

        tracing::error!(
            credentials = self.pool.len(),
            last_error = %last_error,
            "All credentials exhausted"
        );
        failure_text(&format!(
            "all {} credentials exhausted; last error: {}",
            self.pool.len(),
            last_error
        ))
    }

    /// Attempt one credential, retrying transient failures up to the
    /// configured attempt count. A permanent failure returns immediately so
    /// the caller can advance to the next credential.
    async fn try_credential(
        &self,
        model: &str,
        credential: &SecretString,
        index: usize,
        prompt: &str,
    ) -> Result<String, GenerateError> {
        let mut attempt = 1;
        loop {
            match self.backend.generate(model, credential, prompt).await {
                Ok(text) => {
                    tracing::info!(credential = index, attempt, "Generation succeeded");
                    return Ok(text);
                }
                Err(e) if e.is_transient() && attempt < self.config.attempts_per_credential => {
                    tracing::warn!(
                        credential = index,
                        attempt,
                        error = %e,
                        "Transient backend failure; retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        credential = index,
                        attempt,
                        error = %e,
                        "Credential failed; moving to next"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// The sentinel diagnostic delivered in place of a briefing when generation
/// fails outright.
fn failure_text(reason: &str) -> String {
    format!("⚠️ Briefing generation failed: {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::sync::Mutex;

    /// Scripted backend: responds per credential value, records call order.
    struct ScriptedBackend {
        calls: Mutex<Vec<String>>,
        models: Result<Vec<String>, String>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                models: Ok(vec!["scripted-model".to_string()]),
            }
        }

        fn with_broken_discovery() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                models: Err("discovery down".to_string()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn list_models(&self, _: &SecretString) -> Result<Vec<String>, GenerateError> {
            self.models
                .clone()
                .map_err(GenerateError::Transient)
        }

        /// Credential values encode their behavior:
        /// `ok:<text>` succeeds, `perm` fails permanently, `transient`
        /// always fails transiently, `flaky:<n>` fails transiently until
        /// the n-th call of that credential.
        async fn generate(
            &self,
            _model: &str,
            credential: &SecretString,
            _prompt: &str,
        ) -> Result<String, GenerateError> {
            let value = credential.expose_secret().to_string();
            let mut calls = self.calls.lock().unwrap();
            calls.push(value.clone());
            let uses = calls.iter().filter(|c| **c == value).count();
            drop(calls);

            if let Some(text) = value.strip_prefix("ok:") {
                Ok(text.to_string())
            } else if value == "perm" {
                Err(GenerateError::Permanent("quota exhausted".to_string()))
            } else if value == "transient" {
                Err(GenerateError::Transient("overloaded".to_string()))
            } else if let Some(n) = value.strip_prefix("flaky:") {
                let threshold: usize = n.parse().unwrap();
                if uses >= threshold {
                    Ok("recovered".to_string())
                } else {
                    Err(GenerateError::Transient("overloaded".to_string()))
                }
            } else {
                panic!("unscripted credential: {value}");
            }
        }
    }

    fn pool(values: &[&str]) -> CredentialPool {
        CredentialPool::new(values.iter().map(|v| SecretString::from(*v)).collect())
    }

    fn config() -> DispatchConfig {
        DispatchConfig {
            attempts_per_credential: 3,
            retry_delay: Duration::from_millis(0),
            default_model: "fallback-model".to_string(),
        }
    }

    #[tokio::test]
    async fn first_success_wins_and_later_credentials_untouched() {
        let backend = Arc::new(ScriptedBackend::new());
        let client = GenerationClient::new(
            backend.clone(),
            pool(&["perm", "perm", "ok:third wins"]),
            config(),
        );

        let text = client.generate("prompt").await;
        assert_eq!(text, "third wins");
        // Each permanent failure tried once, success tried once, nothing after.
        assert_eq!(backend.calls(), vec!["perm", "perm", "ok:third wins"]);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new());
        let client =
            GenerationClient::new(backend.clone(), pool(&["perm", "ok:done"]), config());

        client.generate("prompt").await;
        assert_eq!(
            backend.calls().iter().filter(|c| *c == "perm").count(),
            1
        );
    }

    #[tokio::test]
    async fn transient_failure_retries_then_succeeds() {
        let backend = Arc::new(ScriptedBackend::new());
        let client = GenerationClient::new(backend.clone(), pool(&["flaky:3"]), config());

        let text = client.generate("prompt").await;
        assert_eq!(text, "recovered");
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn transient_exhaustion_advances_to_next_credential() {
        let backend = Arc::new(ScriptedBackend::new());
        let client =
            GenerationClient::new(backend.clone(), pool(&["transient", "ok:next"]), config());

        let text = client.generate("prompt").await;
        assert_eq!(text, "next");
        // 3 attempts on the transient credential, then 1 on the next.
        assert_eq!(backend.calls().len(), 4);
    }

    #[tokio::test]
    async fn exhausted_pool_returns_sentinel_text_not_error() {
        let backend = Arc::new(ScriptedBackend::new());
        let client = GenerationClient::new(backend, pool(&["perm", "transient"]), config());

        let text = client.generate("prompt").await;
        assert!(text.contains("Briefing generation failed"));
        assert!(text.contains("2 credentials exhausted"));
    }

    #[tokio::test]
    async fn empty_pool_returns_sentinel_text() {
        let backend = Arc::new(ScriptedBackend::new());
        let client = GenerationClient::new(backend, pool(&[]), config());

        let text = client.generate("prompt").await;
        assert!(text.contains("no credentials configured"));
    }

    #[tokio::test]
    async fn discovery_failure_falls_back_to_default_model() {
        struct ModelCapture {
            inner: ScriptedBackend,
            seen_model: Mutex<Option<String>>,
        }

        #[async_trait]
        impl GenerationBackend for ModelCapture {
            async fn list_models(
                &self,
                c: &SecretString,
            ) -> Result<Vec<String>, GenerateError> {
                self.inner.list_models(c).await
            }
            async fn generate(
                &self,
                model: &str,
                c: &SecretString,
                p: &str,
            ) -> Result<String, GenerateError> {
                *self.seen_model.lock().unwrap() = Some(model.to_string());
                self.inner.generate(model, c, p).await
            }
        }

        let backend = Arc::new(ModelCapture {
            inner: ScriptedBackend::with_broken_discovery(),
            seen_model: Mutex::new(None),
        });
        let client = GenerationClient::new(backend.clone(), pool(&["ok:fine"]), config());

        assert_eq!(client.generate("prompt").await, "fine");
        assert_eq!(
            backend.seen_model.lock().unwrap().as_deref(),
            Some("fallback-model")
        );
    }
}
