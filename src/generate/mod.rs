//! Generation backend integration.
//!
//! The backend is an opaque capability behind [`GenerationBackend`]; the
//! [`failover`] dispatcher turns a prompt into text by rotating an ordered
//! credential pool over it.

pub mod failover;
pub mod gemini;

pub use failover::{CredentialPool, DispatchConfig, GenerationClient};
pub use gemini::GeminiBackend;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::GenerateError;

/// A generative text backend.
///
/// Implementations classify every failure as [`GenerateError::Transient`]
/// (retry may succeed) or [`GenerateError::Permanent`] (bad credential, bad
/// request, quota — advance to the next credential instead).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Model variants currently serviceable with this credential.
    async fn list_models(&self, credential: &SecretString) -> Result<Vec<String>, GenerateError>;

    /// Generate text from `prompt` with one model/credential pair.
    async fn generate(
        &self,
        model: &str,
        credential: &SecretString,
        prompt: &str,
    ) -> Result<String, GenerateError>;
}
