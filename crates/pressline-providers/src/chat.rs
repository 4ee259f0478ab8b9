// pressline-providers/src/chat.rs
// ============================================================================
// Module: Chat providers
// Description: HTTP and deterministic-fake `ChatProvider` implementations.
// Purpose: Back draft, edit, and review task handlers (spec §6 "Chat
//          Provider").
// Dependencies: pressline-core, reqwest
// ============================================================================

use std::time::Duration;

use pressline_core::interfaces::ChatError;
use pressline_core::interfaces::ChatProvider;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Calls a local LLM service's `/generate` endpoint (spec §6 "Chat
/// Provider"), matching the prototype's `local_llm_base_url` setting.
pub struct HttpChatProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpChatProvider {
    /// Builds a provider against `base_url`.
    ///
    /// # Errors
    /// Returns [`ChatError::Request`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| ChatError::Request(err.to_string()))?;
        Ok(Self { client, base_url: base_url.into() })
    }
}

impl ChatProvider for HttpChatProvider {
    fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let url = format!("{}/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&GenerateRequest { prompt })
            .send()
            .map_err(|err| ChatError::Request(err.to_string()))?
            .error_for_status()
            .map_err(|err| ChatError::Request(err.to_string()))?;
        let body: GenerateResponse = response.json().map_err(|err| ChatError::Request(err.to_string()))?;
        Ok(body.text)
    }
}

/// A deterministic, network-free chat provider for tests and the demo CLI
/// profile: echoes a fixed template around the prompt rather than calling
/// out to a model.
pub struct FakeChatProvider {
    template: String,
}

impl FakeChatProvider {
    /// Builds a fake provider using `template`, which must contain a
    /// `{prompt}` placeholder.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl Default for FakeChatProvider {
    fn default() -> Self {
        Self::new("generated: {prompt}")
    }
}

impl ChatProvider for FakeChatProvider {
    fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        Ok(self.template.replace("{prompt}", prompt))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only fixture assertions.")]
mod tests {
    use super::FakeChatProvider;
    use pressline_core::interfaces::ChatProvider;

    #[test]
    fn fake_chat_substitutes_prompt() {
        let provider = FakeChatProvider::default();
        assert_eq!(provider.generate("hi").unwrap(), "generated: hi");
    }
}
