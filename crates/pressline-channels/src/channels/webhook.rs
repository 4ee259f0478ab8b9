// pressline-channels/src/channels/webhook.rs
// ============================================================================
// Module: Webhook Channel
// Description: Channel that POSTs the article as JSON to a configured URL.
// Purpose: Give the `publish` task a generic outbound delivery channel; the
//          receiving system's own wire format (RSS XML, email, social post)
//          is out of scope (spec.md Non-goals) and is expected to live behind
//          this same HTTP endpoint.
// Dependencies: pressline-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`WebhookChannel`] serializes the article and issues a blocking HTTP POST.
//! Redirects are rejected, matching the teacher's outbound-HTTP posture of
//! never silently following a redirect to an unreviewed host.
//!
//! Invariants:
//! - Only 2xx responses are treated as success.
//! - Redirect responses are treated as failures, not followed.

use std::time::Duration;

use pressline_core::core::Article;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use url::Url;

use crate::channel::Channel;
use crate::channel::ChannelError;
use crate::channel::ChannelReceipt;
use crate::channel::ReceiptFactory;

/// Default request timeout for webhook deliveries.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound webhook delivery channel.
pub struct WebhookChannel {
    client: Client,
    url: Url,
    receipts: ReceiptFactory,
}

impl WebhookChannel {
    /// Builds a webhook channel posting to `url` under the name `webhook`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the HTTP client cannot be constructed.
    pub fn new(url: Url) -> Result<Self, ChannelError> {
        Self::named("webhook", url)
    }

    /// Builds a webhook channel under a custom name.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] when the HTTP client cannot be constructed.
    pub fn named(name: impl Into<String>, url: Url) -> Result<Self, ChannelError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| ChannelError::DeliveryFailed(err.to_string()))?;
        Ok(Self { client, url, receipts: ReceiptFactory::new(name) })
    }
}

impl Channel for WebhookChannel {
    fn deliver(&self, article: &Article) -> Result<ChannelReceipt, ChannelError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(article)
            .send()
            .map_err(|err| ChannelError::DeliveryFailed(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Rejected(format!(
                "webhook responded with status {status}"
            )));
        }
        Ok(self.receipts.next())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "test assertions favor clarity over production error handling"
)]
mod tests {
    use pressline_core::core::ArticleId;
    use pressline_core::core::StoryId;
    use pressline_core::core::Timestamp;
    use tiny_http::Response;
    use tiny_http::Server;

    use super::*;

    fn sample_article() -> Article {
        let now = Timestamp::now();
        Article {
            article_id: ArticleId::new(),
            story_id: StoryId::new(),
            headline: "Headline".to_owned(),
            body: "Body".to_owned(),
            byline: "Staff".to_owned(),
            summary: "Summary".to_owned(),
            sources: vec!["https://example.com".to_owned()],
            entities: vec![],
            tags: vec![],
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn webhook_succeeds_on_2xx_response() {
        let server = Server::http("127.0.0.1:0").expect("bind test server");
        let addr = server.server_addr();
        let handle = std::thread::spawn(move || {
            let request = server.recv().expect("receive request");
            request.respond(Response::from_string("ok")).expect("respond");
        });

        let url = Url::parse(&format!("http://{addr}/hook")).expect("valid url");
        let channel = WebhookChannel::new(url).expect("build channel");
        let receipt = channel.deliver(&sample_article()).expect("delivery succeeds");
        assert_eq!(receipt.channel, "webhook");
        handle.join().expect("server thread");
    }

    #[test]
    fn webhook_fails_on_error_response() {
        let server = Server::http("127.0.0.1:0").expect("bind test server");
        let addr = server.server_addr();
        let handle = std::thread::spawn(move || {
            let request = server.recv().expect("receive request");
            request
                .respond(Response::from_string("nope").with_status_code(500))
                .expect("respond");
        });

        let url = Url::parse(&format!("http://{addr}/hook")).expect("valid url");
        let channel = WebhookChannel::new(url).expect("build channel");
        let err = channel.deliver(&sample_article()).expect_err("delivery fails");
        assert!(matches!(err, ChannelError::Rejected(_)));
        handle.join().expect("server thread");
    }
}
