use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::SendError;
use crate::payload::Message;
use crate::transport::{ReqwestTransport, Transport, TransportError, DEFAULT_TIMEOUT};

pub const DEFAULT_API_URL: &str = "https://slack.com/api/chat.postMessage";

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Incoming webhook; the URL itself carries the credentials.
    Webhook { url: String },
    /// Web API method authenticated with a bearer token.
    Api { url: String, token: String },
}

impl Endpoint {
    pub fn webhook(url: impl Into<String>) -> Self {
        Endpoint::Webhook { url: url.into() }
    }

    pub fn api(token: impl Into<String>) -> Self {
        Endpoint::Api {
            url: DEFAULT_API_URL.to_string(),
            token: token.into(),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Endpoint::Webhook { url } | Endpoint::Api { url, .. } => url,
        }
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![("content-type", "application/json; charset=utf-8".to_string())];
        if let Endpoint::Api { token, .. } = self {
            headers.push(("authorization", format!("Bearer {token}")));
        }
        headers
    }
}

/// Application-level reply of the Web API (`{"ok": false, "error": "..."}`).
#[derive(Debug, Deserialize)]
struct ApiReply {
    ok: bool,
    error: Option<String>,
}

/// Serializes messages and posts each one exactly once.
#[derive(Debug, Clone)]
pub struct Notifier<T = ReqwestTransport> {
    transport: T,
}

impl Notifier<ReqwestTransport> {
    pub fn new(timeout: Duration) -> Result<Self, SendError> {
        Ok(Self::with_transport(ReqwestTransport::new(timeout)?))
    }
}

impl<T: Transport> Notifier<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Deliver `message` to `endpoint`. Failures are logged at WARN and
    /// returned; nothing is retried.
    pub async fn send(&self, endpoint: &Endpoint, message: &Message) -> Result<(), SendError> {
        let result = self.try_send(endpoint, message).await;
        if let Err(e) = &result {
            warn!(target: "hookpost::notifier", url = %redact(endpoint), "send failed: {e}");
        }
        result
    }

    async fn try_send(&self, endpoint: &Endpoint, message: &Message) -> Result<(), SendError> {
        let body = message.to_json()?;
        debug!(url = %redact(endpoint), bytes = body.len(), "posting message");

        let headers = endpoint.headers();
        let resp = self
            .transport
            .post(endpoint.url(), &headers, body.into_bytes())
            .await?;

        if !resp.is_success() {
            return Err(TransportError::Status {
                status: resp.status,
                body: resp.body,
            }
            .into());
        }

        // Webhooks answer with plain `ok`; the Web API answers with JSON.
        if let Ok(reply) = serde_json::from_str::<ApiReply>(&resp.body) {
            if !reply.ok {
                return Err(SendError::RemoteRejected {
                    reason: reply.error.unwrap_or_else(|| "unknown_error".to_string()),
                });
            }
        }

        debug!(status = resp.status, "message delivered");
        Ok(())
    }
}

/// Send with a default notifier.
pub async fn send(endpoint: &Endpoint, message: &Message) -> Result<(), SendError> {
    let notifier = Notifier::new(DEFAULT_TIMEOUT)?;
    notifier.send(endpoint, message).await
}

/// Webhook URLs embed their secret in the path; log only scheme and host.
fn redact(endpoint: &Endpoint) -> String {
    let url = endpoint.url();
    match reqwest::Url::parse(url) {
        Ok(u) => format!("{}://{}/...", u.scheme(), u.host_str().unwrap_or_default()),
        Err(_) => "<invalid url>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Attachment, Severity, Title};
    use crate::transport::HttpResponse;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Call {
        url: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    struct MockTransport {
        reply: fn() -> Result<HttpResponse, TransportError>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockTransport {
        fn new(reply: fn() -> Result<HttpResponse, TransportError>) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn post(
            &self,
            url: &str,
            headers: &[(&str, String)],
            body: Vec<u8>,
        ) -> Result<HttpResponse, TransportError> {
            self.calls.lock().unwrap().push(Call {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                body: String::from_utf8(body).unwrap(),
            });
            (self.reply)()
        }
    }

    fn rich_message() -> Message {
        let attachment = Attachment::builder()
            .fallback("x")
            .severity(Severity::Good)
            .title(Title {
                text: Some("T".into()),
                link: None,
            })
            .text("v")
            .build()
            .unwrap();
        Message::builder().attachment(attachment).build()
    }

    const HOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    #[tokio::test]
    async fn webhook_ok_is_success() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Ok(HttpResponse {
                status: 200,
                body: "ok".into(),
            })
        }));
        let msg = rich_message();
        notifier.send(&Endpoint::webhook(HOOK), &msg).await.unwrap();

        let calls = notifier.transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, HOOK);
        assert_eq!(calls[0].body, msg.to_json().unwrap());
        assert!(calls[0]
            .headers
            .iter()
            .any(|(k, v)| k == "content-type" && v.starts_with("application/json")));
        assert!(!calls[0].headers.iter().any(|(k, _)| k == "authorization"));
    }

    #[tokio::test]
    async fn connection_refused_is_not_retried() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Err(TransportError::Connect("connection refused".into()))
        }));
        let err = notifier
            .send(&Endpoint::webhook(HOOK), &rich_message())
            .await
            .unwrap_err();
        assert_matches!(err, SendError::Transport(TransportError::Connect(_)));
        assert_eq!(notifier.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn ok_false_reply_is_remote_rejection() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"ok": false, "error": "channel_not_found"}"#.into(),
            })
        }));
        let err = notifier
            .send(&Endpoint::api("xoxb-test"), &rich_message())
            .await
            .unwrap_err();
        assert_matches!(err, SendError::RemoteRejected { reason } if reason == "channel_not_found");
        assert_eq!(notifier.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn ok_false_without_reason() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"ok": false}"#.into(),
            })
        }));
        let err = notifier
            .send(&Endpoint::api("xoxb-test"), &rich_message())
            .await
            .unwrap_err();
        assert_matches!(err, SendError::RemoteRejected { reason } if reason == "unknown_error");
    }

    #[tokio::test]
    async fn non_2xx_is_transport_error() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Ok(HttpResponse {
                status: 404,
                body: "no_service".into(),
            })
        }));
        let err = notifier
            .send(&Endpoint::webhook(HOOK), &rich_message())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            SendError::Transport(TransportError::Status { status: 404, ref body })
                if body == "no_service"
        );
    }

    #[tokio::test]
    async fn api_endpoint_sends_bearer_token() {
        let notifier = Notifier::with_transport(MockTransport::new(|| {
            Ok(HttpResponse {
                status: 200,
                body: r#"{"ok": true, "ts": "1700000000.000100"}"#.into(),
            })
        }));
        let msg = Message::builder().channel("#ops").text("hello").build();
        notifier.send(&Endpoint::api("xoxb-test"), &msg).await.unwrap();

        let calls = notifier.transport.calls.lock().unwrap();
        assert_eq!(calls[0].url, DEFAULT_API_URL);
        assert!(calls[0]
            .headers
            .iter()
            .any(|(k, v)| k == "authorization" && v == "Bearer xoxb-test"));
    }

    #[test]
    fn redact_hides_webhook_secret() {
        let shown = redact(&Endpoint::webhook(HOOK));
        assert_eq!(shown, "https://hooks.slack.com/...");
        assert!(!shown.contains("XXXX"));
    }
}
