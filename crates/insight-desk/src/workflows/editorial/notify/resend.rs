use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use super::{template, Delivery, NotifyError, ReviewNotice, ReviewNotifier};

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// E-mail delivery through the Resend HTTP API.
pub struct ResendNotifier {
    client: Client,
    endpoint: Url,
    api_key: String,
    sender: String,
    recipient: String,
}

impl ResendNotifier {
    pub fn new(
        api_key: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Result<Self, NotifyError> {
        let endpoint =
            Url::parse(RESEND_ENDPOINT).map_err(|err| NotifyError::Build(err.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| NotifyError::Build(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            sender: sender.into(),
            recipient: recipient.into(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }
}

impl fmt::Debug for ResendNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResendNotifier")
            .field("endpoint", &self.endpoint.as_str())
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl ReviewNotifier for ResendNotifier {
    fn notify(&self, notice: &ReviewNotice) -> Result<Delivery, NotifyError> {
        let payload = json!({
            "from": self.sender,
            "to": [self.recipient],
            "subject": template::subject(notice),
            "html": template::html_body(notice),
            "text": template::text_body(notice),
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message_id = response
            .json::<SendResponse>()
            .ok()
            .and_then(|parsed| parsed.id);
        info!(slug = %notice.slug, message_id = ?message_id, "review notification sent");
        Ok(Delivery::Sent { message_id })
    }
}
