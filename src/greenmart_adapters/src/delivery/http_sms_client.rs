use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};

use greenmart_core::{Mobile, SmsClient};

const AUTH_HEADER: &str = "X-Api-Key";

/// Minimal SMS gateway client: one JSON POST per message.
pub struct HttpSmsClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl HttpSmsClient {
    pub fn new(base_url: String, api_key: Secret<String>, http_client: Client) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl SmsClient for HttpSmsClient {
    #[tracing::instrument(name = "Sending SMS", skip_all)]
    async fn send_sms(&self, recipient: &Mobile, content: &str) -> Result<(), String> {
        let base = Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        let url = base.join("/messages").map_err(|e| e.to_string())?;

        let request_body = SendSmsRequest {
            to: recipient.as_str(),
            content,
        };

        self.http_client
            .post(url)
            .header(AUTH_HEADER, self.api_key.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}

#[derive(serde::Serialize, Debug)]
struct SendSmsRequest<'a> {
    to: &'a str,
    content: &'a str,
}
