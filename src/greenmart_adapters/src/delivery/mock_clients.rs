use greenmart_core::{Email, EmailClient, Mobile, SmsClient};

#[derive(Debug, Clone, Default)]
pub struct MockEmailClient;

impl MockEmailClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EmailClient for MockEmailClient {
    async fn send_email(
        &self,
        _recipient: &Email,
        _subject: &str,
        _content: &str,
    ) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockSmsClient;

impl MockSmsClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SmsClient for MockSmsClient {
    async fn send_sms(&self, _recipient: &Mobile, _content: &str) -> Result<(), String> {
        Ok(())
    }
}
