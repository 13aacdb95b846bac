use async_trait::async_trait;

use crate::domain::email::Email;
use crate::domain::mobile::Mobile;

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(
        &self,
        recipient: &Email,
        subject: &str,
        content: &str,
    ) -> Result<(), String>;
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    async fn send_sms(&self, recipient: &Mobile, content: &str) -> Result<(), String>;
}
