pub mod http_email_client;
pub mod http_sms_client;
pub mod mock_clients;

pub use http_email_client::HttpEmailClient;
pub use http_sms_client::HttpSmsClient;
pub use mock_clients::{MockEmailClient, MockSmsClient};
