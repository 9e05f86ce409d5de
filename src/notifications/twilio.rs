// src/notifications/twilio.rs

use super::NotifyError;
use crate::config::SmsCredentials;

/// Minimal client for the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    http: reqwest::Client,
    credentials: SmsCredentials,
}

impl TwilioClient {
    pub fn new(credentials: SmsCredentials) -> Self {
        TwilioClient {
            http: reqwest::Client::new(),
            credentials,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.credentials.api_base.trim_end_matches('/'),
            self.credentials.account_sid
        )
    }

    /// Send one text message.
    pub async fn send(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        let params = [
            ("To", to),
            ("From", self.credentials.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(to, "sms sent");
        Ok(())
    }
}
