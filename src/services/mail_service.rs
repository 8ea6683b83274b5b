use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{
    message::header::ContentType, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("could not build message: {0}")]
    Build(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Outbound mail. One attempt per call; failures are returned, not retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(
        smtp_server: &str,
        smtp_username: &str,
        smtp_password: &str,
        from_email: &str,
    ) -> Result<Self, MailError> {
        let creds = Credentials::new(smtp_username.to_string(), smtp_password.to_string());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_server)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .credentials(creds)
            .timeout(Some(std::time::Duration::from_secs(15)))
            .build();
        Ok(Self {
            transport,
            from_email: from_email.to_string(),
        })
    }
}

pub fn build_message(from: &str, to: &str, subject: &str, body: &str) -> Result<Message, MailError> {
    Message::builder()
        .from(from.parse().map_err(|e| MailError::Address(format!("{:?}", e)))?)
        .to(to.parse().map_err(|e| MailError::Address(format!("{:?}", e)))?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| MailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let email = build_message(&self.from_email, to, subject, body)?;
        AsyncTransport::send(&self.transport, email)
            .await
            .map(|_resp| ())
            .map_err(|e| MailError::Transport(e.to_string()))
    }
}

/// Writes mail to the log instead of sending it. Used when no SMTP relay is
/// configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        tracing::info!(%to, %subject, %body, "mail transport not configured; logging message");
        Ok(())
    }
}

pub fn activation_message(base_url: &str, uid: &str, token: &str) -> (String, String) {
    let link = format!(
        "{}/api/auth/activate/{}/{}",
        base_url.trim_end_matches('/'),
        uid,
        token
    );
    let subject = "Activate your account".to_string();
    let body = format!("Hi,\n\nPlease click the link below to activate your account:\n{link}\n");
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_addresses_never_reach_the_transport() {
        assert!(matches!(
            build_message("invalid-from", "to@example.com", "s", "b"),
            Err(MailError::Address(_))
        ));
        assert!(matches!(
            build_message("from@example.com", "not-an-email", "s", "b"),
            Err(MailError::Address(_))
        ));
        assert!(build_message("from@example.com", "to@example.com", "s", "b").is_ok());
    }

    #[test]
    fn activation_link_points_at_the_api() {
        let (_, body) = activation_message("https://jobs.example.com/", "abc", "k1-ff");
        assert!(body.contains("https://jobs.example.com/api/auth/activate/abc/k1-ff"));
    }

    #[test]
    fn log_mailer_always_succeeds() {
        tokio_test::assert_ok!(tokio_test::block_on(LogMailer.send("a@x.com", "hi", "body")));
    }
}
