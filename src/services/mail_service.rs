//! Outgoing mail. SMTP via lettre when configured, otherwise messages are
//! only written to the log (handy in development).

use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> AppResult<()>;
}

/// Fallback when no SMTP relay is configured
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        log::info!(
            "📧 [mail not sent, SMTP disabled] to={} subject={}\n{}",
            email.to,
            email.subject,
            email.text
        );
        Ok(())
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Mail(e.to_string()))?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| AppError::Mail(format!("Invalid sender: {}", self.from_address)))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| AppError::Mail(format!("Invalid recipient: {}", email.to)))?)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html),
                    ),
            )
            .map_err(|e| AppError::Mail(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        log::info!("📧 Email sent to {} ({})", email.to, email.subject);
        Ok(())
    }
}

pub fn password_reset_email(to: &str, reset_url: &str) -> Email {
    Email {
        to: to.to_string(),
        subject: "Password Reset".to_string(),
        text: format!(
            "You have requested a password reset. Please visit the link below to reset your \
             password. This link is valid for 1 hour.\n\n{}\n\nIf you didn't request this \
             email, please ignore it.",
            reset_url
        ),
        html: format!(
            "<p>You have requested a password reset. Please click the link below to reset \
             your password. This link is valid for 1 hour.</p>\
             <p><a href=\"{url}\">Reset my password</a></p>\
             <p>If you didn't request this email, please ignore it.</p>",
            url = reset_url
        ),
    }
}

/// Keeps every message instead of sending it
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<Email>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn last(&self) -> Option<Email> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> AppResult<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}
