use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::EmailConfig;

/// What the mail template needs for an OTP link email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub recipients: Vec<String>,
    pub subject: String,
    pub url: String,
    pub first_name: String,
    pub msg_purpose: String,
    pub company_name: String,
    pub base_url: String,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, AppError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let mailer = SmtpTransport::starttls_relay(&config.host)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid EMAIL_FROM: {}", e)))?;

        tracing::info!(host = %config.host, port = config.port, "Email service initialized");

        Ok(Self { mailer, from })
    }
}

fn render_plain(message: &EmailMessage) -> String {
    format!(
        "Hi {},\n\n{}: open the link below to continue.\n\n{}\n\nThe link expires shortly. \
         If you did not request this, ignore this email.\n\n{}\n{}",
        message.first_name,
        message.msg_purpose,
        message.url,
        message.company_name,
        message.base_url
    )
}

fn render_html(message: &EmailMessage) -> String {
    format!(
        r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>{purpose}</h2>
        <p>Hi {first_name},</p>
        <p>Click the button below to continue.</p>
        <p><a href="{url}" style="background-color: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block;">{purpose}</a></p>
        <p>The link expires shortly. If you did not request this, ignore this email.</p>
        <p><a href="{base_url}">{company}</a></p>
    </body>
</html>"###,
        purpose = message.msg_purpose,
        first_name = message.first_name,
        url = message.url,
        base_url = message.base_url,
        company = message.company_name,
    )
}

#[async_trait]
impl EmailProvider for EmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject.clone());

        for recipient in &message.recipients {
            let mailbox = recipient
                .parse::<Mailbox>()
                .map_err(|e| AppError::EmailError(format!("Invalid recipient: {}", e)))?;
            builder = builder.to(mailbox);
        }

        let email = builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(render_plain(message)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(render_html(message)),
                    ),
            )
            .map_err(|e| AppError::EmailError(e.to_string()))?;

        // SmtpTransport is blocking
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::InternalError(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(
                    recipients = message.recipients.len(),
                    purpose = %message.msg_purpose,
                    "Email sent successfully"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    purpose = %message.msg_purpose,
                    "Failed to send email"
                );
                Err(AppError::EmailError(e.to_string()))
            }
        }
    }
}

/// Records every message instead of sending it. Can be switched to fail.
#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<EmailMessage> {
        self.sent().pop()
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::EmailError("mock transport failure".to_string()));
        }

        self.sent
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Lock error: {}", e)))?
            .push(message.clone());
        Ok(())
    }
}
