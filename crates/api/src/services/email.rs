//! Transactional email over SMTP.
//!
//! Uses lettre for delivery with Askama templates for the bodies.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use souq_core::Email;
use souq_core::password_reset::reset_code_ttl;

use crate::config::SmtpConfig;

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    code: &'a str,
    minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    code: &'a str,
    minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends password reset codes.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from_address", &self.from_address)
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Build the SMTP transport. No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a password reset code.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or delivery fails.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        let minutes = reset_code_ttl().num_minutes();
        let html = PasswordResetHtml {
            name,
            code,
            minutes,
        }
        .render()?;
        let text = PasswordResetText {
            name,
            code,
            minutes,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), "Your Souq password reset code", &text, &html)
            .await
    }

    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_owned()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_owned()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

/// A random zero-padded four-digit reset code.
#[must_use]
pub fn generate_reset_code() -> String {
    use rand::Rng;
    let code: u16 = rand::rng().random_range(0..10_000);
    format!("{code:04}")
}

#[cfg(test)]
mod tests {
    use souq_core::password_reset::is_well_formed_code;

    use super::*;

    #[test]
    fn reset_code_is_four_digits() {
        for _ in 0..200 {
            let code = generate_reset_code();
            assert!(is_well_formed_code(&code), "{code}");
        }
    }

    #[test]
    fn templates_include_code() {
        let text = PasswordResetText {
            name: "Mona",
            code: "0420",
            minutes: 10,
        }
        .render()
        .unwrap_or_default();
        assert!(text.contains("0420"));
        assert!(text.contains("10 minutes"));

        let html = PasswordResetHtml {
            name: "Mona",
            code: "0420",
            minutes: 10,
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("0420"));
    }
}
