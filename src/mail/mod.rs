use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::MailConfig;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub text_body: String,
    pub html_body: String,
}

impl Email {
    /// 日志用摘要，不含正文（正文里可能有重置链接）
    pub fn summary(&self) -> String {
        format!("'{}' from {} to {:?}", self.subject, self.sender, self.recipients)
    }

    fn to_message(&self) -> Result<Message, AppError> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|e| AppError::Mail(format!("invalid sender {}: {}", self.sender, e)))?;

        let mut builder = Message::builder().from(from).subject(self.subject.clone());
        for recipient in &self.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| AppError::Mail(format!("invalid recipient {}: {}", recipient, e)))?;
            builder = builder.to(to);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                self.text_body.clone(),
                self.html_body.clone(),
            ))
            .map_err(|e| AppError::Mail(e.to_string()))
    }
}

/// 发信通道：配置了 SMTP 服务器时走 SMTP，否则只写日志
pub enum Mailer {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Log,
}

impl Mailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, AppError> {
        let Some(server) = config.server.as_deref() else {
            tracing::warn!("MAIL_SERVER not set, outgoing mail will only be logged");
            return Ok(Mailer::Log);
        };

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
                .map_err(|e| AppError::Mail(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(server)
        };

        let mut builder = builder.port(config.port);
        if let (Some(user), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Mailer::Smtp(builder.build()))
    }

    pub async fn send(&self, email: &Email) -> Result<(), AppError> {
        match self {
            Mailer::Smtp(transport) => {
                let message = email.to_message()?;
                transport
                    .send(message)
                    .await
                    .map_err(|e| AppError::Mail(e.to_string()))?;
                tracing::info!("Sent mail {}", email.summary());
            }
            Mailer::Log => {
                tracing::info!("Mail {} not sent, no MAIL_SERVER configured", email.summary());
                tracing::debug!("Mail body:\n{}", email.text_body);
            }
        }
        Ok(())
    }
}

/// 组装密码重置邮件
pub fn reset_password_email(config: &MailConfig, recipient: &str, reset_url: &str) -> Email {
    let subject = format!("{} Réinitialisation de mot de passe", config.subject_prefix)
        .trim()
        .to_string();

    let text_body = format!(
        "Bonjour {recipient},\n\n\
         Pour réinitialiser votre mot de passe, cliquez sur le lien suivant :\n\n\
         {reset_url}\n\n\
         Si vous n'avez pas demandé de réinitialisation, ignorez simplement ce message.\n"
    );
    let html_body = format!(
        "<p>Bonjour {recipient},</p>\
         <p>Pour réinitialiser votre mot de passe, \
         <a href=\"{reset_url}\">cliquez ici</a>.</p>\
         <p>Vous pouvez aussi copier ce lien dans votre navigateur :</p>\
         <p>{reset_url}</p>\
         <p>Si vous n'avez pas demandé de réinitialisation, ignorez simplement ce message.</p>"
    );

    Email {
        subject,
        sender: config.sender.clone(),
        recipients: vec![recipient.to_string()],
        text_body,
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_config() -> MailConfig {
        MailConfig {
            server: None,
            port: 587,
            use_tls: true,
            username: None,
            password: None,
            sender: "noreply@example.com".into(),
            subject_prefix: "[Unsta Inc]".into(),
        }
    }

    #[test]
    fn reset_mail_carries_link_in_both_bodies() {
        let url = "https://example.com/admin/reset/password/abc.def.ghi";
        let email = reset_password_email(&mail_config(), "a@b.com", url);

        assert_eq!(email.recipients, vec!["a@b.com".to_string()]);
        assert_eq!(email.sender, "noreply@example.com");
        assert!(email.subject.starts_with("[Unsta Inc]"));
        assert!(email.text_body.contains(url));
        assert!(email.html_body.contains(url));
    }

    #[test]
    fn summary_leaves_out_the_reset_link() {
        let url = "https://example.com/admin/reset/password/secret.token.value";
        let email = reset_password_email(&mail_config(), "a@b.com", url);
        let summary = email.summary();

        assert!(summary.contains("a@b.com"));
        assert!(summary.contains(&email.subject));
        assert!(!summary.contains("secret.token.value"));
    }

    #[test]
    fn builds_mime_message() {
        let email = reset_password_email(&mail_config(), "a@b.com", "https://x/y");
        assert!(email.to_message().is_ok());

        let broken = Email {
            sender: "not an address".into(),
            ..email
        };
        assert!(matches!(broken.to_message(), Err(AppError::Mail(_))));
    }

    #[tokio::test]
    async fn log_mailer_accepts_mail() {
        let mailer = Mailer::from_config(&mail_config()).unwrap();
        assert!(matches!(mailer, Mailer::Log));
        let email = reset_password_email(&mail_config(), "a@b.com", "https://x/y");
        mailer.send(&email).await.unwrap();
    }
}
