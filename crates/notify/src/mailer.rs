use crate::{DispatchOutcome, NotificationDispatcher, NotifyError, NotifyResult, ShareInvite};
use handlebars::Handlebars;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub const INVITE_SUBJECT: &str = "You've been invited to view a PDF";

/// Implicit-TLS submission port.
const SUBMISSIONS_PORT: u16 = 465;

/// SMTP settings, resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl SmtpConfig {
    /// Builds the config from `SMTP_*` variables using `lookup` to read each key.
    ///
    /// Returns `Ok(None)` when `SMTP_HOST` is unset or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> NotifyResult<Option<Self>> {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(host) = non_blank("SMTP_HOST") else {
            return Ok(None);
        };

        let port = match non_blank("SMTP_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                NotifyError::InvalidConfig(format!("SMTP_PORT '{}': {}", raw, e))
            })?,
            None => SUBMISSIONS_PORT,
        };

        let from = non_blank("SMTP_FROM")
            .ok_or_else(|| NotifyError::InvalidConfig("SMTP_FROM is required".into()))?;

        Ok(Some(Self {
            host: host.trim().to_owned(),
            port,
            username: non_blank("SMTP_USERNAME"),
            password: non_blank("SMTP_PASSWORD"),
            from,
        }))
    }
}

/// Sends share invitations over SMTP.
pub struct SmtpDispatcher {
    smtp: SmtpTransport,
    from: Mailbox,
}

impl SmtpDispatcher {
    /// Builds the transport.
    ///
    /// With credentials, port 465 uses implicit TLS and any other port uses STARTTLS. Without
    /// credentials the transport is a plain local relay (for example a development mail
    /// catcher).
    pub fn new(cfg: &SmtpConfig) -> NotifyResult<Self> {
        let from: Mailbox = cfg.from.parse()?;

        let smtp = match (&cfg.username, &cfg.password) {
            (Some(user), Some(pass)) => {
                let creds = Credentials::new(user.clone(), pass.clone());
                let builder = if cfg.port == SUBMISSIONS_PORT {
                    SmtpTransport::relay(&cfg.host)?
                } else {
                    SmtpTransport::starttls_relay(&cfg.host)?
                };
                builder.port(cfg.port).credentials(creds).build()
            }
            _ => SmtpTransport::builder_dangerous(&cfg.host)
                .port(cfg.port)
                .build(),
        };

        Ok(Self { smtp, from })
    }

    fn deliver(&self, invite: &ShareInvite) -> NotifyResult<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(invite.email.parse()?)
            .subject(INVITE_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(render_invite_html(invite)?)?;

        self.smtp.send(&email)?;
        Ok(())
    }
}

impl NotificationDispatcher for SmtpDispatcher {
    fn send_share_invite(&self, invite: &ShareInvite) -> DispatchOutcome {
        match self.deliver(invite) {
            Ok(()) => {
                tracing::info!(pdf = %invite.pdf_name, "share invite sent");
                DispatchOutcome::sent()
            }
            Err(e) => {
                tracing::warn!(pdf = %invite.pdf_name, "share invite failed: {}", e);
                DispatchOutcome::failed(e.to_string())
            }
        }
    }
}

/// Invitation body. Handlebars HTML-escapes every `{{...}}` substitution.
const INVITE_TEMPLATE: &str = "<p>You have been invited to view the PDF: <b>{{pdfName}}</b>.</p>\n<p>Click <a href=\"{{shareLink}}\">here</a> to view it.</p>";

/// Renders the invitation body.
pub fn render_invite_html(invite: &ShareInvite) -> NotifyResult<String> {
    Ok(Handlebars::new().render_template(INVITE_TEMPLATE, invite)?)
}
