//! Email service for reservation and money gift notifications.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails to console (development)
//! - `resend`: Uses the Resend API
//! - `sendgrid`: Uses SendGrid API

use crate::config::EmailConfig;
use domain::models::{MoneyDonation, Reservation, TransferType};
use domain::services::{NotificationResult, NotificationService};
use persistence::repositories::{CelebrantRepository, CelebrantSettingsRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Who the notification is about, resolved from the celebrant's settings.
#[derive(Debug, Clone)]
struct CelebrantContext {
    name: String,
    account_email: Option<String>,
}

impl Default for CelebrantContext {
    fn default() -> Self {
        Self {
            name: "the celebrant".to_string(),
            account_email: None,
        }
    }
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    http: reqwest::Client,
    pool: Option<PgPool>,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: Arc::new(config),
            http,
            pool: None,
        }
    }

    /// Lets templates use the celebrant's name and falls back to the
    /// account e-mail when no admin address is configured.
    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "resend" => self.send_resend(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => Err(EmailError::NotConfigured(format!(
                "unknown provider {}",
                provider
            ))),
        }
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.config.sender_name, self.config.sender_email)
    }

    /// Console provider - logs email to console (for development).
    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            to_name = ?message.to_name,
            subject = %message.subject,
            from = %self.from_header(),
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body (plain text)");
        debug!(body_html_length = message.body_html.len(), "Email body (HTML)");
        Ok(())
    }

    /// Resend provider.
    async fn send_resend(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.resend_api_key.is_empty() {
            return Err(EmailError::NotConfigured(
                "email.resend_api_key is empty".to_string(),
            ));
        }

        let body = serde_json::json!({
            "from": self.from_header(),
            "to": [message.to],
            "subject": message.subject,
            "html": message.body_html,
            "text": message.body_text,
        });

        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.config.resend_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("Resend request failed: {}", e)))?;

        Self::check_provider_response("Resend", &message, response).await
    }

    /// SendGrid provider.
    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured(
                "email.sendgrid_api_key is empty".to_string(),
            ));
        }

        let mut recipient = serde_json::json!({ "email": message.to });
        if let Some(name) = &message.to_name {
            recipient["name"] = serde_json::json!(name);
        }

        let body = serde_json::json!({
            "personalizations": [{ "to": [recipient] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.body_text },
                { "type": "text/html", "value": message.body_html }
            ]
        });

        let response = self
            .http
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        Self::check_provider_response("SendGrid", &message, response).await
    }

    async fn check_provider_response(
        provider: &str,
        message: &EmailMessage,
        response: reqwest::Response,
    ) -> Result<(), EmailError> {
        if response.status().is_success() {
            info!(
                provider = provider,
                to = %message.to,
                subject = %message.subject,
                "Email sent"
            );
            return Ok(());
        }

        let status = response.status();
        let error_body = response.text().await.unwrap_or_default();
        error!(provider = provider, status = %status, error = %error_body, "Email API error");
        Err(EmailError::ProviderError(format!(
            "{} returned {}: {}",
            provider, status, error_body
        )))
    }

    async fn celebrant_context(&self, celebrant_id: Uuid) -> CelebrantContext {
        let Some(pool) = &self.pool else {
            return CelebrantContext::default();
        };

        let settings = CelebrantSettingsRepository::new(pool.clone())
            .find_by_celebrant(celebrant_id)
            .await;
        let account = CelebrantRepository::new(pool.clone())
            .find_by_id(celebrant_id)
            .await;

        let mut context = CelebrantContext::default();
        match settings {
            Ok(Some(entity)) => {
                let name = entity.name.trim();
                if !name.is_empty() {
                    context.name = name.to_string();
                }
            }
            Ok(None) => {}
            Err(e) => warn!(
                celebrant_id = %celebrant_id,
                error = %e,
                "Could not load celebrant name"
            ),
        }
        if let Ok(Some(entity)) = account {
            context.account_email = entity.email;
        }
        context
    }

    fn admin_recipient(&self, context: &CelebrantContext) -> Option<String> {
        if !self.config.admin_email.is_empty() {
            return Some(self.config.admin_email.clone());
        }
        context.account_email.clone()
    }

    fn dashboard_url(&self) -> String {
        format!("{}/admin/dashboard", self.config.base_url.trim_end_matches('/'))
    }

    async fn send_pair(
        &self,
        guest: EmailMessage,
        admin: Option<EmailMessage>,
    ) -> NotificationResult {
        let mut failures = Vec::new();

        if let Err(e) = self.send(guest).await {
            failures.push(format!("guest: {}", e));
        }
        match admin {
            Some(message) => {
                if let Err(e) = self.send(message).await {
                    failures.push(format!("admin: {}", e));
                }
            }
            None => debug!("No admin recipient configured, skipping celebrant notification"),
        }

        if failures.is_empty() {
            NotificationResult::Sent
        } else {
            NotificationResult::Failed(failures.join("; "))
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for EmailService {
    async fn reservation_confirmed(&self, reservation: &Reservation) -> NotificationResult {
        if !self.is_enabled() {
            return NotificationResult::Skipped;
        }

        let context = self.celebrant_context(reservation.celebrant_id).await;
        let guest = reservation_guest_email(&context.name, reservation);
        let admin = self.admin_recipient(&context).map(|to| {
            reservation_admin_email(&context.name, reservation, &to, &self.dashboard_url())
        });

        self.send_pair(guest, admin).await
    }

    async fn donation_pledged(&self, donation: &MoneyDonation) -> NotificationResult {
        if !self.is_enabled() {
            return NotificationResult::Skipped;
        }

        let context = self.celebrant_context(donation.celebrant_id).await;
        let guest = donation_guest_email(&context.name, donation);
        let admin = self
            .admin_recipient(&context)
            .map(|to| donation_admin_email(&context.name, donation, &to, &self.dashboard_url()));

        self.send_pair(guest, admin).await
    }
}

/// Escapes guest supplied text for HTML bodies.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, header_color: &str, heading: &str, tagline: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: {header_color}; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
        <h1 style="margin: 0;">{heading}</h1>
        <p>{tagline}</p>
    </div>
    <div style="background: #f9fafb; padding: 30px; border-radius: 0 0 10px 10px;">
{content}
    </div>
</body>
</html>"#
    )
}

fn items_html(reservation: &Reservation) -> String {
    let mut html: String = reservation
        .selected_items
        .iter()
        .map(|item| {
            format!(
                r#"        <div style="background: white; padding: 15px; margin: 10px 0; border-radius: 8px; border-left: 4px solid #ec4899;"><strong>{}</strong></div>
"#,
                escape_html(&item.title)
            )
        })
        .collect();
    if reservation.include_wine {
        html.push_str("        <div style=\"background: #fef3f4; padding: 10px; margin: 5px 0; border-radius: 6px;\">Wine Selection</div>\n");
    }
    if reservation.include_flowers {
        html.push_str("        <div style=\"background: #fef3f4; padding: 10px; margin: 5px 0; border-radius: 6px;\">Fresh Flowers</div>\n");
    }
    html
}

fn items_text(reservation: &Reservation) -> String {
    let mut lines: Vec<String> = reservation
        .selected_items
        .iter()
        .map(|item| format!("- {}", item.title))
        .collect();
    if reservation.include_wine {
        lines.push("- Wine Selection (add-on)".to_string());
    }
    if reservation.include_flowers {
        lines.push("- Fresh Flowers (add-on)".to_string());
    }
    lines.join("\n")
}

fn message_html(label: &str, message: Option<&str>) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!(
            "        <h3>{}</h3>\n        <p style=\"font-style: italic; background: white; padding: 15px; border-radius: 8px;\">\"{}\"</p>\n",
            label,
            escape_html(m)
        ),
        None => String::new(),
    }
}

fn message_text(label: &str, message: Option<&str>) -> String {
    match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(m) => format!("\n{}\n\"{}\"\n", label, m),
        None => String::new(),
    }
}

/// Confirmation sent to the guest after a reservation commits.
pub fn reservation_guest_email(celebrant_name: &str, reservation: &Reservation) -> EmailMessage {
    let guest = escape_html(&reservation.guest_name);
    let celebrant = escape_html(celebrant_name);

    let content = format!(
        "        <h2>Hello {guest}!</h2>\n\
         <p>Your gift reservation has been confirmed. Here are the details:</p>\n\
         <h3>Reserved Items:</h3>\n\
         {items}{message}\
         <p><strong>What's Next?</strong></p>\n\
         <ul><li>Your gifts are now reserved and won't be available to other guests</li>\
         <li>If you have any questions, just reply to this email</li></ul>\n\
         <p>Thank you for being part of {celebrant}'s special day!</p>\n\
         <p>Reservation reference: {id}</p>",
        items = items_html(reservation),
        message = message_html("Your Message:", reservation.message.as_deref()),
        id = reservation.id,
    );

    let body_text = format!(
        "Hello {name}!\n\nYour gift reservation has been confirmed.\n\nReserved items:\n{items}\n{message}\n\
         Your gifts are now reserved and won't be available to other guests.\n\n\
         Thank you for being part of {celebrant}'s special day!\n\nReservation reference: {id}",
        name = reservation.guest_name,
        items = items_text(reservation),
        message = message_text("Your message:", reservation.message.as_deref()),
        celebrant = celebrant_name,
        id = reservation.id,
    );

    EmailMessage {
        to: reservation.guest_email.clone(),
        to_name: Some(reservation.guest_name.clone()),
        subject: "🎉 Your Gift Reservation is Confirmed!".to_string(),
        body_text,
        body_html: layout(
            "Gift Reservation Confirmed",
            "linear-gradient(135deg, #ec4899, #8b5cf6)",
            "Gift Reservation Confirmed!",
            &format!("Thank you for making {}'s birthday special", celebrant),
            &content,
        ),
    }
}

/// Alert sent to the celebrant/admin for a new reservation.
pub fn reservation_admin_email(
    celebrant_name: &str,
    reservation: &Reservation,
    to: &str,
    dashboard_url: &str,
) -> EmailMessage {
    let content = format!(
        "        <div style=\"background: white; padding: 20px; border-radius: 8px; margin: 15px 0;\">\n\
         <h3>Guest Information:</h3>\n\
         <p><strong>Name:</strong> {name}</p>\n\
         <p><strong>Email:</strong> {email}</p>\n{phone}\
         </div>\n\
         <h3>Reserved Items:</h3>\n{items}{message}\
         <p>You can view all reservations in your <a href=\"{url}\">admin dashboard</a>.</p>",
        name = escape_html(&reservation.guest_name),
        email = escape_html(&reservation.guest_email),
        phone = reservation
            .guest_phone
            .as_deref()
            .map(|p| format!("<p><strong>Phone:</strong> {}</p>\n", escape_html(p)))
            .unwrap_or_default(),
        items = items_html(reservation),
        message = message_html("Guest Message:", reservation.message.as_deref()),
        url = escape_html(dashboard_url),
    );

    let body_text = format!(
        "New gift reservation for {celebrant}.\n\nGuest: {name} <{email}>\n\nReserved items:\n{items}\n{message}\n\
         Dashboard: {url}",
        celebrant = celebrant_name,
        name = reservation.guest_name,
        email = reservation.guest_email,
        items = items_text(reservation),
        message = message_text("Guest message:", reservation.message.as_deref()),
        url = dashboard_url,
    );

    EmailMessage {
        to: to.to_string(),
        to_name: None,
        subject: format!("🎁 New Gift Reservation from {}", reservation.guest_name),
        body_text,
        body_html: layout(
            "New Gift Reservation",
            "#1f2937",
            "New Gift Reservation",
            &format!(
                "Someone just reserved gifts for {}'s birthday!",
                escape_html(celebrant_name)
            ),
            &content,
        ),
    }
}

fn bank_details_html(transfer_type: TransferType, reference: &str) -> String {
    let details = transfer_type.bank_details();
    format!(
        "        <div style=\"background: white; padding: 20px; border-radius: 8px; border: 2px solid #10b981; margin: 20px 0;\">\n\
         <h3>{label}</h3>\n\
         <p><strong>Bank:</strong> {bank}</p>\n\
         <p><strong>Account Holder:</strong> {holder}</p>\n\
         <p><strong>Account Number:</strong> {number}</p>\n\
         <p><strong>{routing_label}:</strong> {routing}</p>\n\
         <p><strong>Reference:</strong> {reference}</p>\n\
         </div>\n",
        label = details.label,
        bank = details.bank_name,
        holder = details.account_holder,
        number = details.account_number,
        routing_label = details.routing_label,
        routing = details.routing_code,
        reference = escape_html(reference),
    )
}

fn bank_details_text(transfer_type: TransferType, reference: &str) -> String {
    let details = transfer_type.bank_details();
    format!(
        "{}\n  Bank: {}\n  Account holder: {}\n  Account number: {}\n  {}: {}\n  Reference: {}\n",
        details.label,
        details.bank_name,
        details.account_holder,
        details.account_number,
        details.routing_label,
        details.routing_code,
        reference
    )
}

/// Transfer instructions sent to the guest. Both transfer options are
/// listed; the chosen one comes first.
pub fn donation_guest_email(celebrant_name: &str, donation: &MoneyDonation) -> EmailMessage {
    let reference = donation.transfer_reference();
    let order = match donation.transfer_type {
        TransferType::Belarus => [TransferType::Belarus, TransferType::International],
        TransferType::International => [TransferType::International, TransferType::Belarus],
    };
    let amount = format!("{:.2} {}", donation.amount(), donation.currency);

    let content = format!(
        "        <h2>Hello {guest}!</h2>\n\
         <p>Thank you for choosing to contribute a money gift of <strong>{amount}</strong> to {celebrant}'s birthday celebration!</p>\n\
         {first}{second}\
         <div style=\"background: #fef3c7; padding: 15px; border-radius: 8px; border-left: 4px solid #f59e0b;\">\
         <p><strong>Important:</strong> Please include the reference \"{reference}\" in your transfer so we can identify your gift.</p></div>\n\
         {message}",
        guest = escape_html(&donation.guest_name),
        celebrant = escape_html(celebrant_name),
        first = bank_details_html(order[0], &reference),
        second = bank_details_html(order[1], &reference),
        reference = escape_html(&reference),
        message = message_html("Your Message:", donation.message.as_deref()),
    );

    let body_text = format!(
        "Hello {name}!\n\nThank you for choosing to contribute a money gift of {amount} to {celebrant}'s birthday celebration!\n\n\
         {first}\n{second}\nPlease include the reference \"{reference}\" in your transfer.\n{message}",
        name = donation.guest_name,
        celebrant = celebrant_name,
        first = bank_details_text(order[0], &reference),
        second = bank_details_text(order[1], &reference),
        message = message_text("Your message:", donation.message.as_deref()),
    );

    EmailMessage {
        to: donation.guest_email.clone(),
        to_name: Some(donation.guest_name.clone()),
        subject: "💝 Bank Transfer Instructions for Your Money Gift".to_string(),
        body_text,
        body_html: layout(
            "Money Gift Instructions",
            "linear-gradient(135deg, #10b981, #059669)",
            "Thank You for Your Money Gift!",
            &format!(
                "Your contribution means so much to {}",
                escape_html(celebrant_name)
            ),
            &content,
        ),
    }
}

/// Alert sent to the celebrant/admin for a new money gift pledge.
pub fn donation_admin_email(
    celebrant_name: &str,
    donation: &MoneyDonation,
    to: &str,
    dashboard_url: &str,
) -> EmailMessage {
    let reference = donation.transfer_reference();
    let amount = format!("{:.2} {}", donation.amount(), donation.currency);
    let label = donation.transfer_type.bank_details().label;

    let content = format!(
        "        <div style=\"background: white; padding: 20px; border-radius: 8px; margin: 15px 0; border-left: 4px solid #10b981;\">\n\
         <h3>Guest Information:</h3>\n\
         <p><strong>Name:</strong> {name}</p>\n\
         <p><strong>Email:</strong> {email}</p>\n{phone}\
         <p><strong>Amount:</strong> {amount}</p>\n\
         <p><strong>Transfer:</strong> {label}</p>\n\
         </div>\n{message}\
         <p>Watch for a transfer with the reference \"{reference}\".</p>\n\
         <p>You can view all money gifts in your <a href=\"{url}\">admin dashboard</a>.</p>",
        name = escape_html(&donation.guest_name),
        email = escape_html(&donation.guest_email),
        phone = donation
            .guest_phone
            .as_deref()
            .map(|p| format!("<p><strong>Phone:</strong> {}</p>\n", escape_html(p)))
            .unwrap_or_default(),
        message = message_html("Guest Message:", donation.message.as_deref()),
        reference = escape_html(&reference),
        url = escape_html(dashboard_url),
    );

    let body_text = format!(
        "New money gift pledge for {celebrant}.\n\nGuest: {name} <{email}>\nAmount: {amount}\nTransfer: {label}\n\
         Reference: {reference}\n{message}\nDashboard: {url}",
        celebrant = celebrant_name,
        name = donation.guest_name,
        email = donation.guest_email,
        message = message_text("Guest message:", donation.message.as_deref()),
        url = dashboard_url,
    );

    EmailMessage {
        to: to.to_string(),
        to_name: None,
        subject: format!("💰 New Money Gift Request from {}", donation.guest_name),
        body_text,
        body_html: layout(
            "New Money Gift Request",
            "#1f2937",
            "New Money Gift Request",
            "Someone just requested bank transfer instructions!",
            &content,
        ),
    }
}
