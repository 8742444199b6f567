//! Money donation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;
use validator::Validate;

/// Currency assumed when a guest does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// How the guest intends to transfer the money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferType {
    Belarus,
    International,
}

impl TransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferType::Belarus => "belarus",
            TransferType::International => "international",
        }
    }

    /// Bank details the guest needs for this transfer type.
    pub fn bank_details(&self) -> BankDetails {
        match self {
            TransferType::Belarus => BankDetails {
                label: "Belarus Bank Transfer",
                bank_name: "Belarusbank",
                account_holder: "Birthday Celebrant",
                account_number: "BY86 AKBB 1010 0000 0029 6600 0000",
                routing_code: "AKBBBY2X",
                routing_label: "BIC",
            },
            TransferType::International => BankDetails {
                label: "International Transfer (Wise)",
                bank_name: "Wise",
                account_holder: "Birthday Celebrant",
                account_number: "GB33 BUKB 2020 1555 5555 55",
                routing_code: "TRWIGB2L",
                routing_label: "SWIFT",
            },
        }
    }
}

impl std::fmt::Display for TransferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransferType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "belarus" => Ok(TransferType::Belarus),
            "international" => Ok(TransferType::International),
            other => Err(format!("Unknown transfer type: {}", other)),
        }
    }
}

/// Bank account details shown in transfer instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BankDetails {
    pub label: &'static str,
    pub bank_name: &'static str,
    pub account_holder: &'static str,
    pub account_number: &'static str,
    pub routing_code: &'static str,
    pub routing_label: &'static str,
}

/// A recorded money gift pledge. No inventory semantics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MoneyDonation {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    /// Amount in minor units (cents)
    #[serde(rename = "amount", serialize_with = "serialize_minor_units")]
    pub amount_minor: i64,
    pub currency: String,
    pub transfer_type: TransferType,
    pub created_at: DateTime<Utc>,
}

impl MoneyDonation {
    /// Amount in major units.
    pub fn amount(&self) -> f64 {
        shared::validation::from_minor_units(self.amount_minor)
    }

    /// Payment reference the guest should use for the transfer.
    pub fn transfer_reference(&self) -> String {
        format!("Birthday Gift - {}", self.guest_name)
    }
}

fn serialize_minor_units<S: Serializer>(minor: &i64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(shared::validation::from_minor_units(*minor))
}

/// Request body for pledging a money gift.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateDonationRequest {
    /// Internal account identifier, required on `POST /api/v1/donations`.
    #[serde(default)]
    pub celebrant_id: Option<Uuid>,

    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub guest_name: String,

    #[serde(default)]
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 254, message = "Email is too long"))]
    pub guest_email: String,

    #[validate(length(max = 40, message = "Phone must be at most 40 characters"))]
    #[validate(custom(function = "super::reservation::validate_guest_phone"))]
    pub guest_phone: Option<String>,

    #[validate(length(max = 2000, message = "Message must be at most 2000 characters"))]
    pub message: Option<String>,

    #[validate(custom(function = "shared::validation::validate_donation_amount"))]
    pub amount: f64,

    #[validate(custom(function = "shared::validation::validate_currency_code"))]
    pub currency: Option<String>,

    pub transfer_type: TransferType,
}

impl CreateDonationRequest {
    /// Currency to record, falling back to the default.
    pub fn currency_or_default(&self) -> String {
        self.currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

/// Data required to record a donation.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub celebrant_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub message: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub transfer_type: TransferType,
}

impl NewDonation {
    pub fn from_request(celebrant_id: Uuid, request: CreateDonationRequest) -> Self {
        let currency = request.currency_or_default();
        Self {
            celebrant_id,
            guest_name: request.guest_name.trim().to_string(),
            guest_email: request.guest_email.trim().to_lowercase(),
            guest_phone: request.guest_phone,
            message: request.message,
            amount_minor: shared::validation::to_minor_units(request.amount),
            currency,
            transfer_type: request.transfer_type,
        }
    }
}

/// Response after a donation pledge is recorded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DonationResponse {
    pub success: bool,
    pub donation_id: Uuid,
    pub message: String,
}

impl DonationResponse {
    pub fn recorded(donation_id: Uuid) -> Self {
        Self {
            success: true,
            donation_id,
            message: "Money gift recorded, transfer instructions sent".to_string(),
        }
    }
}

/// Paginated donation listing for the celebrant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListDonationsResponse {
    pub donations: Vec<MoneyDonation>,
    pub next_cursor: Option<String>,
}
