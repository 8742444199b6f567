//! Admin dashboard aggregates and data export.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::celebrant::CelebrantSettings;
use super::donation::{MoneyDonation, TransferType};
use super::reservation::Reservation;
use super::wishlist_item::WishlistItem;

/// Donation total for one currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub amount: f64,
    pub count: i64,
}

/// Reservation progress of a single item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAvailability {
    pub id: Uuid,
    pub title: String,
    pub reserved: i32,
    pub available: i32,
}

/// Number of donations per transfer type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferTypeSplit {
    pub belarus: i64,
    pub international: i64,
}

/// Aggregated wishlist activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_reservations: i64,
    pub total_donations: i64,
    pub donation_totals: Vec<CurrencyTotal>,
    /// Unique guests by case-insensitive e-mail across reservations and donations.
    pub total_guests: i64,
    pub wine_add_ons: i64,
    pub flower_add_ons: i64,
    pub items: Vec<ItemAvailability>,
    pub transfer_types: TransferTypeSplit,
}

impl DashboardSummary {
    pub fn compute(
        reservations: &[Reservation],
        donations: &[MoneyDonation],
        items: &[WishlistItem],
    ) -> Self {
        let guests: HashSet<String> = reservations
            .iter()
            .map(|r| r.guest_email.trim().to_lowercase())
            .chain(donations.iter().map(|d| d.guest_email.trim().to_lowercase()))
            .collect();

        let mut per_currency: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        let mut transfer_types = TransferTypeSplit::default();
        for donation in donations {
            let entry = per_currency.entry(donation.currency.as_str()).or_default();
            entry.0 += donation.amount_minor;
            entry.1 += 1;
            match donation.transfer_type {
                TransferType::Belarus => transfer_types.belarus += 1,
                TransferType::International => transfer_types.international += 1,
            }
        }

        Self {
            total_reservations: reservations.len() as i64,
            total_donations: donations.len() as i64,
            donation_totals: per_currency
                .into_iter()
                .map(|(currency, (minor, count))| CurrencyTotal {
                    currency: currency.to_string(),
                    amount: shared::validation::from_minor_units(minor),
                    count,
                })
                .collect(),
            total_guests: guests.len() as i64,
            wine_add_ons: reservations.iter().filter(|r| r.include_wine).count() as i64,
            flower_add_ons: reservations.iter().filter(|r| r.include_flowers).count() as i64,
            items: items
                .iter()
                .map(|item| ItemAvailability {
                    id: item.id,
                    title: item.title.clone(),
                    reserved: item.reserved,
                    available: item.quantity,
                })
                .collect(),
            transfer_types,
        }
    }
}

/// Full data export for the celebrant.
#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub celebrant_settings: Option<CelebrantSettings>,
    pub reservations: Vec<Reservation>,
    pub donations: Vec<MoneyDonation>,
    pub summary: DashboardSummary,
}

impl ExportDocument {
    /// Attachment filename for the export taken on the given day.
    pub fn filename(date: NaiveDate) -> String {
        format!("birthday-wishlist-data-{}.json", date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reservation::SelectedItem;

    fn reservation(email: &str, wine: bool, flowers: bool) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            celebrant_id: Uuid::nil(),
            guest_name: "Guest".to_string(),
            guest_email: email.to_string(),
            guest_phone: None,
            message: None,
            selected_items: vec![SelectedItem {
                id: Uuid::new_v4(),
                title: "Book".to_string(),
            }],
            include_wine: wine,
            include_flowers: flowers,
            created_at: Utc::now(),
        }
    }

    fn donation(email: &str, minor: i64, currency: &str, transfer: TransferType) -> MoneyDonation {
        MoneyDonation {
            id: Uuid::new_v4(),
            celebrant_id: Uuid::nil(),
            guest_name: "Guest".to_string(),
            guest_email: email.to_string(),
            guest_phone: None,
            message: None,
            amount_minor: minor,
            currency: currency.to_string(),
            transfer_type: transfer,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compute_summary() {
        let reservations = vec![
            reservation("a@example.com", true, false),
            reservation("B@example.com", true, true),
        ];
        let donations = vec![
            donation("b@example.com", 5000, "USD", TransferType::Belarus),
            donation("c@example.com", 2550, "USD", TransferType::International),
            donation("d@example.com", 10000, "BYN", TransferType::Belarus),
        ];
        let now = Utc::now();
        let items = vec![WishlistItem {
            id: Uuid::new_v4(),
            celebrant_id: Uuid::nil(),
            title: "Camera".to_string(),
            description: String::new(),
            image: None,
            category: None,
            quantity: 1,
            reserved: 2,
            created_at: now,
            updated_at: now,
        }];

        let summary = DashboardSummary::compute(&reservations, &donations, &items);

        assert_eq!(summary.total_reservations, 2);
        assert_eq!(summary.total_donations, 3);
        assert_eq!(summary.total_guests, 4);
        assert_eq!(summary.wine_add_ons, 2);
        assert_eq!(summary.flower_add_ons, 1);
        assert_eq!(summary.transfer_types.belarus, 2);
        assert_eq!(summary.transfer_types.international, 1);
        assert_eq!(
            summary.donation_totals,
            vec![
                CurrencyTotal {
                    currency: "BYN".to_string(),
                    amount: 100.0,
                    count: 1
                },
                CurrencyTotal {
                    currency: "USD".to_string(),
                    amount: 75.5,
                    count: 2
                },
            ]
        );
        assert_eq!(summary.items[0].reserved, 2);
        assert_eq!(summary.items[0].available, 1);
    }

    #[test]
    fn test_compute_empty() {
        let summary = DashboardSummary::compute(&[], &[], &[]);
        assert_eq!(summary.total_reservations, 0);
        assert_eq!(summary.total_guests, 0);
        assert!(summary.donation_totals.is_empty());
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(
            ExportDocument::filename(date),
            "birthday-wishlist-data-2025-03-07.json"
        );
    }
}
