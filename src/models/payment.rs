use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub payment_id: i32,
    pub user_id: i32,
    pub module_id: Option<i32>,
    pub payment_purpose: String,
    pub payment_method: PaymentMethod,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub card_last_four: Option<String>,
    pub transaction_reference: Uuid,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Ewallet,
}

impl PaymentMethod {
    pub fn requires_card(&self) -> bool {
        matches!(self, PaymentMethod::CreditCard | PaymentMethod::DebitCard)
    }
}

fn card_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{16}$").unwrap())
}

fn expiry_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").unwrap())
}

fn cvv_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3,4}$").unwrap())
}

fn validate_card_number(value: &str) -> Result<(), ValidationError> {
    if card_number_regex().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number_format"))
    }
}

fn validate_expiry(value: &str) -> Result<(), ValidationError> {
    if expiry_regex().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("expiry_format"))
    }
}

fn validate_cvv(value: &str) -> Result<(), ValidationError> {
    if cvv_regex().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("cvv_format"))
    }
}

/// Simulated card details. Format checks only; nothing beyond the last four
/// digits is ever stored.
#[derive(Debug, Deserialize, Validate)]
pub struct CardDetails {
    #[validate(custom = "validate_card_number")]
    pub card_number: String,
    #[validate(custom = "validate_expiry")]
    pub expiry: String,
    #[validate(custom = "validate_cvv")]
    pub cvv: String,
    #[validate(length(min = 1, message = "Billing name is required"))]
    pub billing_name: String,
    #[validate(length(min = 1, message = "Billing address is required"))]
    pub billing_address: String,
}

impl CardDetails {
    pub fn last_four(&self) -> String {
        let len = self.card_number.len();
        self.card_number[len.saturating_sub(4)..].to_string()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseModuleRequest {
    pub module_id: i32,
    pub payment_method: PaymentMethod,
    #[validate]
    pub card: Option<CardDetails>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: i32,
    pub user_id: i32,
    pub module_id: Option<i32>,
    pub payment_purpose: String,
    pub payment_method: PaymentMethod,
    pub amount_paid: Decimal,
    pub payment_status: PaymentStatus,
    pub card_last_four: Option<String>,
    pub transaction_reference: Uuid,
    pub transaction_date: DateTime<Utc>,
}

impl From<PaymentTransaction> for PaymentResponse {
    fn from(tx: PaymentTransaction) -> Self {
        Self {
            payment_id: tx.payment_id,
            user_id: tx.user_id,
            module_id: tx.module_id,
            payment_purpose: tx.payment_purpose,
            payment_method: tx.payment_method,
            amount_paid: tx.amount_paid,
            payment_status: tx.payment_status,
            card_last_four: tx.card_last_four,
            transaction_reference: tx.transaction_reference,
            transaction_date: tx.transaction_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str, cvv: &str, name: &str, address: &str) -> CardDetails {
        CardDetails {
            card_number: number.to_string(),
            expiry: expiry.to_string(),
            cvv: cvv.to_string(),
            billing_name: name.to_string(),
            billing_address: address.to_string(),
        }
    }

    #[test]
    fn well_formed_card_passes() {
        let details = card("4111111111111111", "09/27", "123", "A. Guide", "Kuching");
        assert!(details.validate().is_ok());
        assert_eq!(details.last_four(), "1111");
    }

    #[test]
    fn four_digit_cvv_is_accepted() {
        let details = card("4111111111111111", "01/26", "1234", "A. Guide", "Kuching");
        assert!(details.validate().is_ok());
    }

    #[test]
    fn short_card_number_fails() {
        let details = card("411111111111111", "09/27", "123", "A. Guide", "Kuching");
        assert!(details.validate().is_err());
    }

    #[test]
    fn non_numeric_card_number_fails() {
        let details = card("4111-1111-1111-1111", "09/27", "123", "A. Guide", "Kuching");
        assert!(details.validate().is_err());
    }

    #[test]
    fn invalid_expiry_month_fails() {
        let details = card("4111111111111111", "13/27", "123", "A. Guide", "Kuching");
        assert!(details.validate().is_err());
    }

    #[test]
    fn two_digit_cvv_fails() {
        let details = card("4111111111111111", "09/27", "12", "A. Guide", "Kuching");
        assert!(details.validate().is_err());
    }

    #[test]
    fn empty_billing_fields_fail() {
        let details = card("4111111111111111", "09/27", "123", "", "");
        assert!(details.validate().is_err());
    }

    #[test]
    fn card_methods_require_card_details() {
        assert!(PaymentMethod::CreditCard.requires_card());
        assert!(PaymentMethod::DebitCard.requires_card());
        assert!(!PaymentMethod::Ewallet.requires_card());
    }
}
