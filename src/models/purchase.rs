use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::payment::PaymentStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModulePurchase {
    pub purchase_id: i32,
    pub user_id: i32,
    pub module_id: i32,
    pub payment_id: i32,
    pub status: PurchaseStatus,
    pub is_active: bool,
    pub purchase_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Active,
    Revoked,
}

/// Latest purchase joined with its payment, as consulted by the access and
/// purchase-status checks.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PurchaseWithPaymentRow {
    pub purchase_id: i32,
    pub status: PurchaseStatus,
    pub is_active: bool,
    pub purchase_date: DateTime<Utc>,
    pub payment_id: i32,
    pub payment_status: PaymentStatus,
}
