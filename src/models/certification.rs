use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certification {
    pub cert_id: i32,
    pub guide_id: i32,
    pub module_id: i32,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CreateCertificationRequest {
    pub guide_id: i32,
    pub module_id: i32,
    pub issued_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
}

/// Certification joined with its module, as rendered on certificate pages.
#[derive(Debug, Serialize, FromRow)]
pub struct CertificationWithModuleRow {
    pub cert_id: i32,
    pub guide_id: i32,
    pub module_id: i32,
    pub module_name: String,
    pub is_compulsory: bool,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
}
