use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParkGuide {
    pub guide_id: i32,
    pub user_id: i32,
    pub assigned_park_id: Option<i32>,
    pub requested_park_id: Option<i32>,
    pub certification_status: GuideCertificationStatus,
    pub license_expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "guide_certification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GuideCertificationStatus {
    NotApplicable,
    Pending,
    Certified,
    Expired,
}

#[derive(Debug, Deserialize)]
pub struct CreateParkGuideRequest {
    pub user_id: i32,
    pub assigned_park_id: Option<i32>,
    pub certification_status: Option<GuideCertificationStatus>,
    pub license_expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateParkGuideRequest {
    pub assigned_park_id: Option<i32>,
    pub certification_status: Option<GuideCertificationStatus>,
    pub license_expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct LicenseApprovalRequest {
    pub requested_park_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct CertificationDecisionRequest {
    pub decision: CertificationDecision,
}

/// Guide row joined with user names and the assigned park, for profile views.
#[derive(Debug, Serialize, FromRow)]
pub struct GuideProfileResponse {
    pub guide_id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub certification_status: GuideCertificationStatus,
    pub license_expiry_date: Option<NaiveDate>,
    pub assigned_park_id: Option<i32>,
    pub assigned_park_name: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct PendingCertificationRow {
    pub guide_id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub certification_status: GuideCertificationStatus,
    pub requested_park_id: Option<i32>,
    pub requested_park_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    pub eligible: bool,
    pub certification_status: GuideCertificationStatus,
    pub compulsory_certifications: i64,
    pub required_certifications: i64,
}
