use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{
    certification::CertificationWithModuleRow,
    park_guide::{EligibilityResponse, GuideCertificationStatus, ParkGuide},
};

pub const REQUIRED_COMPULSORY_CERTIFICATIONS: i64 = 2;

/// Single source of truth for the official-license rule: a guide may request
/// a license only while their certification status is `not_applicable` and
/// they hold at least two unexpired compulsory-module certifications.
pub fn license_eligibility(
    status: GuideCertificationStatus,
    compulsory_certifications: i64,
) -> bool {
    matches!(status, GuideCertificationStatus::NotApplicable)
        && compulsory_certifications >= REQUIRED_COMPULSORY_CERTIFICATIONS
}

pub fn count_valid_compulsory(
    certifications: &[CertificationWithModuleRow],
    today: NaiveDate,
) -> i64 {
    certifications
        .iter()
        .filter(|cert| cert.is_compulsory && cert.expiry_date >= today)
        .count() as i64
}

#[derive(Debug)]
pub struct EligibilityService {
    pool: PgPool,
}

impl EligibilityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn guide_certifications(
        &self,
        guide_id: i32,
    ) -> Result<Vec<CertificationWithModuleRow>, sqlx::Error> {
        sqlx::query_as::<_, CertificationWithModuleRow>(
            r#"
            SELECT c.cert_id, c.guide_id, c.module_id, tm.module_name,
                   tm.is_compulsory, c.issued_date, c.expiry_date
            FROM certifications c
            JOIN training_modules tm ON c.module_id = tm.module_id
            WHERE c.guide_id = $1
            ORDER BY c.issued_date DESC
            "#,
        )
        .bind(guide_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn snapshot(&self, guide: &ParkGuide) -> Result<EligibilityResponse, sqlx::Error> {
        let certifications = self.guide_certifications(guide.guide_id).await?;
        let today = chrono::Utc::now().date_naive();
        let compulsory = count_valid_compulsory(&certifications, today);

        Ok(EligibilityResponse {
            eligible: license_eligibility(guide.certification_status, compulsory),
            certification_status: guide.certification_status,
            compulsory_certifications: compulsory,
            required_certifications: REQUIRED_COMPULSORY_CERTIFICATIONS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cert(module_id: i32, is_compulsory: bool, expiry: NaiveDate) -> CertificationWithModuleRow {
        CertificationWithModuleRow {
            cert_id: module_id,
            guide_id: 1,
            module_id,
            module_name: format!("Module {}", module_id),
            is_compulsory,
            issued_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            expiry_date: expiry,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn future() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn ineligible_below_two_compulsory_certs() {
        assert!(!license_eligibility(
            GuideCertificationStatus::NotApplicable,
            0
        ));
        assert!(!license_eligibility(
            GuideCertificationStatus::NotApplicable,
            1
        ));
    }

    #[test]
    fn eligible_at_two_or_more_compulsory_certs() {
        assert!(license_eligibility(
            GuideCertificationStatus::NotApplicable,
            2
        ));
        assert!(license_eligibility(
            GuideCertificationStatus::NotApplicable,
            3
        ));
    }

    #[test]
    fn only_not_applicable_status_is_eligible() {
        for status in [
            GuideCertificationStatus::Pending,
            GuideCertificationStatus::Certified,
            GuideCertificationStatus::Expired,
        ] {
            assert!(!license_eligibility(status, 5));
        }
    }

    #[test]
    fn non_compulsory_certs_do_not_count() {
        let certs = vec![
            cert(1, true, future()),
            cert(2, false, future()),
            cert(3, false, future()),
        ];
        assert_eq!(count_valid_compulsory(&certs, today()), 1);
    }

    #[test]
    fn expired_certs_do_not_count() {
        let expired = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let certs = vec![cert(1, true, expired), cert(2, true, future())];
        assert_eq!(count_valid_compulsory(&certs, today()), 1);
    }

    #[test]
    fn cert_expiring_today_still_counts() {
        let certs = vec![cert(1, true, today()), cert(2, true, today())];
        let count = count_valid_compulsory(&certs, today());
        assert_eq!(count, 2);
        assert!(license_eligibility(
            GuideCertificationStatus::NotApplicable,
            count
        ));
    }
}
