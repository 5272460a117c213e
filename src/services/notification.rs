use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// Certification nearing its expiry date, joined with the guide's contact
/// details for the reminder.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpiringCertification {
    pub cert_id: i32,
    pub guide_id: i32,
    pub module_name: String,
    pub expiry_date: NaiveDate,
    pub email: String,
    pub first_name: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ExpiringLicense {
    pub guide_id: i32,
    pub license_expiry_date: NaiveDate,
    pub email: String,
    pub first_name: String,
}

pub struct NotificationService {
    pub db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_expiring_certifications(
        &self,
        days: i32,
    ) -> Result<Vec<ExpiringCertification>> {
        let results = sqlx::query_as::<_, ExpiringCertification>(
            r#"
            SELECT c.cert_id, c.guide_id, tm.module_name, c.expiry_date,
                   u.email, u.first_name
            FROM certifications c
            JOIN training_modules tm ON c.module_id = tm.module_id
            JOIN park_guides pg ON c.guide_id = pg.guide_id
            JOIN users u ON pg.user_id = u.user_id
            WHERE c.expiry_date BETWEEN CURRENT_DATE AND CURRENT_DATE + $1
            ORDER BY c.expiry_date ASC
            "#,
        )
        .bind(days)
        .fetch_all(&self.db)
        .await?;

        Ok(results)
    }

    pub async fn find_guide_expiring_certifications(
        &self,
        guide_id: i32,
        days: i32,
    ) -> Result<Vec<ExpiringCertification>> {
        let results = sqlx::query_as::<_, ExpiringCertification>(
            r#"
            SELECT c.cert_id, c.guide_id, tm.module_name, c.expiry_date,
                   u.email, u.first_name
            FROM certifications c
            JOIN training_modules tm ON c.module_id = tm.module_id
            JOIN park_guides pg ON c.guide_id = pg.guide_id
            JOIN users u ON pg.user_id = u.user_id
            WHERE c.guide_id = $1
              AND c.expiry_date BETWEEN CURRENT_DATE AND CURRENT_DATE + $2
            ORDER BY c.expiry_date ASC
            "#,
        )
        .bind(guide_id)
        .bind(days)
        .fetch_all(&self.db)
        .await?;

        Ok(results)
    }

    pub async fn find_expiring_licenses(&self, days: i32) -> Result<Vec<ExpiringLicense>> {
        let results = sqlx::query_as::<_, ExpiringLicense>(
            r#"
            SELECT pg.guide_id, pg.license_expiry_date, u.email, u.first_name
            FROM park_guides pg
            JOIN users u ON pg.user_id = u.user_id
            WHERE pg.certification_status = 'certified'
              AND pg.license_expiry_date IS NOT NULL
              AND pg.license_expiry_date BETWEEN CURRENT_DATE AND CURRENT_DATE + $1
            ORDER BY pg.license_expiry_date ASC
            "#,
        )
        .bind(days)
        .fetch_all(&self.db)
        .await?;

        Ok(results)
    }

    pub async fn send_reminder(
        &self,
        email: &str,
        certifications: &[ExpiringCertification],
    ) -> Result<()> {
        // Mail delivery lives behind an external service; here the reminder
        // is emitted as a structured log line.
        tracing::info!(
            "Reminder: guide {} has {} certification(s) expiring soon: {:?}",
            email,
            certifications.len(),
            certifications
                .iter()
                .map(|c| &c.module_name)
                .collect::<Vec<_>>()
        );

        Ok(())
    }

    pub async fn process_expiry_reminders(&self) -> Result<()> {
        self.process_expiry_reminders_with_days(30).await
    }

    pub async fn process_expiry_reminders_with_days(&self, days: i32) -> Result<()> {
        let expiring = self.find_expiring_certifications(days).await?;

        // Group expiring certifications by guide
        let mut per_guide: std::collections::HashMap<i32, Vec<ExpiringCertification>> =
            std::collections::HashMap::new();

        for cert in expiring {
            per_guide.entry(cert.guide_id).or_default().push(cert);
        }

        for (guide_id, certifications) in per_guide {
            let email = certifications[0].email.clone();
            if let Err(e) = self.send_reminder(&email, &certifications).await {
                tracing::error!(
                    "Failed to send expiry reminder to {} (guide {}): {}",
                    email,
                    guide_id,
                    e
                );
            }
        }

        for license in self.find_expiring_licenses(days).await? {
            tracing::info!(
                "Reminder: guide {} ({}) holds a license expiring on {}",
                license.guide_id,
                license.email,
                license.license_expiry_date
            );
        }

        Ok(())
    }
}
