use std::collections::HashMap;
use std::time::Instant;

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::handlers::admin::*;
use crate::utils::logger::LOGGER;

#[derive(Debug)]
pub struct AnalyticsService {
    pool: PgPool,
}

#[derive(Debug)]
pub enum AnalyticsError {
    DatabaseError(String),
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_dashboard_analytics(&self) -> Result<AnalyticsResponse, AnalyticsError> {
        let start_time = Instant::now();

        LOGGER.log_business_event("analytics_request_started", None, HashMap::new());

        let results = tokio::try_join!(
            self.get_user_counts(),
            self.get_guide_status_breakdown(),
            self.get_module_stats(),
            self.get_payment_stats(),
            self.get_certification_stats(),
            self.get_rating_averages(),
            self.get_top_rated_guides()
        );

        let duration = start_time.elapsed();
        LOGGER.log_database_query("dashboard_analytics", duration.as_millis(), None);

        match results {
            Ok((
                (total_users, pending_user_approvals, total_guides),
                guide_status_breakdown,
                module_stats,
                payment_stats,
                certification_stats,
                rating_averages,
                top_rated_guides,
            )) => Ok(AnalyticsResponse {
                total_users,
                pending_user_approvals,
                total_guides,
                guide_status_breakdown,
                module_stats,
                payment_stats,
                certification_stats,
                rating_averages,
                top_rated_guides,
            }),
            Err(e) => Err(AnalyticsError::DatabaseError(e.to_string())),
        }
    }

    async fn get_user_counts(&self) -> Result<(i64, i64, i64), sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM users) as total_users,
                (SELECT COUNT(*) FROM users WHERE status = 'pending') as pending_approvals,
                (SELECT COUNT(*) FROM park_guides) as total_guides",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((row.get(0), row.get(1), row.get(2)))
    }

    async fn get_guide_status_breakdown(&self) -> Result<HashMap<String, i64>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT certification_status::text, COUNT(*) as count
             FROM park_guides
             GROUP BY certification_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut breakdown = HashMap::new();
        for row in rows {
            let status: String = row.get(0);
            let count: i64 = row.get(1);
            breakdown.insert(status, count);
        }
        Ok(breakdown)
    }

    async fn get_module_stats(&self) -> Result<ModuleStats, sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM training_modules) as total_modules,
                (SELECT COUNT(*) FROM training_modules WHERE is_compulsory = TRUE) as compulsory,
                (SELECT COUNT(*) FROM module_purchases WHERE is_active = TRUE AND status = 'active') as purchases",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ModuleStats {
            total_modules: row.get(0),
            compulsory_modules: row.get(1),
            active_purchases: row.get(2),
        })
    }

    async fn get_payment_stats(&self) -> Result<PaymentStats, sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) FILTER (WHERE payment_status = 'pending') as pending,
                COUNT(*) FILTER (WHERE payment_status = 'approved') as approved,
                COUNT(*) FILTER (WHERE payment_status = 'rejected') as rejected,
                COALESCE(SUM(amount_paid) FILTER (WHERE payment_status = 'approved'), 0) as revenue
             FROM payment_transactions",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(PaymentStats {
            pending: row.get(0),
            approved: row.get(1),
            rejected: row.get(2),
            approved_revenue: row.get::<Decimal, _>(3),
        })
    }

    async fn get_certification_stats(&self) -> Result<CertificationStats, sqlx::Error> {
        let counts = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM certifications) as total,
                (SELECT COUNT(*) FROM certifications
                 WHERE expiry_date BETWEEN CURRENT_DATE AND CURRENT_DATE + 30) as expiring",
        )
        .fetch_one(&self.pool)
        .await?;

        let monthly_rows = sqlx::query(
            "SELECT TO_CHAR(DATE_TRUNC('month', issued_date), 'YYYY-MM') as month,
                    COUNT(*) as count
             FROM certifications
             WHERE issued_date >= CURRENT_DATE - 365
             GROUP BY DATE_TRUNC('month', issued_date)
             ORDER BY DATE_TRUNC('month', issued_date)",
        )
        .fetch_all(&self.pool)
        .await?;

        let issued_per_month = monthly_rows
            .iter()
            .map(|row| MonthlyIssued {
                month: row.get(0),
                count: row.get(1),
            })
            .collect();

        Ok(CertificationStats {
            total_issued: counts.get(0),
            expiring_within_30_days: counts.get(1),
            issued_per_month,
        })
    }

    async fn get_rating_averages(&self) -> Result<RatingAverages, sqlx::Error> {
        let row = sqlx::query(
            "SELECT
                ROUND(AVG(language_rating), 1)::float8 as language,
                ROUND(AVG(knowledge_rating), 1)::float8 as knowledge,
                ROUND(AVG(organization_rating), 1)::float8 as organization,
                ROUND(AVG(engagement_rating), 1)::float8 as engagement,
                ROUND(AVG(safety_rating), 1)::float8 as safety
             FROM visitor_feedback",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingAverages {
            language: row.get(0),
            knowledge: row.get(1),
            organization: row.get(2),
            engagement: row.get(3),
            safety: row.get(4),
        })
    }

    async fn get_top_rated_guides(&self) -> Result<Vec<GuideRatingRow>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT vf.guide_id,
                    u.first_name || ' ' || u.last_name as guide_name,
                    ROUND(AVG((vf.language_rating + vf.knowledge_rating + vf.organization_rating
                               + vf.engagement_rating + vf.safety_rating) / 5.0), 2)::float8 as average_rating,
                    COUNT(*) as feedback_count
             FROM visitor_feedback vf
             JOIN park_guides pg ON vf.guide_id = pg.guide_id
             JOIN users u ON pg.user_id = u.user_id
             GROUP BY vf.guide_id, u.first_name, u.last_name
             ORDER BY average_rating DESC, feedback_count DESC
             LIMIT 10",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| GuideRatingRow {
                guide_id: row.get(0),
                guide_name: row.get(1),
                average_rating: row.get(2),
                feedback_count: row.get(3),
            })
            .collect())
    }
}
