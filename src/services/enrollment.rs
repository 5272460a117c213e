use sqlx::PgPool;

use crate::models::{
    payment::PaymentStatus,
    progress::ProgressStatus,
    purchase::{PurchaseStatus, PurchaseWithPaymentRow},
    training_module::TrainingModule,
};

/// Outcome of the module access check, mirroring the reasons the clients
/// branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAccess {
    FreeModule,
    Completed,
    Purchased,
    NotPurchased,
    PaymentPending,
    AccessRevoked,
}

impl ModuleAccess {
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            ModuleAccess::FreeModule | ModuleAccess::Completed | ModuleAccess::Purchased
        )
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ModuleAccess::FreeModule => "free_module",
            ModuleAccess::Completed => "completed",
            ModuleAccess::Purchased => "purchased",
            ModuleAccess::NotPurchased => "not_purchased",
            ModuleAccess::PaymentPending => "payment_pending",
            ModuleAccess::AccessRevoked => "access_revoked",
        }
    }
}

#[derive(Debug)]
pub struct EnrollmentService {
    pool: PgPool,
}

impl EnrollmentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn latest_purchase(
        &self,
        user_id: i32,
        module_id: i32,
    ) -> Result<Option<PurchaseWithPaymentRow>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseWithPaymentRow>(
            r#"
            SELECT mp.purchase_id, mp.status, mp.is_active, mp.purchase_date,
                   pt.payment_id, pt.payment_status
            FROM module_purchases mp
            JOIN payment_transactions pt ON mp.payment_id = pt.payment_id
            WHERE mp.user_id = $1 AND mp.module_id = $2 AND mp.is_active = TRUE
            ORDER BY mp.purchase_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Whether the user owns the module: an active purchase whose payment has
    /// been approved. Free enrollments satisfy this through their zero-amount
    /// approved transaction.
    pub async fn owns_module(&self, user_id: i32, module_id: i32) -> Result<bool, sqlx::Error> {
        let purchase = self.latest_purchase(user_id, module_id).await?;
        Ok(purchase.is_some_and(|p| {
            p.status == PurchaseStatus::Active && p.payment_status == PaymentStatus::Approved
        }))
    }

    pub async fn module_access(
        &self,
        user_id: i32,
        module: &TrainingModule,
    ) -> Result<ModuleAccess, sqlx::Error> {
        if module.is_free() {
            return Ok(ModuleAccess::FreeModule);
        }

        let Some(purchase) = self.latest_purchase(user_id, module.module_id).await? else {
            return Ok(ModuleAccess::NotPurchased);
        };

        // A completed module stays readable even if its payment record later
        // changes state.
        let completed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM guide_training_progress gtp
                JOIN park_guides pg ON pg.guide_id = gtp.guide_id
                WHERE pg.user_id = $1 AND gtp.module_id = $2 AND gtp.status = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(module.module_id)
        .bind(ProgressStatus::Completed)
        .fetch_one(&self.pool)
        .await?;

        if completed {
            return Ok(ModuleAccess::Completed);
        }

        if purchase.payment_status != PaymentStatus::Approved {
            return Ok(ModuleAccess::PaymentPending);
        }

        if purchase.status != PurchaseStatus::Active {
            return Ok(ModuleAccess::AccessRevoked);
        }

        Ok(ModuleAccess::Purchased)
    }

    /// Compulsory-module gate for purchases: true when every compulsory
    /// module in the catalog is owned by the user.
    pub async fn owns_all_compulsory(&self, user_id: i32) -> Result<bool, sqlx::Error> {
        let missing = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM training_modules tm
            WHERE tm.is_compulsory = TRUE
            AND NOT EXISTS (
                SELECT 1
                FROM module_purchases mp
                JOIN payment_transactions pt ON mp.payment_id = pt.payment_id
                WHERE mp.user_id = $1
                  AND mp.module_id = tm.module_id
                  AND mp.is_active = TRUE
                  AND mp.status = 'active'
                  AND pt.payment_status = 'approved'
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(missing == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_reasons_match_client_contract() {
        assert_eq!(ModuleAccess::FreeModule.reason(), "free_module");
        assert_eq!(ModuleAccess::NotPurchased.reason(), "not_purchased");
        assert_eq!(ModuleAccess::PaymentPending.reason(), "payment_pending");
        assert_eq!(ModuleAccess::AccessRevoked.reason(), "access_revoked");
    }

    #[test]
    fn only_free_completed_and_purchased_grant_access() {
        assert!(ModuleAccess::FreeModule.has_access());
        assert!(ModuleAccess::Completed.has_access());
        assert!(ModuleAccess::Purchased.has_access());
        assert!(!ModuleAccess::NotPurchased.has_access());
        assert!(!ModuleAccess::PaymentPending.has_access());
        assert!(!ModuleAccess::AccessRevoked.has_access());
    }
}
