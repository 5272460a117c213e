mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::env;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    handlers::{
        admin, auth, certifications, feedback, info_docs, notifications, park_guides, parks,
        payments, plants, progress, quizzes, training_modules, users,
    },
    middleware::auth::auth_middleware,
    utils::database::create_pool,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_secret: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "park_guide_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let db = create_pool(&database_url).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    let state = AppState { db, jwt_secret };

    let cors_origin =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let cors = if cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(axum::http::header::HeaderValue::from_static("*"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        CorsLayer::new()
            .allow_origin(cors_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    };

    let protected_routes = Router::new()
        .route("/api/users", get(users::get_users))
        .route("/api/users/profile", get(auth::get_profile))
        .route("/api/users/profile", put(auth::update_profile))
        .route("/api/users/:id", get(users::get_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route("/api/users/:id/status", put(users::update_user_status))
        .route("/api/park-guides", get(park_guides::get_park_guides))
        .route("/api/park-guides", post(park_guides::create_park_guide))
        .route("/api/park-guides/me", get(park_guides::get_own_guide_profile))
        .route(
            "/api/park-guides/me/license-eligibility",
            get(park_guides::get_license_eligibility),
        )
        .route(
            "/api/park-guides/pending-certifications",
            get(park_guides::get_pending_certifications),
        )
        .route(
            "/api/park-guides/license-approval-request",
            post(park_guides::request_license_approval),
        )
        .route("/api/park-guides/:id", get(park_guides::get_park_guide))
        .route("/api/park-guides/:id", put(park_guides::update_park_guide))
        .route("/api/park-guides/:id", delete(park_guides::delete_park_guide))
        .route(
            "/api/park-guides/:id/certification",
            put(park_guides::decide_certification),
        )
        .route(
            "/api/training-modules",
            post(training_modules::create_training_module),
        )
        .route(
            "/api/training-modules/:id",
            put(training_modules::update_training_module),
        )
        .route(
            "/api/training-modules/:id",
            delete(training_modules::delete_training_module),
        )
        .route(
            "/api/training-modules/:id/enroll",
            post(training_modules::enroll_free_module),
        )
        .route(
            "/api/training-modules/:id/access",
            get(training_modules::check_module_access),
        )
        .route(
            "/api/training-modules/:id/purchase-status",
            get(training_modules::check_purchase_status),
        )
        .route("/api/training-modules/:id/quiz", get(quizzes::get_module_quiz))
        .route("/api/quiz-completions", post(quizzes::submit_quiz_completion))
        .route("/api/quiz-completions", get(quizzes::get_quiz_completions))
        .route("/api/guide-training-progress", get(progress::get_all_progress))
        .route("/api/guide-training-progress", post(progress::record_progress))
        .route(
            "/api/guide-training-progress/me",
            get(progress::get_own_progress),
        )
        .route("/api/guide-training-progress/:id", get(progress::get_progress))
        .route(
            "/api/guide-training-progress/:id",
            put(progress::update_progress),
        )
        .route(
            "/api/guide-training-progress/:id",
            delete(progress::delete_progress),
        )
        .route("/api/certifications", get(certifications::get_certifications))
        .route(
            "/api/certifications",
            post(certifications::create_certification),
        )
        .route(
            "/api/certifications/user/:guide_id",
            get(certifications::get_guide_certifications),
        )
        .route("/api/certifications/:id", get(certifications::get_certification))
        .route(
            "/api/certifications/:id",
            delete(certifications::delete_certification),
        )
        .route(
            "/api/payment-transactions",
            get(payments::get_payment_transactions),
        )
        .route(
            "/api/payment-transactions",
            post(payments::create_payment_transaction),
        )
        .route(
            "/api/payment-transactions/history",
            get(payments::get_own_payment_history),
        )
        .route(
            "/api/payment-transactions/:id",
            get(payments::get_payment_transaction),
        )
        .route(
            "/api/payment-transactions/:id",
            put(payments::update_payment_status),
        )
        .route(
            "/api/payment-transactions/:id",
            delete(payments::delete_payment_transaction),
        )
        .route("/api/visitor-feedback", get(feedback::get_all_feedback))
        .route("/api/visitor-feedback/:id", get(feedback::get_feedback))
        .route("/api/visitor-feedback/:id", put(feedback::update_feedback))
        .route("/api/visitor-feedback/:id", delete(feedback::delete_feedback))
        .route(
            "/api/ratings/park-guide/self",
            get(feedback::get_own_rating_summary),
        )
        .route(
            "/api/ratings/park-guide/self/comments",
            get(feedback::get_own_rating_comments),
        )
        .route("/api/parks", post(parks::create_park))
        .route("/api/parks/:id", put(parks::update_park))
        .route("/api/parks/:id", delete(parks::delete_park))
        .route("/api/plants", post(plants::create_plant))
        .route("/api/plants/:id", put(plants::update_plant))
        .route("/api/plants/:id", delete(plants::delete_plant))
        .route("/api/info-docs", post(info_docs::create_info_doc))
        .route("/api/info-docs/:id", put(info_docs::update_info_doc))
        .route("/api/info-docs/:id", delete(info_docs::delete_info_doc))
        .route("/api/admin/analytics", get(admin::get_analytics))
        .route(
            "/api/admin/notifications/trigger",
            post(notifications::trigger_notifications),
        )
        .route(
            "/api/notifications/expiring",
            get(notifications::get_expiring_certifications),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/users/register", post(auth::register))
        .route("/api/users/login", post(auth::login))
        .route("/api/visitor-feedback", post(feedback::submit_feedback))
        .route(
            "/api/training-modules",
            get(training_modules::get_training_modules),
        )
        .route(
            "/api/training-modules/:id",
            get(training_modules::get_training_module),
        )
        .route("/api/parks", get(parks::get_parks))
        .route("/api/parks/:id", get(parks::get_park))
        .route("/api/plants", get(plants::get_plants))
        .route("/api/plants/:id", get(plants::get_plant))
        .route("/api/info-docs", get(info_docs::get_info_docs))
        .route("/api/info-docs/:id", get(info_docs::get_info_doc))
        .merge(protected_routes)
        .layer(cors)
        .with_state(state.clone());

    // Start the daily expiry-reminder scheduler
    let reminder_db = state.db.clone();
    tokio::spawn(async move {
        use crate::services::notification::NotificationService;
        use tokio_cron_scheduler::{Job, JobScheduler};

        let sched = JobScheduler::new()
            .await
            .expect("Failed to create scheduler");

        // Run reminders daily at 8 AM
        let job = Job::new_async("0 0 8 * * *", move |_uuid, _l| {
            let db = reminder_db.clone();
            Box::pin(async move {
                let notification_service = NotificationService::new(db);
                if let Err(e) = notification_service.process_expiry_reminders().await {
                    tracing::error!("Failed to process expiry reminders: {}", e);
                } else {
                    tracing::info!("Daily expiry reminders processed successfully");
                }
            })
        })
        .expect("Failed to create reminder job");

        sched.add(job).await.expect("Failed to add job");
        sched.start().await.expect("Failed to start scheduler");

        tracing::info!("Expiry reminder scheduler started - running daily at 8 AM");

        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
