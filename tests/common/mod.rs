use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use liquorstore_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db::{self, DbConfig},
    entities::{cart_item, product, user},
    events,
    handlers::AppServices,
    AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};

/// Test harness backed by an in-memory SQLite database with the embedded
/// migrations applied. The pool is capped at one connection so concurrent
/// transactions serialize the same way a contended row would.
pub struct TestApp {
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only".to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );

        let db_cfg = DbConfig {
            url: cfg.database_url.clone(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };

        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool).await.expect("failed to migrate");

        let db_arc = Arc::new(pool);
        let (event_sender, event_rx) = events::channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = AuthService::new(AuthConfig::new(
            cfg.jwt_secret.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        ));

        let services = AppServices::new(
            db_arc.clone(),
            event_sender.clone(),
            auth.clone(),
            Duration::from_secs(cfg.txn_timeout_secs),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            auth,
            services,
        };

        Self {
            state,
            _event_task: event_task,
        }
    }

    #[allow(dead_code)]
    pub async fn seed_user(&self, name: &str, email: &str) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            password_hash: Set("unused-in-seeded-tests".to_string()),
            role: Set("customer".to_string()),
            phone: Set(Some("555-0100".to_string())),
            address: Set(Some("1 Test Street".to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed user")
    }

    #[allow(dead_code)]
    pub async fn seed_product(
        &self,
        name: &str,
        price: Decimal,
        stock: i32,
        active: bool,
    ) -> product::Model {
        let now = Utc::now();
        product::ActiveModel {
            category_id: Set(None),
            name: Set(name.to_string()),
            description: Set(None),
            price: Set(price),
            stock: Set(stock),
            image_url: Set(None),
            active: Set(active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product")
    }

    #[allow(dead_code)]
    pub async fn seed_cart_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> cart_item::Model {
        cart_item::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            added_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed cart item")
    }
}
