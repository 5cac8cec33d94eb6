pub mod auth;
pub mod carts;
pub mod categories;
pub mod invoices;
pub mod orders;
pub mod products;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    CartService, CategoryService, InvoiceService, OrderService, ProductService, UserService,
};
use std::sync::Arc;
use std::time::Duration;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub carts: Arc<CartService>,
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
    pub invoices: Arc<InvoiceService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        auth: AuthService,
        txn_timeout: Duration,
    ) -> Self {
        Self {
            orders: Arc::new(OrderService::new(
                db.clone(),
                event_sender.clone(),
                txn_timeout,
            )),
            carts: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db.clone(), event_sender.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            invoices: Arc::new(InvoiceService::new(db.clone())),
            users: Arc::new(UserService::new(db, auth, event_sender)),
        }
    }
}
