use crate::{
    db::DbPool,
    entities::{cart_item, product, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Cart line joined with the current product state. `subtotal` uses the
/// product's current price; prices are only snapshotted at order time.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub stock: i32,
    pub active: bool,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub items_count: usize,
}

/// Cart maintenance. The stock checks here are advisory, keeping obviously
/// unfillable carts out of the system; the authoritative check is the
/// conditional decrement performed at order time.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl CartService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Returns the user's cart joined with product data, newest line first.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn get_cart(&self, user_id: i32) -> Result<CartView, ServiceError> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_desc(cart_item::Column::AddedAt)
            .find_also_related(Product)
            .all(&*self.db)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for (item, prod) in rows {
            // A cart row without a product means the product was deleted;
            // drop it from the view.
            let Some(prod) = prod else { continue };
            let subtotal = (prod.price * Decimal::from(item.quantity)).round_dp(2);
            items.push(CartLine {
                id: item.id,
                product_id: prod.id,
                product_name: prod.name,
                quantity: item.quantity,
                unit_price: prod.price,
                subtotal,
                stock: prod.stock,
                active: prod.active,
                image_url: prod.image_url,
            });
        }

        let total = items
            .iter()
            .map(|line| line.subtotal)
            .sum::<Decimal>()
            .round_dp(2);

        Ok(CartView {
            items_count: items.len(),
            items,
            total,
        })
    }

    /// Adds a product to the cart. An existing line for the same product
    /// accumulates quantity; the combined quantity must be coverable by the
    /// current stock.
    #[instrument(skip(self), fields(user_id = user_id, product_id = product_id))]
    pub async fn add_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<cart_item::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let prod = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if !prod.active {
            return Err(ServiceError::ValidationError(format!(
                "Product \"{}\" is not available",
                prod.name
            )));
        }

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?;

        let requested = quantity + existing.as_ref().map(|item| item.quantity).unwrap_or(0);
        if prod.stock < requested {
            return Err(ServiceError::InsufficientStock {
                product_id: prod.id,
                name: prod.name,
                available: prod.stock,
                requested,
            });
        }

        let saved = match existing {
            Some(item) => {
                let mut active: cart_item::ActiveModel = item.into();
                active.quantity = Set(requested);
                active.update(&*self.db).await?
            }
            None => {
                cart_item::ActiveModel {
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    added_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(&*self.db)
                .await?
            }
        };

        info!(quantity = saved.quantity, "Cart line saved");
        Ok(saved)
    }

    /// Sets the quantity of an existing cart line.
    #[instrument(skip(self), fields(user_id = user_id, product_id = product_id))]
    pub async fn update_quantity(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<cart_item::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be greater than zero".to_string(),
            ));
        }

        let prod = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if prod.stock < quantity {
            return Err(ServiceError::InsufficientStock {
                product_id: prod.id,
                name: prod.name,
                available: prod.stock,
                requested: quantity,
            });
        }

        let item = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not in cart", product_id))
            })?;

        let mut active: cart_item::ActiveModel = item.into();
        active.quantity = Set(quantity);
        Ok(active.update(&*self.db).await?)
    }

    /// Removes one product from the cart.
    #[instrument(skip(self), fields(user_id = user_id, product_id = product_id))]
    pub async fn remove_item(&self, user_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not in cart",
                product_id
            )));
        }

        Ok(())
    }

    /// Empties the user's cart. Returns the number of removed lines.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn clear_cart(&self, user_id: i32) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        info!(items_deleted = result.rows_affected, "Cart cleared");

        if let Err(e) = self.event_sender.send(Event::CartCleared { user_id }).await {
            warn!(error = %e, user_id, "Failed to send cart cleared event");
        }

        Ok(result.rows_affected)
    }
}
