use crate::{
    db::DbPool,
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update. Every field is optional; only the fields present are
/// applied, in a single update statement.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatch {
    pub category_id: Option<Option<i32>>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub image_url: Option<Option<String>>,
    pub active: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.image_url.is_none()
            && self.active.is_none()
    }
}

/// Catalog management. Writes here never touch stock held by open orders;
/// `set_stock` is an absolute administrative override.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Lists products, optionally filtered on the active flag, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<product::Model>, ServiceError> {
        let mut query = Product::find().order_by_desc(product::Column::CreatedAt);
        if let Some(active) = active {
            query = query.filter(product::Column::Active.eq(active));
        }

        Ok(query.all(&*self.db).await?)
    }

    /// Case-insensitive substring search over name and description, active
    /// products only.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<product::Model>, ServiceError> {
        if term.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "search term must not be empty".to_string(),
            ));
        }

        let matches = Product::find()
            .filter(product::Column::Active.eq(true))
            .filter(
                Condition::any()
                    .add(product::Column::Name.contains(term))
                    .add(product::Column::Description.contains(term)),
            )
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(matches)
    }

    /// Active products within a category, sorted by name.
    #[instrument(skip(self), fields(category_id = category_id))]
    pub async fn list_by_category(
        &self,
        category_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let products = Product::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .filter(product::Column::Active.eq(true))
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = product_id))]
    pub async fn get(&self, product_id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProductInput) -> Result<product::Model, ServiceError> {
        input.validate()?;

        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let created = product::ActiveModel {
            category_id: Set(input.category_id),
            name: Set(input.name),
            description: Set(input.description),
            price: Set(input.price.round_dp(2)),
            stock: Set(input.stock),
            image_url: Set(input.image_url),
            active: Set(input.active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = created.id, "Product created");

        if let Err(e) = self
            .event_sender
            .send(Event::ProductCreated {
                product_id: created.id,
            })
            .await
        {
            warn!(error = %e, "Failed to send product created event");
        }

        Ok(created)
    }

    /// Applies a partial update field-by-field.
    #[instrument(skip(self, patch), fields(product_id = product_id))]
    pub async fn update(
        &self,
        product_id: i32,
        patch: ProductPatch,
    ) -> Result<product::Model, ServiceError> {
        if patch.is_empty() {
            return Err(ServiceError::ValidationError(
                "no fields provided to update".to_string(),
            ));
        }

        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must not be negative".to_string(),
                ));
            }
        }
        if let Some(stock) = patch.stock {
            if stock < 0 {
                return Err(ServiceError::ValidationError(
                    "stock must not be negative".to_string(),
                ));
            }
        }

        let existing = self.get(product_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(category_id) = patch.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(price) = patch.price {
            active.price = Set(price.round_dp(2));
        }
        if let Some(stock) = patch.stock {
            active.stock = Set(stock);
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(active_flag) = patch.active {
            active.active = Set(active_flag);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        info!(product_id, "Product updated");

        if let Err(e) = self
            .event_sender
            .send(Event::ProductUpdated { product_id })
            .await
        {
            warn!(error = %e, "Failed to send product updated event");
        }

        Ok(updated)
    }

    /// Absolute stock override, for administrative corrections.
    #[instrument(skip(self), fields(product_id = product_id, stock = stock))]
    pub async fn set_stock(
        &self,
        product_id: i32,
        stock: i32,
    ) -> Result<product::Model, ServiceError> {
        if stock < 0 {
            return Err(ServiceError::ValidationError(
                "stock must not be negative".to_string(),
            ));
        }

        let existing = self.get(product_id).await?;

        let mut active: product::ActiveModel = existing.into();
        active.stock = Set(stock);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::StockAdjusted {
                product_id,
                new_stock: stock,
            })
            .await
        {
            warn!(error = %e, "Failed to send stock adjusted event");
        }

        Ok(updated)
    }

    #[instrument(skip(self), fields(product_id = product_id))]
    pub async fn delete(&self, product_id: i32) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(product_id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        info!(product_id, "Product deleted");

        if let Err(e) = self
            .event_sender
            .send(Event::ProductDeleted { product_id })
            .await
        {
            warn!(error = %e, "Failed to send product deleted event");
        }

        Ok(())
    }
}
