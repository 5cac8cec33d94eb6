use crate::{
    db::DbPool,
    entities::{category, Category},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; only present fields are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self), fields(category_id = category_id))]
    pub async fn get(&self, category_id: i32) -> Result<category::Model, ServiceError> {
        Category::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<category::Model, ServiceError> {
        input.validate()?;

        let created = category::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = created.id, "Category created");
        Ok(created)
    }

    #[instrument(skip(self, patch), fields(category_id = category_id))]
    pub async fn update(
        &self,
        category_id: i32,
        patch: CategoryPatch,
    ) -> Result<category::Model, ServiceError> {
        if patch.name.is_none() && patch.description.is_none() {
            return Err(ServiceError::ValidationError(
                "no fields provided to update".to_string(),
            ));
        }

        let existing = self.get(category_id).await?;

        let mut active: category::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self), fields(category_id = category_id))]
    pub async fn delete(&self, category_id: i32) -> Result<(), ServiceError> {
        let result = Category::delete_by_id(category_id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }

        info!(category_id, "Category deleted");
        Ok(())
    }
}
