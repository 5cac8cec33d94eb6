use crate::{
    auth::AuthService,
    db::DbPool,
    entities::{
        user::{self, ROLE_CUSTOMER},
        User,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Profile without credentials, as returned over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            phone: model.phone,
            address: model.address,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub user: UserProfile,
    pub token: String,
}

/// Account registration, login and administrative user management.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    auth: AuthService,
    event_sender: EventSender,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, auth: AuthService, event_sender: EventSender) -> Self {
        Self {
            db,
            auth,
            event_sender,
        }
    }

    /// Creates an account and logs it in. Email must be unused.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthenticatedUser, ServiceError> {
        input.validate()?;

        let taken = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!(
                "email {} is already registered",
                input.email
            )));
        }

        let now = Utc::now();
        let created = user::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(self.auth.hash_password(&input.password)?),
            role: Set(ROLE_CUSTOMER.to_string()),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(user_id = created.id, "User registered");

        if let Err(e) = self
            .event_sender
            .send(Event::UserRegistered {
                user_id: created.id,
            })
            .await
        {
            warn!(error = %e, "Failed to send user registered event");
        }

        let token = self.auth.issue_token(&created)?;
        Ok(AuthenticatedUser {
            user: created.into(),
            token,
        })
    }

    /// Verifies credentials and issues a token. The same error is returned
    /// for an unknown email and a wrong password.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthenticatedUser, ServiceError> {
        input.validate()?;

        let user = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".to_string()))?;

        if !self.auth.verify_password(&input.password, &user.password_hash)? {
            return Err(ServiceError::Unauthorized("invalid credentials".to_string()));
        }

        let token = self.auth.issue_token(&user)?;
        info!(user_id = user.id, "User logged in");

        Ok(AuthenticatedUser {
            user: user.into(),
            token,
        })
    }

    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn get_profile(&self, user_id: i32) -> Result<UserProfile, ServiceError> {
        let user = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        Ok(user.into())
    }

    /// Every account, for administration.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = User::find()
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(users.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn delete(&self, user_id: i32) -> Result<(), ServiceError> {
        let result = User::delete_by_id(user_id).exec(&*self.db).await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "User {} not found",
                user_id
            )));
        }

        info!(user_id, "User deleted");
        Ok(())
    }
}
