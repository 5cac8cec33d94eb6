use crate::{
    db::DbPool,
    entities::{invoice, order, Invoice, Order},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// Invoice joined with the status of its order.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceWithOrder {
    pub invoice: invoice::Model,
    pub order_status: order::OrderStatus,
    pub order_user_id: i32,
}

/// Read-only access to issued invoices. Invoices are written exclusively by
/// the order transaction.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Invoices belonging to a user's orders, newest first.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<InvoiceWithOrder>, ServiceError> {
        let rows = Invoice::find()
            .find_also_related(Order)
            .order_by_desc(invoice::Column::IssuedAt)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(inv, ord)| {
                let ord = ord?;
                (ord.user_id == user_id).then(|| InvoiceWithOrder {
                    invoice: inv,
                    order_status: ord.status,
                    order_user_id: ord.user_id,
                })
            })
            .collect())
    }

    /// One invoice by id, with its order.
    #[instrument(skip(self), fields(invoice_id = invoice_id))]
    pub async fn get(&self, invoice_id: i32) -> Result<InvoiceWithOrder, ServiceError> {
        let (inv, ord) = Invoice::find_by_id(invoice_id)
            .find_also_related(Order)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;

        let ord = ord.ok_or_else(|| {
            ServiceError::NotFound(format!("Order for invoice {} not found", invoice_id))
        })?;

        Ok(InvoiceWithOrder {
            invoice: inv,
            order_status: ord.status,
            order_user_id: ord.user_id,
        })
    }

    /// The invoice issued for a given order.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn get_by_order(&self, order_id: i32) -> Result<InvoiceWithOrder, ServiceError> {
        let inv = Invoice::find()
            .filter(invoice::Column::OrderId.eq(order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No invoice found for order {}", order_id))
            })?;

        let ord = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        Ok(InvoiceWithOrder {
            invoice: inv,
            order_status: ord.status,
            order_user_id: ord.user_id,
        })
    }

    /// Every invoice in the system, newest first.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<InvoiceWithOrder>, ServiceError> {
        let rows = Invoice::find()
            .find_also_related(Order)
            .order_by_desc(invoice::Column::IssuedAt)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(inv, ord)| {
                let ord = ord?;
                Some(InvoiceWithOrder {
                    invoice: inv,
                    order_status: ord.status,
                    order_user_id: ord.user_id,
                })
            })
            .collect())
    }
}
