use crate::{
    db::{self, DbPool},
    entities::{
        cart_item, invoice,
        order::{self, OrderStatus},
        order_detail, product, CartItem, Invoice, Order, OrderDetail, Product, User,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Result of converting a cart into a committed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithInvoice {
    pub order: order::Model,
    pub details: Vec<order_detail::Model>,
    pub invoice: invoice::Model,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithDetails {
    pub order: order::Model,
    pub details: Vec<order_detail::Model>,
}

/// Converts carts into orders and back. All stock movement in the system
/// funnels through this service, inside a single transaction per operation.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    txn_timeout: Duration,
}

impl OrderService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, txn_timeout: Duration) -> Self {
        Self {
            db,
            event_sender,
            txn_timeout,
        }
    }

    /// Converts the user's cart into an order with line-item snapshots, an
    /// invoice, and decremented stock, atomically.
    ///
    /// Any failure rolls the whole transaction back: no partial stock
    /// mutation, no dangling order or invoice, cart untouched.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn create_order_from_cart(
        &self,
        user_id: i32,
    ) -> Result<OrderWithInvoice, ServiceError> {
        let db = self.db.clone();

        let (order, details, invoice) = db::with_txn_timeout(self.txn_timeout, async move {
            let txn = db.begin().await?;

            // Cart joined with products. Rows whose product vanished or was
            // deactivated are excluded from pricing.
            let rows: Vec<(cart_item::Model, Option<product::Model>)> = CartItem::find()
                .filter(cart_item::Column::UserId.eq(user_id))
                .find_also_related(Product)
                .all(&txn)
                .await?;

            let lines: Vec<(cart_item::Model, product::Model)> = rows
                .into_iter()
                .filter_map(|(item, prod)| match prod {
                    Some(p) if p.active => Some((item, p)),
                    _ => None,
                })
                .collect();

            if lines.is_empty() {
                return Err(ServiceError::EmptyCart);
            }

            // Verify every line before writing anything, so the caller is
            // told about the first shortage without side effects.
            for (item, prod) in &lines {
                if prod.stock < item.quantity {
                    return Err(ServiceError::InsufficientStock {
                        product_id: prod.id,
                        name: prod.name.clone(),
                        available: prod.stock,
                        requested: item.quantity,
                    });
                }
            }

            let total: Decimal = lines
                .iter()
                .map(|(item, prod)| prod.price * Decimal::from(item.quantity))
                .sum::<Decimal>()
                .round_dp(2);

            let now = Utc::now();

            let order = order::ActiveModel {
                user_id: Set(user_id),
                total: Set(total),
                status: Set(OrderStatus::Pending),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            let mut details = Vec::with_capacity(lines.len());
            for (item, prod) in &lines {
                let subtotal = (prod.price * Decimal::from(item.quantity)).round_dp(2);

                let detail = order_detail::ActiveModel {
                    order_id: Set(order.id),
                    product_id: Set(prod.id),
                    product_name: Set(prod.name.clone()),
                    quantity: Set(item.quantity),
                    unit_price: Set(prod.price),
                    subtotal: Set(subtotal),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                details.push(detail);

                // Decrement conditioned on the stock still being sufficient.
                // Zero affected rows means a concurrent order won the race
                // since our read above.
                let updated = Product::update_many()
                    .col_expr(
                        product::Column::Stock,
                        Expr::col(product::Column::Stock).sub(item.quantity),
                    )
                    .filter(product::Column::Id.eq(prod.id))
                    .filter(product::Column::Stock.gte(item.quantity))
                    .exec(&txn)
                    .await?;

                if updated.rows_affected == 0 {
                    let available = Product::find_by_id(prod.id)
                        .one(&txn)
                        .await?
                        .map(|p| p.stock)
                        .unwrap_or(0);
                    return Err(ServiceError::InsufficientStock {
                        product_id: prod.id,
                        name: prod.name.clone(),
                        available,
                        requested: item.quantity,
                    });
                }
            }

            let customer = User::find_by_id(user_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

            // Unique by construction: the order id is unique.
            let invoice_number = format!("INV-{}-{:06}", order.created_at.year(), order.id);

            let invoice = invoice::ActiveModel {
                order_id: Set(order.id),
                invoice_number: Set(invoice_number),
                customer_name: Set(customer.name),
                customer_email: Set(customer.email),
                customer_phone: Set(customer.phone),
                customer_address: Set(customer.address),
                total: Set(order.total),
                issued_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            CartItem::delete_many()
                .filter(cart_item::Column::UserId.eq(user_id))
                .exec(&txn)
                .await?;

            txn.commit().await?;
            Ok((order, details, invoice))
        })
        .await?;

        info!(
            order_id = order.id,
            total = %order.total,
            invoice_number = %invoice.invoice_number,
            "Order created from cart"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::OrderCreated {
                order_id: order.id,
                user_id,
            })
            .await
        {
            warn!(error = %e, order_id = order.id, "Failed to send order created event");
        }
        if let Err(e) = self
            .event_sender
            .send(Event::InvoiceIssued {
                order_id: order.id,
                invoice_number: invoice.invoice_number.clone(),
            })
            .await
        {
            warn!(error = %e, order_id = order.id, "Failed to send invoice issued event");
        }

        Ok(OrderWithInvoice {
            order,
            details,
            invoice,
        })
    }

    /// Updates the order status. No stock side effects; every transition
    /// between statuses is accepted.
    #[instrument(skip(self), fields(order_id = order_id, new_status = %new_status))]
    pub async fn update_order_status(
        &self,
        order_id: i32,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_status = order.status;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        info!(
            order_id,
            old_status = %old_status,
            new_status = %new_status,
            "Order status updated"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            })
            .await
        {
            warn!(error = %e, order_id, "Failed to send status changed event");
        }

        Ok(updated)
    }

    /// Deletes an order, restoring each line's quantity to its product's
    /// stock, then removing invoice, details and the order row, atomically.
    ///
    /// Restoration is additive: a product deleted since the order was placed
    /// affects zero rows and that line is skipped.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn delete_order(&self, order_id: i32) -> Result<i32, ServiceError> {
        let db = self.db.clone();

        db::with_txn_timeout(self.txn_timeout, async move {
            let txn = db.begin().await?;

            let order = Order::find_by_id(order_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

            let details = OrderDetail::find()
                .filter(order_detail::Column::OrderId.eq(order_id))
                .all(&txn)
                .await?;

            for detail in &details {
                let restored = Product::update_many()
                    .col_expr(
                        product::Column::Stock,
                        Expr::col(product::Column::Stock).add(detail.quantity),
                    )
                    .filter(product::Column::Id.eq(detail.product_id))
                    .exec(&txn)
                    .await?;

                if restored.rows_affected == 0 {
                    warn!(
                        product_id = detail.product_id,
                        order_id, "Product missing during stock restoration, line skipped"
                    );
                }
            }

            Invoice::delete_many()
                .filter(invoice::Column::OrderId.eq(order_id))
                .exec(&txn)
                .await?;
            OrderDetail::delete_many()
                .filter(order_detail::Column::OrderId.eq(order_id))
                .exec(&txn)
                .await?;
            Order::delete_by_id(order.id).exec(&txn).await?;

            txn.commit().await?;
            Ok(order_id)
        })
        .await?;

        info!(order_id, "Order deleted and stock restored");

        if let Err(e) = self.event_sender.send(Event::OrderDeleted { order_id }).await {
            warn!(error = %e, order_id, "Failed to send order deleted event");
        }

        Ok(order_id)
    }

    /// Fetches one order with its line items.
    #[instrument(skip(self), fields(order_id = order_id))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderWithDetails, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let details = OrderDetail::find()
            .filter(order_detail::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;

        Ok(OrderWithDetails { order, details })
    }

    /// Lists a user's orders, newest first, with their line items.
    #[instrument(skip(self), fields(user_id = user_id))]
    pub async fn list_user_orders(
        &self,
        user_id: i32,
    ) -> Result<Vec<OrderWithDetails>, ServiceError> {
        let orders = Order::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let details = OrderDetail::find()
                .filter(order_detail::Column::OrderId.eq(order.id))
                .all(&*self.db)
                .await?;
            result.push(OrderWithDetails { order, details });
        }

        Ok(result)
    }

    /// Lists all orders, optionally filtered by status, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<order::Model>, ServiceError> {
        let mut query = Order::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        Ok(query.all(&*self.db).await?)
    }
}
