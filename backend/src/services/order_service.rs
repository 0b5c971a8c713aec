use sqlx::PgPool;
use storefront_shared::{
    OrderListQuery, OrderListResponse, OrderResponse, OrderStatisticsResponse, OrderStatus,
    OrderStatusResponse, PageMeta, TrackingResponse, UpdateOrderStatusRequest, DEFAULT_PAGE_SIZE,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{build_timeline, Order, Pagination, Product};

/// Order lifecycle service: listing, detail, tracking projections,
/// cancellation and fulfilment updates.
#[derive(Clone)]
pub struct OrderService {
    db_pool: PgPool,
}

impl OrderService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_orders(
        &self,
        user_id: Uuid,
        query: OrderListQuery,
    ) -> Result<OrderListResponse, AppError> {
        let status = match query.status.as_deref() {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|e| AppError::Validation(e.to_string()))?,
            ),
            None => None,
        };

        let page = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);
        let orders =
            Order::list_for_user(&self.db_pool, user_id, status, page.limit, page.offset).await?;
        let total = Order::count_for_user(&self.db_pool, user_id, status).await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in &orders {
            let items = Order::items(&self.db_pool, order.id).await?;
            responses.push(order.to_response(items));
        }

        Ok(OrderListResponse {
            pagination: PageMeta::new(page.page, page.limit, total, responses.len()),
            orders: responses,
        })
    }

    pub async fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<OrderResponse, AppError> {
        let order = self.find_owned(user_id, id).await?;
        let items = Order::items(&self.db_pool, order.id).await?;
        Ok(order.to_response(items))
    }

    pub async fn get_status(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<OrderStatusResponse, AppError> {
        let order = self.find_owned(user_id, id).await?;
        Ok(OrderStatusResponse {
            order_id: order.order_id,
            status: order.status,
            payment_status: order.payment_status,
            estimated_delivery: order.estimated_delivery,
            created_at: order.created_at,
        })
    }

    /// Deterministic projection from the current status; there is no live
    /// shipping feed behind this.
    pub async fn track(&self, user_id: Uuid, id: Uuid) -> Result<TrackingResponse, AppError> {
        let order = self.find_owned(user_id, id).await?;
        let timeline = build_timeline(&order);

        Ok(TrackingResponse {
            order_id: order.order_id.clone(),
            current_status: order.status,
            estimated_delivery: order.estimated_delivery,
            shipping_address: order.shipping_address(),
            timeline,
        })
    }

    /// Cancel an order: restore every line's stock and flip the status,
    /// atomically. Only `pending` and `confirmed` orders qualify.
    pub async fn cancel(&self, user_id: Uuid, id: Uuid) -> Result<OrderResponse, AppError> {
        let mut tx = self.db_pool.begin().await?;

        let order = Order::find_for_user_locked(&mut tx, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if !order.status.is_cancellable() {
            warn!(
                "Rejected cancellation of order {} in status {}",
                order.order_id, order.status
            );
            return Err(AppError::BusinessRule(format!(
                "Cannot cancel order with status: {}. Order can only be cancelled when pending or confirmed.",
                order.status
            )));
        }

        let items = Order::raw_items(&mut *tx, order.id).await?;
        for item in &items {
            Product::restore_stock(&mut *tx, item.product_id, item.quantity).await?;
        }

        Order::update_status(&mut *tx, order.id, OrderStatus::Cancelled).await?;

        tx.commit().await?;
        info!("Cancelled order {} for user {}", order.order_id, user_id);

        let order = Order::find_for_user(&self.db_pool, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        let items = Order::items(&self.db_pool, order.id).await?;
        Ok(order.to_response(items))
    }

    pub async fn statistics(&self, user_id: Uuid) -> Result<OrderStatisticsResponse, AppError> {
        Order::statistics(&self.db_pool, user_id).await
    }

    /// Fulfilment update (admin). Status changes go through the transition
    /// table; payment status is an independent axis set directly.
    pub async fn admin_update(
        &self,
        id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderResponse, AppError> {
        let order = Order::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        if let Some(next) = request.status {
            if !order.status.can_transition_to(next) {
                return Err(AppError::BusinessRule(format!(
                    "Cannot change order status from {} to {}",
                    order.status, next
                )));
            }
            Order::update_status(&self.db_pool, order.id, next).await?;
            info!("Order {} moved to {}", order.order_id, next);
        }

        if let Some(payment_status) = request.payment_status {
            Order::update_payment_status(&self.db_pool, order.id, payment_status).await?;
            info!("Order {} payment marked {}", order.order_id, payment_status);
        }

        let order = Order::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        let items = Order::items(&self.db_pool, order.id).await?;
        Ok(order.to_response(items))
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> Result<Order, AppError> {
        Order::find_for_user(&self.db_pool, id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }
}
