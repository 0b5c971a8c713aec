use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgConnection, PgPool};
use storefront_shared::{
    OrderItemResponse, OrderProductInfo, OrderResponse, OrderStatisticsResponse, OrderStatus,
    PaymentMethod, PaymentStatus, ShippingAddress, TimelineStep,
    TRACKING_CONFIRMED_OFFSET_MINUTES, TRACKING_PROCESSING_OFFSET_HOURS,
    TRACKING_SHIPPED_BEFORE_DELIVERY_DAYS,
};
use uuid::Uuid;

use crate::error::AppError;

const ORDER_COLUMNS: &str = "id, order_id, user_id, total_amount, discount_amount, shipping_amount, final_amount, status, payment_status, payment_method, ship_name, ship_phone, ship_address_line1, ship_address_line2, ship_city, ship_state, ship_pincode, ship_country, estimated_delivery, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub ship_name: String,
    pub ship_phone: String,
    pub ship_address_line1: String,
    pub ship_address_line2: Option<String>,
    pub ship_city: String,
    pub ship_state: String,
    pub ship_pincode: String,
    pub ship_country: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Frozen line snapshot staged for insertion at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

/// Order line joined with what remains of the product for display.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItemDetail {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
    pub product_name: Option<String>,
    pub product_brand: Option<String>,
    pub product_images: Option<Vec<String>>,
}

impl Order {
    /// Human-facing unique id. UUID-derived so uniqueness does not rest on
    /// clock resolution; the column's UNIQUE constraint is the backstop.
    pub fn generate_order_id() -> String {
        format!("ORD-{}", Uuid::new_v4().simple().to_string().to_uppercase())
    }

    /// Insert the order header and its frozen line items. Must run inside
    /// the checkout transaction.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: Uuid,
        items: &[NewOrderItem],
        total_amount: Decimal,
        discount_amount: Decimal,
        shipping_amount: Decimal,
        final_amount: Decimal,
        payment_method: PaymentMethod,
        address: &ShippingAddress,
        estimated_delivery: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                order_id, user_id, total_amount, discount_amount, shipping_amount, final_amount,
                payment_method, ship_name, ship_phone, ship_address_line1, ship_address_line2,
                ship_city, ship_state, ship_pincode, ship_country, estimated_delivery
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Self::generate_order_id())
        .bind(user_id)
        .bind(total_amount)
        .bind(discount_amount)
        .bind(shipping_amount)
        .bind(final_amount)
        .bind(payment_method)
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.pincode)
        .bind(&address.country)
        .bind(estimated_delivery)
        .fetch_one(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price, total_price) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.total_price)
            .execute(&mut *conn)
            .await?;
        }

        Ok(order)
    }

    pub async fn find_for_user(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(order)
    }

    /// Same lookup, but locked for the cancellation transaction.
    pub async fn find_for_user_locked(
        conn: &mut PgConnection,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(order)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(orders)
    }

    pub async fn count_for_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItemDetail>, AppError> {
        let items = sqlx::query_as::<_, OrderItemDetail>(
            r#"
            SELECT oi.id, oi.product_id, oi.quantity, oi.price, oi.total_price,
                   p.name AS product_name, p.brand AS product_brand, p.images AS product_images
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }

    /// Line items as stored, without the product join. Used by cancellation
    /// inside its transaction.
    pub async fn raw_items(
        executor: impl PgExecutor<'_>,
        order_id: Uuid,
    ) -> Result<Vec<NewOrderItem>, AppError> {
        #[derive(FromRow)]
        struct Row {
            product_id: Uuid,
            quantity: i32,
            price: Decimal,
            total_price: Decimal,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT product_id, quantity, price, total_price FROM order_items WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_all(executor)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| NewOrderItem {
                product_id: r.product_id,
                quantity: r.quantity,
                price: r.price,
                total_price: r.total_price,
            })
            .collect())
    }

    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn update_payment_status(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(payment_status)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn statistics(pool: &PgPool, user_id: Uuid) -> Result<OrderStatisticsResponse, AppError> {
        #[derive(FromRow)]
        struct Row {
            total_orders: i64,
            total_spent: Decimal,
            pending_orders: i64,
            delivered_orders: i64,
            cancelled_orders: i64,
        }

        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT COUNT(*) AS total_orders,
                   COALESCE(SUM(final_amount), 0) AS total_spent,
                   COUNT(*) FILTER (WHERE status IN ('pending', 'confirmed', 'processing')) AS pending_orders,
                   COUNT(*) FILTER (WHERE status = 'delivered') AS delivered_orders,
                   COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled_orders
            FROM orders
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(OrderStatisticsResponse {
            total_orders: row.total_orders,
            total_spent: row.total_spent,
            pending_orders: row.pending_orders,
            delivered_orders: row.delivered_orders,
            cancelled_orders: row.cancelled_orders,
        })
    }

    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: self.ship_name.clone(),
            phone: self.ship_phone.clone(),
            address_line1: self.ship_address_line1.clone(),
            address_line2: self.ship_address_line2.clone(),
            city: self.ship_city.clone(),
            state: self.ship_state.clone(),
            pincode: self.ship_pincode.clone(),
            country: self.ship_country.clone(),
        }
    }

    pub fn to_response(&self, items: Vec<OrderItemDetail>) -> OrderResponse {
        OrderResponse {
            id: self.id,
            order_id: self.order_id.clone(),
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product: item.product_name.map(|name| OrderProductInfo {
                        id: item.product_id,
                        name,
                        brand: item.product_brand.unwrap_or_default(),
                        image: item.product_images.and_then(|images| images.into_iter().next()),
                    }),
                    quantity: item.quantity,
                    price: item.price,
                    total_price: item.total_price,
                })
                .collect(),
            total_amount: self.total_amount,
            discount_amount: self.discount_amount,
            shipping_amount: self.shipping_amount,
            final_amount: self.final_amount,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            shipping_address: self.shipping_address(),
            estimated_delivery: self.estimated_delivery,
            created_at: self.created_at,
        }
    }
}

/// Deterministic five-step projection of the order's progress. Dates are
/// fixed offsets from creation and estimated delivery; completion flags
/// derive purely from the current status.
pub fn build_timeline(order: &Order) -> Vec<TimelineStep> {
    use OrderStatus::*;

    let created = order.created_at;
    let shipped_date = order
        .estimated_delivery
        .map(|d| d - Duration::days(TRACKING_SHIPPED_BEFORE_DELIVERY_DAYS));

    vec![
        TimelineStep {
            status: "ordered".to_string(),
            description: "Order placed".to_string(),
            date: Some(created),
            completed: true,
        },
        TimelineStep {
            status: "confirmed".to_string(),
            description: "Order confirmed".to_string(),
            date: Some(created + Duration::minutes(TRACKING_CONFIRMED_OFFSET_MINUTES)),
            completed: order.status != Pending,
        },
        TimelineStep {
            status: "processing".to_string(),
            description: "Preparing for shipment".to_string(),
            date: Some(created + Duration::hours(TRACKING_PROCESSING_OFFSET_HOURS)),
            completed: matches!(order.status, Processing | Shipped | Delivered),
        },
        TimelineStep {
            status: "shipped".to_string(),
            description: "Shipped".to_string(),
            date: shipped_date,
            completed: matches!(order.status, Shipped | Delivered),
        },
        TimelineStep {
            status: "delivered".to_string(),
            description: "Delivered".to_string(),
            date: order.estimated_delivery,
            completed: order.status == Delivered,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn order(status: OrderStatus) -> Order {
        let created = Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_id: Order::generate_order_id(),
            user_id: Uuid::new_v4(),
            total_amount: Decimal::from(200),
            discount_amount: Decimal::ZERO,
            shipping_amount: Decimal::from(40),
            final_amount: Decimal::from(240),
            status,
            payment_status: PaymentStatus::Pending,
            payment_method: PaymentMethod::Card,
            ship_name: "Asha".to_string(),
            ship_phone: "9876543210".to_string(),
            ship_address_line1: "12 MG Road".to_string(),
            ship_address_line2: None,
            ship_city: "Pune".to_string(),
            ship_state: "MH".to_string(),
            ship_pincode: "411001".to_string(),
            ship_country: "India".to_string(),
            estimated_delivery: Some(created + Duration::days(7)),
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn order_ids_are_prefixed_and_distinct() {
        let ids: HashSet<String> = (0..64).map(|_| Order::generate_order_id()).collect();
        assert_eq!(ids.len(), 64);
        assert!(ids.iter().all(|id| id.starts_with("ORD-")));
    }

    #[test]
    fn timeline_is_five_fixed_steps() {
        let timeline = build_timeline(&order(OrderStatus::Pending));
        let statuses: Vec<&str> = timeline.iter().map(|s| s.status.as_str()).collect();
        assert_eq!(
            statuses,
            vec!["ordered", "confirmed", "processing", "shipped", "delivered"]
        );
    }

    #[test]
    fn pending_order_has_only_first_step_completed() {
        let timeline = build_timeline(&order(OrderStatus::Pending));
        let flags: Vec<bool> = timeline.iter().map(|s| s.completed).collect();
        assert_eq!(flags, vec![true, false, false, false, false]);
    }

    #[test]
    fn shipped_order_completes_first_four_steps() {
        let timeline = build_timeline(&order(OrderStatus::Shipped));
        let flags: Vec<bool> = timeline.iter().map(|s| s.completed).collect();
        assert_eq!(flags, vec![true, true, true, true, false]);
    }

    #[test]
    fn delivered_order_completes_everything() {
        let timeline = build_timeline(&order(OrderStatus::Delivered));
        assert!(timeline.iter().all(|s| s.completed));
    }

    #[test]
    fn timeline_dates_use_fixed_offsets() {
        let o = order(OrderStatus::Pending);
        let timeline = build_timeline(&o);

        assert_eq!(timeline[0].date, Some(o.created_at));
        assert_eq!(timeline[1].date, Some(o.created_at + Duration::minutes(30)));
        assert_eq!(timeline[2].date, Some(o.created_at + Duration::hours(2)));
        assert_eq!(
            timeline[3].date,
            o.estimated_delivery.map(|d| d - Duration::days(3))
        );
        assert_eq!(timeline[4].date, o.estimated_delivery);
    }
}
