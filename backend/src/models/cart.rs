use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line joined with its product, as used by cart views and checkout.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Effective-price snapshot taken when the line was added/updated.
    pub snapshot_price: Decimal,
    pub product_name: String,
    pub product_brand: String,
    pub product_price: Decimal,
    pub product_discount_price: Option<Decimal>,
    pub product_images: Vec<String>,
    pub product_stock: i32,
}

impl CartLine {
    /// Current discount-aware price of the underlying product.
    pub fn current_price(&self) -> Decimal {
        match self.product_discount_price {
            Some(discount) if discount < self.product_price => discount,
            _ => self.product_price,
        }
    }
}

/// Totals are never stored: they are recomputed from the line items on
/// every read so they cannot drift.
pub fn cart_totals(lines: &[CartLine]) -> (Decimal, i64) {
    let total_amount = lines
        .iter()
        .map(|line| line.snapshot_price * Decimal::from(line.quantity))
        .sum();
    let total_items = lines.iter().map(|line| i64::from(line.quantity)).sum();
    (total_amount, total_items)
}

const CART_LINE_QUERY: &str = r#"
SELECT ci.id AS item_id, ci.product_id, ci.quantity, ci.price AS snapshot_price,
       p.name AS product_name, p.brand AS product_brand, p.price AS product_price,
       p.discount_price AS product_discount_price, p.images AS product_images,
       p.stock AS product_stock
FROM cart_items ci
JOIN products p ON p.id = ci.product_id
WHERE ci.cart_id = $1
ORDER BY ci.created_at
"#;

impl Cart {
    pub async fn find_active(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, is_active, created_at, updated_at FROM carts WHERE user_id = $1 AND is_active = TRUE",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(cart)
    }

    /// A user with no active cart gets a fresh one on their next add-to-cart.
    pub async fn create(pool: &PgPool, user_id: Uuid) -> Result<Self, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (user_id)
            VALUES ($1)
            RETURNING id, user_id, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(cart)
    }

    pub async fn lines(pool: &PgPool, cart_id: Uuid) -> Result<Vec<CartLine>, AppError> {
        let lines = sqlx::query_as::<_, CartLine>(CART_LINE_QUERY)
            .bind(cart_id)
            .fetch_all(pool)
            .await?;

        Ok(lines)
    }

    /// Checkout variant: locks the product rows so the stock gate and the
    /// decrement observe the same values.
    pub async fn lines_for_update(
        executor: impl PgExecutor<'_>,
        cart_id: Uuid,
    ) -> Result<Vec<CartLine>, AppError> {
        let query = format!("{CART_LINE_QUERY} FOR UPDATE OF p");
        let lines = sqlx::query_as::<_, CartLine>(&query)
            .bind(cart_id)
            .fetch_all(executor)
            .await?;

        Ok(lines)
    }

    pub async fn deactivate(executor: impl PgExecutor<'_>, cart_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE carts SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn clear_items(executor: impl PgExecutor<'_>, cart_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    pub async fn touch(executor: impl PgExecutor<'_>, cart_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}

impl CartItem {
    pub async fn find(pool: &PgPool, cart_id: Uuid, item_id: Uuid) -> Result<Option<Self>, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity, price, created_at, updated_at FROM cart_items WHERE id = $1 AND cart_id = $2",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    pub async fn find_by_product(
        pool: &PgPool,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Self>, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity, price, created_at, updated_at FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

        Ok(item)
    }

    pub async fn insert(
        pool: &PgPool,
        cart_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
    ) -> Result<Self, AppError> {
        let item = sqlx::query_as::<_, CartItem>(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, cart_id, product_id, quantity, price, created_at, updated_at
            "#,
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .fetch_one(pool)
        .await?;

        Ok(item)
    }

    /// Quantity change always refreshes the price snapshot.
    pub async fn set_quantity_and_price(
        pool: &PgPool,
        item_id: Uuid,
        quantity: i32,
        price: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE cart_items SET quantity = $2, price = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(item_id)
        .bind(quantity)
        .bind(price)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn delete(pool: &PgPool, cart_id: Uuid, item_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn count(pool: &PgPool, cart_id: Uuid) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
                .bind(cart_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, snapshot: i64, price: i64, discount: Option<i64>) -> CartLine {
        CartLine {
            item_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            snapshot_price: Decimal::from(snapshot),
            product_name: "Widget".to_string(),
            product_brand: "Acme".to_string(),
            product_price: Decimal::from(price),
            product_discount_price: discount.map(Decimal::from),
            product_images: vec![],
            product_stock: 10,
        }
    }

    #[test]
    fn totals_are_sum_of_lines() {
        let lines = vec![line(2, 100, 100, None), line(3, 50, 60, Some(50))];
        let (total_amount, total_items) = cart_totals(&lines);
        assert_eq!(total_amount, Decimal::from(350));
        assert_eq!(total_items, 5);
    }

    #[test]
    fn totals_of_empty_cart_are_zero() {
        let (total_amount, total_items) = cart_totals(&[]);
        assert_eq!(total_amount, Decimal::ZERO);
        assert_eq!(total_items, 0);
    }

    #[test]
    fn current_price_tracks_discount() {
        assert_eq!(line(1, 100, 100, Some(70)).current_price(), Decimal::from(70));
        assert_eq!(line(1, 100, 100, None).current_price(), Decimal::from(100));
        assert_eq!(line(1, 100, 100, Some(130)).current_price(), Decimal::from(100));
    }
}
