use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use storefront_shared::{
    CreateProductRequest, ProductResponse, RatingSummary, ReviewResponse, UpdateProductRequest,
};
use uuid::Uuid;

use crate::error::AppError;

const PRODUCT_COLUMNS: &str = "id, name, brand, price, discount_price, description, images, stock, is_available, featured, rating_average, rating_count, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_available: bool,
    pub featured: bool,
    pub rating_average: Decimal,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public catalog listing filter. Price bounds apply to the effective price.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub featured: Option<bool>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
    Rating,
    Popular,
}

impl ProductSort {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("price_low") => ProductSort::PriceLow,
            Some("price_high") => ProductSort::PriceHigh,
            Some("name_asc") => ProductSort::NameAsc,
            Some("name_desc") => ProductSort::NameDesc,
            Some("rating") => ProductSort::Rating,
            Some("popular") => ProductSort::Popular,
            _ => ProductSort::Newest,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC",
            ProductSort::PriceLow => "price ASC",
            ProductSort::PriceHigh => "price DESC",
            ProductSort::NameAsc => "name ASC",
            ProductSort::NameDesc => "name DESC",
            ProductSort::Rating => "rating_average DESC",
            ProductSort::Popular => "rating_count DESC",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub async fn create(pool: &PgPool, request: &CreateProductRequest) -> Result<Self, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, brand, price, discount_price, description, images, stock, is_available, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7 > 0, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&request.name)
        .bind(&request.brand)
        .bind(request.price)
        .bind(request.discount_price)
        .bind(&request.description)
        .bind(&request.images)
        .bind(request.stock)
        .bind(request.featured.unwrap_or(false))
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    pub async fn find_available_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_available = TRUE"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Product lookup for add-to-cart: must be available with stock on hand.
    pub async fn find_purchasable(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_available = TRUE AND stock > 0"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    fn push_public_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
        qb.push(" WHERE is_available = TRUE");

        if let Some(featured) = filter.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(min) = filter.price_min {
            qb.push(" AND COALESCE(LEAST(discount_price, price), price) >= ")
                .push_bind(min);
        }
        if let Some(max) = filter.price_max {
            qb.push(" AND COALESCE(LEAST(discount_price, price), price) <= ")
                .push_bind(max);
        }
        if let Some(search) = &filter.search {
            qb.push(" AND name ILIKE ").push_bind(format!("%{}%", search));
        }
    }

    pub async fn list(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Self>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products"
        ));
        Self::push_public_filters(&mut qb, filter);
        qb.push(" ORDER BY ").push(filter.sort.order_by());
        qb.push(" LIMIT ").push_bind(filter.limit);
        qb.push(" OFFSET ").push_bind(filter.offset);

        let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
        Ok(products)
    }

    pub async fn count(pool: &PgPool, filter: &ProductFilter) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
        Self::push_public_filters(&mut qb, filter);

        let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(count)
    }

    /// Admin listing includes unavailable products and searches across
    /// name, brand and description.
    pub async fn list_admin(
        pool: &PgPool,
        featured: Option<bool>,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));
        Self::push_admin_filters(&mut qb, featured, search);
        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
        Ok(products)
    }

    pub async fn count_admin(
        pool: &PgPool,
        featured: Option<bool>,
        search: Option<&str>,
    ) -> Result<i64, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE TRUE");
        Self::push_admin_filters(&mut qb, featured, search);

        let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(count)
    }

    fn push_admin_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        featured: Option<bool>,
        search: Option<&str>,
    ) {
        if let Some(featured) = featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(search) = search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR brand ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub async fn find_featured(pool: &PgPool, limit: i64) -> Result<Vec<Self>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE featured = TRUE AND is_available = TRUE
            ORDER BY created_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(products)
    }

    /// Full-text-ish search over name, brand and description, restricted to
    /// available products.
    pub async fn search(
        pool: &PgPool,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_available = TRUE"
        ));
        Self::push_admin_filters(&mut qb, None, Some(query));
        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let products = qb.build_query_as::<Product>().fetch_all(pool).await?;
        Ok(products)
    }

    pub async fn count_search(pool: &PgPool, query: &str) -> Result<i64, AppError> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products WHERE is_available = TRUE");
        Self::push_admin_filters(&mut qb, None, Some(query));

        let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
        Ok(count)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        request: &UpdateProductRequest,
    ) -> Result<Self, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = NOW()");

        if let Some(name) = &request.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(brand) = &request.brand {
            qb.push(", brand = ").push_bind(brand);
        }
        if let Some(price) = request.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(discount_price) = request.discount_price {
            qb.push(", discount_price = ").push_bind(discount_price);
        }
        if let Some(description) = &request.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(images) = &request.images {
            // new uploads are appended, matching the upload flow
            qb.push(", images = images || ").push_bind(images);
        }
        if let Some(stock) = request.stock {
            qb.push(", stock = ")
                .push_bind(stock)
                .push(", is_available = ")
                .push_bind(stock > 0);
        }
        if let Some(featured) = request.featured {
            qb.push(", featured = ").push_bind(featured);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format!(" RETURNING {PRODUCT_COLUMNS}"));

        let product = qb.build_query_as::<Product>().fetch_one(pool).await?;
        Ok(product)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    pub async fn remove_image(pool: &PgPool, id: Uuid, image: &str) -> Result<Self, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET images = array_remove(images, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(image)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    /// Insert a review and recompute the product's rating summary in the
    /// same transaction.
    pub async fn add_review(
        pool: &PgPool,
        product_id: Uuid,
        user_id: Uuid,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "INSERT INTO product_reviews (product_id, user_id, rating, comment) VALUES ($1, $2, $3, $4)",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE products
            SET rating_average = sub.average, rating_count = sub.count, updated_at = NOW()
            FROM (
                SELECT COALESCE(ROUND(AVG(rating), 2), 0) AS average, COUNT(*)::INT AS count
                FROM product_reviews
                WHERE product_id = $1
            ) AS sub
            WHERE id = $1
            "#,
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn reviews(pool: &PgPool, product_id: Uuid) -> Result<Vec<ReviewRow>, AppError> {
        let reviews = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT r.id, r.user_id, u.name AS user_name, r.rating, r.comment, r.created_at
            FROM product_reviews r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;

        Ok(reviews)
    }

    /// Guarded decrement: succeeds only when enough stock remains, so two
    /// concurrent checkouts cannot both pass the gate.
    pub async fn decrease_stock(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        amount: i32,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2, is_available = (stock - $2) > 0, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id)
        .bind(amount)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Give stock back on cancellation.
    pub async fn restore_stock(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        amount: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, is_available = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(amount)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Discount-aware price: the lesser of price and discount_price.
    pub fn effective_price(&self) -> Decimal {
        match self.discount_price {
            Some(discount) if discount < self.price => discount,
            _ => self.price,
        }
    }

    pub fn discount_percentage(&self) -> i32 {
        match self.discount_price {
            Some(discount) if self.price > Decimal::ZERO && discount < self.price => {
                ((self.price - discount) / self.price * Decimal::from(100))
                    .round()
                    .to_i32()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn has_stock(&self) -> bool {
        self.stock > 0 && self.is_available
    }

    pub fn to_response(&self, reviews: Option<Vec<ReviewRow>>) -> ProductResponse {
        ProductResponse {
            id: self.id,
            name: self.name.clone(),
            brand: self.brand.clone(),
            price: self.price,
            discount_price: self.discount_price,
            current_price: self.effective_price(),
            discount_percentage: self.discount_percentage(),
            description: self.description.clone(),
            images: self.images.clone(),
            stock: self.stock,
            is_available: self.is_available,
            featured: self.featured,
            ratings: RatingSummary {
                average: self.rating_average,
                count: self.rating_count,
            },
            reviews: reviews.map(|rows| {
                rows.into_iter()
                    .map(|r| ReviewResponse {
                        id: r.id,
                        user_id: r.user_id,
                        user_name: r.user_name,
                        rating: r.rating,
                        comment: r.comment,
                        created_at: r.created_at,
                    })
                    .collect()
            }),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, discount: Option<i64>, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Trail Shoe".to_string(),
            brand: "Acme".to_string(),
            price: Decimal::from(price),
            discount_price: discount.map(Decimal::from),
            description: None,
            images: vec!["shoe.jpg".to_string()],
            stock,
            is_available: stock > 0,
            featured: false,
            rating_average: Decimal::ZERO,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_price_prefers_lower_discount() {
        assert_eq!(product(100, Some(80), 5).effective_price(), Decimal::from(80));
        assert_eq!(product(100, None, 5).effective_price(), Decimal::from(100));
        // a discount at or above the list price is ignored
        assert_eq!(product(100, Some(100), 5).effective_price(), Decimal::from(100));
        assert_eq!(product(100, Some(120), 5).effective_price(), Decimal::from(100));
    }

    #[test]
    fn discount_percentage_rounds() {
        assert_eq!(product(100, Some(80), 5).discount_percentage(), 20);
        assert_eq!(product(300, Some(200), 5).discount_percentage(), 33);
        assert_eq!(product(100, None, 5).discount_percentage(), 0);
    }

    #[test]
    fn stock_availability() {
        assert!(product(100, None, 1).has_stock());
        assert!(!product(100, None, 0).has_stock());
    }

    #[test]
    fn sort_parsing_defaults_to_newest() {
        assert_eq!(ProductSort::from_query(Some("price_low")), ProductSort::PriceLow);
        assert_eq!(ProductSort::from_query(Some("rating")), ProductSort::Rating);
        assert_eq!(ProductSort::from_query(Some("bogus")), ProductSort::Newest);
        assert_eq!(ProductSort::from_query(None), ProductSort::Newest);
    }
}
