//! Database models for the storefront platform
//!
//! Each model corresponds to a database table and provides type-safe
//! interactions with the database using sqlx.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{cart_totals, Cart, CartItem, CartLine};
pub use order::{build_timeline, NewOrderItem, Order, OrderItemDetail};
pub use product::{Product, ProductFilter, ProductSort, ReviewRow};
pub use user::User;

/// Pagination helper: 1-based page numbers clamped to sane bounds.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let limit = limit
            .unwrap_or(default_limit)
            .clamp(1, storefront_shared::MAX_PAGE_SIZE);
        let page = page.unwrap_or(1).max(1);
        Self {
            page,
            limit,
            offset: (page - 1) * limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_bounds() {
        let p = Pagination::new(None, None, 10);
        assert_eq!((p.page, p.limit, p.offset), (1, 10, 0));

        let p = Pagination::new(Some(3), Some(20), 10);
        assert_eq!((p.page, p.limit, p.offset), (3, 20, 40));

        let p = Pagination::new(Some(0), Some(1000), 10);
        assert_eq!((p.page, p.limit, p.offset), (1, 100, 0));
    }
}
