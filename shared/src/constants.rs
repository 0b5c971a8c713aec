use rust_decimal::Decimal;
use std::time::Duration;

// JWT configuration
pub const JWT_ACCESS_TOKEN_EXPIRY: Duration = Duration::from_secs(15 * 60); // 15 minutes
pub const JWT_REFRESH_TOKEN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60); // 7 days

// Pagination defaults
pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_PRODUCT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

// Shipping policy: free above the threshold (exclusive), flat fee otherwise
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);

// Order lifecycle
pub const ESTIMATED_DELIVERY_DAYS: i64 = 7;

// Tracking timeline offsets from order creation / estimated delivery
pub const TRACKING_CONFIRMED_OFFSET_MINUTES: i64 = 30;
pub const TRACKING_PROCESSING_OFFSET_HOURS: i64 = 2;
pub const TRACKING_SHIPPED_BEFORE_DELIVERY_DAYS: i64 = 3;

// Password hashing
pub const BCRYPT_COST: u32 = 10;

// Validation patterns
pub const PHONE_PATTERN: &str = r"^[0-9]{10,15}$";

// Shipping address
pub const DEFAULT_COUNTRY: &str = "India";

// Review constraints
pub const MIN_REVIEW_RATING: i32 = 1;
pub const MAX_REVIEW_RATING: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_constants_have_expected_values() {
        assert_eq!(FREE_SHIPPING_THRESHOLD, Decimal::from(500));
        assert_eq!(FLAT_SHIPPING_FEE, Decimal::from(40));
    }
}
