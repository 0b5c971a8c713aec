use crate::constants::DEFAULT_COUNTRY;
use crate::types::*;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Response envelope shared by every endpoint:
/// `{success, message, data?, error?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure_with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Success envelope with a message and no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }
}

/// Pagination block mirrored on every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    pub fn new(page: i64, limit: i64, total: i64, returned: usize) -> Self {
        let skip = (page - 1) * limit;
        Self {
            current_page: page,
            total_pages: (total + limit - 1) / limit.max(1),
            total,
            has_next: (skip + returned as i64) < total,
            has_prev: page > 1,
        }
    }
}

// User DTOs

fn validate_register_identity(req: &RegisterRequest) -> Result<(), ValidationError> {
    if req.email.is_none() && req.phone.is_none() {
        return Err(ValidationError::new("email_or_phone_required"));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits_only = phone.chars().all(|c| c.is_ascii_digit());
    if !digits_only || phone.len() < 10 || phone.len() > 15 {
        return Err(ValidationError::new("invalid_phone_format"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_register_identity", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "Name must be at least 3 characters long"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(custom = "validate_phone")]
    pub phone: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[validate(length(min = 1, message = "Google ID token is required"))]
    pub id_token: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AdminRegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

// Product DTOs

pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("amount_negative"));
    }
    Ok(())
}

fn validate_product_pricing(req: &CreateProductRequest) -> Result<(), ValidationError> {
    if let Some(discount) = req.discount_price {
        if discount > req.price {
            return Err(ValidationError::new("discount_exceeds_price"));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_product_pricing"))]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub brand: String,

    #[validate(custom = "validate_amount")]
    pub price: Decimal,

    #[validate(custom = "validate_amount")]
    pub discount_price: Option<Decimal>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, message = "At least one product image is required"))]
    pub images: Vec<String>,

    #[validate(range(min = 0))]
    pub stock: i32,

    pub featured: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,

    #[validate(custom = "validate_amount")]
    pub price: Option<Decimal>,

    #[validate(custom = "validate_amount")]
    pub discount_price: Option<Decimal>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    /// Appended to the existing image list, matching upload semantics.
    pub images: Option<Vec<String>>,

    #[validate(range(min = 0))]
    pub stock: Option<i32>,

    pub featured: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeleteImageRequest {
    #[validate(length(min = 1, message = "Image name is required"))]
    pub image_name: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: Decimal,
    pub count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub current_price: Decimal,
    pub discount_percentage: i32,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub is_available: bool,
    pub featured: bool,
    pub ratings: RatingSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub pagination: PageMeta,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub featured: Option<bool>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminProductListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
}

// Cart DTOs

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,

    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartProductInfo {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub images: Vec<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product: CartProductInfo,
    pub quantity: i32,
    /// Effective price snapshot taken at add/update time.
    pub price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
    pub total_amount: Decimal,
    pub total_items: i64,
    pub is_active: bool,
}

impl CartResponse {
    /// Placeholder returned when the user has no active cart.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_amount: Decimal::ZERO,
            total_items: 0,
            is_active: false,
        }
    }
}

// Checkout DTOs

/// Raw address input; presence of required sub-fields is checked by the
/// checkout gate so the response can name every missing field at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddressInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: Option<String>,
}

impl ShippingAddressInput {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if blank(&self.name) {
            missing.push("name");
        }
        if blank(&self.phone) {
            missing.push("phone");
        }
        if blank(&self.address_line1) {
            missing.push("address_line1");
        }
        if blank(&self.city) {
            missing.push("city");
        }
        if blank(&self.state) {
            missing.push("state");
        }
        if blank(&self.pincode) {
            missing.push("pincode");
        }
        missing
    }

    pub fn into_validated(self) -> Result<ShippingAddress, Vec<&'static str>> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(ShippingAddress {
            name: self.name.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            address_line1: self.address_line1.unwrap_or_default(),
            address_line2: self.address_line2,
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            pincode: self.pincode.unwrap_or_default(),
            country: self.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Option<ShippingAddressInput>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryProductInfo {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub image: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSummaryLine {
    pub product: SummaryProductInfo,
    pub quantity: i32,
    pub total_price: Decimal,
    pub in_stock: bool,
    pub available_stock: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutSummaryResponse {
    pub items: Vec<CheckoutSummaryLine>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub total_items: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartValidationIssue {
    pub product: String,
    pub issue: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartValidationSummary {
    pub total_items: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartValidationResponse {
    pub valid: bool,
    pub issues: Vec<CartValidationIssue>,
    pub cart_summary: CartValidationSummary,
}

// Order DTOs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderProductInfo {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    /// Absent when the product has since been removed from the catalog.
    pub product: Option<OrderProductInfo>,
    pub quantity: i32,
    pub price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_id: String,
    pub items: Vec<OrderItemResponse>,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub shipping_amount: Decimal,
    pub final_amount: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub pagination: PageMeta,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderStatusResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineStep {
    pub status: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingResponse {
    pub order_id: String,
    pub current_status: OrderStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub shipping_address: ShippingAddress,
    pub timeline: Vec<TimelineStep>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderStatisticsResponse {
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_address_fields_are_listed_in_order() {
        let input = ShippingAddressInput {
            name: Some("Asha".to_string()),
            phone: None,
            address_line1: Some("  ".to_string()),
            address_line2: None,
            city: Some("Pune".to_string()),
            state: None,
            pincode: Some("411001".to_string()),
            country: None,
        };
        assert_eq!(input.missing_fields(), vec!["phone", "address_line1", "state"]);
    }

    #[test]
    fn complete_address_validates_with_default_country() {
        let input = ShippingAddressInput {
            name: Some("Asha".to_string()),
            phone: Some("9876543210".to_string()),
            address_line1: Some("12 MG Road".to_string()),
            address_line2: None,
            city: Some("Pune".to_string()),
            state: Some("MH".to_string()),
            pincode: Some("411001".to_string()),
            country: None,
        };
        let address = input.into_validated().unwrap();
        assert_eq!(address.country, DEFAULT_COUNTRY);
        assert_eq!(address.pincode, "411001");
    }

    #[test]
    fn register_requires_email_or_phone() {
        let req = RegisterRequest {
            name: "Ravi".to_string(),
            email: None,
            phone: None,
            password: "secret1".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            name: "Ravi".to_string(),
            email: None,
            phone: Some("9876543210".to_string()),
            password: "secret1".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn phone_format_is_ten_to_fifteen_digits() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("98765abc10").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn discount_above_price_is_rejected() {
        let req = CreateProductRequest {
            name: "Tee".to_string(),
            brand: "Acme".to_string(),
            price: Decimal::from(100),
            discount_price: Some(Decimal::from(150)),
            description: None,
            images: vec!["tee.jpg".to_string()],
            stock: 5,
            featured: None,
        };
        assert!(req.validate().is_err());

        let req = CreateProductRequest {
            discount_price: Some(Decimal::from(80)),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn page_meta_derives_navigation_flags() {
        let meta = PageMeta::new(2, 10, 25, 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let last = PageMeta::new(3, 10, 25, 5);
        assert!(!last.has_next);
    }
}
