use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_shared::{
    CartValidationIssue, CartValidationResponse, CartValidationSummary, CheckoutRequest,
    CheckoutSummaryLine, CheckoutSummaryResponse, OrderResponse, PaymentMethod, ShippingAddress,
    SummaryProductInfo, ESTIMATED_DELIVERY_DAYS, FLAT_SHIPPING_FEE, FREE_SHIPPING_THRESHOLD,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Cart, CartLine, NewOrderItem, Order, Product};

/// Checkout workflow: validate-input, load-cart, validate-stock-and-price,
/// apply-stock-deductions, create-order, deactivate-cart, all committed as
/// one atomic unit.
#[derive(Clone)]
pub struct CheckoutService {
    db_pool: PgPool,
}

/// Order amounts and frozen line snapshots computed from the cart at
/// checkout time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub items: Vec<NewOrderItem>,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub total_items: i64,
}

/// Free above the threshold (exclusive), flat fee otherwise.
pub fn shipping_fee(subtotal: Decimal) -> Decimal {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}

/// Gate the checkout input: both parts present, address complete. The error
/// message names every missing address field at once.
pub fn validate_checkout_input(
    request: CheckoutRequest,
) -> Result<(ShippingAddress, PaymentMethod), AppError> {
    let (Some(address), Some(payment_method)) = (request.shipping_address, request.payment_method)
    else {
        return Err(AppError::Validation(
            "Shipping address and payment method are required".to_string(),
        ));
    };

    let address = address.into_validated().map_err(|missing| {
        AppError::Validation(format!(
            "Missing shipping address fields: {}",
            missing.join(", ")
        ))
    })?;

    Ok((address, payment_method))
}

/// Re-validate every line against current stock and recompute prices
/// discount-aware. Stale cart snapshots are never trusted.
pub fn build_order_draft(lines: &[CartLine]) -> Result<OrderDraft, AppError> {
    if lines.is_empty() {
        return Err(AppError::BusinessRule("Cart is empty".to_string()));
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;
    let mut total_items = 0i64;

    for line in lines {
        if line.product_stock < line.quantity {
            return Err(AppError::BusinessRule(format!(
                "Insufficient stock for {}. Only {} available.",
                line.product_name, line.product_stock
            )));
        }

        let price = line.current_price();
        let total_price = price * Decimal::from(line.quantity);

        items.push(NewOrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
            price,
            total_price,
        });

        subtotal += total_price;
        total_items += i64::from(line.quantity);
    }

    let shipping = shipping_fee(subtotal);
    let discount = Decimal::ZERO; // reserved for coupon logic
    let final_amount = subtotal + shipping - discount;

    Ok(OrderDraft {
        items,
        subtotal,
        shipping,
        discount,
        final_amount,
        total_items,
    })
}

impl CheckoutService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Priced preview of the active cart, flagging lines the catalog can no
    /// longer cover.
    pub async fn summary(&self, user_id: Uuid) -> Result<CheckoutSummaryResponse, AppError> {
        let lines = self.load_active_lines(user_id).await?;

        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = Decimal::ZERO;
        let mut total_items = 0i64;

        for line in &lines {
            let price = line.current_price();
            let total_price = price * Decimal::from(line.quantity);

            items.push(CheckoutSummaryLine {
                product: SummaryProductInfo {
                    id: line.product_id,
                    name: line.product_name.clone(),
                    brand: line.product_brand.clone(),
                    image: line.product_images.first().cloned(),
                    price,
                },
                quantity: line.quantity,
                total_price,
                in_stock: line.product_stock >= line.quantity,
                available_stock: line.product_stock,
            });

            subtotal += total_price;
            total_items += i64::from(line.quantity);
        }

        let shipping = shipping_fee(subtotal);

        Ok(CheckoutSummaryResponse {
            items,
            subtotal,
            shipping,
            discount: Decimal::ZERO,
            total: subtotal + shipping,
            total_items,
        })
    }

    /// Dry-run stock validation of the active cart.
    pub async fn validate(&self, user_id: Uuid) -> Result<CartValidationResponse, AppError> {
        let lines = self.load_active_lines(user_id).await?;

        let mut issues = Vec::new();
        let mut total_amount = Decimal::ZERO;
        let mut total_items = 0i64;

        for line in &lines {
            total_amount += line.current_price() * Decimal::from(line.quantity);
            total_items += i64::from(line.quantity);

            if line.product_stock == 0 {
                issues.push(CartValidationIssue {
                    product: line.product_name.clone(),
                    issue: "out_of_stock".to_string(),
                    message: format!("{} is out of stock", line.product_name),
                });
            } else if line.product_stock < line.quantity {
                issues.push(CartValidationIssue {
                    product: line.product_name.clone(),
                    issue: "insufficient_stock".to_string(),
                    message: format!(
                        "Only {} items available for {}",
                        line.product_stock, line.product_name
                    ),
                });
            }
        }

        Ok(CartValidationResponse {
            valid: issues.is_empty(),
            issues,
            cart_summary: CartValidationSummary {
                total_items,
                total_amount,
            },
        })
    }

    /// Create an order from the active cart. Stock deduction, order
    /// creation and cart deactivation commit as one transaction; any gate
    /// failure or write error aborts the whole unit.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<OrderResponse, AppError> {
        let (address, payment_method) = validate_checkout_input(request)?;

        let cart = Cart::find_active(&self.db_pool, user_id)
            .await?
            .ok_or_else(|| AppError::BusinessRule("Cart is empty".to_string()))?;

        let mut tx = self.db_pool.begin().await?;

        // lock the product rows so the stock gate and the decrement observe
        // the same state; concurrent checkouts serialize here
        let lines = Cart::lines_for_update(&mut *tx, cart.id).await?;
        let draft = build_order_draft(&lines)?;

        for item in &draft.items {
            let decremented =
                Product::decrease_stock(&mut *tx, item.product_id, item.quantity).await?;
            if !decremented {
                let line = lines.iter().find(|l| l.product_id == item.product_id);
                return Err(AppError::BusinessRule(format!(
                    "Insufficient stock for {}. Only {} available.",
                    line.map(|l| l.product_name.as_str()).unwrap_or("product"),
                    line.map(|l| l.product_stock).unwrap_or(0)
                )));
            }
        }

        let estimated_delivery = Utc::now() + Duration::days(ESTIMATED_DELIVERY_DAYS);
        let order = Order::insert(
            &mut tx,
            user_id,
            &draft.items,
            draft.subtotal,
            draft.discount,
            draft.shipping,
            draft.final_amount,
            payment_method,
            &address,
            estimated_delivery,
        )
        .await?;

        Cart::clear_items(&mut *tx, cart.id).await?;
        Cart::deactivate(&mut *tx, cart.id).await?;

        tx.commit().await?;
        info!(
            "Order {} created for user {} ({} items, final amount {})",
            order.order_id, user_id, draft.total_items, order.final_amount
        );

        let items = Order::items(&self.db_pool, order.id).await?;
        Ok(order.to_response(items))
    }

    async fn load_active_lines(&self, user_id: Uuid) -> Result<Vec<CartLine>, AppError> {
        let cart = Cart::find_active(&self.db_pool, user_id)
            .await?
            .ok_or_else(|| AppError::BusinessRule("Cart is empty".to_string()))?;

        let lines = Cart::lines(&self.db_pool, cart.id).await?;
        if lines.is_empty() {
            debug!("Active cart {} has no lines", cart.id);
            return Err(AppError::BusinessRule("Cart is empty".to_string()));
        }

        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_shared::ShippingAddressInput;

    fn line(name: &str, quantity: i32, stock: i32, price: i64, discount: Option<i64>) -> CartLine {
        CartLine {
            item_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            snapshot_price: Decimal::from(price),
            product_name: name.to_string(),
            product_brand: "Acme".to_string(),
            product_price: Decimal::from(price),
            product_discount_price: discount.map(Decimal::from),
            product_images: vec![],
            product_stock: stock,
        }
    }

    fn address_input() -> ShippingAddressInput {
        ShippingAddressInput {
            name: Some("Asha".to_string()),
            phone: Some("9876543210".to_string()),
            address_line1: Some("12 MG Road".to_string()),
            address_line2: None,
            city: Some("Pune".to_string()),
            state: Some("MH".to_string()),
            pincode: Some("411001".to_string()),
            country: None,
        }
    }

    #[test]
    fn shipping_is_flat_fee_up_to_threshold() {
        assert_eq!(shipping_fee(Decimal::from(200)), Decimal::from(40));
        // the threshold itself still pays shipping (strictly greater is free)
        assert_eq!(shipping_fee(Decimal::from(500)), Decimal::from(40));
        assert_eq!(shipping_fee(Decimal::from(501)), Decimal::ZERO);
    }

    #[test]
    fn draft_of_two_unit_line_totals_240() {
        // cart with one line {qty: 2, stock: 5, price: 100}: subtotal 200,
        // shipping 40, final 240
        let lines = vec![line("Widget", 2, 5, 100, None)];
        let draft = build_order_draft(&lines).unwrap();

        assert_eq!(draft.subtotal, Decimal::from(200));
        assert_eq!(draft.shipping, Decimal::from(40));
        assert_eq!(draft.discount, Decimal::ZERO);
        assert_eq!(draft.final_amount, Decimal::from(240));
        assert_eq!(draft.total_items, 2);
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].total_price, Decimal::from(200));
    }

    #[test]
    fn draft_fails_naming_available_stock() {
        let lines = vec![line("Widget", 2, 1, 100, None)];
        let err = build_order_draft(&lines).unwrap_err();
        match err {
            AppError::BusinessRule(msg) => {
                assert!(msg.contains("Insufficient stock for Widget"), "{msg}");
                assert!(msg.contains("Only 1 available"), "{msg}");
            }
            other => panic!("expected business rule error, got {other}"),
        }
    }

    #[test]
    fn draft_of_empty_cart_is_rejected() {
        let err = build_order_draft(&[]).unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(msg) if msg == "Cart is empty"));
    }

    #[test]
    fn draft_recomputes_discounted_prices() {
        // snapshot says 100 but the product now carries an 80 discount; the
        // checkout-time price wins
        let mut l = line("Widget", 1, 5, 100, Some(80));
        l.snapshot_price = Decimal::from(100);
        let draft = build_order_draft(&[l]).unwrap();

        assert_eq!(draft.items[0].price, Decimal::from(80));
        assert_eq!(draft.subtotal, Decimal::from(80));
    }

    #[test]
    fn large_subtotal_ships_free() {
        let lines = vec![line("Widget", 3, 10, 200, None)];
        let draft = build_order_draft(&lines).unwrap();

        assert_eq!(draft.subtotal, Decimal::from(600));
        assert_eq!(draft.shipping, Decimal::ZERO);
        assert_eq!(draft.final_amount, Decimal::from(600));
    }

    #[test]
    fn checkout_input_requires_address_and_method() {
        let err = validate_checkout_input(CheckoutRequest {
            shipping_address: None,
            payment_method: Some(PaymentMethod::Card),
        })
        .unwrap_err();
        assert!(
            matches!(err, AppError::Validation(msg) if msg == "Shipping address and payment method are required")
        );

        let err = validate_checkout_input(CheckoutRequest {
            shipping_address: Some(address_input()),
            payment_method: None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn checkout_input_names_missing_address_fields() {
        let mut address = address_input();
        address.phone = None;
        address.pincode = None;

        let err = validate_checkout_input(CheckoutRequest {
            shipping_address: Some(address),
            payment_method: Some(PaymentMethod::Upi),
        })
        .unwrap_err();

        match err {
            AppError::Validation(msg) => {
                assert!(msg.starts_with("Missing shipping address fields:"), "{msg}");
                assert!(msg.contains("phone"), "{msg}");
                assert!(msg.contains("pincode"), "{msg}");
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn valid_checkout_input_passes() {
        let (address, method) = validate_checkout_input(CheckoutRequest {
            shipping_address: Some(address_input()),
            payment_method: Some(PaymentMethod::Cash),
        })
        .unwrap();

        assert_eq!(address.city, "Pune");
        assert_eq!(address.country, "India");
        assert_eq!(method, PaymentMethod::Cash);
    }
}
