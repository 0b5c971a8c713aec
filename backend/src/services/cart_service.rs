use sqlx::PgPool;
use storefront_shared::{CartLineResponse, CartProductInfo, CartResponse};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{cart_totals, Cart, CartItem, CartLine, Product};

/// Shopping cart service. A user has at most one active cart; totals are
/// recomputed from the line items on every read.
#[derive(Clone)]
pub struct CartService {
    db_pool: PgPool,
}

impl CartService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// The user's active cart, or `None` when they have none (the handler
    /// renders that as an empty-cart placeholder, not an error).
    pub async fn get_cart(&self, user_id: Uuid) -> Result<Option<CartResponse>, AppError> {
        let Some(cart) = Cart::find_active(&self.db_pool, user_id).await? else {
            return Ok(None);
        };

        Ok(Some(self.render_cart(cart.id, true).await?))
    }

    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartResponse, AppError> {
        let product = Product::find_purchasable(&self.db_pool, product_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Product not found or out of stock".to_string())
            })?;

        if product.stock < quantity {
            return Err(AppError::BusinessRule(format!(
                "Only {} items available in stock",
                product.stock
            )));
        }

        // refreshed on every add so the snapshot tracks seller price edits
        let current_price = product.effective_price();

        let cart = match Cart::find_active(&self.db_pool, user_id).await? {
            Some(cart) => cart,
            None => {
                debug!("Creating new active cart for user {}", user_id);
                Cart::create(&self.db_pool, user_id).await?
            }
        };

        match CartItem::find_by_product(&self.db_pool, cart.id, product_id).await? {
            Some(existing) => {
                let merged = existing.quantity + quantity;
                if merged > product.stock {
                    return Err(AppError::BusinessRule(format!(
                        "Cannot add more than available stock ({})",
                        product.stock
                    )));
                }
                CartItem::set_quantity_and_price(&self.db_pool, existing.id, merged, current_price)
                    .await?;
            }
            None => {
                CartItem::insert(&self.db_pool, cart.id, product_id, quantity, current_price)
                    .await?;
            }
        }

        Cart::touch(&self.db_pool, cart.id).await?;
        debug!("Added {}x{} to cart {}", quantity, product_id, cart.id);

        self.render_cart(cart.id, true).await
    }

    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartResponse, AppError> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let cart = Cart::find_active(&self.db_pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        let item = CartItem::find(&self.db_pool, cart.id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart item not found".to_string()))?;

        let product = Product::find_by_id(&self.db_pool, item.product_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Product not found or out of stock".to_string())
            })?;

        if product.stock < quantity {
            return Err(AppError::BusinessRule(format!(
                "Only {} items available in stock",
                product.stock
            )));
        }

        CartItem::set_quantity_and_price(&self.db_pool, item.id, quantity, product.effective_price())
            .await?;
        Cart::touch(&self.db_pool, cart.id).await?;

        self.render_cart(cart.id, true).await
    }

    /// Removing the last line item deactivates the cart: an empty cart is
    /// not a valid active cart.
    pub async fn remove_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartResponse, AppError> {
        let cart = Cart::find_active(&self.db_pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        CartItem::delete(&self.db_pool, cart.id, item_id).await?;

        let remaining = CartItem::count(&self.db_pool, cart.id).await?;
        let still_active = remaining > 0;
        if still_active {
            Cart::touch(&self.db_pool, cart.id).await?;
        } else {
            debug!("Cart {} emptied, deactivating", cart.id);
            Cart::deactivate(&self.db_pool, cart.id).await?;
        }

        self.render_cart(cart.id, still_active).await
    }

    /// Idempotent: clearing when no active cart exists reports `false` and
    /// the handler answers "already empty".
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<bool, AppError> {
        let Some(cart) = Cart::find_active(&self.db_pool, user_id).await? else {
            return Ok(false);
        };

        Cart::clear_items(&self.db_pool, cart.id).await?;
        Cart::deactivate(&self.db_pool, cart.id).await?;
        info!("Cleared cart {} for user {}", cart.id, user_id);

        Ok(true)
    }

    async fn render_cart(&self, cart_id: Uuid, is_active: bool) -> Result<CartResponse, AppError> {
        let lines = Cart::lines(&self.db_pool, cart_id).await?;
        let (total_amount, total_items) = cart_totals(&lines);

        Ok(CartResponse {
            items: lines.into_iter().map(render_line).collect(),
            total_amount,
            total_items,
            is_active,
        })
    }
}

fn render_line(line: CartLine) -> CartLineResponse {
    let line_total = line.snapshot_price * rust_decimal::Decimal::from(line.quantity);
    CartLineResponse {
        id: line.item_id,
        product: CartProductInfo {
            id: line.product_id,
            name: line.product_name,
            brand: line.product_brand,
            images: line.product_images,
            price: line.product_price,
            discount_price: line.product_discount_price,
        },
        quantity: line.quantity,
        price: line.snapshot_price,
        line_total,
    }
}
