use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::CartService;
use crate::utils::validation::validation_errors_to_app_error;
use storefront_shared::{AddToCartRequest, ApiResponse, CartResponse, UpdateCartItemRequest};

pub async fn get_cart(
    user: AuthenticatedUser,
    cart_service: web::Data<CartService>,
) -> Result<HttpResponse, AppError> {
    match cart_service.get_cart(user.user_id).await? {
        Some(cart) => {
            Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart retrieved successfully", cart)))
        }
        None => Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart is empty", CartResponse::empty()))),
    }
}

pub async fn add_to_cart(
    user: AuthenticatedUser,
    request: web::Json<AddToCartRequest>,
    cart_service: web::Data<CartService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let quantity = request.quantity.unwrap_or(1);
    let cart = cart_service
        .add_to_cart(user.user_id, request.product_id, quantity)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Product added to cart successfully", cart)))
}

pub async fn update_cart_item(
    user: AuthenticatedUser,
    item_id: web::Path<Uuid>,
    request: web::Json<UpdateCartItemRequest>,
    cart_service: web::Data<CartService>,
) -> Result<HttpResponse, AppError> {
    let cart = cart_service
        .update_item(user.user_id, *item_id, request.quantity)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok("Cart updated successfully", cart)))
}

pub async fn remove_from_cart(
    user: AuthenticatedUser,
    item_id: web::Path<Uuid>,
    cart_service: web::Data<CartService>,
) -> Result<HttpResponse, AppError> {
    let cart = cart_service.remove_item(user.user_id, *item_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Item removed from cart successfully",
        cart,
    )))
}

pub async fn clear_cart(
    user: AuthenticatedUser,
    cart_service: web::Data<CartService>,
) -> Result<HttpResponse, AppError> {
    let cleared = cart_service.clear_cart(user.user_id).await?;

    let message = if cleared {
        "Cart cleared successfully"
    } else {
        "Cart is already empty"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::message(message)))
}
