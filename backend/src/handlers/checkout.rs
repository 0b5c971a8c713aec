use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::CheckoutService;
use storefront_shared::{ApiResponse, CheckoutRequest};

pub async fn get_checkout_summary(
    user: AuthenticatedUser,
    checkout_service: web::Data<CheckoutService>,
) -> Result<HttpResponse, AppError> {
    let summary = checkout_service.summary(user.user_id).await?;

    let out_of_stock: Vec<_> = summary.items.iter().filter(|i| !i.in_stock).cloned().collect();
    if !out_of_stock.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::failure_with_data(
            "Some items are out of stock",
            serde_json::json!({
                "out_of_stock": out_of_stock,
                "summary": summary,
            }),
        )));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Checkout summary retrieved successfully",
        summary,
    )))
}

pub async fn validate_cart(
    user: AuthenticatedUser,
    checkout_service: web::Data<CheckoutService>,
) -> Result<HttpResponse, AppError> {
    let validation = checkout_service.validate(user.user_id).await?;

    let message = if validation.valid {
        "Cart is valid for checkout"
    } else {
        "Cart has issues"
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(message, validation)))
}

pub async fn create_order(
    user: AuthenticatedUser,
    request: web::Json<CheckoutRequest>,
    checkout_service: web::Data<CheckoutService>,
) -> Result<HttpResponse, AppError> {
    let order = checkout_service
        .create_order(user.user_id, request.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok("Order created successfully", order)))
}
