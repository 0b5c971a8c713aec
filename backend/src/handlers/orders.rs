use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::OrderService;
use storefront_shared::{ApiResponse, OrderListQuery, UpdateOrderStatusRequest};

pub async fn get_user_orders(
    user: AuthenticatedUser,
    query: web::Query<OrderListQuery>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let orders = order_service
        .list_orders(user.user_id, query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Orders retrieved successfully", orders)))
}

pub async fn get_order_statistics(
    user: AuthenticatedUser,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let statistics = order_service.statistics(user.user_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Order statistics retrieved successfully",
        statistics,
    )))
}

pub async fn get_order_details(
    user: AuthenticatedUser,
    order_id: web::Path<Uuid>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service.get_order(user.user_id, *order_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Order details retrieved successfully",
        order,
    )))
}

pub async fn get_order_status(
    user: AuthenticatedUser,
    order_id: web::Path<Uuid>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let status = order_service.get_status(user.user_id, *order_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Order status retrieved successfully",
        status,
    )))
}

pub async fn track_order(
    user: AuthenticatedUser,
    order_id: web::Path<Uuid>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let tracking = order_service.track(user.user_id, *order_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Order tracking retrieved successfully",
        tracking,
    )))
}

pub async fn cancel_order(
    user: AuthenticatedUser,
    order_id: web::Path<Uuid>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service.cancel(user.user_id, *order_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Order cancelled successfully", order)))
}

/// Admin fulfilment update: status transitions plus direct payment-status
/// changes.
pub async fn update_order(
    order_id: web::Path<Uuid>,
    request: web::Json<UpdateOrderStatusRequest>,
    order_service: web::Data<OrderService>,
) -> Result<HttpResponse, AppError> {
    let order = order_service
        .admin_update(*order_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Order updated successfully", order)))
}
