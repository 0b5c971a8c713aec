use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::AuthenticatedUser;
use crate::services::ProductService;
use crate::utils::validation::validation_errors_to_app_error;
use storefront_shared::{
    AdminProductListQuery, ApiResponse, CreateProductRequest, DeleteImageRequest,
    ProductListQuery, ReviewRequest, UpdateProductRequest,
};

#[derive(Debug, Deserialize)]
pub struct FeaturedQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchPageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// Admin catalog management

pub async fn create_product(
    request: web::Json<CreateProductRequest>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let product = product_service.create_product(request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Product created successfully", product)))
}

pub async fn get_all_products_admin(
    query: web::Query<AdminProductListQuery>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let list = product_service.list_admin(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Products retrieved successfully", list)))
}

pub async fn get_product_admin(
    product_id: web::Path<Uuid>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let product = product_service.get_product_admin(*product_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Product retrieved successfully", product)))
}

pub async fn update_product(
    product_id: web::Path<Uuid>,
    request: web::Json<UpdateProductRequest>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let product = product_service.update_product(*product_id, request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Product updated successfully", product)))
}

pub async fn delete_product(
    product_id: web::Path<Uuid>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    product_service.delete_product(*product_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Product deleted successfully")))
}

pub async fn delete_image(
    product_id: web::Path<Uuid>,
    request: web::Json<DeleteImageRequest>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let product = product_service
        .delete_image(*product_id, &request.image_name)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Image deleted successfully", product)))
}

// Public storefront

pub async fn get_all_products(
    query: web::Query<ProductListQuery>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let list = product_service.list_public(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Products retrieved successfully", list)))
}

pub async fn get_featured_products(
    query: web::Query<FeaturedQuery>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let products = product_service.featured(query.limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Featured products retrieved successfully",
        products,
    )))
}

pub async fn search_products(
    query: web::Path<String>,
    page: web::Query<SearchPageQuery>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let list = product_service
        .search(&query, page.page, page.limit)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(
        "Search results retrieved successfully",
        list,
    )))
}

pub async fn get_product(
    product_id: web::Path<Uuid>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let product = product_service.get_product_public(*product_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Product retrieved successfully", product)))
}

pub async fn add_review(
    user: AuthenticatedUser,
    product_id: web::Path<Uuid>,
    request: web::Json<ReviewRequest>,
    product_service: web::Data<ProductService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let product = product_service
        .add_review(*product_id, user.user_id, request)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Review added successfully", product)))
}
