use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::AppError;
use crate::services::AuthService;
use crate::utils::validation::validation_errors_to_app_error;
use storefront_shared::{
    AdminRegisterRequest, ApiResponse, GoogleLoginRequest, LoginRequest, RegisterRequest,
};

pub async fn register(
    request: web::Json<RegisterRequest>,
    auth_service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let auth = auth_service.register(request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("User registered successfully", auth)))
}

pub async fn login(
    request: web::Json<LoginRequest>,
    auth_service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let auth = auth_service.login(request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Login successful", auth)))
}

pub async fn google_login(
    request: web::Json<GoogleLoginRequest>,
    auth_service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let auth = auth_service.google_login(request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Google login successful", auth)))
}

pub async fn register_admin(
    request: web::Json<AdminRegisterRequest>,
    auth_service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let admin = auth_service.register_admin(request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Admin registered successfully", admin)))
}

pub async fn login_admin(
    request: web::Json<LoginRequest>,
    auth_service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate().map_err(validation_errors_to_app_error)?;

    let auth = auth_service.login_admin(request).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Admin logged in successfully", auth)))
}
