use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};

use crate::error::AppError;
use crate::utils::jwt::{Claims, JwtService};
use storefront_shared::UserRole;

/// Authenticated user information extracted from JWT token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = uuid::Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Internal("Invalid user ID in claims".to_string()))?;

        Ok(Self {
            user_id,
            name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}

impl actix_web::FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<Claims>().cloned();
        ready(match claims {
            Some(claims) => AuthenticatedUser::from_claims(&claims),
            None => Err(AppError::Internal("Claims not found in request".to_string())),
        })
    }
}

pub struct AuthMiddleware {
    jwt_service: Arc<JwtService>,
    required_role: Option<UserRole>,
}

impl AuthMiddleware {
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self {
            jwt_service,
            required_role: None,
        }
    }

    pub fn require_role(mut self, role: UserRole) -> Self {
        self.required_role = Some(role);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            jwt_service: self.jwt_service.clone(),
            required_role: self.required_role,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    jwt_service: Arc<JwtService>,
    required_role: Option<UserRole>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let jwt_service = self.jwt_service.clone();
        let required_role = self.required_role;

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            let token = match auth_header {
                Some(token) => token,
                None => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "success": false,
                        "message": "Authorization token is required",
                        "error": "missing_token"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            let claims = match jwt_service.validate_token(token) {
                Ok(claims) => claims,
                Err(e) => {
                    let response = HttpResponse::Unauthorized().json(serde_json::json!({
                        "success": false,
                        "message": e.to_string(),
                        "error": "invalid_token"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            };

            if claims.token_type != "access" {
                let response = HttpResponse::Unauthorized().json(serde_json::json!({
                    "success": false,
                    "message": "Access token required",
                    "error": "invalid_token_type"
                }));
                return Ok(req.into_response(response).map_into_right_body());
            }

            if let Some(required_role) = required_role {
                if !has_required_role(claims.role, required_role) {
                    let response = HttpResponse::Forbidden().json(serde_json::json!({
                        "success": false,
                        "message": "Insufficient permissions for this operation",
                        "error": "insufficient_permissions"
                    }));
                    return Ok(req.into_response(response).map_into_right_body());
                }
            }

            req.extensions_mut().insert(claims);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Admins can reach customer-level endpoints; customers cannot reach
/// admin-level ones.
fn has_required_role(user_role: UserRole, required_role: UserRole) -> bool {
    match required_role {
        UserRole::Customer => true,
        UserRole::Admin => matches!(user_role, UserRole::Admin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::JwtService;
    use actix_web::{web, App, HttpResponse};
    use actix_web::test as test_util;
    use uuid::Uuid;

    async fn test_handler() -> Result<HttpResponse, Error> {
        Ok(HttpResponse::Ok().json(serde_json::json!({"message": "success"})))
    }

    fn setup_jwt_service() -> Arc<JwtService> {
        Arc::new(
            JwtService::from_secret("test-secret-key-for-testing-only-1234")
                .expect("Failed to create JWT service"),
        )
    }

    #[actix_web::test]
    async fn missing_token_is_unauthorized() {
        let jwt_service = setup_jwt_service();
        let app = test_util::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service))
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test_util::TestRequest::get().uri("/test").to_request();
        let resp = test_util::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn valid_token_passes_through() {
        let jwt_service = setup_jwt_service();
        let token = jwt_service
            .generate_access_token(
                Uuid::new_v4(),
                "testuser".to_string(),
                Some("test@example.com".to_string()),
                UserRole::Customer,
            )
            .expect("Failed to generate token");

        let app = test_util::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service))
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test_util::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test_util::call_service(&app, req).await;

        assert_eq!(resp.status(), 200);
    }

    #[actix_web::test]
    async fn refresh_token_cannot_access_api() {
        let jwt_service = setup_jwt_service();
        let token = jwt_service
            .generate_refresh_token(Uuid::new_v4(), "testuser".to_string(), None, UserRole::Customer)
            .expect("Failed to generate token");

        let app = test_util::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service))
                .route("/test", web::get().to(test_handler)),
        )
        .await;

        let req = test_util::TestRequest::get()
            .uri("/test")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test_util::call_service(&app, req).await;

        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn customer_is_forbidden_from_admin_routes() {
        let jwt_service = setup_jwt_service();
        let token = jwt_service
            .generate_access_token(
                Uuid::new_v4(),
                "testuser".to_string(),
                Some("test@example.com".to_string()),
                UserRole::Customer,
            )
            .expect("Failed to generate token");

        let app = test_util::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt_service).require_role(UserRole::Admin))
                .route("/admin", web::get().to(test_handler)),
        )
        .await;

        let req = test_util::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test_util::call_service(&app, req).await;

        assert_eq!(resp.status(), 403);
    }

    #[test]
    fn role_hierarchy() {
        assert!(has_required_role(UserRole::Customer, UserRole::Customer));
        assert!(has_required_role(UserRole::Admin, UserRole::Customer));
        assert!(!has_required_role(UserRole::Customer, UserRole::Admin));
        assert!(has_required_role(UserRole::Admin, UserRole::Admin));
    }
}
