use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, Level};

mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

use config::AppConfig;
use database::{Database, DatabaseConfig};
use error::AppError;
use middleware::auth::AuthMiddleware;
use storefront_shared::UserRole;
use utils::jwt::JwtService;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Starting Storefront Backend on {}:{}", config.host, config.port);

    // Initialize database
    let database = Database::new(DatabaseConfig::with_url(&config.database_url)).await?;

    // Run migrations
    database.migrate().await?;

    // Initialize JWT service
    let jwt_service = Arc::new(JwtService::new()?);

    // Initialize services
    let auth_service = services::AuthService::new(
        database.pool().clone(),
        jwt_service.clone(),
        config.google_client_id.clone(),
    );
    let product_service =
        services::ProductService::new(database.pool().clone(), config.upload_dir.clone());
    let cart_service = services::CartService::new(database.pool().clone());
    let checkout_service = services::CheckoutService::new(database.pool().clone());
    let order_service = services::OrderService::new(database.pool().clone());

    let host = config.host.clone();
    let port = config.port;

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(product_service.clone()))
            .app_data(web::Data::new(cart_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .service(handlers::health::health_check)
            .service(
                web::scope("/user")
                    .route("/register", web::post().to(handlers::auth::register))
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/google", web::post().to(handlers::auth::google_login)),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(handlers::auth::register_admin))
                            .route("/login", web::post().to(handlers::auth::login_admin)),
                    )
                    .service(
                        web::scope("/product")
                            .wrap(
                                AuthMiddleware::new(jwt_service.clone())
                                    .require_role(UserRole::Admin),
                            )
                            .route("/create", web::post().to(handlers::products::create_product))
                            .route(
                                "/view",
                                web::get().to(handlers::products::get_all_products_admin),
                            )
                            .route(
                                "/view/{product_id}",
                                web::get().to(handlers::products::get_product_admin),
                            )
                            .route(
                                "/update/{product_id}",
                                web::patch().to(handlers::products::update_product),
                            )
                            .route(
                                "/delete/{product_id}",
                                web::delete().to(handlers::products::delete_product),
                            )
                            .route(
                                "/delete-image/{product_id}",
                                web::delete().to(handlers::products::delete_image),
                            )
                            .route(
                                "/{product_id}/reviews",
                                web::post().to(handlers::products::add_review),
                            ),
                    )
                    .service(
                        web::scope("/orders")
                            .wrap(
                                AuthMiddleware::new(jwt_service.clone())
                                    .require_role(UserRole::Admin),
                            )
                            .route(
                                "/{order_id}/status",
                                web::patch().to(handlers::orders::update_order),
                            ),
                    ),
            )
            .service(
                web::scope("/product")
                    // Public endpoints
                    .route("", web::get().to(handlers::products::get_all_products))
                    .route(
                        "/featured",
                        web::get().to(handlers::products::get_featured_products),
                    )
                    .route(
                        "/search/{query}",
                        web::get().to(handlers::products::search_products),
                    )
                    .route(
                        "/{product_id}",
                        web::get().to(handlers::products::get_product),
                    )
                    // Protected endpoints
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware::new(jwt_service.clone()))
                            .route(
                                "/{product_id}/reviews",
                                web::post().to(handlers::products::add_review),
                            ),
                    ),
            )
            .service(
                web::scope("/cart")
                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                    .route("", web::get().to(handlers::cart::get_cart))
                    .route("/add", web::post().to(handlers::cart::add_to_cart))
                    .route(
                        "/update/{item_id}",
                        web::patch().to(handlers::cart::update_cart_item),
                    )
                    .route(
                        "/remove/{item_id}",
                        web::delete().to(handlers::cart::remove_from_cart),
                    )
                    .route("/clear", web::delete().to(handlers::cart::clear_cart)),
            )
            .service(
                web::scope("/checkout")
                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                    .route(
                        "/summary",
                        web::get().to(handlers::checkout::get_checkout_summary),
                    )
                    .route(
                        "/validate",
                        web::post().to(handlers::checkout::validate_cart),
                    )
                    .route(
                        "/create-order",
                        web::post().to(handlers::checkout::create_order),
                    ),
            )
            .service(
                web::scope("/order")
                    .wrap(AuthMiddleware::new(jwt_service.clone()))
                    .route("", web::get().to(handlers::orders::get_user_orders))
                    .route(
                        "/statistics",
                        web::get().to(handlers::orders::get_order_statistics),
                    )
                    .route(
                        "/{order_id}",
                        web::get().to(handlers::orders::get_order_details),
                    )
                    .route(
                        "/{order_id}/status",
                        web::get().to(handlers::orders::get_order_status),
                    )
                    .route(
                        "/{order_id}/track",
                        web::get().to(handlers::orders::track_order),
                    )
                    .route(
                        "/{order_id}/cancel",
                        web::patch().to(handlers::orders::cancel_order),
                    ),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
    .map_err(AppError::from)
}
