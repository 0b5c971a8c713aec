use rust_decimal::Decimal;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use storefront_shared::{
    AdminProductListQuery, CreateProductRequest, PageMeta, ProductListQuery, ProductListResponse,
    ProductResponse, ReviewRequest, UpdateProductRequest, DEFAULT_PAGE_SIZE,
    DEFAULT_PRODUCT_PAGE_SIZE,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Pagination, Product, ProductFilter, ProductSort};

/// Catalog service: admin product management plus the public storefront
/// views.
#[derive(Clone)]
pub struct ProductService {
    db_pool: PgPool,
    upload_dir: PathBuf,
}

impl ProductService {
    pub fn new(db_pool: PgPool, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_pool,
            upload_dir: upload_dir.into(),
        }
    }

    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, AppError> {
        let product = Product::create(&self.db_pool, &request).await?;
        info!("Created product {} ({})", product.id, product.name);
        Ok(product.to_response(None))
    }

    pub async fn list_admin(
        &self,
        query: AdminProductListQuery,
    ) -> Result<ProductListResponse, AppError> {
        let page = Pagination::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

        let products = Product::list_admin(
            &self.db_pool,
            query.featured,
            query.search.as_deref(),
            page.limit,
            page.offset,
        )
        .await?;
        let total =
            Product::count_admin(&self.db_pool, query.featured, query.search.as_deref()).await?;

        Ok(ProductListResponse {
            pagination: PageMeta::new(page.page, page.limit, total, products.len()),
            products: products.iter().map(|p| p.to_response(None)).collect(),
        })
    }

    pub async fn get_product_admin(&self, id: Uuid) -> Result<ProductResponse, AppError> {
        let product = Product::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        let reviews = Product::reviews(&self.db_pool, id).await?;

        Ok(product.to_response(Some(reviews)))
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, AppError> {
        let existing = Product::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        // the discount invariant must hold against the price after the update
        let new_price = request.price.unwrap_or(existing.price);
        let new_discount = request.discount_price.or(existing.discount_price);
        if let Some(discount) = new_discount {
            if discount > new_price || discount < Decimal::ZERO {
                return Err(AppError::Validation(
                    "Discount price must be <= regular price".to_string(),
                ));
            }
        }

        let product = Product::update(&self.db_pool, id, &request).await?;
        debug!("Updated product {}", id);
        Ok(product.to_response(None))
    }

    /// Deleting a product also removes its media files from the upload
    /// directory; file removal is best-effort.
    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        let product = Product::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        for image in &product.images {
            self.remove_media_file(image).await;
        }

        Product::delete(&self.db_pool, id).await?;
        info!("Deleted product {}", id);
        Ok(())
    }

    pub async fn delete_image(
        &self,
        id: Uuid,
        image_name: &str,
    ) -> Result<ProductResponse, AppError> {
        let product = Product::find_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if !product.images.iter().any(|img| img == image_name) {
            return Err(AppError::NotFound("Image not found".to_string()));
        }

        let product = Product::remove_image(&self.db_pool, id, image_name).await?;
        self.remove_media_file(image_name).await;

        Ok(product.to_response(None))
    }

    pub async fn add_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        request: ReviewRequest,
    ) -> Result<ProductResponse, AppError> {
        let product = Product::find_by_id(&self.db_pool, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        Product::add_review(
            &self.db_pool,
            product.id,
            user_id,
            request.rating,
            request.comment.as_deref(),
        )
        .await?;

        // re-read so the response carries the recomputed rating summary
        let product = Product::find_by_id(&self.db_pool, product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
        let reviews = Product::reviews(&self.db_pool, product_id).await?;

        Ok(product.to_response(Some(reviews)))
    }

    pub async fn list_public(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductListResponse, AppError> {
        let page = Pagination::new(query.page, query.limit, DEFAULT_PRODUCT_PAGE_SIZE);
        let filter = ProductFilter {
            featured: query.featured,
            price_min: query.price_min,
            price_max: query.price_max,
            search: query.search,
            sort: ProductSort::from_query(query.sort.as_deref()),
            limit: page.limit,
            offset: page.offset,
        };

        let products = Product::list(&self.db_pool, &filter).await?;
        let total = Product::count(&self.db_pool, &filter).await?;

        Ok(ProductListResponse {
            pagination: PageMeta::new(page.page, page.limit, total, products.len()),
            products: products.iter().map(|p| p.to_response(None)).collect(),
        })
    }

    pub async fn get_product_public(&self, id: Uuid) -> Result<ProductResponse, AppError> {
        let product = Product::find_available_by_id(&self.db_pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found or unavailable".to_string()))?;
        let reviews = Product::reviews(&self.db_pool, id).await?;

        Ok(product.to_response(Some(reviews)))
    }

    pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<ProductResponse>, AppError> {
        let limit = limit.unwrap_or(10).clamp(1, storefront_shared::MAX_PAGE_SIZE);
        let products = Product::find_featured(&self.db_pool, limit).await?;
        Ok(products.iter().map(|p| p.to_response(None)).collect())
    }

    pub async fn search(
        &self,
        query: &str,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<ProductListResponse, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Search query is required".to_string()));
        }

        let page = Pagination::new(page, limit, DEFAULT_PRODUCT_PAGE_SIZE);
        let products = Product::search(&self.db_pool, query, page.limit, page.offset).await?;
        let total = Product::count_search(&self.db_pool, query).await?;

        Ok(ProductListResponse {
            pagination: PageMeta::new(page.page, page.limit, total, products.len()),
            products: products.iter().map(|p| p.to_response(None)).collect(),
        })
    }

    /// Remove a media file under the upload directory. Only the file name is
    /// honoured so stored names cannot escape the directory.
    async fn remove_media_file(&self, image: &str) {
        let Some(file_name) = Path::new(image).file_name() else {
            return;
        };
        let path = self.upload_dir.join(file_name);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove media file {}: {}", path.display(), e);
            }
        }
    }
}
