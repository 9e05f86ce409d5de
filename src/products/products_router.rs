// src/products/products_router.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use super::products_structs::{
    group_variants, LowStockItem, NewProduct, NewVariant, Product, ProductVariant, UpdateVariant,
};
use crate::error::AppError;
use crate::shared::shared_structs::GenericResponse;
use crate::users::auth_middleware::AuthenticatedUser;
use crate::AppState;

const PRODUCT_COLUMNS: &str = "id, name, description, category, image_url, created_at, updated_at";
const VARIANT_COLUMNS: &str =
    "id, product_id, sku, variant_name, price, stock_quantity, low_stock_threshold, created_at, updated_at";

/// Variants at or below their threshold, lowest stock first.
pub async fn fetch_low_stock(pool: &PgPool) -> Result<Vec<LowStockItem>, sqlx::Error> {
    query_as::<_, LowStockItem>(
        "SELECT v.id, v.sku, v.variant_name, p.name AS product_name, p.category, \
                v.stock_quantity, v.low_stock_threshold, v.price \
         FROM product_variants v JOIN products p ON p.id = v.product_id \
         WHERE v.stock_quantity <= v.low_stock_threshold \
         ORDER BY v.stock_quantity ASC",
    )
    .fetch_all(pool)
    .await
}

/// Every product with its variants, newest product first.
#[get("/products")]
pub async fn list_products(
    data: web::Data<AppState>,
    _caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let products = query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC"
    ))
    .fetch_all(&data.db_pool)
    .await?;

    let variants = query_as::<_, ProductVariant>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM product_variants ORDER BY created_at ASC"
    ))
    .fetch_all(&data.db_pool)
    .await?;

    Ok(HttpResponse::Ok().json(GenericResponse::success(
        "Products listed successfully!",
        group_variants(products, variants),
    )))
}

/// Create a product together with its first variant.
#[post("/products")]
pub async fn create_product(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    form: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;
    form.validate()?;

    // Product and first variant are created together or not at all
    let mut transaction = data.db_pool.begin().await?;

    let product = query_as::<_, Product>(&format!(
        "INSERT INTO products (name, description, category, image_url) \
         VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(form.name.trim())
    .bind(&form.description)
    .bind(form.category)
    .bind(&form.image_url)
    .fetch_one(&mut *transaction)
    .await?;

    let variant = query_as::<_, ProductVariant>(&format!(
        "INSERT INTO product_variants (product_id, variant_name, sku, price, stock_quantity, low_stock_threshold) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VARIANT_COLUMNS}"
    ))
    .bind(product.id)
    .bind(form.variant_name.trim())
    .bind(form.sku.trim())
    .bind(&form.price)
    .bind(form.stock_quantity)
    .bind(form.low_stock_threshold)
    .fetch_one(&mut *transaction)
    .await?;

    transaction.commit().await?;

    tracing::info!(product_id = %product.id, sku = %variant.sku, "product created");
    Ok(HttpResponse::Created().json(GenericResponse::success(
        format!("Product created successfully! ID: {}", product.id),
        super::products_structs::ProductWithVariants {
            product,
            variants: vec![variant],
        },
    )))
}

/// Add a variant to an existing product.
#[post("/variants")]
pub async fn create_variant(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    form: web::Json<NewVariant>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;
    form.validate()?;

    let product_exists = query("SELECT 1 FROM products WHERE id = $1")
        .bind(form.product_id)
        .fetch_optional(&data.db_pool)
        .await?
        .is_some();
    if !product_exists {
        return Err(AppError::NotFound(format!(
            "Product with ID {} not found.",
            form.product_id
        )));
    }

    let variant = query_as::<_, ProductVariant>(&format!(
        "INSERT INTO product_variants (product_id, variant_name, sku, price, stock_quantity, low_stock_threshold) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {VARIANT_COLUMNS}"
    ))
    .bind(form.product_id)
    .bind(form.variant_name.trim())
    .bind(form.sku.trim())
    .bind(&form.price)
    .bind(form.stock_quantity)
    .bind(form.low_stock_threshold)
    .fetch_one(&data.db_pool)
    .await?;

    tracing::info!(variant_id = %variant.id, sku = %variant.sku, "variant created");
    Ok(HttpResponse::Created().json(GenericResponse::success("Variant created successfully!", variant)))
}

/// Partially update a variant; also the manual stock adjustment path.
#[put("/variants/{id}")]
pub async fn update_variant(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    form: web::Json<UpdateVariant>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;
    form.validate()?;
    let id = path.into_inner();

    let variant = query_as::<_, ProductVariant>(&format!(
        "UPDATE product_variants SET \
            variant_name = COALESCE($1, variant_name), \
            sku = COALESCE($2, sku), \
            price = COALESCE($3, price), \
            stock_quantity = COALESCE($4, stock_quantity), \
            low_stock_threshold = COALESCE($5, low_stock_threshold), \
            updated_at = now() \
         WHERE id = $6 RETURNING {VARIANT_COLUMNS}"
    ))
    .bind(form.variant_name.as_deref().map(str::trim))
    .bind(form.sku.as_deref().map(str::trim))
    .bind(&form.price)
    .bind(form.stock_quantity)
    .bind(form.low_stock_threshold)
    .bind(id)
    .fetch_optional(&data.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Variant with ID {id} not found for update.")))?;

    tracing::info!(variant_id = %id, stock = variant.stock_quantity, "variant updated");
    Ok(HttpResponse::Ok().json(GenericResponse::success(
        format!("Variant with ID {id} updated successfully."),
        variant,
    )))
}

/// Delete a variant. Variants with recorded sales are kept for history and yield a conflict.
#[delete("/variants/{id}")]
pub async fn delete_variant(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;
    let id = path.into_inner();

    let result = query("DELETE FROM product_variants WHERE id = $1")
        .bind(id)
        .execute(&data.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Variant with ID {id} not found for deletion."
        )));
    }

    tracing::info!(variant_id = %id, "variant deleted");
    Ok(HttpResponse::Ok().json(GenericResponse::ok(format!(
        "Variant with ID {id} deleted successfully."
    ))))
}

#[get("/variants/low-stock")]
pub async fn list_low_stock(
    data: web::Data<AppState>,
    _caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let items = fetch_low_stock(&data.db_pool).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::success("Low stock variants", items)))
}
