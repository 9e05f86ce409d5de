// src/sales/sales_router.rs

use actix_web::{get, post, web, HttpResponse};
use sqlx::query_as;
use uuid::Uuid;

use super::sales_structs::{
    attach_items, summarize, RecordSaleRequest, SaleHeaderRow, SaleItemDetail, SalesPage, SalesQuery,
};
use crate::error::AppError;
use crate::shared::shared_structs::GenericResponse;
use crate::users::auth_middleware::AuthenticatedUser;
use crate::AppState;

/// Record a sale for the authenticated seller.
///
/// The cart comes from the client; see `SaleRecorder::record_sale` for the
/// validation and stock rules.
#[post("/sales")]
pub async fn record_sale(
    data: web::Data<AppState>,
    seller: AuthenticatedUser,
    request: web::Json<RecordSaleRequest>,
) -> Result<HttpResponse, AppError> {
    let sale = data.recorder.record_sale(&request.items, &seller).await?;

    Ok(HttpResponse::Created().json(GenericResponse::success("Sale recorded successfully!", sale)))
}

/// Sales with their items, newest first. Staff only see their own sales.
#[get("/sales")]
pub async fn list_sales(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    params: web::Query<SalesQuery>,
) -> Result<HttpResponse, AppError> {
    if params.limit.is_some_and(|l| l <= 0) {
        return Err(AppError::Validation("limit must be positive".into()));
    }
    let seller_filter: Option<Uuid> = (!caller.is_admin()).then_some(caller.user_id);

    let headers = query_as::<_, SaleHeaderRow>(
        "SELECT s.id, s.user_id, u.name AS seller_name, s.total_amount, s.created_at \
         FROM sales s JOIN users u ON u.id = s.user_id \
         WHERE ($1::uuid IS NULL OR s.user_id = $1) \
         ORDER BY s.created_at DESC \
         LIMIT $2",
    )
    .bind(seller_filter)
    .bind(params.limit)
    .fetch_all(&data.db_pool)
    .await?;

    let sale_ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
    let items = query_as::<_, SaleItemDetail>(
        "SELECT si.id, si.sale_id, si.variant_id, si.quantity_sold, si.price_at_sale, \
                v.sku, v.variant_name, p.name AS product_name, p.category \
         FROM sale_items si \
         JOIN product_variants v ON v.id = si.variant_id \
         JOIN products p ON p.id = v.product_id \
         WHERE si.sale_id = ANY($1) \
         ORDER BY si.line_number ASC",
    )
    .bind(&sale_ids)
    .fetch_all(&data.db_pool)
    .await?;

    let sales = attach_items(headers, items);
    let summary = summarize(&sales);

    Ok(HttpResponse::Ok().json(GenericResponse::success(
        "Sales listed successfully!",
        SalesPage { summary, sales },
    )))
}
