// src/dashboard/dashboard_router.rs

use actix_web::{get, web, HttpResponse};
use sqlx::{query_as, PgPool};

use super::dashboard_structs::{
    best_selling, chart_series, compute_stats, ChartQuery, Dashboard, SaleTotalRow, SoldItemRow,
    BEST_SELLING_LIMIT,
};
use crate::error::AppError;
use crate::products::products_router::fetch_low_stock;
use crate::shared::shared_structs::GenericResponse;
use crate::users::auth_middleware::AuthenticatedUser;
use crate::AppState;

async fn fetch_sale_totals(pool: &PgPool) -> Result<Vec<SaleTotalRow>, sqlx::Error> {
    query_as::<_, SaleTotalRow>("SELECT total_amount, created_at FROM sales ORDER BY created_at")
        .fetch_all(pool)
        .await
}

async fn fetch_sold_items(pool: &PgPool) -> Result<Vec<SoldItemRow>, sqlx::Error> {
    query_as::<_, SoldItemRow>(
        "SELECT si.variant_id, v.variant_name, p.name AS product_name, p.category, \
                si.quantity_sold, si.price_at_sale \
         FROM sale_items si \
         JOIN product_variants v ON v.id = si.variant_id \
         JOIN products p ON p.id = v.product_id",
    )
    .fetch_all(pool)
    .await
}

/// Revenue, sales count, units sold, best sellers and low-stock alerts. Admin only.
#[get("/dashboard")]
pub async fn dashboard(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;

    let sales = fetch_sale_totals(&data.db_pool).await?;
    let items = fetch_sold_items(&data.db_pool).await?;
    let low_stock_alerts = fetch_low_stock(&data.db_pool).await?;

    let body = Dashboard {
        stats: compute_stats(&sales, &items, low_stock_alerts.len()),
        best_selling: best_selling(&items, BEST_SELLING_LIMIT),
        low_stock_alerts,
    };
    Ok(HttpResponse::Ok().json(GenericResponse::success("Dashboard", body)))
}

/// Revenue and sale count per day or month. Admin only.
#[get("/dashboard/chart")]
pub async fn sales_chart(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    params: web::Query<ChartQuery>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;

    let sales = fetch_sale_totals(&data.db_pool).await?;
    Ok(HttpResponse::Ok().json(GenericResponse::success(
        "Sales chart",
        chart_series(&sales, params.range),
    )))
}
