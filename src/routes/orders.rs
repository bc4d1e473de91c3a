use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AdminGuard, AppState};
use crate::error::ApiError;
use crate::models::{CreateOrderRequest, OrderCreatedResponse, OrdersQuery, UpdateOrderStatusRequest};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::post().to(create_order))
        .route("/admin/orders", web::get().to(list_orders))
        .route("/admin/orders/{id}/status", web::put().to(update_order_status));
}

/// Lead form submission
///
/// POST /api/v1/orders
async fn create_order(
    state: web::Data<AppState>,
    req: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let order_id = state.postgres.create_order(&req).await?;

    Ok(HttpResponse::Created().json(OrderCreatedResponse {
        success: true,
        order_id,
        message: "Заявка принята, мы свяжемся с вами в ближайшее время".to_string(),
    }))
}

async fn list_orders(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    query: web::Query<OrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    let orders = state.postgres.list_orders(query.status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn update_order_status(
    _admin: AdminGuard,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    req: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state.postgres.update_order_status(path.into_inner(), req.status).await?;
    tracing::info!("Order {} moved to {:?}", order.id, order.status);
    Ok(HttpResponse::Ok().json(order))
}
