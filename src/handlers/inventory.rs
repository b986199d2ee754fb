use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::CurrentUser;
use crate::entities::inventory_item::{self, TrendData};
use crate::errors::ServiceError;
use crate::handlers::common::{created_response, success_response, validate_input};
use crate::services::inventory::{ItemPatch, NewItem};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[validate(custom = "validate_name_not_blank")]
    pub name: String,
    #[validate(range(min = 0, message = "Balance cannot be negative"))]
    pub balance: Option<i32>,
    #[validate(range(min = 1, message = "Minimum stock must be at least 1"))]
    pub min_stock: i32,
    #[schema(value_type = Object)]
    pub trend_data: Option<TrendData>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(custom = "validate_name_not_blank")]
    pub name: Option<String>,
    #[validate(range(min = 0, message = "Balance cannot be negative"))]
    pub balance: Option<i32>,
    #[validate(range(min = 1, message = "Minimum stock must be at least 1"))]
    pub min_stock: Option<i32>,
    #[schema(value_type = Object)]
    pub trend_data: Option<TrendData>,
    pub image_url: Option<String>,
}

/// Signed stock delta applied on top of the current balance.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

/// Item view returned to clients; owner id and raw timestamps stay internal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub item_key: String,
    pub balance: i32,
    pub min_stock: i32,
    #[schema(value_type = Object)]
    pub trend_data: TrendData,
    pub image_url: Option<String>,
}

impl From<inventory_item::Model> for ItemResponse {
    fn from(item: inventory_item::Model) -> Self {
        Self {
            id: item.id,
            name: item.name,
            item_key: item.item_key,
            balance: item.balance,
            min_stock: item.min_stock,
            trend_data: item.trend_data,
            image_url: item.image_url,
        }
    }
}

fn validate_name_not_blank(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Item name is required".into());
        return Err(err);
    }
    Ok(())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/search", get(search_items))
        .route("/low-stock", get(low_stock_items))
        .route(
            "/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/:id/stock", patch(adjust_stock))
}

#[utoipa::path(
    get,
    path = "/api/inventory",
    responses(
        (status = 200, description = "Items owned by the current user", body = [ItemResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.inventory.list_items(current.user_id).await?;
    let items: Vec<ItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item returned", body = ItemResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.inventory.get_item(current.user_id, id).await?;
    Ok(success_response(ItemResponse::from(item)))
}

#[utoipa::path(
    post,
    path = "/api/inventory",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 409, description = "An item with the same key already exists", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    info!(name = %payload.name, "POST /api/inventory");

    let item = state
        .inventory
        .create_item(
            current.user_id,
            NewItem {
                name: payload.name,
                balance: payload.balance,
                min_stock: payload.min_stock,
                trend_data: payload.trend_data,
                image_url: payload.image_url,
            },
        )
        .await?;

    Ok(created_response(ItemResponse::from(item)))
}

#[utoipa::path(
    put,
    path = "/api/inventory/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    info!(item_id = %id, "PUT /api/inventory/{id}");

    let item = state
        .inventory
        .update_item(
            current.user_id,
            id,
            ItemPatch {
                name: payload.name,
                balance: payload.balance,
                min_stock: payload.min_stock,
                trend_data: payload.trend_data,
                image_url: payload.image_url,
            },
        )
        .await?;

    Ok(success_response(ItemResponse::from(item)))
}

#[utoipa::path(
    delete,
    path = "/api/inventory/{id}",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.inventory.delete_item(current.user_id, id).await?;
    info!(item_id = %id, "DELETE /api/inventory/{id}");

    Ok(success_response(json!({
        "message": "Item deleted successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/inventory/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Items matching the query", body = [ItemResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn search_items(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state
        .inventory
        .search_items(current.user_id, &params.query)
        .await?;
    let items: Vec<ItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(success_response(items))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    responses(
        (status = 200, description = "Items at or below their minimum stock", body = [ItemResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn low_stock_items(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ServiceError> {
    let items = state.inventory.low_stock_items(current.user_id).await?;
    let items: Vec<ItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(success_response(items))
}

#[utoipa::path(
    patch,
    path = "/api/inventory/{id}/stock",
    params(("id" = Uuid, Path, description = "Item id")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ItemResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    info!(item_id = %id, delta = payload.quantity, "PATCH /api/inventory/{id}/stock");

    let item = state
        .inventory
        .adjust_stock(current.user_id, id, payload.quantity)
        .await?;
    Ok(success_response(ItemResponse::from(item)))
}
