// src/admin/handlers/sellers.rs

use crate::admin::models::{
    SellerListQuery, SellerListResponse, SellerStatusResponse, UpdateSellerStatusRequest,
};
use crate::admin::validators::UpdateSellerStatusValidator;
use crate::auth::models::{permissions, SellerStatus};
use crate::auth::AdminSession;
use crate::common::{ApiError, AppState, Validator};
use crate::seller::services::SellerService;
use axum::extract::{Extension, Json, Path, Query};
use std::sync::Arc;
use tracing::info;

/// GET /api/admin/sellers?status= - List seller accounts
pub async fn list_sellers(
    Extension(state): Extension<Arc<AppState>>,
    admin: AdminSession,
    Query(query): Query<SellerListQuery>,
) -> Result<Json<SellerListResponse>, ApiError> {
    admin.require(permissions::SELLERS_READ)?;

    let status = match query.status.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<SellerStatus>()
                .map_err(ApiError::ValidationError)?,
        ),
        _ => None,
    };

    let sellers = SellerService::new(state.db.clone()).list(status).await?;

    Ok(Json(SellerListResponse {
        success: true,
        total: sellers.len(),
        sellers,
    }))
}

/// PATCH /api/admin/sellers/:id/status - Approve, suspend or reject a seller
pub async fn update_seller_status(
    Extension(state): Extension<Arc<AppState>>,
    admin: AdminSession,
    Path(seller_id): Path<String>,
    Json(request): Json<UpdateSellerStatusRequest>,
) -> Result<Json<SellerStatusResponse>, ApiError> {
    admin.require(permissions::SELLERS_APPROVE)?;
    UpdateSellerStatusValidator.validate(&request).into_result()?;

    let status = request
        .status
        .parse::<SellerStatus>()
        .map_err(ApiError::ValidationError)?;

    let seller = SellerService::new(state.db.clone())
        .update_status(&seller_id, status)
        .await?;

    info!(
        seller_id = %seller.id,
        status = %status.as_str(),
        admin_id = %admin.0.user_id,
        reason = ?request.reason,
        "Seller status updated"
    );

    Ok(Json(SellerStatusResponse {
        success: true,
        seller,
    }))
}
