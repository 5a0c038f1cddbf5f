// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

use crate::{
    auth::{DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks, RequirePermission},
    error::ApiError,
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinkDetailResponse, DrinkMenuResponse,
        UpdateDrinkRequest,
    },
    state::AppState,
};

fn require_title(title: &str) -> Result<&str, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Drink title must not be empty"));
    }
    Ok(title)
}

fn all_drinks(state: &AppState) -> Result<Json<DrinkDetailResponse>, ApiError> {
    Ok(Json(DrinkDetailResponse {
        success: true,
        drinks: state.db.list()?,
    }))
}

#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses(
        (status = 200, description = "Public menu", body = DrinkMenuResponse),
        (status = 500, body = crate::error::ErrorBody)
    )
)]
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinkMenuResponse>, ApiError> {
    let drinks = state.db.list()?;
    Ok(Json(DrinkMenuResponse {
        success: true,
        drinks: drinks.iter().map(|drink| drink.short()).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer_auth" = ["get:drinks-detail"])),
    responses(
        (status = 200, description = "Drinks with full recipes", body = DrinkDetailResponse),
        (status = 400, body = crate::auth::AuthErrorBody),
        (status = 401, body = crate::auth::AuthErrorBody),
        (status = 403, body = crate::auth::AuthErrorBody)
    )
)]
pub async fn list_drinks_detail(
    _auth: RequirePermission<GetDrinksDetail>,
    State(state): State<AppState>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    all_drinks(&state)
}

#[utoipa::path(
    post,
    path = "/drinks",
    request_body = CreateDrinkRequest,
    tag = "Drinks",
    security(("bearer_auth" = ["post:drinks"])),
    responses(
        (status = 200, description = "All drinks after insert", body = DrinkDetailResponse),
        (status = 400, description = "Duplicate or empty title", body = crate::error::ErrorBody),
        (status = 401, body = crate::auth::AuthErrorBody),
        (status = 403, body = crate::auth::AuthErrorBody),
        (status = 422, body = crate::error::ErrorBody)
    )
)]
pub async fn create_drink(
    auth: RequirePermission<PostDrinks>,
    State(state): State<AppState>,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let Json(request) = payload?;
    let title = require_title(&request.title)?;

    let drink = state.db.insert(title, request.recipe.into())?;
    tracing::info!(
        drink_id = drink.id,
        title = %drink.title,
        subject = %auth.claims.subject(),
        "Drink created"
    );

    all_drinks(&state)
}

#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    params(("id" = u64, Path, description = "Drink identifier")),
    request_body = UpdateDrinkRequest,
    tag = "Drinks",
    security(("bearer_auth" = ["patch:drinks"])),
    responses(
        (status = 200, description = "All drinks after update", body = DrinkDetailResponse),
        (status = 400, body = crate::error::ErrorBody),
        (status = 401, body = crate::auth::AuthErrorBody),
        (status = 403, body = crate::auth::AuthErrorBody),
        (status = 404, body = crate::error::ErrorBody),
        (status = 422, body = crate::error::ErrorBody)
    )
)]
pub async fn update_drink(
    auth: RequirePermission<PatchDrinks>,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinkDetailResponse>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let title = match request.title.as_deref() {
        Some(title) => Some(require_title(title)?.to_string()),
        None => None,
    };

    let drink = state.db.update(id, title, request.recipe.map(Into::into))?;
    tracing::info!(drink_id = drink.id, subject = %auth.claims.subject(), "Drink updated");

    all_drinks(&state)
}

#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    params(("id" = u64, Path, description = "Drink identifier")),
    tag = "Drinks",
    security(("bearer_auth" = ["delete:drinks"])),
    responses(
        (status = 200, description = "Drink deleted", body = DeleteDrinkResponse),
        (status = 401, body = crate::auth::AuthErrorBody),
        (status = 403, body = crate::auth::AuthErrorBody),
        (status = 404, body = crate::error::ErrorBody)
    )
)]
pub async fn delete_drink(
    auth: RequirePermission<DeleteDrinks>,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    let Path(id) = id?;

    state.db.delete(id)?;
    tracing::info!(drink_id = id, subject = %auth.claims.subject(), "Drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
