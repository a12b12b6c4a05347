use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::role::{CreateRoleRequest, PatchRoleRequest, UpdateRoleRequest},
    middleware::CurrentUser,
    utils::{PathParam, ValidatedJson},
    AppState,
};

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn create_role(
    State(state): State<AppState>,
    actor: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.role_service.create(req).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn get_role(
    State(state): State<AppState>,
    PathParam(role_id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.role_service.get(role_id).await?;
    Ok((StatusCode::OK, Json(role)))
}

pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let roles = state.role_service.list().await?;
    Ok((StatusCode::OK, Json(roles)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn update_role(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(role_id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.role_service.update(role_id, req).await?;
    Ok((StatusCode::ACCEPTED, Json(role)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn patch_role(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(role_id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<PatchRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role = state.role_service.patch(role_id, req).await?;
    Ok((StatusCode::ACCEPTED, Json(role)))
}

#[tracing::instrument(skip(state, actor), fields(actor_id = actor.id()))]
pub async fn delete_role(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(role_id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    state.role_service.delete(role_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
