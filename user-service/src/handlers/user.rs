use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::user::{
        ChangePasswordRequest, PatchUserRequest, RegisterRequest, RequestPasswordReset,
        SetPasswordRequest, SetRoleRequest, UpdateUserRequest,
    },
    middleware::CurrentUser,
    utils::{PathParam, ValidatedJson},
    AppState,
};

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.register(&req.email).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn set_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.confirm_email(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn set_role(
    State(state): State<AppState>,
    actor: CurrentUser,
    ValidatedJson(req): ValidatedJson<SetRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.set_role(req).await?;
    Ok((StatusCode::OK, Json(res)))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathParam(user_id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.get(user_id).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list().await?;
    Ok((StatusCode::OK, Json(users)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn update_user(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(user_id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.update(user_id, req).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn patch_user(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(user_id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<PatchUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.patch(user_id, req).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[tracing::instrument(skip(state, actor), fields(actor_id = actor.id()))]
pub async fn delete_user(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(user_id): PathParam<i32>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.delete(user_id).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[tracing::instrument(skip(state, actor, req), fields(actor_id = actor.id()))]
pub async fn change_password(
    State(state): State<AppState>,
    actor: CurrentUser,
    PathParam(user_id): PathParam<i32>,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.change_password(user_id, req).await?;
    Ok((StatusCode::OK, Json(res)))
}

pub async fn request_reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RequestPasswordReset>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.request_password_reset(&req.email).await?;
    Ok((StatusCode::OK, Json(res)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let res = state.user_service.reset_password(req).await?;
    Ok((StatusCode::OK, Json(res)))
}
