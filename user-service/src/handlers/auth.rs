use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{LoginForm, RefreshRequest},
    utils::{Password, ValidatedForm, ValidatedJson},
    AppState,
};

#[tracing::instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedForm(form): ValidatedForm<LoginForm>,
) -> Result<impl IntoResponse, AppError> {
    let requested = form.requested_scopes();
    let password = Password::new(form.password);

    let tokens = state
        .auth_service
        .login(&form.username, &password, &requested)
        .await?;

    Ok((StatusCode::OK, Json(tokens)))
}

pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tokens = state.auth_service.refresh(&req.refresh_token).await?;
    Ok((StatusCode::OK, Json(tokens)))
}
