use axum::{
    Json,
    body::Body,
    extract::FromRequestParts,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::auth::claims::{AuthUser, Role};
use crate::response::ApiResponse;

#[derive(serde::Serialize, Default)]
pub struct Empty;

/// Helper to extract and validate the user from request headers, then stash
/// the claims in extensions for the handler.
async fn extract_and_insert_authuser(
    req: Request<Body>,
) -> Result<(Request<Body>, AuthUser), (StatusCode, Json<ApiResponse<Empty>>)> {
    let (mut parts, body) = req.into_parts();
    let user = AuthUser::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Authentication required")),
            )
        })?;

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(user.clone());
    Ok((req, user))
}

/// Basic guard to ensure the request is authenticated.
pub async fn allow_authenticated(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, _user) = extract_and_insert_authuser(req).await?;
    Ok(next.run(req).await)
}

/// Role guard shared by the two role-specific wrappers.
async fn allow_role(
    req: Request<Body>,
    next: Next,
    required: Role,
    failure_msg: &str,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    let (req, user) = extract_and_insert_authuser(req).await?;

    if user.0.role != required {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(failure_msg)),
        ));
    }

    Ok(next.run(req).await)
}

/// Presenter-only endpoints: opening, ending and inspecting sessions.
pub async fn require_presenter(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role(req, next, Role::Presenter, "Presenter access required").await
}

/// Student-only endpoints: check-in, reconciliation, personal stats.
pub async fn require_student(
    req: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ApiResponse<Empty>>)> {
    allow_role(req, next, Role::Student, "Only students may record attendance").await
}
