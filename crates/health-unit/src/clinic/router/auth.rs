use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::debug;

use super::SharedService;
use crate::clinic::auth::TokenIssuer;
use crate::clinic::domain::User;
use crate::clinic::service::{ClinicError, LoginRequest};

#[derive(Serialize)]
struct LoginEnvelope {
    success: bool,
    token: String,
    user: User,
}

/// First hop of `X-Forwarded-For`, when a proxy supplied one.
fn origin_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) async fn login(
    State(service): State<SharedService>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ClinicError> {
    let outcome = service.login(&request, origin_ip(&headers))?;
    Ok(Json(LoginEnvelope {
        success: true,
        token: outcome.token,
        user: outcome.user,
    })
    .into_response())
}

/// Reject requests without a valid bearer token, otherwise attach the caller's session.
///
/// A missing token is 401; a token that fails verification is 403.
pub async fn require_session(
    State(tokens): State<Arc<TokenIssuer>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned);

    let Some(token) = token else {
        return ClinicError::Unauthorized.into_response();
    };

    match tokens.verify(&token) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            debug!(error = %err, "bearer token rejected");
            ClinicError::InvalidToken.into_response()
        }
    }
}
