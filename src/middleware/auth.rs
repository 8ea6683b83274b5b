use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::Error;
use crate::policy::Principal;
use crate::AppState;

/// Attaches a [`Principal`] to every request.
///
/// No `Authorization` header means an anonymous caller. A header that is not
/// a valid bearer access token for an active user is rejected outright.
pub async fn resolve_principal(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match req.headers().get(AUTHORIZATION) {
        None => Principal::Anonymous,
        Some(value) => {
            let Ok(raw) = value.to_str() else {
                return Error::Unauthenticated("bad authorization header").into_response();
            };
            let Some(token) = raw.strip_prefix("Bearer ") else {
                return Error::Unauthenticated("unsupported authorization scheme").into_response();
            };
            match state.accounts.principal_from_token(token.trim()).await {
                Ok(principal) => principal,
                Err(e) => return e.into_response(),
            }
        }
    };
    req.extensions_mut().insert(principal);
    next.run(req).await
}
