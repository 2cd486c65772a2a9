//! Payment gateway callbacks.
//!
//! The gateway posts confirmations either form-encoded or as JSON, so the
//! raw body is taken and decoded by [`GatewayConfirmation::from_body`].

use super::{AppState, extract::AppQuery};
use crate::{
    core::reconcile::{self, GatewayConfirmation},
    errors::Result,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

fn parse_confirmation(headers: &HeaderMap, body: &Bytes) -> Result<GatewayConfirmation> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    GatewayConfirmation::from_body(content_type, body)
}

/// `POST /api/epayco/confirmation` - server-to-server confirmation.
pub async fn confirmation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let confirmation = parse_confirmation(&headers, &body)?;
    let transition = reconcile::apply_confirmation(&state.db, &confirmation).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Order {} is {}", transition.reference_code, transition.status),
    })))
}

/// `POST /api/epayco/response` - browser return with the same fields.
pub async fn response(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let confirmation = parse_confirmation(&headers, &body)?;
    let transition = reconcile::apply_confirmation(&state.db, &confirmation).await?;
    let redirect_url = reconcile::redirect_for(
        &state.config,
        &transition,
        confirmation.x_response_reason_text.as_deref(),
    )?;
    Ok(Json(json!({ "success": true, "redirectUrl": redirect_url })))
}

#[derive(Debug, Deserialize)]
pub struct LandingQuery {
    pub ref_payco: Option<String>,
}

/// `GET /api/epayco/response?ref_payco=...`
pub async fn landing(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<LandingQuery>,
) -> Result<Response> {
    let location = reconcile::landing_redirect(&state.config, query.ref_payco.as_deref())?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
