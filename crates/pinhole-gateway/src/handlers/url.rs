use crate::error::{AppError, Result};
use crate::model::{CreateUrlRequest, CreateUrlResponse, GetUrlResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pinhole_core::ShortCode;
use tracing::{debug, error};

pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<CreateUrlResponse>)> {
    if request.original_url.is_empty() {
        return Err(AppError::BadRequest("no URL to shorten".to_string()));
    }

    let code = state.shortener().shorten(&request.original_url).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUrlResponse {
            short_code: code.to_string(),
            short_url: state.short_url(&code),
            original_url: request.original_url,
        }),
    ))
}

pub async fn get_url_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GetUrlResponse>> {
    let code = parse_code(&short_code)?;
    let record = state.shortener().resolve(&code).await?;

    Ok(Json(GetUrlResponse {
        short_code: code.to_string(),
        original_url: record.original_url,
    }))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    let code = parse_code(&short_code)?;
    let record = state.shortener().resolve(&code).await?;

    let location = HeaderValue::from_str(&record.original_url).map_err(|e| {
        error!(index = record.index, error = %e, "stored url is not a valid location header");
        AppError::Internal
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Malformed codes are answered like unknown ones and never reach the codec.
fn parse_code(raw: &str) -> Result<ShortCode> {
    ShortCode::parse(raw).map_err(|e| {
        debug!(short_code = raw, error = %e, "rejecting malformed short code");
        AppError::NotFound
    })
}
