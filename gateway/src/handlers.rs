//! HTTP request handlers.
//!
//! Handlers authenticate the caller, parse the string-typed payload
//! fields into domain ids and dates (unparsable input is
//! `INVALID_INPUT`, never a panic), and delegate to the manager.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use ik_core::types::{
    CreateReservation, HotelId, ReservationFilter, ReservationId, ReservationStatus,
    ReservationUpdate, ServiceId, UserId
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReservationRequest {
    pub room_id: String,
    pub start_date: String,
    pub end_date: String,
    /// Comma-separated service ids, e.g. `"1,2"`.
    #[serde(default)]
    pub services: Option<String>
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationRequest {
    pub id: String,
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// When present, fully replaces the selection; an empty string
    /// clears it.
    #[serde(default)]
    pub services: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub hotel_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String
}

fn parse_field<T: FromStr>(value: &str, field: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ApiError::invalid_input(field, format!("unparsable value: {value}")))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    value
        .parse()
        .map_err(|_| ApiError::invalid_input(field, format!("unparsable date: {value}")))
}

/// Parses a comma-separated service id list; a blank string yields an
/// empty selection.
fn parse_service_list(raw: &str) -> Result<Vec<ServiceId>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|part| parse_field::<ServiceId>(part.trim(), "services"))
        .collect()
}

// -------- lifecycle --------

pub async fn add_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<AddReservationRequest>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;

    let request = CreateReservation {
        room_id: parse_field(&body.room_id, "roomId")?,
        start_date: parse_date(&body.start_date, "startDate")?,
        end_date: parse_date(&body.end_date, "endDate")?,
        service_ids: body
            .services
            .as_deref()
            .map(parse_service_list)
            .transpose()?
            .unwrap_or_default()
    };

    let reservation = state.manager.create_reservation(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn update_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpdateReservationRequest>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let id: ReservationId = parse_field(&body.id, "id")?;

    let update = ReservationUpdate {
        room_id: body
            .room_id
            .as_deref()
            .map(|value| parse_field(value, "roomId"))
            .transpose()?,
        start_date: body
            .start_date
            .as_deref()
            .map(|value| parse_date(value, "startDate"))
            .transpose()?,
        end_date: body
            .end_date
            .as_deref()
            .map(|value| parse_date(value, "endDate"))
            .transpose()?,
        service_ids: body
            .services
            .as_deref()
            .map(parse_service_list)
            .transpose()?
    };

    let reservation = state
        .manager
        .update_reservation(&principal, id, update)
        .await?;
    Ok(Json(reservation))
}

pub async fn delete_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let id: ReservationId = parse_field(&id, "id")?;

    state.manager.delete_reservation(&principal, id).await?;
    Ok(Json(MessageResponse {
        message: "Reservation deleted successfully".to_string()
    }))
}

pub async fn confirm_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let id: ReservationId = parse_field(&id, "id")?;

    let reservation = state.manager.confirm_reservation(&principal, id).await?;
    Ok(Json(reservation))
}

pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let id: ReservationId = parse_field(&id, "id")?;

    let reservation = state.manager.cancel_reservation(&principal, id).await?;
    Ok(Json(reservation))
}

// -------- queries --------

pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let id: ReservationId = parse_field(&id, "id")?;

    let reservation = state.manager.reservation_by_id(&principal, id).await?;
    Ok(Json(reservation))
}

pub async fn get_by_client_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(client_id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let client_id: UserId = parse_field(&client_id, "clientId")?;

    let reservations = state
        .manager
        .reservations_by_client(&principal, client_id)
        .await?;
    Ok(Json(reservations))
}

pub async fn get_by_hotel_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(hotel_id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let hotel_id: HotelId = parse_field(&hotel_id, "hotelId")?;

    let reservations = state
        .manager
        .reservations_by_hotel(&principal, hotel_id)
        .await?;
    Ok(Json(reservations))
}

pub async fn get_all_active(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let reservations = state.manager.active_reservations(&principal).await?;
    Ok(Json(reservations))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;

    let filter = ReservationFilter {
        client_id: params
            .client_id
            .as_deref()
            .map(|value| parse_field(value, "clientId"))
            .transpose()?,
        hotel_id: params
            .hotel_id
            .as_deref()
            .map(|value| parse_field(value, "hotelId"))
            .transpose()?,
        start_after: params
            .start_date
            .as_deref()
            .map(|value| parse_date(value, "startDate"))
            .transpose()?,
        end_before: params
            .end_date
            .as_deref()
            .map(|value| parse_date(value, "endDate"))
            .transpose()?,
        status: params
            .status
            .as_deref()
            .map(|value| parse_field::<ReservationStatus>(value, "status"))
            .transpose()?
    };

    let reservations = state.manager.search(&principal, filter).await?;
    Ok(Json(reservations))
}

pub async fn total_amount_by_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(client_id): Path<String>
) -> Result<impl IntoResponse> {
    let principal = state.verifier.authenticate(&headers)?;
    let client_id: UserId = parse_field(&client_id, "clientId")?;

    let total = state
        .manager
        .total_amount_by_client(&principal, client_id)
        .await?;
    Ok(Json(total))
}

pub async fn reservation_total(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>
) -> Result<impl IntoResponse> {
    let id: ReservationId = parse_field(&id, "id")?;
    let total = state.manager.compute_total(id).await?;
    Ok(Json(total))
}

pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string()
    })
}
