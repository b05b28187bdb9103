// SPDX-FileCopyrightText: 2026 Clinicbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the admin REST API.

use std::collections::{BTreeMap, BTreeSet};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use clinicbot_core::types::{
    Contact, ContactFilter, ContactProfile, ConversationEntry, MessageTemplate, NewTemplate,
    TemplateFilter, TemplatePatch,
};
use clinicbot_core::{
    BotSettings, BotSettingsPatch, ClinicError, DispatchResult, HealthStatus, NotificationCategory,
};
use clinicbot_notify::AppointmentNotice;

use crate::error::{ApiError, ApiJson};
use crate::server::GatewayState;

type ApiResult<T> = Result<T, ApiError>;

// --- Request / response bodies ---

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Storage health detail when not healthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Response body for POST /v1/contacts.
#[derive(Debug, Serialize)]
pub struct UpsertResponse {
    pub contact: Contact,
    pub created: bool,
}

#[derive(Debug, Deserialize)]
pub struct BlockedRequest {
    pub blocked: bool,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRequest {
    pub active: bool,
}

/// Request body for POST /v1/templates/{id}/send.
#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    pub contact_id: String,
    /// Extra placeholder values.
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

/// Request body for POST /v1/notifications/test.
#[derive(Debug, Deserialize)]
pub struct TestNotificationRequest {
    pub destination: String,
    #[serde(default = "default_test_category")]
    pub category: NotificationCategory,
}

fn default_test_category() -> NotificationCategory {
    NotificationCategory::NewAppointment
}

// --- Public endpoints ---

/// GET /health
pub async fn get_public_health(State(state): State<GatewayState>) -> Response {
    let uptime_secs = state.health.start_time.elapsed().as_secs();
    let storage = state
        .storage
        .health_check()
        .await
        .unwrap_or_else(|e| HealthStatus::Unhealthy(e.to_string()));

    let (code, status, detail) = match storage {
        HealthStatus::Healthy => (StatusCode::OK, "ok", None),
        HealthStatus::Degraded(d) => (StatusCode::OK, "degraded", Some(d)),
        HealthStatus::Unhealthy(d) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", Some(d)),
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs,
        detail,
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_public_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics not enabled").into_response(),
    }
}

// --- Contacts ---

/// GET /v1/contacts
pub async fn list_contacts(
    State(state): State<GatewayState>,
    Query(filter): Query<ContactFilter>,
) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(state.storage.list_contacts(&filter).await?))
}

/// POST /v1/contacts
pub async fn upsert_contact(
    State(state): State<GatewayState>,
    ApiJson(profile): ApiJson<ContactProfile>,
) -> ApiResult<Response> {
    let (contact, created) = state.storage.upsert_contact(&profile).await?;
    let code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(UpsertResponse { contact, created })).into_response())
}

/// GET /v1/contacts/{id}
pub async fn get_contact(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .storage
        .find_contact(&id)
        .await?
        .ok_or_else(|| ClinicError::not_found("contact", id))?;
    Ok(Json(contact))
}

/// PUT /v1/contacts/{id}/blocked
pub async fn set_contact_blocked(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<BlockedRequest>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(
        state.storage.set_contact_blocked(&id, body.blocked).await?,
    ))
}

/// PUT /v1/contacts/{id}/tags
pub async fn set_contact_tags(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<TagsRequest>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.storage.set_contact_tags(&id, &body.tags).await?))
}

/// PUT /v1/contacts/{id}/notes
pub async fn set_contact_notes(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NotesRequest>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.storage.set_contact_notes(&id, &body.notes).await?))
}

/// GET /v1/contacts/{id}/messages
pub async fn list_contact_messages(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ConversationEntry>>> {
    if state.storage.find_contact(&id).await?.is_none() {
        return Err(ClinicError::not_found("contact", id).into());
    }
    Ok(Json(state.storage.list_conversation(&id).await?))
}

/// POST /v1/contacts/{id}/messages
///
/// Delivery failures come back as a 200 with the dispatch result.
pub async fn reply_to_contact(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReplyRequest>,
) -> ApiResult<Json<DispatchResult>> {
    Ok(Json(state.dispatcher.reply_to_contact(&id, &body.text).await?))
}

// --- Templates ---

/// GET /v1/templates
pub async fn list_templates(
    State(state): State<GatewayState>,
    Query(filter): Query<TemplateFilter>,
) -> ApiResult<Json<Vec<MessageTemplate>>> {
    Ok(Json(state.storage.list_templates(&filter).await?))
}

/// POST /v1/templates
pub async fn create_template(
    State(state): State<GatewayState>,
    ApiJson(body): ApiJson<NewTemplate>,
) -> ApiResult<(StatusCode, Json<MessageTemplate>)> {
    let template = state.storage.create_template(&body).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PATCH /v1/templates/{id}
pub async fn update_template(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TemplatePatch>,
) -> ApiResult<Json<MessageTemplate>> {
    Ok(Json(state.storage.update_template(&id, patch).await?))
}

/// DELETE /v1/templates/{id}
pub async fn delete_template(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.storage.delete_template(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/templates/{id}/send
pub async fn send_template(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SendTemplateRequest>,
) -> ApiResult<Json<DispatchResult>> {
    let result = state
        .dispatcher
        .send_template(&id, &body.contact_id, body.payload)
        .await?;
    Ok(Json(result))
}

// --- Settings ---

/// GET /v1/settings
pub async fn get_settings(State(state): State<GatewayState>) -> ApiResult<Json<BotSettings>> {
    Ok(Json(state.storage.get_settings().await?))
}

/// PATCH /v1/settings
pub async fn update_settings(
    State(state): State<GatewayState>,
    ApiJson(patch): ApiJson<BotSettingsPatch>,
) -> ApiResult<Json<BotSettings>> {
    Ok(Json(state.storage.update_settings(patch).await?))
}

/// PUT /v1/settings/active
pub async fn set_active(
    State(state): State<GatewayState>,
    ApiJson(body): ApiJson<ActiveRequest>,
) -> ApiResult<Json<BotSettings>> {
    let settings = state.storage.toggle_active(body.active).await?;
    tracing::info!(active = settings.active, "bot active flag changed");
    Ok(Json(settings))
}

// --- Notifications ---

/// POST /v1/notifications/test
pub async fn send_test_notification(
    State(state): State<GatewayState>,
    ApiJson(body): ApiJson<TestNotificationRequest>,
) -> ApiResult<Json<DispatchResult>> {
    let result = state
        .dispatcher
        .send_test(&body.destination, body.category)
        .await?;
    Ok(Json(result))
}

/// POST /v1/notifications/summary
pub async fn send_daily_summary(
    State(state): State<GatewayState>,
) -> ApiResult<Json<DispatchResult>> {
    let result = state
        .dispatcher
        .send_daily_summary(chrono::Utc::now())
        .await?;
    Ok(Json(result))
}

/// POST /v1/notifications/appointment
///
/// Always 200: the booking side must never fail because of delivery.
pub async fn notify_appointment(
    State(state): State<GatewayState>,
    ApiJson(notice): ApiJson<AppointmentNotice>,
) -> Json<DispatchResult> {
    Json(state.dispatcher.notify_appointment(notice).await)
}
