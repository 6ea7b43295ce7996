use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State as AxumState},
    http::{StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
};
use chrono::Utc;
use registry::{
    AppealRequest, AppealTicket, ClaimReceipt, ClaimedItem, EditCredentials, Item, ItemEdit,
    ItemFilter, file_appeal,
};
use tracing::info;

use crate::{
    error::AppError,
    state::State,
    store::Claimant,
    utils::Submission,
};

pub async fn students_handler(AxumState(state): AxumState<Arc<State>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/csv")], state.students_csv.clone())
}

pub async fn items_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(filter): Query<ItemFilter>,
) -> Json<Vec<Item>> {
    Json(state.store().items(&filter))
}

pub async fn submit_handler(
    AxumState(state): AxumState<Arc<State>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let submission = Submission::read(multipart).await?;
    let form = submission.found_item_form();
    form.validate(&state.directory)?;

    let item = state.store().insert_item(form, submission.photo, Utc::now());

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn verify_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<u64>,
    Json(credentials): Json<EditCredentials>,
) -> Result<Json<Item>, AppError> {
    let item = state.store().verify(id, &credentials)?;

    Ok(Json(item))
}

pub async fn update_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<u64>,
    Json(edit): Json<ItemEdit>,
) -> Result<Json<Item>, AppError> {
    let item = state.store().update(id, &edit)?;

    Ok(Json(item))
}

pub async fn claim_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<ClaimReceipt>, AppError> {
    let submission = Submission::read(multipart).await?;

    let student_number = submission.text("claimerStudent").trim().to_string();
    let name = state
        .directory
        .resolve(&student_number)
        .ok_or(AppError::InvalidClaim("unknown student number"))?
        .to_string();
    let photo = submission
        .photo
        .ok_or(AppError::InvalidClaim("face capture is required"))?;

    let claimant = Claimant {
        student_number,
        name,
    };
    let receipt = state.store().claim(id, claimant, photo, Utc::now())?;

    Ok(Json(receipt))
}

pub async fn claimed_items_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Json<Vec<ClaimedItem>> {
    Json(state.store().claimed())
}

pub async fn appeal_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<u64>,
    Json(request): Json<AppealRequest>,
) -> Result<Json<AppealTicket>, AppError> {
    let claimed = state.store().claimed_item(id)?.clone();
    let ticket = file_appeal(&state.directory, &claimed, &request, Utc::now())?;

    info!(id, ticket = %ticket.ticket_id, "Appeal filed");

    Ok(Json(ticket))
}

pub async fn photo_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let photo = state
        .store()
        .photo(&key)
        .cloned()
        .ok_or(AppError::PhotoNotFound)?;

    Ok(([(CONTENT_TYPE, photo.content_type)], photo.data))
}
