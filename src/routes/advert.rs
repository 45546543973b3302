use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::advert_dto::{
        AdvertActionPayload, AdvertContactResponse, AdvertListQuery, AdvertListResponse,
        AdvertResponse, CreateAdvertPayload, ShortUrlResponse, StateFilterQuery,
        SubmittedAdvertResponse, UpdateAdvertPayload,
    },
    error::Result,
    services::advert_service::AdvertAction,
    utils::{time::now, validation::validate},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/adverts",
    request_body = CreateAdvertPayload,
    responses(
        (status = 201, description = "Advert submitted", body = Json<SubmittedAdvertResponse>),
        (status = 422, description = "Advert rejected with per-field errors")
    )
)]
#[axum::debug_handler]
pub async fn create_advert(
    State(state): State<AppState>,
    Json(payload): Json<CreateAdvertPayload>,
) -> Result<impl IntoResponse> {
    let advert = state.advert_service.submit(payload).await?;
    let edit_token = state.advert_service.edit_token(&advert);
    Ok((
        StatusCode::CREATED,
        Json(SubmittedAdvertResponse {
            advert: AdvertResponse::new(advert, now()),
            edit_token,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/adverts",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
        ("active" = Option<String>, Query, description = "1 for active adverts, anything else for expired ones"),
        ("premium" = Option<String>, Query, description = "1 for premium adverts, anything else for regular ones"),
        ("location_id" = Option<i64>, Query, description = "Location, including its descendants"),
        ("category_id" = Option<i64>, Query, description = "Category, including its descendants"),
        ("order" = Option<String>, Query, description = "recent or premium")
    ),
    responses(
        (status = 200, description = "List of adverts", body = Json<AdvertListResponse>),
        (status = 400, description = "Invalid query")
    )
)]
#[axum::debug_handler]
pub async fn list_adverts(
    State(state): State<AppState>,
    Query(query): Query<AdvertListQuery>,
) -> Result<impl IntoResponse> {
    validate(&query)?;
    let adverts = state.advert_service.list(&query).await?;
    let at = now();
    Ok(Json(AdvertListResponse {
        items: adverts
            .into_iter()
            .map(|advert| AdvertResponse::new(advert, at))
            .collect(),
        page: query.page(),
        per_page: query.per_page(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/adverts/states",
    params(
        ("selected" = Option<String>, Query, description = "Currently selected state"),
        ("location_id" = Option<i64>, Query, description = "Location filter"),
        ("category_id" = Option<i64>, Query, description = "Category filter")
    ),
    responses(
        (status = 200, description = "States of live adverts in rows of six")
    )
)]
#[axum::debug_handler]
pub async fn list_states(
    State(state): State<AppState>,
    Query(query): Query<StateFilterQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.advert_service.state_rows(&query).await?;
    Ok(Json(rows))
}

#[utoipa::path(
    get,
    path = "/api/adverts/{id}",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    responses(
        (status = 200, description = "Advert found", body = Json<AdvertResponse>),
        (status = 404, description = "Advert not found")
    )
)]
#[axum::debug_handler]
pub async fn get_advert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let advert = state.advert_service.get(id).await?;
    Ok(Json(AdvertResponse::new(advert, now())))
}

#[utoipa::path(
    patch,
    path = "/api/adverts/{id}",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = UpdateAdvertPayload,
    responses(
        (status = 200, description = "Advert updated", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 404, description = "Advert not found"),
        (status = 422, description = "Advert rejected with per-field errors")
    )
)]
#[axum::debug_handler]
pub async fn update_advert(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdvertPayload>,
) -> Result<impl IntoResponse> {
    let advert = state.advert_service.update(id, payload).await?;
    Ok(Json(AdvertResponse::new(advert, now())))
}

async fn run_action(
    state: AppState,
    id: i64,
    action: AdvertAction,
    payload: AdvertActionPayload,
) -> Result<Json<AdvertResponse>> {
    let advert = state
        .advert_service
        .perform(id, action, &payload)
        .await?;
    Ok(Json(AdvertResponse::new(advert, now())))
}

#[utoipa::path(
    post,
    path = "/api/adverts/{id}/advertise",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = AdvertActionPayload,
    responses(
        (status = 200, description = "Advert is live for a fresh run", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 404, description = "Advert or order item not found")
    )
)]
#[axum::debug_handler]
pub async fn advertise(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdvertActionPayload>,
) -> Result<impl IntoResponse> {
    run_action(state, id, AdvertAction::Advertise, payload).await
}

#[utoipa::path(
    post,
    path = "/api/adverts/{id}/bump",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = AdvertActionPayload,
    responses(
        (status = 200, description = "Advert bumped", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 404, description = "Advert or order item not found"),
        (status = 409, description = "Advert is not bumpable")
    )
)]
#[axum::debug_handler]
pub async fn bump(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdvertActionPayload>,
) -> Result<impl IntoResponse> {
    run_action(state, id, AdvertAction::Bump, payload).await
}

#[utoipa::path(
    post,
    path = "/api/adverts/{id}/premium-upgrade",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = AdvertActionPayload,
    responses(
        (status = 200, description = "Advert upgraded to premium", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 404, description = "Advert or order item not found"),
        (status = 409, description = "Advert cannot be upgraded")
    )
)]
#[axum::debug_handler]
pub async fn premium_upgrade(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdvertActionPayload>,
) -> Result<impl IntoResponse> {
    run_action(state, id, AdvertAction::PremiumUpgrade, payload).await
}

#[utoipa::path(
    post,
    path = "/api/adverts/{id}/archive",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = AdvertActionPayload,
    responses(
        (status = 200, description = "Advert archived", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 409, description = "Advert cannot be archived")
    )
)]
#[axum::debug_handler]
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdvertActionPayload>,
) -> Result<impl IntoResponse> {
    run_action(state, id, AdvertAction::Archive, payload).await
}

#[utoipa::path(
    post,
    path = "/api/adverts/{id}/unarchive",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    request_body = AdvertActionPayload,
    responses(
        (status = 200, description = "Advert unarchived", body = Json<AdvertResponse>),
        (status = 401, description = "Missing or wrong edit token and password"),
        (status = 409, description = "Advert cannot be unarchived")
    )
)]
#[axum::debug_handler]
pub async fn unarchive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdvertActionPayload>,
) -> Result<impl IntoResponse> {
    run_action(state, id, AdvertAction::Unarchive, payload).await
}

#[utoipa::path(
    get,
    path = "/api/adverts/{id}/short-url",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    responses(
        (status = 200, description = "Short link, or the canonical URL when shortening fails", body = Json<ShortUrlResponse>),
        (status = 404, description = "Advert not found")
    )
)]
#[axum::debug_handler]
pub async fn short_url(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let url = state.advert_service.short_url(id).await?;
    Ok(Json(ShortUrlResponse { url }))
}

#[utoipa::path(
    get,
    path = "/api/adverts/{id}/contact",
    params(
        ("id" = i64, Path, description = "Advert ID")
    ),
    responses(
        (status = 200, description = "Contact and order details", body = Json<AdvertContactResponse>),
        (status = 404, description = "Advert not found")
    )
)]
#[axum::debug_handler]
pub async fn contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let contact = state.advert_service.contact(id).await?;
    Ok(Json(AdvertContactResponse::from(contact)))
}
