//! HTTP request handlers

use super::error::AppError;
use super::state::AppState;
use crate::contact::{compose_email, ContactError, ContactRequest};
use crate::models::{Advertisement, BodyType, Credentials, FuelType, SellerType, TransmissionType, User};
use crate::search::{
    build_search_param, Facet, FilterDomainModel, RangeEdge, RangeField, SearchPage, SearchParams,
    SearchState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

/// Facet query parameters for listing endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AdvertisementQuery {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub body_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub seller_type: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub year_min: Option<i64>,
    pub year_max: Option<i64>,
    pub mileage_min: Option<i64>,
    pub mileage_max: Option<i64>,
    pub power_min: Option<i64>,
    pub power_max: Option<i64>,
    pub page_size: Option<u32>,
    pub offset: Option<u32>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse an enum label; unknown labels are rejected rather than matched as `Other`
fn parse_label<T: PartialEq>(
    name: &str,
    raw: &Option<String>,
    parse: fn(&str) -> T,
    other: T,
) -> Result<Option<T>, AppError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(label) => {
            let value = parse(&label);
            if value == other {
                Err(AppError::BadRequest(format!("unknown {}: {}", name, label)))
            } else {
                Ok(Some(value))
            }
        }
    }
}

impl AdvertisementQuery {
    pub fn facets(&self) -> Result<Vec<Facet>, AppError> {
        let mut facets = Vec::new();

        if let Some(name) = non_blank(&self.brand) {
            facets.push(Facet::Brand { name });
        }
        if let Some(name) = non_blank(&self.model) {
            facets.push(Facet::Model { name });
        }
        if let Some(value) = parse_label("body type", &self.body_type, BodyType::from_label, BodyType::Other)? {
            facets.push(Facet::BodyType { value });
        }
        if let Some(value) = parse_label("fuel type", &self.fuel_type, FuelType::from_label, FuelType::Other)? {
            facets.push(Facet::FuelType { value });
        }
        if let Some(value) = parse_label(
            "transmission",
            &self.transmission,
            TransmissionType::from_label,
            TransmissionType::Other,
        )? {
            facets.push(Facet::Transmission { value });
        }
        if let Some(value) =
            parse_label("seller type", &self.seller_type, SellerType::from_label, SellerType::Other)?
        {
            facets.push(Facet::SellerType { value });
        }

        let ranges = [
            (RangeField::Price, self.price_min, self.price_max),
            (RangeField::Year, self.year_min, self.year_max),
            (RangeField::Mileage, self.mileage_min, self.mileage_max),
            (RangeField::Power, self.power_min, self.power_max),
        ];
        for (field, min, max) in ranges {
            for (edge, value) in [(RangeEdge::Min, min), (RangeEdge::Max, max)] {
                if let Some(value) = value {
                    facets.push(Facet::Range { field, edge, value });
                }
            }
        }

        Ok(facets)
    }

    pub fn to_search_params(&self, default_page_size: u32) -> Result<SearchParams, AppError> {
        let facets = self.facets()?;
        Ok(SearchParams::from_params(facets.iter().map(build_search_param))
            .with_page_size(self.page_size.unwrap_or(default_page_size))
            .with_offset(self.offset.unwrap_or(0)))
    }
}

fn signed_in(state: &AppState) -> Result<User, AppError> {
    state.search.client().session().user().ok_or(AppError::Unauthorized)
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "online": state.search.is_online(),
    }))
}

pub async fn filters(State(state): State<AppState>) -> Json<FilterDomainModel> {
    Json(state.filters.snapshot())
}

/// Apply one facet and refresh the feed
pub async fn apply_filter(
    State(state): State<AppState>,
    Json(facet): Json<Facet>,
) -> Json<FilterDomainModel> {
    state.filters.apply(&facet);
    state.refresh_feed();
    Json(state.filters.snapshot())
}

pub async fn reset_filters(State(state): State<AppState>) -> Json<FilterDomainModel> {
    state.filters.reset();
    state.refresh_feed();
    Json(state.filters.snapshot())
}

/// State of the feed driven by the facet selection
pub async fn feed(State(state): State<AppState>) -> Json<SearchState> {
    Json(state.feed.state())
}

pub async fn advertisements(
    State(state): State<AppState>,
    Query(query): Query<AdvertisementQuery>,
) -> Result<Json<SearchPage>, AppError> {
    let params = query.to_search_params(state.page_size())?;
    Ok(Json(state.search.page(&params).await?))
}

pub async fn count(
    State(state): State<AppState>,
    Query(query): Query<AdvertisementQuery>,
) -> Result<impl IntoResponse, AppError> {
    let params = query.to_search_params(state.page_size())?;
    let count = state.search.count(&params).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

pub async fn advertisement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Advertisement>, AppError> {
    Ok(Json(state.search.advertisement(&id).await?))
}

pub async fn own_advertisements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Advertisement>>, AppError> {
    let user = signed_in(&state)?;
    Ok(Json(state.search.own_advertisements(&user.object_id).await?))
}

pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<User>, AppError> {
    let session = state.search.client().login(&credentials).await?;
    Ok(Json(session.user))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    signed_in(&state)?;
    state.search.client().logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorites(
    State(state): State<AppState>,
) -> Result<Json<Vec<Advertisement>>, AppError> {
    let user = signed_in(&state)?;
    Ok(Json(state.search.favorites(&user.object_id).await?))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = signed_in(&state)?;
    state.search.add_favorite(&user.object_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let user = signed_in(&state)?;
    state.search.remove_favorite(&user.object_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Email the seller of a listing on behalf of the caller
pub async fn contact_seller(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ContactRequest>,
) -> Result<StatusCode, AppError> {
    request.validate()?;

    let ad = state.search.advertisement(&id).await?;
    let owner_id = ad.owner_id.as_deref().ok_or(ContactError::NoRecipient)?;
    let seller = state.search.client().fetch_user(owner_id).await?;

    let email = compose_email(&state.templates, &ad, &seller, &request)?;
    state.search.client().send_email(&email).await?;
    info!("Forwarded contact request for {}", ad.object_id);

    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchKey, SearchParam};

    #[test]
    fn test_query_to_search_params() {
        let query = AdvertisementQuery {
            brand: Some("BMW".to_string()),
            body_type: Some("suv".to_string()),
            price_min: Some(5000),
            page_size: Some(10),
            ..Default::default()
        };
        let params = query.to_search_params(3).unwrap();
        assert_eq!(params.page_size, 10);
        assert_eq!(
            params.params(),
            &[
                SearchParam::equal_to_string(SearchKey::TransportName, "BMW"),
                SearchParam::equal_to_string(SearchKey::BodyType, "SUV"),
                SearchParam::min(SearchKey::Price, 5000),
            ]
        );
    }

    #[test]
    fn test_empty_query() {
        let params = AdvertisementQuery::default().to_search_params(3).unwrap();
        assert!(params.is_empty());
        assert_eq!(params.page_size, 3);
        assert_eq!(params.offset, 0);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let query = AdvertisementQuery {
            fuel_type: Some("steam".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.to_search_params(3), Err(AppError::BadRequest(_))));
    }
}
