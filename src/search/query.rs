//! Facet to predicate mapping and `where` clause rendering

use super::params::{SearchKey, SearchParam, SearchValue};
use crate::models::{BodyType, FuelType, SellerType, TransmissionType};
use serde::{Deserialize, Serialize};

/// Numeric attribute that can be filtered by range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RangeField {
    Price,
    Year,
    Mileage,
    Power,
}

impl RangeField {
    pub fn key(&self) -> SearchKey {
        match self {
            Self::Price => SearchKey::Price,
            Self::Year => SearchKey::YearOfManufacture,
            Self::Mileage => SearchKey::Mileage,
            Self::Power => SearchKey::Power,
        }
    }
}

/// Side of a range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RangeEdge {
    Min,
    Max,
}

/// A single user-selected filter criterion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "facet")]
pub enum Facet {
    Brand { name: String },
    Model { name: String },
    BodyType { value: BodyType },
    FuelType { value: FuelType },
    Transmission { value: TransmissionType },
    SellerType { value: SellerType },
    Range {
        field: RangeField,
        edge: RangeEdge,
        value: i64,
    },
}

/// Map a facet to its predicate
pub fn build_search_param(facet: &Facet) -> SearchParam {
    match facet {
        Facet::Brand { name } => SearchParam::equal_to_string(SearchKey::TransportName, name.as_str()),
        Facet::Model { name } => SearchParam::equal_to_string(SearchKey::TransportModel, name.as_str()),
        Facet::BodyType { value } => SearchParam::equal_to_string(SearchKey::BodyType, value.as_str()),
        Facet::FuelType { value } => SearchParam::equal_to_string(SearchKey::FuelType, value.as_str()),
        Facet::Transmission { value } => {
            SearchParam::equal_to_string(SearchKey::TransmissionType, value.as_str())
        }
        Facet::SellerType { value } => {
            SearchParam::equal_to_string(SearchKey::SellerType, value.as_str())
        }
        Facet::Range { field, edge, value } => match edge {
            RangeEdge::Min => SearchParam::min(field.key(), *value),
            RangeEdge::Max => SearchParam::max(field.key(), *value),
        },
    }
}

/// Render one predicate as a `where` clause fragment
pub fn render_clause(param: &SearchParam) -> String {
    let key = param.key().as_str();
    match param.value() {
        SearchValue::EqualToString(s) => format!("{} = '{}'", key, s.replace('\'', "''")),
        SearchValue::EqualToInt(v) => format!("{} = {}", key, v),
        SearchValue::GreaterOrEqualTo(v) => format!("{} >= {}", key, v),
        SearchValue::LessOrEqualTo(v) => format!("{} <= {}", key, v),
    }
}

/// Render predicates as a backend `where` clause, joined with `and`.
///
/// Clauses keep the order of `params` and nothing is merged here. An empty
/// slice yields an empty string, which callers treat as "no `where` clause".
pub fn compose_query_string(params: &[SearchParam]) -> String {
    params
        .iter()
        .map(render_clause)
        .collect::<Vec<_>>()
        .join(" and ")
}
