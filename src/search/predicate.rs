//! Client-side evaluation of search predicates against cached listings
//!
//! Mirrors how the backend evaluates the rendered `where` clause: string
//! equality is case-insensitive, numeric bounds are inclusive.

use super::params::{SearchKey, SearchParam, SearchValue};
use crate::models::Advertisement;

/// Column value of a listing, borrowed
enum Field<'a> {
    Text(&'a str),
    Int(i64),
}

fn field<'a>(ad: &'a Advertisement, key: SearchKey) -> Field<'a> {
    match key {
        SearchKey::Price => Field::Int(ad.price),
        SearchKey::Mileage => Field::Int(ad.mileage),
        SearchKey::YearOfManufacture => Field::Int(ad.year_of_manufacture),
        SearchKey::Power => Field::Int(ad.power),
        SearchKey::TransportName => Field::Text(&ad.transport_name),
        SearchKey::TransportModel => Field::Text(&ad.transport_model),
        SearchKey::BodyType => Field::Text(ad.body_type.as_str()),
        SearchKey::FuelType => Field::Text(ad.fuel_type.as_str()),
        SearchKey::TransmissionType => Field::Text(ad.transmission_type.as_str()),
        SearchKey::SellerType => Field::Text(ad.seller_type.as_str()),
    }
}

/// Whether `ad` satisfies a single predicate
pub fn matches(param: &SearchParam, ad: &Advertisement) -> bool {
    match (field(ad, param.key()), param.value()) {
        (Field::Text(actual), SearchValue::EqualToString(expected)) => {
            actual.trim().eq_ignore_ascii_case(expected.trim())
        }
        (Field::Int(actual), SearchValue::EqualToString(expected)) => {
            expected.trim().parse::<i64>().map_or(false, |e| e == actual)
        }
        (Field::Int(actual), SearchValue::EqualToInt(expected)) => actual == *expected,
        (Field::Int(actual), SearchValue::GreaterOrEqualTo(bound)) => actual >= *bound,
        (Field::Int(actual), SearchValue::LessOrEqualTo(bound)) => actual <= *bound,
        (Field::Text(actual), SearchValue::EqualToInt(expected)) => {
            actual.trim().parse::<i64>().map_or(false, |a| a == *expected)
        }
        // Text columns have no ordering in the backend schema
        (Field::Text(_), SearchValue::GreaterOrEqualTo(_) | SearchValue::LessOrEqualTo(_)) => false,
    }
}

/// Whether `ad` satisfies every predicate (empty slice matches everything)
pub fn matches_all(params: &[SearchParam], ad: &Advertisement) -> bool {
    params.iter().all(|p| matches(p, ad))
}
