//! Advertisement (listing) models
//!
//! `Advertisement` is the canonical shape used everywhere in the crate. It can
//! be built from a network payload (`AdvertisementResponse`) or from an
//! offline cache row (`CachedAdvertisement`).

use super::vehicle::{BodyType, FuelType, SellerType, TransmissionType};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A car listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advertisement {
    pub object_id: String,
    pub owner_id: Option<String>,
    /// Brand, e.g. "BMW"
    pub transport_name: String,
    /// Model, e.g. "X5"
    pub transport_model: String,
    pub price: i64,
    pub year_of_manufacture: i64,
    /// Kilometres
    pub mileage: i64,
    /// Horse power
    pub power: i64,
    pub body_type: BodyType,
    pub fuel_type: FuelType,
    pub transmission_type: TransmissionType,
    pub seller_type: SellerType,
    pub description: String,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub photos: Vec<String>,
    pub created: DateTime<Utc>,
}

impl Advertisement {
    /// Build from a decoded network payload
    pub fn from_response(response: AdvertisementResponse) -> Self {
        Self {
            object_id: response.object_id,
            owner_id: response.owner_id,
            transport_name: response.transport_name,
            transport_model: response.transport_model,
            price: response.price,
            year_of_manufacture: response.year_of_manufacture,
            mileage: response.mileage,
            power: response.power,
            body_type: response.body_type,
            fuel_type: response.fuel_type,
            transmission_type: response.transmission_type,
            seller_type: response.seller_type,
            description: response.description.unwrap_or_default(),
            location: response.location,
            phone_number: response.phone_number,
            photos: response.photos.unwrap_or_default(),
            created: millis_to_datetime(response.created),
        }
    }

    /// Build from an offline cache row
    pub fn from_cached(cached: CachedAdvertisement) -> Self {
        // Rows written by older builds may carry a bare URL instead of a JSON array
        let photos = serde_json::from_str::<Vec<String>>(&cached.photos).unwrap_or_else(|_| {
            cached
                .photos
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        });

        Self {
            object_id: cached.object_id,
            owner_id: non_empty(cached.owner_id),
            transport_name: cached.transport_name,
            transport_model: cached.transport_model,
            price: cached.price,
            year_of_manufacture: cached.year_of_manufacture,
            mileage: cached.mileage,
            power: cached.power,
            body_type: BodyType::from_label(&cached.body_type),
            fuel_type: FuelType::from_label(&cached.fuel_type),
            transmission_type: TransmissionType::from_label(&cached.transmission_type),
            seller_type: SellerType::from_label(&cached.seller_type),
            description: cached.description,
            location: non_empty(cached.location),
            phone_number: non_empty(cached.phone_number),
            photos,
            created: millis_to_datetime(Some(cached.created)),
        }
    }

    /// Flatten into a cache row
    pub fn to_cached(&self) -> CachedAdvertisement {
        CachedAdvertisement {
            object_id: self.object_id.clone(),
            owner_id: self.owner_id.clone().unwrap_or_default(),
            transport_name: self.transport_name.clone(),
            transport_model: self.transport_model.clone(),
            price: self.price,
            year_of_manufacture: self.year_of_manufacture,
            mileage: self.mileage,
            power: self.power,
            body_type: self.body_type.as_str().to_string(),
            fuel_type: self.fuel_type.as_str().to_string(),
            transmission_type: self.transmission_type.as_str().to_string(),
            seller_type: self.seller_type.as_str().to_string(),
            description: self.description.clone(),
            location: self.location.clone().unwrap_or_default(),
            phone_number: self.phone_number.clone().unwrap_or_default(),
            photos: serde_json::to_string(&self.photos).unwrap_or_else(|_| "[]".to_string()),
            created: self.created.timestamp_millis(),
        }
    }

    /// Display title, e.g. "BMW X5"
    pub fn title(&self) -> String {
        format!("{} {}", self.transport_name, self.transport_model)
    }
}

/// Listing as returned by the backend `/data/Advertisement` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisementResponse {
    pub object_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub transport_name: String,
    pub transport_model: String,
    pub price: i64,
    pub year_of_manufacture: i64,
    pub mileage: i64,
    pub power: i64,
    pub body_type: BodyType,
    pub fuel_type: FuelType,
    pub transmission_type: TransmissionType,
    pub seller_type: SellerType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    /// Epoch milliseconds
    #[serde(default)]
    pub created: Option<i64>,
}

/// Listing as stored in the offline cache: enum fields are raw labels,
/// photos are a JSON-encoded string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAdvertisement {
    pub object_id: String,
    pub owner_id: String,
    pub transport_name: String,
    pub transport_model: String,
    pub price: i64,
    pub year_of_manufacture: i64,
    pub mileage: i64,
    pub power: i64,
    pub body_type: String,
    pub fuel_type: String,
    pub transmission_type: String,
    pub seller_type: String,
    pub description: String,
    pub location: String,
    pub phone_number: String,
    pub photos: String,
    pub created: i64,
}

/// Payload for creating a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdvertisement {
    pub transport_name: String,
    pub transport_model: String,
    pub price: i64,
    pub year_of_manufacture: i64,
    pub mileage: i64,
    pub power: i64,
    pub body_type: BodyType,
    pub fuel_type: FuelType,
    pub transmission_type: TransmissionType,
    pub seller_type: SellerType,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

fn millis_to_datetime(millis: Option<i64>) -> DateTime<Utc> {
    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A listing with sensible defaults for tests
    pub fn advertisement(id: &str, brand: &str, model: &str, price: i64) -> Advertisement {
        Advertisement {
            object_id: id.to_string(),
            owner_id: Some("owner-1".to_string()),
            transport_name: brand.to_string(),
            transport_model: model.to_string(),
            price,
            year_of_manufacture: 2015,
            mileage: 120_000,
            power: 190,
            body_type: BodyType::Sedan,
            fuel_type: FuelType::Diesel,
            transmission_type: TransmissionType::Automatic,
            seller_type: SellerType::Private,
            description: "Well kept".to_string(),
            location: Some("Minsk".to_string()),
            phone_number: None,
            photos: vec!["https://files.example.com/1.jpg".to_string()],
            created: millis_to_datetime(Some(1_700_000_000_000)),
        }
    }

    /// JSON as the backend would send it
    pub fn response_json(id: &str, brand: &str, model: &str, price: i64) -> serde_json::Value {
        serde_json::json!({
            "objectId": id,
            "ownerId": "owner-1",
            "transportName": brand,
            "transportModel": model,
            "price": price,
            "yearOfManufacture": 2015,
            "mileage": 120000,
            "power": 190,
            "bodyType": "Sedan",
            "fuelType": "Diesel",
            "transmissionType": "Automatic",
            "sellerType": "Private",
            "description": "Well kept",
            "location": "Minsk",
            "photos": ["https://files.example.com/1.jpg"],
            "created": 1700000000000i64,
        })
    }
}
