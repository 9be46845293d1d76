//! Facet catalogue and the filter selection state holder

use super::params::{SearchParam, SearchParams};
use super::query::{build_search_param, Facet, RangeEdge, RangeField};
use crate::config::{BrandCatalogue, FilterSettings, RangeSettings};
use crate::models::{BodyType, FuelType, SellerType, TransmissionType};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Values that can be turned into a facet
pub trait FacetValue: Clone + PartialEq {
    fn facet(&self) -> Facet;
}

/// Brand name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Brand(pub String);

/// Model name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(pub String);

impl FacetValue for Brand {
    fn facet(&self) -> Facet {
        Facet::Brand {
            name: self.0.clone(),
        }
    }
}

impl FacetValue for Model {
    fn facet(&self) -> Facet {
        Facet::Model {
            name: self.0.clone(),
        }
    }
}

impl FacetValue for BodyType {
    fn facet(&self) -> Facet {
        Facet::BodyType { value: *self }
    }
}

impl FacetValue for FuelType {
    fn facet(&self) -> Facet {
        Facet::FuelType { value: *self }
    }
}

impl FacetValue for TransmissionType {
    fn facet(&self) -> Facet {
        Facet::Transmission { value: *self }
    }
}

impl FacetValue for SellerType {
    fn facet(&self) -> Facet {
        Facet::SellerType { value: *self }
    }
}

/// One entry of a selectable list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selectable<T> {
    pub value: T,
    pub is_selected: bool,
}

impl<T: FacetValue> Selectable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            is_selected: false,
        }
    }

    /// Predicate for this entry, derived on demand
    pub fn search_param(&self) -> SearchParam {
        build_search_param(&self.value.facet())
    }
}

/// Select `value` in a single-choice list, or clear it if already selected
fn toggle<T: PartialEq>(items: &mut [Selectable<T>], value: &T) {
    let already = items.iter().any(|i| i.is_selected && i.value == *value);
    for item in items.iter_mut() {
        item.is_selected = !already && item.value == *value;
    }
}

fn selected<T: FacetValue>(items: &[Selectable<T>]) -> impl Iterator<Item = SearchParam> + '_ {
    items
        .iter()
        .filter(|i| i.is_selected)
        .map(Selectable::search_param)
}

/// Longest option list a range picker offers
pub const MAX_RANGE_OPTIONS: usize = 1000;

/// A numeric range filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSpec {
    pub field: RangeField,
    pub lower_bound: i64,
    pub upper_bound: i64,
    pub step: i64,
    pub min_selected: Option<i64>,
    pub max_selected: Option<i64>,
}

impl RangeSpec {
    pub fn new(field: RangeField, settings: RangeSettings) -> Self {
        Self {
            field,
            lower_bound: settings.lower_bound,
            upper_bound: settings.upper_bound,
            step: settings.step.max(1),
            min_selected: None,
            max_selected: None,
        }
    }

    /// Values offered by the picker, from lower to upper bound, at most `MAX_RANGE_OPTIONS`
    pub fn options(&self) -> Vec<i64> {
        let step = self.step.max(1);
        let mut values = Vec::new();
        let mut next = Some(self.lower_bound);
        while let Some(v) = next {
            if v > self.upper_bound || values.len() >= MAX_RANGE_OPTIONS {
                break;
            }
            values.push(v);
            next = v.checked_add(step);
        }
        values
    }

    /// Set one edge. No check against the other edge is made.
    pub fn select(&mut self, edge: RangeEdge, value: Option<i64>) {
        match edge {
            RangeEdge::Min => self.min_selected = value,
            RangeEdge::Max => self.max_selected = value,
        }
    }

    pub fn clear(&mut self) {
        self.min_selected = None;
        self.max_selected = None;
    }

    /// Predicates for the edges that are set
    pub fn search_params(&self) -> Vec<SearchParam> {
        let edges = [
            (RangeEdge::Min, self.min_selected),
            (RangeEdge::Max, self.max_selected),
        ];
        edges
            .into_iter()
            .filter_map(|(edge, value)| {
                value.map(|value| {
                    build_search_param(&Facet::Range {
                        field: self.field,
                        edge,
                        value,
                    })
                })
            })
            .collect()
    }
}

/// Full facet catalogue with the current selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDomainModel {
    pub brands: Vec<Selectable<Brand>>,
    pub models: Vec<Selectable<Model>>,
    pub body_types: Vec<Selectable<BodyType>>,
    pub fuel_types: Vec<Selectable<FuelType>>,
    pub transmission_types: Vec<Selectable<TransmissionType>>,
    pub seller_types: Vec<Selectable<SellerType>>,
    pub price: RangeSpec,
    pub year: RangeSpec,
    pub mileage: RangeSpec,
    pub power: RangeSpec,
    #[serde(skip)]
    catalogue: Vec<BrandCatalogue>,
}

impl Default for FilterDomainModel {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

impl FilterDomainModel {
    /// Build an unselected catalogue
    pub fn from_settings(settings: &FilterSettings) -> Self {
        let mut model = Self {
            brands: settings
                .brands
                .iter()
                .map(|b| Selectable::new(Brand(b.name.clone())))
                .collect(),
            models: Vec::new(),
            body_types: BodyType::ALL.iter().copied().map(Selectable::new).collect(),
            fuel_types: FuelType::ALL.iter().copied().map(Selectable::new).collect(),
            transmission_types: TransmissionType::ALL
                .iter()
                .copied()
                .map(Selectable::new)
                .collect(),
            seller_types: SellerType::ALL.iter().copied().map(Selectable::new).collect(),
            price: RangeSpec::new(RangeField::Price, settings.price),
            year: RangeSpec::new(RangeField::Year, settings.year),
            mileage: RangeSpec::new(RangeField::Mileage, settings.mileage),
            power: RangeSpec::new(RangeField::Power, settings.power),
            catalogue: settings.brands.clone(),
        };
        model.refresh_models();
        model
    }

    /// Apply a facet selection. Categorical facets toggle; range facets set the edge.
    pub fn apply(&mut self, facet: &Facet) {
        match facet {
            Facet::Brand { name } => {
                toggle(&mut self.brands, &Brand(name.clone()));
                self.refresh_models();
            }
            Facet::Model { name } => toggle(&mut self.models, &Model(name.clone())),
            Facet::BodyType { value } => toggle(&mut self.body_types, value),
            Facet::FuelType { value } => toggle(&mut self.fuel_types, value),
            Facet::Transmission { value } => toggle(&mut self.transmission_types, value),
            Facet::SellerType { value } => toggle(&mut self.seller_types, value),
            Facet::Range { field, edge, value } => self.range_mut(*field).select(*edge, Some(*value)),
        }
    }

    /// Clear one edge of a range
    pub fn clear_range_edge(&mut self, field: RangeField, edge: RangeEdge) {
        self.range_mut(field).select(edge, None);
    }

    pub fn range(&self, field: RangeField) -> &RangeSpec {
        match field {
            RangeField::Price => &self.price,
            RangeField::Year => &self.year,
            RangeField::Mileage => &self.mileage,
            RangeField::Power => &self.power,
        }
    }

    fn range_mut(&mut self, field: RangeField) -> &mut RangeSpec {
        match field {
            RangeField::Price => &mut self.price,
            RangeField::Year => &mut self.year,
            RangeField::Mileage => &mut self.mileage,
            RangeField::Power => &mut self.power,
        }
    }

    /// Rebuild the model list for the selected brand, keeping a still-offered model selection
    fn refresh_models(&mut self) {
        let selected_brand = self
            .brands
            .iter()
            .find(|b| b.is_selected)
            .map(|b| b.value.0.clone());
        let selected_model = self
            .models
            .iter()
            .find(|m| m.is_selected)
            .map(|m| m.value.clone());

        self.models = self
            .catalogue
            .iter()
            .filter(|b| selected_brand.as_ref().map_or(true, |name| &b.name == name))
            .flat_map(|b| b.models.iter())
            .map(|m| {
                let mut item = Selectable::new(Model(m.clone()));
                item.is_selected = selected_model.as_ref() == Some(&item.value);
                item
            })
            .collect();
    }

    /// Predicates of every selected facet, in catalogue order
    pub fn selected_params(&self) -> Vec<SearchParam> {
        selected(&self.brands)
            .chain(selected(&self.models))
            .chain(selected(&self.body_types))
            .chain(selected(&self.fuel_types))
            .chain(selected(&self.transmission_types))
            .chain(selected(&self.seller_types))
            .chain(self.price.search_params())
            .chain(self.year.search_params())
            .chain(self.mileage.search_params())
            .chain(self.power.search_params())
            .collect()
    }

    /// Search descriptor for the first page of the current selection
    pub fn to_search_params(&self, page_size: u32) -> SearchParams {
        SearchParams::from_params(self.selected_params()).with_page_size(page_size)
    }

    /// Number of active facets (range edges count separately)
    pub fn active_count(&self) -> usize {
        self.selected_params().len()
    }
}

/// Single holder of the filter selection; updates are serialized through it
/// and observers receive every new snapshot.
pub struct FilterStore {
    tx: watch::Sender<FilterDomainModel>,
    initial: FilterDomainModel,
}

impl FilterStore {
    pub fn new(model: FilterDomainModel) -> Self {
        let (tx, _) = watch::channel(model.clone());
        Self { tx, initial: model }
    }

    /// Observe selection changes
    pub fn subscribe(&self) -> watch::Receiver<FilterDomainModel> {
        self.tx.subscribe()
    }

    /// Current selection
    pub fn snapshot(&self) -> FilterDomainModel {
        self.tx.borrow().clone()
    }

    /// Mutate the selection and notify observers
    pub fn update(&self, f: impl FnOnce(&mut FilterDomainModel)) {
        self.tx.send_modify(f);
    }

    /// Apply one facet
    pub fn apply(&self, facet: &Facet) {
        self.update(|model| model.apply(facet));
    }

    /// Drop all selections
    pub fn reset(&self) {
        let initial = self.initial.clone();
        self.tx.send_modify(move |model| *model = initial);
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(FilterDomainModel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::params::{SearchKey, SearchValue, ValueType};

    #[test]
    fn test_min_only_range() {
        let mut spec = RangeSpec::new(RangeField::Price, RangeSettings::new(0, 100_000, 1_000));
        spec.select(RangeEdge::Min, Some(5_000));

        let params = spec.search_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].value(), &SearchValue::GreaterOrEqualTo(5_000));
        assert_eq!(params[0].value_type(), ValueType::Min);
    }

    #[test]
    fn test_inverted_range_passes_through() {
        let mut spec = RangeSpec::new(RangeField::Year, RangeSettings::new(1990, 2024, 1));
        spec.select(RangeEdge::Min, Some(2020));
        spec.select(RangeEdge::Max, Some(2010));

        let params = spec.search_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].value(), &SearchValue::GreaterOrEqualTo(2020));
        assert_eq!(params[1].value(), &SearchValue::LessOrEqualTo(2010));
    }

    #[test]
    fn test_range_options() {
        let spec = RangeSpec::new(RangeField::Power, RangeSettings::new(100, 130, 10));
        assert_eq!(spec.options(), vec![100, 110, 120, 130]);
    }

    #[test]
    fn test_range_options_near_integer_limit() {
        let spec = RangeSpec::new(RangeField::Price, RangeSettings::new(i64::MAX - 5, i64::MAX, 10));
        assert_eq!(spec.options(), vec![i64::MAX - 5]);

        let wide = RangeSpec::new(RangeField::Price, RangeSettings::new(0, i64::MAX, 1));
        assert_eq!(wide.options().len(), MAX_RANGE_OPTIONS);
    }

    #[test]
    fn test_brand_selection_narrows_models() {
        let mut model = FilterDomainModel::default();
        let all_models = model.models.len();

        model.apply(&Facet::Brand {
            name: "BMW".to_string(),
        });
        assert!(model.models.len() < all_models);
        assert!(model.models.iter().any(|m| m.value.0 == "X5"));
        assert!(!model.models.iter().any(|m| m.value.0 == "Golf"));
    }

    #[test]
    fn test_toggle_is_single_choice() {
        let mut model = FilterDomainModel::default();
        model.apply(&Facet::BodyType {
            value: BodyType::Sedan,
        });
        model.apply(&Facet::BodyType {
            value: BodyType::Suv,
        });
        let selected: Vec<_> = model.body_types.iter().filter(|b| b.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, BodyType::Suv);

        model.apply(&Facet::BodyType {
            value: BodyType::Suv,
        });
        assert!(model.body_types.iter().all(|b| !b.is_selected));
    }

    #[test]
    fn test_selected_params_catalogue_order() {
        let mut model = FilterDomainModel::default();
        model.apply(&Facet::Range {
            field: RangeField::Price,
            edge: RangeEdge::Max,
            value: 30_000,
        });
        model.apply(&Facet::Brand {
            name: "BMW".to_string(),
        });
        model.apply(&Facet::FuelType {
            value: FuelType::Diesel,
        });

        let params = model.selected_params();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], SearchParam::equal_to_string(SearchKey::TransportName, "BMW"));
        assert_eq!(params[1], SearchParam::equal_to_string(SearchKey::FuelType, "Diesel"));
        assert_eq!(params[2], SearchParam::max(SearchKey::Price, 30_000));

        let search = model.to_search_params(5);
        assert_eq!(search.page_size, 5);
        assert_eq!(search.len(), 3);
    }

    #[test]
    fn test_model_selection_dropped_when_brand_changes() {
        let mut model = FilterDomainModel::default();
        model.apply(&Facet::Brand {
            name: "BMW".to_string(),
        });
        model.apply(&Facet::Model {
            name: "X5".to_string(),
        });
        model.apply(&Facet::Brand {
            name: "Audi".to_string(),
        });
        assert!(model.models.iter().all(|m| !m.is_selected));
        assert_eq!(model.active_count(), 1);
    }

    #[tokio::test]
    async fn test_store_notifies_subscribers() {
        let store = FilterStore::default();
        let mut rx = store.subscribe();

        store.apply(&Facet::SellerType {
            value: SellerType::Dealer,
        });
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().active_count(), 1);

        store.reset();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().active_count(), 0);
        assert_eq!(store.snapshot().active_count(), 0);
    }
}
