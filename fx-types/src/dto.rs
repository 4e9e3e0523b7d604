//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Conversion;

/// Request to convert a quantity between two currencies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConvertRequest {
    /// Source currency code (case-insensitive)
    #[schema(example = "usd")]
    pub currency_from: String,
    /// Target currency code (case-insensitive)
    #[schema(example = "eur")]
    pub currency_to: String,
    /// Quantity of the source currency
    #[schema(example = 100.0)]
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

fn default_quantity() -> f64 {
    1.0
}

/// Conversion result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertResponse {
    /// Converted amount in the target currency
    #[schema(example = 92.5)]
    pub result: f64,
    /// Normalised source currency code
    #[schema(example = "USD")]
    pub from: String,
    /// Normalised target currency code
    #[schema(example = "EUR")]
    pub to: String,
    /// Units of `to` per unit of `from`
    #[schema(example = 0.925)]
    pub from_rate: f64,
    /// Units of `from` per unit of `to`
    #[schema(example = 1.081)]
    pub to_rate: f64,
    #[schema(example = 100.0)]
    pub quantity: f64,
}

impl From<&Conversion> for ConvertResponse {
    fn from(conversion: &Conversion) -> Self {
        Self {
            result: conversion.amount,
            from: conversion.pair.from.to_string(),
            to: conversion.pair.to.to_string(),
            from_rate: conversion.rate.value(),
            to_rate: conversion.inverse_rate.value(),
            quantity: conversion.quantity,
        }
    }
}

/// Response body format for `/convert`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// Query string accepted by `/convert`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertQuery {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}
