// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pricing rules for tutoring requests.
//!
//! Prices travel as decimal strings. A student price is either an explicit
//! override or the tutor price times a per-country multiplier, raised to the
//! request's minimum price. Anything that does not parse yields `"0"`.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Multiplier for students in Lebanon.
pub const LEBANON_MULTIPLIER: f64 = 2.0;
/// Multiplier everywhere else (and when the country is unknown).
pub const DEFAULT_MULTIPLIER: f64 = 3.0;

/// Returned when no valid price can be derived.
pub const ZERO_PRICE: &str = "0";

/// Inputs to [`calculate_student_price`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceInputs<'a> {
    pub student_price: Option<&'a str>,
    pub tutor_price: Option<&'a str>,
    pub country: Option<&'a str>,
    pub min_price: Option<&'a str>,
}

/// Where an effective student price came from (drives the UI badge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Override,
    Calculated,
}

/// A student price together with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EffectivePrice {
    pub price: String,
    pub source: PriceSource,
}

/// Parse a price string; `None` for empty, malformed or non-finite input.
pub fn parse_price(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// `validator` check for price fields: any non-negative decimal string.
pub fn validate_price(value: &str) -> Result<(), validator::ValidationError> {
    match parse_price(value) {
        Some(v) if v >= 0.0 => Ok(()),
        _ => Err(validator::ValidationError::new("price")
            .with_message("must be a non-negative number".into())),
    }
}

/// Format a price with two decimals.
pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

/// Multiplier applied to a tutor price to get the student price.
pub fn country_multiplier(country: Option<&str>) -> f64 {
    match country {
        Some(c) if c.trim().eq_ignore_ascii_case("LEBANON") => LEBANON_MULTIPLIER,
        _ => DEFAULT_MULTIPLIER,
    }
}

/// Whether a stored student price is an explicit override.
///
/// Empty, zero and unparseable values are not overrides.
pub fn is_student_price_override(value: &str) -> bool {
    parse_price(value).is_some_and(|v| v != 0.0)
}

/// Compute the student-facing price.
///
/// Priority: override, then `tutor_price × multiplier` floored at
/// `min_price`, then `"0"`.
pub fn calculate_student_price(inputs: PriceInputs<'_>) -> String {
    effective_student_price(inputs).price
}

/// Like [`calculate_student_price`], also reporting whether it was an override.
pub fn effective_student_price(inputs: PriceInputs<'_>) -> EffectivePrice {
    if let Some(price) = inputs
        .student_price
        .and_then(parse_price)
        .filter(|v| *v != 0.0)
    {
        return EffectivePrice {
            price: format_price(price),
            source: PriceSource::Override,
        };
    }

    let calculated = inputs
        .tutor_price
        .and_then(parse_price)
        .filter(|v| *v > 0.0)
        .map(|tutor| {
            let price = tutor * country_multiplier(inputs.country);
            match inputs.min_price.and_then(parse_price) {
                Some(min) if price < min => min,
                _ => price,
            }
        });

    EffectivePrice {
        price: calculated.map_or_else(|| ZERO_PRICE.to_string(), format_price),
        source: PriceSource::Calculated,
    }
}

/// Student-facing price for a fresh tutor bid.
pub fn calculate_tutor_offer_price(tutor_price: &str, country: Option<&str>) -> String {
    match parse_price(tutor_price).filter(|v| *v > 0.0) {
        Some(tutor) => format_price(tutor * country_multiplier(country)),
        None => ZERO_PRICE.to_string(),
    }
}
