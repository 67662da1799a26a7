//! # Cart Items and Pricing
//!
//! Item labels typed by users, the letter-count pricing rule, and currencies.

use crate::error::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum length of an item label, in characters
pub const MAX_ITEM_LENGTH: usize = 20;

/// Default checkout currency (cards and boleto both settle in BRL)
pub const DEFAULT_CURRENCY: &str = "brl";

/// Stripe currencies without a minor unit
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Price of a label in whole currency units: one unit per ASCII letter.
///
/// Digits, punctuation, whitespace and non-ASCII letters are free.
pub fn letter_price(label: &str) -> u32 {
    label.chars().filter(|c| c.is_ascii_alphabetic()).count() as u32
}

/// A user-entered shopping list label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartItem(String);

impl CartItem {
    /// Validate a label: non-empty after trimming and at most
    /// [`MAX_ITEM_LENGTH`] characters. The label itself is kept as typed.
    pub fn parse(label: impl Into<String>) -> ShopResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ShopError::Validation("Items must be non-empty strings".to_string()));
        }
        if label.chars().count() > MAX_ITEM_LENGTH {
            return Err(ShopError::Validation(format!(
                "Items can only have a maximum of {} characters",
                MAX_ITEM_LENGTH
            )));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Price in whole currency units
    pub fn price(&self) -> u32 {
        letter_price(&self.0)
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CartItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a list of raw labels into cart items.
///
/// Rejects an empty list with the message callers rely on: "Items are required".
pub fn parse_items<I, S>(labels: I) -> ShopResult<Vec<CartItem>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items = labels
        .into_iter()
        .map(|label| CartItem::parse(label))
        .collect::<ShopResult<Vec<_>>>()?;
    if items.is_empty() {
        return Err(ShopError::Validation("Items are required".to_string()));
    }
    Ok(items)
}

/// Validate the `items` field of a JSON body.
///
/// Anything other than a non-empty array of non-empty strings is a
/// validation error.
pub fn parse_items_value(value: Option<&serde_json::Value>) -> ShopResult<Vec<CartItem>> {
    let array = match value {
        Some(serde_json::Value::Array(array)) if !array.is_empty() => array,
        _ => return Err(ShopError::Validation("Items are required".to_string())),
    };
    let labels = array
        .iter()
        .map(|v| {
            v.as_str().map(String::from).ok_or_else(|| {
                ShopError::Validation("Items must be non-empty strings".to_string())
            })
        })
        .collect::<ShopResult<Vec<_>>>()?;
    parse_items(labels)
}

/// Lower-cased three-letter currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Parse a currency code; `None` or blank falls back to [`DEFAULT_CURRENCY`].
    pub fn parse(code: Option<&str>) -> ShopResult<Self> {
        let code = code
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ShopError::Validation(format!("Unsupported currency: {}", code)));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of minor units per whole unit (100 for cents, 1 for zero-decimal)
    pub fn minor_unit_factor(&self) -> i64 {
        if ZERO_DECIMAL_CURRENCIES.contains(&self.0.as_str()) {
            1
        } else {
            100
        }
    }

    /// Convert whole units to the provider's minor-unit integer
    pub fn to_minor_units(&self, whole: u32) -> i64 {
        i64::from(whole) * self.minor_unit_factor()
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_ascii_uppercase())
    }
}

/// One priced entry of a checkout request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display name (the label)
    pub name: String,
    /// Description shown on the hosted page
    pub description: String,
    /// Unit amount in minor units
    pub unit_amount: i64,
    pub quantity: u32,
}

impl LineItem {
    /// Price a cart item in the given currency
    pub fn from_item(item: &CartItem, currency: &Currency) -> Self {
        Self {
            name: item.as_str().to_string(),
            description: format!("Item: {}", item.as_str()),
            unit_amount: currency.to_minor_units(item.price()),
            quantity: 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.unit_amount * i64::from(self.quantity)
    }
}

/// A priced entry of the cart view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub name: String,
    /// Whole currency units
    pub price: u32,
}

/// The cart a user sees: the de-duplicated union of their lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    /// Whole currency units
    pub total: u32,
}

impl CartView {
    /// Build from labels, keeping first-seen order and dropping duplicates
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let items: Vec<CartEntry> = labels
            .into_iter()
            .filter(|label| seen.insert(*label))
            .map(|label| CartEntry {
                name: label.to_string(),
                price: letter_price(label),
            })
            .collect();
        let total = items.iter().map(|e| e.price).sum();
        Self { items, total }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels in cart order, as sent to checkout
    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|e| e.name.clone()).collect()
    }
}
