//! # shop-wasm
//!
//! WebAssembly bindings for shopaholic.
//!
//! The browser prices and validates the cart with the same rules the server
//! applies at checkout, so the totals shown before redirecting always match
//! the Stripe session.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { item_price, validate_item, cart_summary, format_price } from 'shop-wasm';
//!
//! await init();
//!
//! validate_item('Milk');                 // undefined (valid)
//! item_price('Bread');                   // 5
//! const cart = cart_summary(['Milk', 'Bread', 'Milk']);
//! console.log(format_price(cart.total, 'brl')); // "R$ 9.00"
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build crates/shop-wasm --target web
//! ```

use shop_core::{letter_price, CartItem, CartView, Currency, MAX_ITEM_LENGTH};
use wasm_bindgen::prelude::*;

/// Price of one item label, in whole currency units
#[wasm_bindgen]
pub fn item_price(label: &str) -> u32 {
    letter_price(label)
}

/// Validation error for a label, or `undefined` when it can be added to a list
#[wasm_bindgen]
pub fn validate_item(label: &str) -> Option<String> {
    CartItem::parse(label).err().map(|e| e.to_string())
}

/// Longest accepted item label
#[wasm_bindgen]
pub fn max_item_length() -> usize {
    MAX_ITEM_LENGTH
}

/// De-duplicate and price a list of labels: `{ items: [{ name, price }], total }`
#[wasm_bindgen]
pub fn cart_summary(items: JsValue) -> Result<JsValue, JsValue> {
    let labels: Vec<String> = serde_wasm_bindgen::from_value(items)
        .map_err(|e| JsValue::from_str(&format!("Invalid cart items: {}", e)))?;

    serde_wasm_bindgen::to_value(&summarize(&labels))
        .map_err(|e| JsValue::from_str(&format!("Failed to encode cart: {}", e)))
}

fn summarize(labels: &[String]) -> CartView {
    CartView::from_labels(labels.iter().map(String::as_str))
}

/// Format whole units for display, e.g. `R$ 9.00`
#[wasm_bindgen]
pub fn format_price(units: u32, currency: Option<String>) -> Result<String, JsValue> {
    let currency = Currency::parse(currency.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(render_price(units, &currency))
}

fn render_price(units: u32, currency: &Currency) -> String {
    let symbol = match currency.as_str() {
        "brl" => "R$ ".to_string(),
        "usd" => "$".to_string(),
        "eur" => "€".to_string(),
        "gbp" => "£".to_string(),
        _ => format!("{} ", currency),
    };
    if currency.minor_unit_factor() == 1 {
        format!("{}{}", symbol, units)
    } else {
        format!("{}{}.00", symbol, units)
    }
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
