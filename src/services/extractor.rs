use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::models::DrinkEntry;

lazy_static! {
    // First `{` through last `}`, across newlines.
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("valid drinks regex");
}

#[derive(Debug, Deserialize)]
struct RawMenu {
    drinks: Vec<serde_json::Value>,
}

/// Lenient view of a model-produced entry; fields of unexpected types are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDrink {
    name: Option<serde_json::Value>,
    description: Option<serde_json::Value>,
    price: Option<serde_json::Value>,
}

impl RawDrink {
    fn into_entry(self) -> Option<DrinkEntry> {
        let name = text(self.name)?;
        Some(DrinkEntry {
            name,
            description: text(self.description),
            price: text(self.price),
        })
    }
}

fn text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        // Models sometimes emit prices as bare numbers.
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Turn free-form model output into a validated drink list.
///
/// Never fails: unparseable text, or JSON without a `drinks` array, yields an
/// empty list. Entries without a non-empty `name` are dropped.
pub fn extract_drinks(raw: &str) -> Vec<DrinkEntry> {
    let menu = match serde_json::from_str::<RawMenu>(raw.trim()) {
        Ok(menu) => menu,
        Err(e) => {
            log::warn!("⚠️ Response is not plain JSON ({}), scanning for an embedded object", e);
            match JSON_OBJECT
                .find(raw)
                .and_then(|m| serde_json::from_str::<RawMenu>(m.as_str()).ok())
            {
                Some(menu) => {
                    log::info!("✅ Extracted JSON from response");
                    menu
                }
                None => {
                    log::warn!("❌ Could not find valid drinks JSON in response");
                    return Vec::new();
                }
            }
        }
    };

    let candidates = menu.drinks.len();
    let drinks: Vec<DrinkEntry> = menu
        .drinks
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawDrink>(value).ok())
        .filter_map(RawDrink::into_entry)
        .collect();

    if drinks.len() < candidates {
        log::debug!("Dropped {} entries without a name", candidates - drinks.len());
    }

    drinks
}
