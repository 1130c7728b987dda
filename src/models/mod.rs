use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One beverage pulled off a menu. `price` is kept exactly as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[cfg(test)]
impl DrinkEntry {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            price: None,
        }
    }
}

/// A completed extraction. Created once by the analyze flow, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAnalysis {
    pub analysis_id: String,
    pub drinks: Vec<DrinkEntry>,
    pub created_at: DateTime<Utc>,
    pub image_excerpt: String,  // first 100 chars of the submitted payload
    pub image_digest: String,   // hex sha256 of the decoded image
}

impl MenuAnalysis {
    pub fn total_drinks(&self) -> usize {
        self.drinks.len()
    }
}

/// Decoded image ready to be sent to the vision backend.
#[derive(Debug, Clone)]
pub struct MenuImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

// Response bodies for the HTTP boundary

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCreated {
    pub analysis_id: String,
    pub drinks: Vec<DrinkEntry>,
    pub total_drinks: usize,
}

impl From<MenuAnalysis> for AnalysisCreated {
    fn from(a: MenuAnalysis) -> Self {
        Self {
            total_drinks: a.total_drinks(),
            analysis_id: a.analysis_id,
            drinks: a.drinks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub analysis_id: String,
    pub drinks: Vec<DrinkEntry>,
    pub total_drinks: usize,
    pub timestamp: DateTime<Utc>,
}

impl From<MenuAnalysis> for AnalysisDetails {
    fn from(a: MenuAnalysis) -> Self {
        Self {
            total_drinks: a.total_drinks(),
            analysis_id: a.analysis_id,
            drinks: a.drinks,
            timestamp: a.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomDrink {
    pub selected_drink: DrinkEntry,
    pub message: String,
}
