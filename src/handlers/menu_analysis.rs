use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::MenuError;
use crate::models::{DrinkEntry, MenuAnalysis, MenuImage, RandomDrink};
use crate::services::extractor::extract_drinks;
use crate::services::ai_service::VisionPrompt;
use crate::services::{AnalysisStore, VisionAnalysisClient};

/// Rules given to the model ahead of every menu image.
pub const MENU_SYSTEM_PROMPT: &str = "You are a menu analysis expert. Your task is to analyze menu images and extract ONLY drink items.

Rules:
1. Only identify beverages, drinks, cocktails, juices, sodas, coffee, tea, wine, beer, etc.
2. Ignore all food items completely
3. Return a JSON response with this exact structure:
{
    \"drinks\": [
        {
            \"name\": \"drink name\",
            \"description\": \"brief description if available\",
            \"price\": \"price if visible\"
        }
    ]
}
4. If no drinks are found, return {\"drinks\": []}
5. Be thorough - look for all drink sections including alcoholic and non-alcoholic beverages";

/// Prompt sent alongside the image.
pub const MENU_USER_PROMPT: &str =
    "Analyze this menu image and extract all drink items. Return the response as valid JSON only.";

// Browsers and some clients drop the trailing `=`; accept both forms.
const IMAGE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const MENU_PROMPT: VisionPrompt<'static> = VisionPrompt {
    system: MENU_SYSTEM_PROMPT,
    user: MENU_USER_PROMPT,
};

const EXCERPT_CHARS: usize = 100;

pub struct MenuAnalysisService {
    store: Arc<dyn AnalysisStore>,
    vision: Arc<dyn VisionAnalysisClient>,
    vision_timeout: Duration,
}

impl MenuAnalysisService {
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        vision: Arc<dyn VisionAnalysisClient>,
        vision_timeout: Duration,
    ) -> Self {
        Self {
            store,
            vision,
            vision_timeout,
        }
    }

    /// Decode the image, ask the vision backend for drinks, and persist the result.
    ///
    /// Exactly one record is stored on success and none on failure.
    pub async fn analyze(&self, image_data: &str) -> Result<MenuAnalysis, MenuError> {
        log::info!("📸 Received image data of length: {}", image_data.len());

        let image = decode_image(image_data)?;
        log::debug!("🖼️ Decoded {} bytes ({})", image.bytes.len(), image.mime_type);

        let response = tokio::time::timeout(
            self.vision_timeout,
            self.vision.analyze(&image, &MENU_PROMPT),
        )
        .await
        .map_err(|_| MenuError::UpstreamTimeout(self.vision_timeout))??;

        log::info!("✅ Received response from vision backend: {}...", preview(&response, 200));

        let drinks = extract_drinks(&response);

        let analysis = MenuAnalysis {
            analysis_id: Uuid::new_v4().to_string(),
            drinks,
            created_at: Utc::now(),
            image_excerpt: excerpt(image_data),
            image_digest: hex::encode(Sha256::digest(&image.bytes)),
        };

        self.store.put(&analysis).await?;
        log::info!(
            "💾 Stored analysis {} with {} drinks",
            analysis.analysis_id,
            analysis.total_drinks()
        );

        Ok(analysis)
    }

    pub async fn get_analysis(&self, analysis_id: &str) -> Result<MenuAnalysis, MenuError> {
        self.store
            .get(analysis_id)
            .await?
            .ok_or_else(|| MenuError::AnalysisNotFound(analysis_id.to_string()))
    }

    /// Pick one drink uniformly at random. Never cached; each call draws again.
    pub async fn select_random(&self, analysis_id: &str) -> Result<RandomDrink, MenuError> {
        let analysis = self.get_analysis(analysis_id).await?;

        let selected = pick_drink(&analysis.drinks, &mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| MenuError::NoDrinksAvailable(analysis_id.to_string()))?;

        log::info!("🍹 Selected {} from analysis {}", selected.name, analysis_id);

        Ok(RandomDrink {
            message: format!("🍹 Your random drink choice: {}!", selected.name),
            selected_drink: selected,
        })
    }
}

pub fn pick_drink<'a, R: Rng + ?Sized>(drinks: &'a [DrinkEntry], rng: &mut R) -> Option<&'a DrinkEntry> {
    drinks.choose(rng)
}

/// Strip an optional `data:<mime>;base64,` header and decode the rest.
pub fn decode_image(image_data: &str) -> Result<MenuImage, MenuError> {
    let trimmed = image_data.trim();
    let (header, body) = match trimmed.split_once(',') {
        Some((header, body)) => (Some(header), body),
        None => (None, trimmed),
    };

    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = IMAGE_BASE64
        .decode(body.as_bytes())
        .map_err(|e| MenuError::InvalidImageEncoding(e.to_string()))?;

    if bytes.is_empty() {
        return Err(MenuError::InvalidImageEncoding("image payload is empty".to_string()));
    }

    let mime_type = header
        .and_then(mime_from_header)
        .unwrap_or_else(|| sniff_mime(&bytes))
        .to_string();

    Ok(MenuImage { bytes, mime_type })
}

fn mime_from_header(header: &str) -> Option<&str> {
    let mime = header.strip_prefix("data:")?.split(';').next()?;
    mime.starts_with("image/").then_some(mime)
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        "image/jpeg"
    }
}

fn excerpt(image_data: &str) -> String {
    if image_data.chars().count() > EXCERPT_CHARS {
        let head: String = image_data.chars().take(EXCERPT_CHARS).collect();
        format!("{}...", head)
    } else {
        image_data.to_string()
    }
}

fn preview(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
