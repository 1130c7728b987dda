pub mod ai_service; // Vision backend abstraction
pub mod database;
pub mod extractor;
pub mod openrouter; // OpenRouter AI service
pub mod store;

pub use ai_service::VisionAnalysisClient;
pub use database::Database;
pub use openrouter::OpenRouterService;
pub use store::{AnalysisStore, InMemoryStore};
