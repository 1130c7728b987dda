pub mod menu_analysis;

pub use menu_analysis::MenuAnalysisService;
