use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Checked when a plan is generated, not at startup.
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub store_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|key| !key.trim().is_empty()),
            api_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into()),
            store_path: std::env::var("LESSON_PLANS_PATH")
                .unwrap_or_else(|_| "data/lessonPlans.json".into())
                .into(),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".into()).into(),
        }
    }
}
