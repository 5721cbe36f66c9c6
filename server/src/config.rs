use anyhow::Result;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    pub run_migrations_on_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: Vec::new(),
            run_migrations_on_start: true,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cors_allowed_origins =
            parse_origins(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());
        let run_migrations_on_start = env_bool("RUN_MIGRATIONS_ON_START", true);
        Ok(Self {
            cors_allowed_origins,
            run_migrations_on_start,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

fn env_bool(var: &str, default: bool) -> bool {
    std::env::var(var)
        .ok()
        .map(|value| parse_bool(&value))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
