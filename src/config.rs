use crate::domain::plan::PLAN_DAYS;
use crate::services::emotion::DEFAULT_EMOTION_MODEL_URL;
use crate::time_utils::Zone;
use anyhow::{anyhow, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub hf_api_key: String,
    pub emotion_model_url: String,
    pub database_url: Option<String>,
    pub app_enc_key: String,
    pub cache_path: String,
    pub zone: Zone,
    pub plan_chunk_days: u32,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| get(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| anyhow!("{key} missing"));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let tz_raw = or_default("DEFAULT_TIMEZONE", "UTC");
        let zone = Zone::parse(&tz_raw).ok_or_else(|| anyhow!("DEFAULT_TIMEZONE {tz_raw:?} is not a timezone"))?;

        let plan_chunk_days = match get("PLAN_CHUNK_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("PLAN_CHUNK_DAYS {raw:?} is not a number"))?
                .clamp(1, PLAN_DAYS),
            None => PLAN_DAYS,
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = or_default("PORT", "3000");
            format!("0.0.0.0:{port}")
        });

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_base_url: or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: or_default("OPENAI_MODEL", "gpt-3.5-turbo"),
            hf_api_key: required("HF_API_KEY")?,
            emotion_model_url: or_default("EMOTION_MODEL_URL", DEFAULT_EMOTION_MODEL_URL),
            database_url: get("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            app_enc_key: required("APP_ENC_KEY")?,
            cache_path: or_default("CACHE_PATH", "brightlight-cache.json"),
            zone,
            plan_chunk_days,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("OPENAI_API_KEY", "sk-test"),
        ("HF_API_KEY", "hf-test"),
        ("APP_ENC_KEY", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.plan_chunk_days, 14);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.database_url.is_none());
    }

    #[test]
    fn missing_key_fails() {
        let err = load(&REQUIRED[..2]).unwrap_err();
        assert!(err.to_string().contains("APP_ENC_KEY"));
    }

    #[test]
    fn chunk_days_clamped_and_validated() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PLAN_CHUNK_DAYS", "40"));
        assert_eq!(load(&vars).unwrap().plan_chunk_days, 14);

        vars.pop();
        vars.push(("PLAN_CHUNK_DAYS", "seven"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn port_and_timezone() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PORT", "8080"));
        vars.push(("DEFAULT_TIMEZONE", "Europe/Kyiv"));
        let config = load(&vars).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(matches!(config.zone, Zone::Named(_)));

        vars.push(("DEFAULT_TIMEZONE", "Nowhere/Special"));
        let bad: Vec<_> = vars.into_iter().filter(|(_, v)| *v != "Europe/Kyiv").collect();
        assert!(load(&bad).is_err());
    }
}
