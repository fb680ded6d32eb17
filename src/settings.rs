use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub enable_swagger: bool,
    pub port: u16,
    pub class_capacity: u32,
    pub daily_class_limit: u32,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// Bootstrap admin account, created at startup when both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // Load from environment variables with APP_ prefix. No separator:
            // APP_CLASS_CAPACITY maps to the flat key class_capacity.
            .add_source(Environment::with_prefix("APP"))
            .set_default("debug", false)?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("class_capacity", 10)?
            .set_default("daily_class_limit", 5)?
            .set_default("access_token_secret", "access-secret-change-me")?
            .set_default("refresh_token_secret", "refresh-secret-change-me")?
            .set_default("access_token_ttl_minutes", 15)?
            .set_default("refresh_token_ttl_days", 10)?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn clear_app_env() {
        let keys: Vec<String> = std::env::vars()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with("APP_"))
            .collect();
        for key in keys {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_app_env();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.class_capacity, 10);
        assert_eq!(settings.daily_class_limit, 5);
        assert!(settings.admin_email.is_none());
    }

    #[test]
    #[serial]
    fn test_port_override() {
        clear_app_env();
        unsafe { std::env::set_var("APP_PORT", "9090") };
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 9090);
        unsafe { std::env::remove_var("APP_PORT") };
    }

    #[test]
    #[serial]
    fn test_multi_word_overrides() {
        clear_app_env();
        unsafe {
            std::env::set_var("APP_CLASS_CAPACITY", "3");
            std::env::set_var("APP_DAILY_CLASS_LIMIT", "2");
            std::env::set_var("APP_ACCESS_TOKEN_SECRET", "real-secret");
            std::env::set_var("APP_ADMIN_EMAIL", "admin@example.com");
            std::env::set_var("APP_ADMIN_PASSWORD", "admin-pw");
        }
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.class_capacity, 3);
        assert_eq!(settings.daily_class_limit, 2);
        assert_eq!(settings.access_token_secret, "real-secret");
        assert_eq!(settings.admin_email.as_deref(), Some("admin@example.com"));
        assert_eq!(settings.admin_password.as_deref(), Some("admin-pw"));
        clear_app_env();
    }
}
