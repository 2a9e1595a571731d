use crate::domain::model::{NewCustomer, NewProduct};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://order_desk.db";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedConfig {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub customers: Vec<NewCustomer>,
    #[serde(default)]
    pub products: Vec<NewProduct>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_seed_group")]
    pub group: String,
    /// Creates a customer record linked to this user under the given name.
    #[serde(default)]
    pub customer_name: Option<String>,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_session_ttl() -> i64 {
    12 * 60
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_seed_group() -> String {
    crate::domain::model::CUSTOMER_GROUP.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_ttl_minutes: default_session_ttl(),
            secure_cookies: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.bind", &self.server.bind)?;
        validation::validate_range(
            "server.session_ttl_minutes",
            self.server.session_ttl_minutes,
            1,
            60 * 24 * 30,
        )?;
        validation::validate_database_url("database.url", &self.database.url)?;
        validation::validate_positive_number(
            "database.max_connections",
            self.database.max_connections as usize,
            1,
        )?;

        for (i, user) in self.seed.users.iter().enumerate() {
            validation::validate_non_empty_string(&format!("seed.users[{i}].username"), &user.username)?;
            validation::validate_non_empty_string(&format!("seed.users[{i}].password"), &user.password)?;
        }
        for (i, customer) in self.seed.customers.iter().enumerate() {
            validation::validate_non_empty_string(&format!("seed.customers[{i}].name"), &customer.name)?;
        }
        for (i, product) in self.seed.products.iter().enumerate() {
            validation::validate_non_empty_string(&format!("seed.products[{i}].name"), &product.name)?;
            if product.price < 0.0 || !product.price.is_finite() {
                return Err(AppError::InvalidConfigValueError {
                    field: format!("seed.products[{i}].price"),
                    value: product.price.to_string(),
                    reason: "Price must be a non-negative number".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn bind_address(&self) -> &str {
        &self.server.bind
    }

    fn database_url(&self) -> &str {
        &self.database.url
    }

    fn max_connections(&self) -> u32 {
        self.database.max_connections
    }

    fn session_ttl_minutes(&self) -> i64 {
        self.server.session_ttl_minutes
    }

    fn secure_cookies(&self) -> bool {
        self.server.secure_cookies
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Category;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.bind_address(), DEFAULT_BIND);
        assert_eq!(config.database_url(), DEFAULT_DATABASE_URL);
        assert_eq!(config.session_ttl_minutes(), 720);
        assert!(!config.secure_cookies());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:9000"
session_ttl_minutes = 60
secure_cookies = true

[database]
url = "sqlite::memory:"
max_connections = 2

[[seed.users]]
username = "staff"
password = "change-me-now"
group = "admin"

[[seed.customers]]
name = "Peter Piper"
phone = "555-0101"

[[seed.products]]
name = "BBQ Grill"
price = 200.0
category = "Out Door"
tags = ["Kitchen", "Summer"]
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:9000");
        assert_eq!(config.max_connections(), 2);
        assert!(config.secure_cookies());
        assert_eq!(config.seed.users[0].group, "admin");
        assert_eq!(config.seed.customers[0].phone.as_deref(), Some("555-0101"));
        assert_eq!(config.seed.products[0].category, Some(Category::OutDoor));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seed_user_defaults_to_customer_group() {
        let toml_content = r#"
[[seed.users]]
username = "peter"
password = "change-me-now"
"#;
        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.seed.users[0].group, "customer");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ORDER_DESK_TEST_DB", "sqlite://from-env.db");

        let toml_content = r#"
[database]
url = "${ORDER_DESK_TEST_DB}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database_url(), "sqlite://from-env.db");

        std::env::remove_var("ORDER_DESK_TEST_DB");
    }

    #[test]
    fn test_config_validation() {
        let bad_bind = TomlConfig::from_toml_str("[server]\nbind = \"nowhere\"\n").unwrap();
        assert!(bad_bind.validate().is_err());

        let bad_db = TomlConfig::from_toml_str("[database]\nurl = \"mysql://x\"\n").unwrap();
        assert!(bad_db.validate().is_err());

        let bad_price = TomlConfig::from_toml_str(
            "[[seed.products]]\nname = \"Ball\"\nprice = -1.0\n",
        )
        .unwrap();
        assert!(bad_price.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nbind = \"127.0.0.1:8123\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8123");
    }

    #[test]
    fn test_malformed_toml_is_a_config_error() {
        let err = TomlConfig::from_toml_str("[server\nbind = 1").unwrap_err();
        assert!(matches!(err, AppError::ConfigValidationError { .. }));
    }
}
