use order_desk::core::{accounts, seed};
use order_desk::domain::ports::{ConfigProvider, CustomerRepository, ProductRepository};
use order_desk::utils::validation::Validate;
use order_desk::{SqliteStore, TomlConfig};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[server]
bind = "127.0.0.1:9000"
session_ttl_minutes = 30

[database]
url = "sqlite::memory:"

[[seed.users]]
username = "staff"
password = "${ORDER_DESK_TEST_ADMIN_PASSWORD}"
group = "admin"

[[seed.users]]
username = "peter"
password = "orange-Bicycle-42"
email = "peter@example.com"
customer_name = "Peter Piper"

[[seed.customers]]
name = "Walk-in"
phone = "555-0100"

[[seed.products]]
name = "Ceiling Light"
price = 49.5
category = "Indoor"
tags = ["Kitchen", "Bedroom"]

[[seed.products]]
name = "BBQ Grill"
price = 199.0
category = "Out Door"
"#;

#[tokio::test]
async fn test_seed_from_config_file_is_idempotent() {
    std::env::set_var("ORDER_DESK_TEST_ADMIN_PASSWORD", "violet-Harbor-77");
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("order_desk.toml");
    fs::write(&path, CONFIG).unwrap();

    let config = TomlConfig::from_file(&path).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.bind_address(), "127.0.0.1:9000");
    assert_eq!(config.session_ttl_minutes(), 30);

    let store = SqliteStore::in_memory().await.unwrap();
    let first = seed::apply(&store, &config.seed).await.unwrap();
    assert_eq!(first.users, 2);
    assert_eq!(first.customers, 2);
    assert_eq!(first.products, 2);

    let second = seed::apply(&store, &config.seed).await.unwrap();
    assert_eq!(second, seed::SeedReport::default());

    let staff = accounts::authenticate(&store, "staff", "violet-Harbor-77")
        .await
        .unwrap()
        .unwrap();
    assert!(staff.is_admin());

    let peter = accounts::authenticate(&store, "peter", "orange-Bicycle-42")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(peter.landing_path(), "/user/");
    let linked = store.customer_for_user(peter.id).await.unwrap().unwrap();
    assert_eq!(linked.name, "Peter Piper");

    let products = store.list_products().await.unwrap();
    let light = products.iter().find(|p| p.name == "Ceiling Light").unwrap();
    assert_eq!(light.tags, vec!["Bedroom", "Kitchen"]);
}

#[test]
fn test_invalid_bind_address_fails_validation() {
    let config = TomlConfig::from_toml_str("[server]\nbind = \"not-an-address\"\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.user_friendly_message().contains("server.bind"));
}
