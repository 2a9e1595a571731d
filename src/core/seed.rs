use crate::config::toml_config::SeedConfig;
use crate::core::accounts;
use crate::domain::model::{NewCustomer, ADMIN_GROUP, CUSTOMER_GROUP};
use crate::domain::ports::Store;
use crate::utils::error::Result;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub customers: usize,
    pub products: usize,
}

/// Applies seed data. Records whose username or name already exists are skipped,
/// so running it on every start is harmless.
pub async fn apply(store: &dyn Store, seed: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for group in [ADMIN_GROUP, CUSTOMER_GROUP] {
        store.ensure_group(group).await?;
    }

    for user in &seed.users {
        if store.find_user_by_username(&user.username).await?.is_some() {
            tracing::debug!("Seed user '{}' already exists", user.username);
            continue;
        }
        store.ensure_group(&user.group).await?;
        let created = accounts::create_account(
            store,
            &user.username,
            &user.password,
            user.email.clone(),
            &user.group,
        )
        .await?;
        report.users += 1;

        if let Some(name) = &user.customer_name {
            store
                .create_customer(NewCustomer {
                    name: name.clone(),
                    phone: None,
                    email: user.email.clone(),
                    user_id: Some(created.id),
                })
                .await?;
            report.customers += 1;
        }
    }

    for customer in &seed.customers {
        if store.find_customer_by_name(&customer.name).await?.is_some() {
            continue;
        }
        store.create_customer(customer.clone()).await?;
        report.customers += 1;
    }

    for product in &seed.products {
        if store.find_product_by_name(&product.name).await?.is_some() {
            continue;
        }
        store.create_product(product.clone()).await?;
        report.products += 1;
    }

    tracing::info!(
        "Seed applied: {} user(s), {} customer(s), {} product(s) added",
        report.users,
        report.customers,
        report.products
    );
    Ok(report)
}
