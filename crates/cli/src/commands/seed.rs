//! Seed the catalog from a YAML file.
//!
//! The file holds a list of services with their categories and items nested
//! inside. Every record is upserted by its natural key, so re-running the
//! same file is a no-op and edits overwrite what is stored. Each write fires
//! the catalog change trigger, so running storefronts pick the edits up.
//!
//! ```yaml
//! services:
//!   - service_identifier: wash-and-fold
//!     name: Wash & Fold
//!     sequence: 1
//!     categories:
//!       - name: Bags
//!         items:
//!           - name: Eazy Bag
//!             price: "24.95"
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{error, info};

use eazyy_storefront::db::{self, CatalogRepository};
use eazyy_storefront::db::catalog::ServiceSeed;

use super::{CommandError, database_url};

/// Top level of a seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    pub services: Vec<ServiceSeed>,
}

/// Counts of upserted records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub services: usize,
    pub categories: usize,
    pub items: usize,
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails validation, or if a
/// database write fails.
pub async fn catalog(file_path: &str) -> Result<(), CommandError> {
    info!(path = %file_path, "Loading catalog seed");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let seed = parse(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let repo = CatalogRepository::new(pool);
    let mut summary = SeedSummary::default();

    for service in &seed.services {
        let service_id = repo.upsert_service(service).await?;
        summary.services += 1;

        for category in &service.categories {
            let category_id = repo.upsert_category(service_id, category).await?;
            summary.categories += 1;

            for item in &category.items {
                repo.upsert_item(category_id, item).await?;
                summary.items += 1;
            }
        }
    }

    info!("Seeding complete!");
    info!("  Services: {}", summary.services);
    info!("  Categories: {}", summary.categories);
    info!("  Items: {}", summary.items);

    Ok(())
}

fn parse(content: &str) -> Result<CatalogSeed, CommandError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Every problem in the seed, so they can be fixed in one pass.
fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut identifiers = HashSet::new();

    for service in &seed.services {
        let id = service.service_identifier.trim();
        if id.is_empty() {
            errors.push(format!("service '{}' has no service_identifier", service.name));
        } else if !identifiers.insert(id) {
            errors.push(format!("duplicate service_identifier '{id}'"));
        }

        let mut categories = HashSet::new();
        for category in &service.categories {
            if !categories.insert(category.name.as_str()) {
                errors.push(format!("{id}: duplicate category '{}'", category.name));
            }

            let mut items = HashSet::new();
            for item in &category.items {
                if !items.insert(item.name.as_str()) {
                    errors.push(format!("{id}/{}: duplicate item '{}'", category.name, item.name));
                }
                if item.price.is_none() && !item.is_custom_price {
                    errors.push(format!(
                        "{id}/{}: item '{}' needs a price or is_custom_price",
                        category.name, item.name
                    ));
                }
            }
        }
    }

    errors
}
