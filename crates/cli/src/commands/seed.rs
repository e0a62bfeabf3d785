//! Catalog seeding from YAML.
//!
//! Running the same file twice changes nothing the second time: categories
//! are matched by slug, stores by name within their owner's stores, and
//! products by name within their store.
//!
//! # File format
//!
//! ```yaml
//! categories:
//!   - slug: electronics
//!     name_en: Electronics
//!     name_ar: إلكترونيات
//!     icon: "📱"
//! stores:
//!   - store_name: Demo Electronics
//!     owner_email: seller@example.com
//!     products:
//!       - name: Wireless Earbuds
//!         category: electronics
//!         price: "49.99"
//!         stock: 30
//! ```
//!
//! Store owners must already have accounts. Seeded stores are approved.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use sqlx::PgPool;

use souq_api::db::categories::{CategoryRepository, NewCategory};
use souq_api::db::products::{NewProduct, ProductRepository};
use souq_api::db::stores::{NewStore, StoreRepository};
use souq_api::db::users::UserRepository;
use souq_core::{CategoryId, Email, Price, StoreStatus};

use super::{CommandError, connect};

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    categories: Vec<CategorySeed>,
    #[serde(default)]
    stores: Vec<StoreSeed>,
}

#[derive(Debug, Deserialize)]
struct CategorySeed {
    slug: String,
    name_en: String,
    name_ar: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct StoreSeed {
    store_name: String,
    owner_email: String,
    #[serde(default)]
    description: String,
    phone: Option<String>,
    logo: Option<String>,
    #[serde(default)]
    products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
struct ProductSeed {
    name: String,
    /// Category slug.
    category: String,
    price: Price,
    #[serde(default)]
    stock: i32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    shoe_sizes: Vec<String>,
}

#[derive(Debug, Default)]
struct SeedCounts {
    categories_created: usize,
    categories_updated: usize,
    stores_created: usize,
    products_created: usize,
    products_skipped: usize,
}

fn parse_catalog(yaml: &str) -> Result<CatalogFile, CommandError> {
    let catalog: CatalogFile = serde_yaml::from_str(yaml)?;

    for category in &catalog.categories {
        if category.slug.trim().is_empty() || category.name_en.trim().is_empty() {
            return Err(CommandError::Invalid(
                "Every category needs a slug and an English name".to_owned(),
            ));
        }
    }
    for store in &catalog.stores {
        if store.store_name.trim().is_empty() {
            return Err(CommandError::Invalid("Every store needs a name".to_owned()));
        }
        if let Some(product) = store.products.iter().find(|p| p.stock < 0) {
            return Err(CommandError::Invalid(format!(
                "Negative stock for '{}' in '{}'",
                product.name, store.store_name
            )));
        }
    }

    Ok(catalog)
}

/// Load a catalog file.
pub async fn catalog(path: &Path) -> Result<(), CommandError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| CommandError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog = parse_catalog(&yaml)?;

    let pool = connect().await?;
    let mut counts = SeedCounts::default();

    let slugs = seed_categories(&pool, &catalog.categories, &mut counts).await?;
    for store in &catalog.stores {
        seed_store(&pool, store, &slugs, &mut counts).await?;
    }

    tracing::info!(
        categories_created = counts.categories_created,
        categories_updated = counts.categories_updated,
        stores_created = counts.stores_created,
        products_created = counts.products_created,
        products_skipped = counts.products_skipped,
        "Seeding complete"
    );
    Ok(())
}

/// Upsert categories and return every known category by slug.
async fn seed_categories(
    pool: &PgPool,
    seeds: &[CategorySeed],
    counts: &mut SeedCounts,
) -> Result<HashMap<String, CategoryId>, CommandError> {
    let repo = CategoryRepository::new(pool);

    for seed in seeds {
        let slug = seed.slug.trim().to_lowercase();
        let (category, inserted) = repo
            .upsert(&NewCategory {
                name_ar: seed.name_ar.trim(),
                name_en: seed.name_en.trim(),
                slug: &slug,
                icon: seed.icon.trim(),
            })
            .await?;
        if inserted {
            counts.categories_created += 1;
            tracing::info!("Created category {}", category.slug);
        } else {
            counts.categories_updated += 1;
        }
    }

    Ok(repo
        .list()
        .await?
        .into_iter()
        .map(|c| (c.slug, c.id))
        .collect())
}

async fn seed_store(
    pool: &PgPool,
    seed: &StoreSeed,
    slugs: &HashMap<String, CategoryId>,
    counts: &mut SeedCounts,
) -> Result<(), CommandError> {
    let email = Email::parse(&seed.owner_email)
        .map_err(|e| CommandError::Invalid(format!("{}: {e}", seed.owner_email)))?;
    let owner = UserRepository::new(pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| {
            CommandError::Invalid(format!(
                "No account for {email}; create it with `souq-cli admin create --role store_owner`"
            ))
        })?;
    if !owner.role.can_sell() {
        return Err(CommandError::Invalid(format!(
            "{email} is a {} and cannot own stores",
            owner.role
        )));
    }

    let stores = StoreRepository::new(pool);
    let store_name = seed.store_name.trim();
    let existing = stores
        .list_by_owner(owner.id)
        .await?
        .into_iter()
        .find(|s| s.store_name == store_name);

    let store = if let Some(store) = existing {
        store
    } else {
        let store = stores
            .create(&NewStore {
                owner_id: owner.id,
                store_name,
                description: seed.description.trim(),
                phone: seed.phone.as_deref(),
                logo: seed.logo.as_deref(),
            })
            .await?;
        stores.set_status(store.id, StoreStatus::Approved).await?;
        counts.stores_created += 1;
        tracing::info!("Created store {} ({})", store.store_name, store.id);
        store
    };

    let products = ProductRepository::new(pool);
    for product in &seed.products {
        let name = product.name.trim();
        if products.exists_in_store(store.id, name).await? {
            counts.products_skipped += 1;
            continue;
        }
        let category_id = *slugs.get(product.category.trim()).ok_or_else(|| {
            CommandError::Invalid(format!(
                "Unknown category '{}' for product '{name}'",
                product.category
            ))
        })?;

        products
            .create(&NewProduct {
                store_id: store.id,
                category_id,
                name: name.to_owned(),
                description: product.description.trim().to_owned(),
                price: product.price,
                images: product.images.clone(),
                stock: product.stock,
                sizes: product.sizes.clone(),
                colors: product.colors.clone(),
                shoe_sizes: product.shoe_sizes.clone(),
            })
            .await?;
        counts.products_created += 1;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = parse_catalog(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(catalog.categories.iter().any(|c| c.slug == "electronics"));
        let slugs: Vec<&str> = catalog.categories.iter().map(|c| c.slug.as_str()).collect();
        for store in &catalog.stores {
            for product in &store.products {
                assert!(
                    slugs.contains(&product.category.as_str()),
                    "{} uses unknown category {}",
                    product.name,
                    product.category
                );
            }
        }
    }

    #[test]
    fn test_prices_accept_strings_and_numbers() {
        let catalog = parse_catalog(
            r#"
stores:
  - store_name: Corner Shop
    owner_email: owner@example.com
    products:
      - { name: A, category: misc, price: "12.50" }
      - { name: B, category: misc, price: 3 }
"#,
        )
        .unwrap();
        let products = &catalog.stores[0].products;
        assert_eq!(products[0].price.to_string(), "12.50");
        assert_eq!(products[1].stock, 0);
    }

    fn single_product(row: &str) -> String {
        format!(
            "stores:\n  - store_name: S\n    owner_email: a@b.co\n    products:\n      - {row}\n"
        )
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(parse_catalog("categories:\n  - { slug: '', name_en: X, name_ar: Y }\n").is_err());
        for row in [
            "{ name: A, category: c, price: 1, stock: -1 }",
            "{ name: A, category: c, price: '-1' }",
            "{ name: A, category: c, price: 100000000000 }",
        ] {
            assert!(parse_catalog(&single_product(row)).is_err(), "{row}");
        }
    }
}
