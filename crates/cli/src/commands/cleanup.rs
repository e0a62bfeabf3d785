//! Removal of test stores.

use souq_api::db::stores::StoreRepository;

use super::{CommandError, connect};

/// Delete every store whose name contains `pattern`, with its products.
///
/// Without `confirmed` the matches are only listed.
pub async fn stores(pattern: &str, confirmed: bool) -> Result<(), CommandError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(CommandError::Invalid("Pattern cannot be empty".to_owned()));
    }

    let pool = connect().await?;
    let repo = StoreRepository::new(&pool);
    let matches = repo.find_by_name(pattern).await?;

    if matches.is_empty() {
        tracing::info!("No stores match '{}'", pattern);
        return Ok(());
    }

    tracing::info!("{} store(s) match '{}':", matches.len(), pattern);
    for store in &matches {
        tracing::info!("  - {} ({}, {})", store.store_name, store.id, store.status);
    }

    if !confirmed {
        tracing::warn!(
            "Nothing deleted. Re-run with --yes to delete these stores and their products."
        );
        return Ok(());
    }

    let mut products_deleted = 0;
    for store in &matches {
        let removed = repo.delete_with_products(store.id).await?;
        tracing::info!(
            store_id = %store.id,
            products_deleted = removed,
            "Deleted {}",
            store.store_name
        );
        products_deleted += removed;
    }

    tracing::info!(
        "Deleted {} store(s) and {} product(s)",
        matches.len(),
        products_deleted
    );
    Ok(())
}
