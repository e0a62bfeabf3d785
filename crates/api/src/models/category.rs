//! Product category.

use serde::{Deserialize, Serialize};

use souq_core::CategoryId;

/// Bilingual reference category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub icon: String,
}
