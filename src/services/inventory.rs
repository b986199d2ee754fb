use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::inventory_item::{self, Entity as InventoryItems, TrendData};
use crate::errors::ServiceError;

/// Fields accepted when creating an item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub balance: Option<i32>,
    pub min_stock: i32,
    pub trend_data: Option<TrendData>,
    pub image_url: Option<String>,
}

/// Partial update; only present fields overwrite.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub balance: Option<i32>,
    pub min_stock: Option<i32>,
    pub trend_data: Option<TrendData>,
    pub image_url: Option<String>,
}

/// Service owning the inventory business rules. Every operation is scoped to
/// the calling user: lookups always filter on item id and owner id together,
/// so another user's item id behaves exactly like a missing one.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        InventoryItems::find()
            .filter(inventory_item::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        self.find_owned(user_id, id).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_item(
        &self,
        user_id: Uuid,
        input: NewItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        let key = item_key(&input.name);

        let existing = InventoryItems::find()
            .filter(inventory_item::Column::ItemKey.eq(&key))
            .filter(inventory_item::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::AlreadyExists(format!(
                "Item with name '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let created = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            item_key: Set(key),
            balance: Set(input.balance.unwrap_or(0)),
            min_stock: Set(input.min_stock),
            trend_data: Set(input
                .trend_data
                .unwrap_or_else(|| initial_trend_data(now))),
            user_id: Set(user_id),
            image_url: Set(input.image_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        info!(item_id = %created.id, item_key = %created.item_key, "item created");
        Ok(created)
    }

    /// Applies only the fields present in the patch. A name change recomputes
    /// the item key; key uniqueness is enforced at creation only.
    #[instrument(skip(self, patch))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: ItemPatch,
    ) -> Result<inventory_item::Model, ServiceError> {
        let current = self.find_owned(user_id, id).await?;
        let mut item: inventory_item::ActiveModel = current.into();

        if let Some(name) = patch.name {
            item.item_key = Set(item_key(&name));
            item.name = Set(name);
        }
        if let Some(balance) = patch.balance {
            item.balance = Set(balance);
        }
        if let Some(min_stock) = patch.min_stock {
            item.min_stock = Set(min_stock);
        }
        if let Some(trend_data) = patch.trend_data {
            item.trend_data = Set(trend_data);
        }
        if let Some(image_url) = patch.image_url {
            item.image_url = Set(Some(image_url));
        }
        item.updated_at = Set(Utc::now());

        item.update(&*self.db).await.map_err(Into::into)
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let item = self.find_owned(user_id, id).await?;
        item.delete(&*self.db).await?;
        info!(item_id = %id, "item deleted");
        Ok(())
    }

    /// Case-insensitive substring match on the item name; an empty query
    /// matches everything. The comparison runs in-memory over the user's
    /// items so it does not depend on store collation.
    #[instrument(skip(self))]
    pub async fn search_items(
        &self,
        user_id: Uuid,
        query: &str,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let needle = query.to_lowercase();
        let items = self.list_items(user_id).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Items at or below their minimum stock threshold; the boundary is
    /// inclusive, so `balance == min_stock` counts as low.
    #[instrument(skip(self))]
    pub async fn low_stock_items(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let items = self.list_items(user_id).await?;
        Ok(items
            .into_iter()
            .filter(|item| item.balance <= item.min_stock)
            .collect())
    }

    /// Adds `delta` (which may be negative) to the item's balance. The result
    /// is persisted as-is, without re-running creation-time validation.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        user_id: Uuid,
        id: Uuid,
        delta: i32,
    ) -> Result<inventory_item::Model, ServiceError> {
        let current = self.find_owned(user_id, id).await?;
        let balance = current.balance + delta;

        info!(item_id = %id, delta, balance, "stock adjusted");

        let mut item: inventory_item::ActiveModel = current.into();
        item.balance = Set(balance);
        item.updated_at = Set(Utc::now());
        item.update(&*self.db).await.map_err(Into::into)
    }

    /// Owner-scoped lookup: the id and owner filters travel in one query so
    /// an item belonging to someone else is indistinguishable from a missing
    /// one.
    async fn find_owned(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        InventoryItems::find()
            .filter(inventory_item::Column::Id.eq(id))
            .filter(inventory_item::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item not found with id: {}", id)))
    }
}

/// Derives the URL-safe item key: lower-case the name, then delete every
/// character outside `[a-z0-9]`. Separator runs collapse to nothing, so
/// "Milk & Eggs!" becomes "milkeggs".
pub fn item_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9'))
        .collect()
}

/// Empty trend buckets for the current and next calendar year.
pub fn initial_trend_data(now: DateTime<Utc>) -> TrendData {
    let year = now.year();
    let mut buckets = BTreeMap::new();
    buckets.insert(year.to_string(), BTreeMap::new());
    buckets.insert((year + 1).to_string(), BTreeMap::new());
    TrendData(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("Milk", "milk")]
    #[case("Milk & Eggs!", "milkeggs")]
    #[case("Ice-Cream #1", "icecream1")]
    #[case("  Spaced   Out  ", "spacedout")]
    #[case("CAFÉ au lait", "cafaulait")]
    #[case("!!!", "")]
    #[case("42", "42")]
    fn item_key_derivation(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(item_key(name), expected);
    }

    #[test]
    fn item_key_collapses_separator_runs_to_nothing() {
        // Runs of separators are deleted outright, never replaced.
        assert_eq!(item_key("a - _ - b"), "ab");
        assert_eq!(item_key("a---b"), item_key("a b"));
    }

    #[test]
    fn initial_trend_data_covers_this_year_and_next() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let trend = initial_trend_data(now);

        assert_eq!(trend.0.len(), 2);
        assert!(trend.0.contains_key("2026"));
        assert!(trend.0.contains_key("2027"));
        assert!(trend.0["2026"].is_empty());
    }

    #[test]
    fn initial_trend_data_rolls_over_at_year_end() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let trend = initial_trend_data(now);
        assert!(trend.0.contains_key("2026"));
        assert!(trend.0.contains_key("2027"));
    }
}
