use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::generation::RecipeDraft;

/// Soft cap on stored recipes. Records are never deleted, so an unbounded
/// map would grow until the process dies under sustained traffic.
const DEFAULT_CAPACITY: usize = 100_000;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("recipe store capacity exhausted")]
    Exhausted,
    #[error("username already taken: {0}")]
    UsernameTaken(String),
}

/// A persisted recipe. Immutable once created; there is no update or
/// delete path, records live until the process exits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRecord {
    pub id: String,
    pub title: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub suggested_additions: Option<Vec<String>>,
    pub original_ingredients: String,
    pub created_at: DateTime<Utc>,
}

/// Account record. Nothing in the HTTP surface reaches these yet; the
/// password is held in cleartext, so hash it before ever wiring up auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password: String,
}

#[derive(Default)]
struct StoreInner {
    recipes: HashMap<String, RecipeRecord>,
    // Insertion order of recipe ids; search results follow this order.
    order: Vec<String>,
    users: HashMap<String, UserRecord>,
}

/// In-memory record store. Constructed once at startup and injected into
/// the request layer; all state is lost on process exit.
pub struct RecipeStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

impl RecipeStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity,
        }
    }

    /// Assign a fresh id and creation timestamp to a draft and store it.
    pub async fn create_recipe(
        &self,
        draft: RecipeDraft,
        original_ingredients: &str,
    ) -> Result<RecipeRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.recipes.len() >= self.capacity {
            return Err(StoreError::Exhausted);
        }

        let record = RecipeRecord {
            id: Uuid::new_v4().to_string(),
            title: draft.title,
            ingredients: draft.ingredients,
            instructions: draft.instructions,
            cooking_time: draft.cooking_time,
            servings: draft.servings,
            difficulty: draft.difficulty,
            suggested_additions: draft.suggested_additions,
            original_ingredients: original_ingredients.to_string(),
            created_at: Utc::now(),
        };

        inner.order.push(record.id.clone());
        inner.recipes.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    /// Case-insensitive substring match against each record's original
    /// ingredient text, in insertion order.
    pub async fn find_by_ingredient_substring(&self, query: &str) -> Vec<RecipeRecord> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.recipes.get(id))
            .filter(|r| r.original_ingredients.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn recipe_exists(&self, id: &str) -> bool {
        self.inner.read().await.recipes.contains_key(id)
    }

    pub async fn recipe_count(&self) -> usize {
        self.inner.read().await.recipes.len()
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == username) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        inner.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Option<UserRecord> {
        self.inner.read().await.users.get(id).cloned()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<UserRecord> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }
}

impl Default for RecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> RecipeDraft {
        RecipeDraft {
            title: title.to_string(),
            ingredients: vec!["chicken".to_string(), "rice".to_string()],
            instructions: vec!["Cook everything.".to_string()],
            cooking_time: Some("25 mins".to_string()),
            servings: Some("4 servings".to_string()),
            difficulty: Some("Easy".to_string()),
            suggested_additions: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let store = RecipeStore::new();
        let a = store.create_recipe(draft("A"), "chicken, rice").await.unwrap();
        let b = store.create_recipe(draft("B"), "chicken, rice").await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(store.recipe_exists(&a.id).await);
        assert!(store.recipe_exists(&b.id).await);
    }

    #[tokio::test]
    async fn substring_search_is_case_insensitive_and_ordered() {
        let store = RecipeStore::new();
        store.create_recipe(draft("First"), "Chicken, Rice").await.unwrap();
        store.create_recipe(draft("Second"), "tofu, broccoli").await.unwrap();
        store.create_recipe(draft("Third"), "chicken, garlic").await.unwrap();

        let found = store.find_by_ingredient_substring("CHICKEN").await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].title, "First");
        assert_eq!(found[1].title, "Third");

        assert!(store.find_by_ingredient_substring("anchovy").await.is_empty());
    }

    #[tokio::test]
    async fn created_record_is_findable_by_its_own_ingredients() {
        let store = RecipeStore::new();
        let record = store
            .create_recipe(draft("Round trip"), "paneer, spinach")
            .await
            .unwrap();
        let found = store.find_by_ingredient_substring("paneer, spinach").await;
        assert!(found.iter().any(|r| r.id == record.id));
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let store = RecipeStore::with_capacity(1);
        store.create_recipe(draft("Fits"), "eggs").await.unwrap();
        let err = store.create_recipe(draft("Overflow"), "eggs").await;
        assert!(matches!(err, Err(StoreError::Exhausted)));
        assert_eq!(store.recipe_count().await, 1);
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = RecipeStore::new();
        let user = store.create_user("alice", "hunter2").await.unwrap();
        assert_eq!(store.get_user(&user.id).await.unwrap().username, "alice");
        assert!(store.get_user_by_username("alice").await.is_some());

        let dup = store.create_user("alice", "other").await;
        assert!(matches!(dup, Err(StoreError::UsernameTaken(_))));
    }
}
