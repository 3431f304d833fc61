//! Application-facing store combining remote queries with local favorites.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiClient, ApiError};
use crate::models::{Meal, MealCollection, MealError};

/// File name of the persisted favorites, under the home directory.
const FAVORITES_FILE_NAME: &str = "favorite_meals.json";

/// Errors raised by `FavoritesStore`.
#[derive(Debug)]
pub enum StoreError {
    Api(ApiError),
    Meal(MealError),
    /// Category list response did not decode
    BadCategories(String),
    /// Category not present in the cached list
    UnknownCategory(String),
    /// Tried to favorite a reference-only meal
    NotComplete(String),
    /// Change check before any checkpoint was established
    NoCheckpoint,
    /// Favorites file exists but did not parse
    BadFavoritesFile(PathBuf, String),
    /// Favorites file I/O failure
    Io(PathBuf, std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Api(e) => write!(f, "{}", e),
            StoreError::Meal(e) => write!(f, "{}", e),
            StoreError::BadCategories(detail) => {
                write!(f, "malformed category list: {}", detail)
            }
            StoreError::UnknownCategory(category) => {
                write!(f, "`{}` is not a known category", category)
            }
            StoreError::NotComplete(id) => {
                write!(f, "meal {} is not complete, resolve it first", id)
            }
            StoreError::NoCheckpoint => {
                write!(f, "change tracking queried before any checkpoint was set")
            }
            StoreError::BadFavoritesFile(path, detail) => {
                write!(f, "malformed favorites file `{}`: {}", path.display(), detail)
            }
            StoreError::Io(path, e) => {
                write!(f, "favorites file I/O error `{}`: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Api(e) => Some(e),
            StoreError::Meal(e) => Some(e),
            StoreError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for StoreError {
    fn from(e: ApiError) -> Self {
        StoreError::Api(e)
    }
}

impl From<MealError> for StoreError {
    fn from(e: MealError) -> Self {
        StoreError::Meal(e)
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    #[serde(rename = "strCategory")]
    name: String,
}

/// Owns the category cache, the favorites map and change tracking.
///
/// Categories are fetched once at construction and treated as read-only
/// reference data. Favorites hold complete meals only; `resolve` is the
/// path by which a reference meal becomes eligible.
pub struct FavoritesStore {
    api: ApiClient,
    categories: Vec<String>,
    favorites: BTreeMap<String, Meal>,
    checkpoint: Option<Vec<String>>,
}

impl FavoritesStore {
    /// Builds a store: fetches categories, loads favorites from the default
    /// path when present, and marks the session clean.
    pub fn new(api: ApiClient) -> Result<Self, StoreError> {
        Self::with_favorites_path(api, &Self::default_favorites_path())
    }

    /// Like `new` but loading favorites from an explicit path.
    pub fn with_favorites_path(api: ApiClient, favorites_path: &Path) -> Result<Self, StoreError> {
        let mut store = Self {
            api,
            categories: Vec::new(),
            favorites: BTreeMap::new(),
            checkpoint: None,
        };
        store.categories = store.fetch_categories()?;
        store.load_favorites(favorites_path)?;
        store.mark_clean();
        Ok(store)
    }

    fn fetch_categories(&self) -> Result<Vec<String>, StoreError> {
        let response = self.api.meal_categories()?;
        let meals = response.get("meals").cloned().unwrap_or(Value::Null);
        let records: Vec<CategoryRecord> = serde_json::from_value(meals)
            .map_err(|e| StoreError::BadCategories(e.to_string()))?;
        Ok(records.into_iter().map(|record| record.name).collect())
    }

    /// Cached category names, in API order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn find_by_name(&self, name: &str) -> Result<MealCollection, StoreError> {
        Ok(MealCollection::from_response(
            &self.api.search_meals_by_name(name)?,
        )?)
    }

    pub fn find_by_ingredient(&self, ingredient: &str) -> Result<MealCollection, StoreError> {
        let ingredient = ingredient.to_lowercase();
        Ok(MealCollection::from_response(
            &self.api.search_by_ingredient(&ingredient)?,
        )?)
    }

    /// Finds meals in a category, matched case-insensitively against the
    /// cached list; the cached spelling is what goes on the wire.
    pub fn find_by_category(&self, category: &str) -> Result<MealCollection, StoreError> {
        let canonical = self
            .categories
            .iter()
            .find(|cached| cached.eq_ignore_ascii_case(category))
            .ok_or_else(|| StoreError::UnknownCategory(category.to_string()))?;
        Ok(MealCollection::from_response(
            &self.api.meals_by_category(canonical)?,
        )?)
    }

    /// One random complete meal.
    pub fn find_random(&self) -> Result<Meal, StoreError> {
        Ok(Meal::from_response(&self.api.random_meal()?)?)
    }

    /// Complete meal by id.
    pub fn find_by_id(&self, id: &str) -> Result<Meal, StoreError> {
        Ok(Meal::from_response(&self.api.meal_by_id(id)?)?)
    }

    /// Returns a complete meal, looking the id up only when needed.
    pub fn resolve(&self, meal: &Meal) -> Result<Meal, StoreError> {
        if meal.is_complete() {
            return Ok(meal.clone());
        }
        self.find_by_id(meal.id())
    }

    /// Current favorites, keyed by meal id.
    pub fn favorites(&self) -> &BTreeMap<String, Meal> {
        &self.favorites
    }

    /// Adds a complete meal. Returns `false` (and leaves the map untouched)
    /// when the id is already a favorite.
    pub fn add_favorite(&mut self, meal: Meal) -> Result<bool, StoreError> {
        if !meal.is_complete() {
            return Err(StoreError::NotComplete(meal.id().to_string()));
        }
        if self.favorites.contains_key(meal.id()) {
            return Ok(false);
        }
        self.favorites.insert(meal.id().to_string(), meal);
        Ok(true)
    }

    /// Removes a favorite. Returns whether the id was present.
    pub fn remove_favorite(&mut self, id: &str) -> bool {
        self.favorites.remove(id).is_some()
    }

    pub fn clear_favorites(&mut self) {
        self.favorites.clear();
    }

    /// Snapshots the current favorite id set as the clean baseline.
    pub fn mark_clean(&mut self) {
        self.checkpoint = Some(self.favorite_ids());
    }

    /// Whether the favorite set differs from the last `mark_clean`.
    pub fn has_unsaved_changes(&self) -> Result<bool, StoreError> {
        match &self.checkpoint {
            Some(snapshot) => Ok(*snapshot != self.favorite_ids()),
            None => Err(StoreError::NoCheckpoint),
        }
    }

    fn favorite_ids(&self) -> Vec<String> {
        // BTreeMap keys iterate sorted, which is the snapshot order
        self.favorites.keys().cloned().collect()
    }

    /// Default favorites path: `~/favorite_meals.json`.
    pub fn default_favorites_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(FAVORITES_FILE_NAME)
    }

    /// Writes the whole favorites map as `{"meals": [record, ..]}`,
    /// overwriting any existing file. Goes through a temp file and rename
    /// so a crash mid-write cannot leave a truncated file behind.
    pub fn save_favorites(&self, path: &Path) -> Result<(), StoreError> {
        let records: Vec<Value> = self.favorites.values().map(Meal::to_record).collect();
        let document = json!({ "meals": records });
        let serialized = serde_json::to_string(&document)
            .map_err(|e| StoreError::BadFavoritesFile(path.to_path_buf(), e.to_string()))?;
        let staging = path.with_extension("tmp");
        fs::write(&staging, serialized).map_err(|e| StoreError::Io(staging.clone(), e))?;
        fs::rename(&staging, path).map_err(|e| StoreError::Io(path.to_path_buf(), e))?;
        Ok(())
    }

    /// Merges favorites from a file into the current map. Returns whether a
    /// file was found; a missing file simply means zero favorites, but an
    /// existing file that fails to parse is an error.
    pub fn load_favorites(&mut self, path: &Path) -> Result<bool, StoreError> {
        if !path.exists() {
            return Ok(false);
        }
        let raw = fs::read_to_string(path).map_err(|e| StoreError::Io(path.to_path_buf(), e))?;
        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|e| StoreError::BadFavoritesFile(path.to_path_buf(), e.to_string()))?;
        let collection = MealCollection::from_response(&parsed)
            .map_err(|e| StoreError::BadFavoritesFile(path.to_path_buf(), e.to_string()))?;
        for meal in &collection {
            self.add_favorite(meal.clone())?;
        }
        Ok(true)
    }

    /// Whether the active credential may be written to disk.
    pub fn can_persist_credential(&self) -> bool {
        self.api.can_save()
    }

    /// Saves the credential to its default path. Returns `false` for the
    /// development key instead of writing.
    pub fn persist_credential(&self) -> Result<bool, StoreError> {
        if !self.can_persist_credential() {
            return Ok(false);
        }
        self.api.save(&ApiClient::default_key_path())?;
        Ok(true)
    }
}
