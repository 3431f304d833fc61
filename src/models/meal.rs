//! Meal entity built from TheMealDB records.
//!
//! The API returns two shapes under the same `{"meals": [..]}` wrapper:
//! reference records (id + name, from search/filter/list endpoints) and
//! complete records (instructions, ingredients and friends, from lookup and
//! random endpoints). Both normalize into one `Meal` at construction time;
//! nothing downstream re-inspects raw fields.

use std::fmt;

use serde_json::{Map, Value};

/// Key under which a persisted favorite carries its pre-built
/// ingredient → measure object, so reload skips the indexed-slot scan.
pub(crate) const SYNC_INGREDIENTS_KEY: &str = "sync_ingredients";

/// TheMealDB records carry at most 20 `strIngredientN`/`strMeasureN` slots.
const MAX_INGREDIENT_SLOTS: usize = 20;

/// Errors raised while turning a decoded API record into a `Meal`.
#[derive(Debug)]
pub enum MealError {
    /// Response wrapper is not `{"meals": [..]}`
    BadWrapper(String),
    /// The `meals` entry was the no-results sentinel (`null`) or empty
    NoMeal,
    /// More than one record where exactly one was expected
    AmbiguousMeal(usize),
    /// A required field is missing or has the wrong type
    MissingField(&'static str),
    /// Persisted ingredient mapping is malformed
    BadIngredients(String),
}

impl fmt::Display for MealError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MealError::BadWrapper(detail) => write!(f, "malformed meal response: {}", detail),
            MealError::NoMeal => write!(f, "no meal in response"),
            MealError::AmbiguousMeal(count) => {
                write!(f, "expected exactly one meal, found {}", count)
            }
            MealError::MissingField(field) => {
                write!(f, "meal record missing required field `{}`", field)
            }
            MealError::BadIngredients(detail) => {
                write!(f, "malformed ingredient mapping: {}", detail)
            }
        }
    }
}

impl std::error::Error for MealError {}

/// One ingredient line of a complete meal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.measure.trim().is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.measure, self.name)
        }
    }
}

/// Fields present only on a complete meal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealDetail {
    pub category: String,
    pub instructions: String,
    pub tags: String,
    pub ingredients: Vec<Ingredient>,
    pub youtube: Option<String>,
}

/// An immutable meal, either a reference (id + name only) or a complete
/// recipe. Completeness is decided once at construction; complete-only
/// fields live behind `detail()` so a reference meal cannot expose them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meal {
    id: String,
    name: String,
    detail: Option<MealDetail>,
}

impl Meal {
    /// Builds a meal from a single-record response `{"meals": [record]}`.
    pub fn from_response(response: &Value) -> Result<Self, MealError> {
        let records = unwrap_records(response)?;
        let records = records.ok_or(MealError::NoMeal)?;
        match records.len() {
            0 => Err(MealError::NoMeal),
            1 => Self::from_record(as_record(&records[0])?),
            count => Err(MealError::AmbiguousMeal(count)),
        }
    }

    /// Builds a meal from one raw record, API-shaped or favorites-file-shaped.
    pub(crate) fn from_record(record: &Map<String, Value>) -> Result<Self, MealError> {
        let id = required_string(record, "idMeal")?;
        let name = required_string(record, "strMeal")?;
        let detail = if record.contains_key("strInstructions") {
            Some(MealDetail::from_record(record)?)
        } else {
            None
        };
        Ok(Self { id, name, detail })
    }

    /// Creates a reference meal directly.
    pub fn reference(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            detail: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_complete(&self) -> bool {
        self.detail.is_some()
    }

    pub fn detail(&self) -> Option<&MealDetail> {
        self.detail.as_ref()
    }

    /// Inverse of `from_record`: re-emits the record this meal was built
    /// from, with ingredients as an ordered object under the sync key.
    /// `Meal::from_response(&wrap(m.to_record()))` reproduces `m` exactly.
    pub fn to_record(&self) -> Value {
        let mut record = Map::new();
        record.insert("idMeal".into(), Value::String(self.id.clone()));
        record.insert("strMeal".into(), Value::String(self.name.clone()));
        if let Some(detail) = &self.detail {
            record.insert(
                "strCategory".into(),
                Value::String(detail.category.clone()),
            );
            record.insert(
                "strInstructions".into(),
                Value::String(detail.instructions.clone()),
            );
            record.insert("strTags".into(), Value::String(detail.tags.clone()));
            record.insert(
                "strYoutube".into(),
                match &detail.youtube {
                    Some(url) => Value::String(url.clone()),
                    None => Value::Null,
                },
            );
            let mut ingredients = Map::new();
            for ingredient in &detail.ingredients {
                ingredients.insert(
                    ingredient.name.clone(),
                    Value::String(ingredient.measure.clone()),
                );
            }
            record.insert(SYNC_INGREDIENTS_KEY.into(), Value::Object(ingredients));
        }
        Value::Object(record)
    }
}

impl fmt::Display for Meal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (id {})", self.name, self.id)?;
        if let Some(detail) = &self.detail {
            writeln!(f, "Category: {}", detail.category)?;
            writeln!(f, "Tags: {}", detail.tags)?;
            if let Some(url) = &detail.youtube {
                writeln!(f, "Video: {}", url)?;
            }
            writeln!(f, "\nIngredients:")?;
            for ingredient in &detail.ingredients {
                writeln!(f, "  - {}", ingredient)?;
            }
            writeln!(f, "\nInstructions:\n{}", detail.instructions)?;
        }
        Ok(())
    }
}

impl MealDetail {
    fn from_record(record: &Map<String, Value>) -> Result<Self, MealError> {
        let category =
            optional_string(record, "strCategory").unwrap_or_else(|| "Undefined".to_string());
        let instructions = required_string(record, "strInstructions")?;
        let tags = optional_string(record, "strTags").unwrap_or_else(|| "Undefined".to_string());
        let youtube = optional_string(record, "strYoutube").filter(|url| !url.is_empty());
        let ingredients = match record.get(SYNC_INGREDIENTS_KEY) {
            Some(value) => ingredients_from_sync(value)?,
            None => ingredients_from_slots(record),
        };
        Ok(Self {
            category,
            instructions,
            tags,
            ingredients,
            youtube,
        })
    }
}

/// Unwraps `{"meals": [..] | null}`; `Ok(None)` is the no-results sentinel.
pub(crate) fn unwrap_records(response: &Value) -> Result<Option<&Vec<Value>>, MealError> {
    let wrapper = response
        .as_object()
        .ok_or_else(|| MealError::BadWrapper(format!("response is not an object: {}", response)))?;
    let meals = wrapper
        .get("meals")
        .ok_or_else(|| MealError::BadWrapper("response missing `meals` entry".to_string()))?;
    match meals {
        Value::Null => Ok(None),
        Value::Array(records) => Ok(Some(records)),
        other => Err(MealError::BadWrapper(format!(
            "`meals` is not a list: {}",
            other
        ))),
    }
}

pub(crate) fn as_record(value: &Value) -> Result<&Map<String, Value>, MealError> {
    value
        .as_object()
        .ok_or_else(|| MealError::BadWrapper(format!("meal entry is not an object: {}", value)))
}

fn required_string(record: &Map<String, Value>, field: &'static str) -> Result<String, MealError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(MealError::MissingField(field))
}

fn optional_string(record: &Map<String, Value>, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Pairs `strIngredientN` with `strMeasureN` over the bounded slot range,
/// dropping slots with a blank ingredient name or no usable measure.
fn ingredients_from_slots(record: &Map<String, Value>) -> Vec<Ingredient> {
    let mut ingredients = Vec::new();
    for slot in 1..=MAX_INGREDIENT_SLOTS {
        let name = match record
            .get(&format!("strIngredient{}", slot))
            .and_then(Value::as_str)
        {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => continue,
        };
        let measure = match record
            .get(&format!("strMeasure{}", slot))
            .and_then(Value::as_str)
        {
            Some(measure) => measure.to_string(),
            None => continue,
        };
        ingredients.push(Ingredient { name, measure });
    }
    ingredients
}

fn ingredients_from_sync(value: &Value) -> Result<Vec<Ingredient>, MealError> {
    let mapping = value.as_object().ok_or_else(|| {
        MealError::BadIngredients(format!("`{}` is not an object", SYNC_INGREDIENTS_KEY))
    })?;
    mapping
        .iter()
        .map(|(name, measure)| {
            let measure = measure.as_str().ok_or_else(|| {
                MealError::BadIngredients(format!("measure for `{}` is not a string", name))
            })?;
            Ok(Ingredient {
                name: name.clone(),
                measure: measure.to_string(),
            })
        })
        .collect()
}
