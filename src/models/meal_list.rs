//! Read-only collection of meals from one bulk API response.

use serde_json::Value;

use super::meal::{as_record, unwrap_records, Meal, MealError};

/// An order-preserving, id-keyed view over the meals of a single
/// `{"meals": [..] | null}` response. There is no mutation API; build a new
/// collection from a new response instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealCollection {
    meals: Vec<Meal>,
    no_results: bool,
}

impl MealCollection {
    /// Builds a collection from a bulk response. The API's `null` sentinel
    /// yields an empty collection flagged `no_results`, distinct from a
    /// genuinely empty `meals` array.
    pub fn from_response(response: &Value) -> Result<Self, MealError> {
        match unwrap_records(response)? {
            None => Ok(Self {
                meals: Vec::new(),
                no_results: true,
            }),
            Some(records) => {
                let mut meals: Vec<Meal> = Vec::with_capacity(records.len());
                for record in records {
                    let meal = Meal::from_record(as_record(record)?)?;
                    // keyed by id; a duplicate id keeps the first record
                    if meals.iter().all(|known| known.id() != meal.id()) {
                        meals.push(meal);
                    }
                }
                Ok(Self {
                    meals,
                    no_results: false,
                })
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Meal> {
        self.meals.iter().find(|meal| meal.id() == id)
    }

    /// Iterates meals in response order.
    pub fn iter(&self) -> std::slice::Iter<'_, Meal> {
        self.meals.iter()
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }

    /// True when the response was the API's "no results" sentinel.
    pub fn no_results(&self) -> bool {
        self.no_results
    }
}

impl<'a> IntoIterator for &'a MealCollection {
    type Item = &'a Meal;
    type IntoIter = std::slice::Iter<'a, Meal>;

    fn into_iter(self) -> Self::IntoIter {
        self.meals.iter()
    }
}
