mod meal;
mod meal_list;

pub use meal::{Ingredient, Meal, MealDetail, MealError};
pub use meal_list::MealCollection;
