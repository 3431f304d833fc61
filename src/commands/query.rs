//! Read-only query commands: search, filters, random, show.

use std::error::Error;

use crate::backend::FavoritesStore;
use crate::models::MealCollection;

pub fn search(store: &FavoritesStore, name: &str) -> Result<(), Box<dyn Error>> {
    print_collection(&store.find_by_name(name)?);
    Ok(())
}

pub fn random(store: &FavoritesStore) -> Result<(), Box<dyn Error>> {
    println!("{}", store.find_random()?);
    Ok(())
}

pub fn categories(store: &FavoritesStore) -> Result<(), Box<dyn Error>> {
    for category in store.categories() {
        println!("{}", category);
    }
    Ok(())
}

pub fn category(store: &FavoritesStore, name: &str) -> Result<(), Box<dyn Error>> {
    print_collection(&store.find_by_category(name)?);
    Ok(())
}

pub fn ingredient(store: &FavoritesStore, name: &str) -> Result<(), Box<dyn Error>> {
    print_collection(&store.find_by_ingredient(name)?);
    Ok(())
}

pub fn show(store: &FavoritesStore, id: &str) -> Result<(), Box<dyn Error>> {
    println!("{}", store.find_by_id(id)?);
    Ok(())
}

fn print_collection(results: &MealCollection) {
    if results.is_empty() {
        println!("No meals found");
        return;
    }
    for meal in results {
        println!("{:>8}  {}", meal.id(), meal.name());
    }
    println!("\n{} meal(s)", results.len());
}
