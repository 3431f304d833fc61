//! Favorites subcommands. Mutations are written back to the default
//! favorites file before returning.

use std::error::Error;

use clap::{Args, Subcommand};

use crate::backend::FavoritesStore;

#[derive(Args)]
pub struct FavoritesCommand {
    #[command(subcommand)]
    pub command: FavoritesSubcommand,
}

#[derive(Subcommand)]
pub enum FavoritesSubcommand {
    /// List saved favorites
    List,

    /// Look up a meal by id and add it to favorites
    Add {
        /// Meal id
        id: String,
    },

    /// Remove a favorite by id
    Remove {
        /// Meal id
        id: String,
    },

    /// Remove all favorites
    Clear,
}

impl FavoritesCommand {
    pub fn run(&self, store: &mut FavoritesStore) -> Result<(), Box<dyn Error>> {
        match &self.command {
            FavoritesSubcommand::List => {
                if store.favorites().is_empty() {
                    println!("No favorites saved");
                } else {
                    for meal in store.favorites().values() {
                        println!("{:>8}  {}", meal.id(), meal.name());
                    }
                }
            }
            FavoritesSubcommand::Add { id } => {
                let meal = store.find_by_id(id)?;
                let name = meal.name().to_string();
                if store.add_favorite(meal)? {
                    println!("Added `{}` to favorites", name);
                } else {
                    println!("`{}` is already a favorite", name);
                }
            }
            FavoritesSubcommand::Remove { id } => {
                if store.remove_favorite(id) {
                    println!("Removed {} from favorites", id);
                } else {
                    println!("{} is not a favorite", id);
                }
            }
            FavoritesSubcommand::Clear => {
                store.clear_favorites();
                println!("Cleared favorites");
            }
        }

        if store.has_unsaved_changes()? {
            store.save_favorites(&FavoritesStore::default_favorites_path())?;
            store.mark_clean();
        }
        Ok(())
    }
}
