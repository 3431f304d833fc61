mod favorites;
mod key;
pub mod query;

pub use favorites::FavoritesCommand;
pub use key::KeyCommand;
