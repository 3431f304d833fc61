//! Credential file subcommands.

use std::error::Error;

use clap::{Args, Subcommand};

use crate::api::ApiClient;
use crate::backend::FavoritesStore;

#[derive(Args)]
pub struct KeyCommand {
    #[command(subcommand)]
    pub command: KeySubcommand,
}

#[derive(Subcommand)]
pub enum KeySubcommand {
    /// Save the active key and version to the key file
    Save,

    /// Show where the key file lives and whether it exists
    Show,
}

impl KeyCommand {
    pub fn run(&self, store: &FavoritesStore) -> Result<(), Box<dyn Error>> {
        let path = ApiClient::default_key_path();
        match &self.command {
            KeySubcommand::Save => {
                if store.persist_credential()? {
                    println!("Saved credential to {}", path.display());
                } else {
                    println!("The development key cannot be saved");
                }
            }
            KeySubcommand::Show => {
                if path.exists() {
                    println!("{} (present)", path.display());
                } else {
                    println!("{} (not saved yet)", path.display());
                }
            }
        }
        Ok(())
    }
}
