use std::path::PathBuf;

use crate::error::{Result, SalesError};
use crate::settings::{save_settings, shellexpand_path, Settings};
use crate::store::SalesStore;

pub fn run(path: &str, mut settings: Settings) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));

    if !resolved.is_file() {
        return Err(SalesError::Settings(format!(
            "No sales data file found at {}",
            resolved.display()
        )));
    }

    let mut store = SalesStore::load(&resolved);
    if let Some(notice) = store.take_notice() {
        eprintln!("Warning: {notice}");
    }

    settings.data_file = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Switched to {} ({} records)", resolved.display(), store.len());
    Ok(())
}
