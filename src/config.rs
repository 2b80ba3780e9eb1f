//! Support for library configuration options

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

/// The folder where [`LocalStore::open`](crate::store::local::LocalStore::open) looks for its backing files.
/// Feel free to override it when initing this library.
pub static STORE_FOLDER: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new(".".to_string())));

/// The name of the database used by [`LocalStore::open_default`](crate::store::local::LocalStore::open_default).
/// Feel free to override it when initing this library.
pub static DATABASE_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("main_db".to_string())));

/// Returns the backing file that a store named `name` lives in
pub fn store_path(name: &str) -> PathBuf {
    let folder: &Mutex<String> = &STORE_FOLDER;
    let folder = crate::utils::lock(folder).clone();
    PathBuf::from(folder).join(format!("{}.json", name))
}

/// Returns the current value of [`DATABASE_NAME`]
pub fn database_name() -> String {
    let name: &Mutex<String> = &DATABASE_NAME;
    crate::utils::lock(name).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_are_json_files_in_the_store_folder() {
        let path = store_path("planner");
        assert!(path.ends_with("planner.json"));
        assert_eq!(database_name(), "main_db");
    }
}
