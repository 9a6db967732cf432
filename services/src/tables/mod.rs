//! The demo tables served by the admin panel.

pub mod authors;
pub mod external;
pub mod posts;
pub mod profile;
pub mod users;

use crate::error::RegistryError;
use crate::registry::Registry;

/// Registry holding every demo table.
pub fn default_registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    registry
        .register("posts", posts::table)?
        .register("users", users::table)?
        .register("authors", authors::table)?
        .register("profile", profile::table)?
        .register_cached("external", external::table)?;
    Ok(registry)
}
