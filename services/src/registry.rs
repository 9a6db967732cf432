//! Table descriptor registry.
//!
//! Populated once in `main` before the listener is bound, then shared read-only
//! behind an `Arc` by every request handler.

use crate::error::{DescriptorError, RegistryError};
use crate::table::{RequestContext, TableDescriptor};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Builds a table descriptor for one request.
pub type Builder =
    Arc<dyn Fn(&RequestContext) -> Result<TableDescriptor, DescriptorError> + Send + Sync>;

enum Entry {
    Fresh(Builder),
    /// Built once per language, then cloned.
    Cached {
        builder: Builder,
        cache: [OnceLock<TableDescriptor>; 2],
    },
}

#[derive(Default)]
pub struct Registry {
    entries: BTreeMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a builder that runs on every request.
    ///
    /// Registering a name twice fails with [`RegistryError::DuplicateRegistration`].
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        builder: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&RequestContext) -> Result<TableDescriptor, DescriptorError> + Send + Sync + 'static,
    {
        self.insert(name.into(), Entry::Fresh(Arc::new(builder)))
    }

    /// Registers a builder whose output depends only on the request language.
    pub fn register_cached<F>(
        &mut self,
        name: impl Into<String>,
        builder: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&RequestContext) -> Result<TableDescriptor, DescriptorError> + Send + Sync + 'static,
    {
        self.insert(
            name.into(),
            Entry::Cached {
                builder: Arc::new(builder),
                cache: [OnceLock::new(), OnceLock::new()],
            },
        )
    }

    fn insert(&mut self, name: String, entry: Entry) -> Result<&mut Self, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::MalformedDescriptor {
                table: name,
                source: DescriptorError::EmptyName,
            });
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateRegistration(name));
        }
        tracing::debug!(table = %name, "Registered table descriptor");
        self.entries.insert(name, entry);
        Ok(self)
    }

    /// Builds the descriptor registered under `name` for this request.
    pub fn resolve(
        &self,
        name: &str,
        ctx: &RequestContext,
    ) -> Result<TableDescriptor, RegistryError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownDescriptor(name.to_owned()))?;

        match entry {
            Entry::Fresh(builder) => build_checked(name, builder, ctx),
            Entry::Cached { builder, cache } => {
                let slot = &cache[ctx.language().index()];
                if let Some(descriptor) = slot.get() {
                    return Ok(descriptor.clone());
                }
                let descriptor = build_checked(name, builder, ctx)?;
                Ok(slot.get_or_init(|| descriptor).clone())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds every descriptor once so malformed ones stop the process before it serves.
    pub fn validate_all(&self, ctx: &RequestContext) -> Result<(), RegistryError> {
        for name in self.entries.keys() {
            self.resolve(name, ctx)?;
        }
        Ok(())
    }
}

fn build_checked(
    name: &str,
    builder: &Builder,
    ctx: &RequestContext,
) -> Result<TableDescriptor, RegistryError> {
    let malformed = |source| RegistryError::MalformedDescriptor {
        table: name.to_owned(),
        source,
    };
    let descriptor = builder(ctx).map_err(malformed)?;
    if descriptor.name() != name {
        return Err(malformed(DescriptorError::NameMismatch {
            registered: name.to_owned(),
            built: descriptor.name().to_owned(),
        }));
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnSpec, DataSource, DataType, Language, TableBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn users(ctx: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
        TableBuilder::new("users")
            .title(ctx.text("Users", "用户"))
            .primary_key("id", DataType::Int)
            .data_source(DataSource::relational("users"))
            .column(ColumnSpec::new("Id", "id", DataType::Int))
            .build()
    }

    fn other_users(_: &RequestContext) -> Result<TableDescriptor, DescriptorError> {
        TableBuilder::new("users")
            .primary_key("id", DataType::Int)
            .data_source(DataSource::relational("people"))
            .column(ColumnSpec::new("Id", "id", DataType::Int))
            .build()
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry.register("users", users).unwrap();
        let err = registry.register("users", other_users).err().unwrap();
        assert!(matches!(err, RegistryError::DuplicateRegistration(name) if name == "users"));

        // The first builder stays in place.
        let descriptor = registry.resolve("users", &RequestContext::startup()).unwrap();
        assert_eq!(descriptor.data_source().table(), Some("users"));
    }

    #[test]
    fn unknown_name_fails_closed() {
        let registry = Registry::new();
        let err = registry.resolve("ghosts", &RequestContext::startup()).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownDescriptor(name) if name == "ghosts"));
    }

    #[test]
    fn resolve_builds_per_request() {
        let mut registry = Registry::new();
        registry.register("users", users).unwrap();
        let cn = RequestContext::startup().with_language(Language::Cn);
        assert_eq!(registry.resolve("users", &cn).unwrap().title(), "用户");
        assert_eq!(
            registry.resolve("users", &RequestContext::startup()).unwrap().title(),
            "Users"
        );
    }

    #[test]
    fn builder_errors_propagate_as_malformed() {
        let mut registry = Registry::new();
        registry
            .register("broken", |_: &RequestContext| {
                TableBuilder::new("broken")
                    .data_source(DataSource::relational("broken"))
                    .build()
            })
            .unwrap();
        let err = registry.validate_all(&RequestContext::startup()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MalformedDescriptor {
                source: DescriptorError::MissingPrimaryKey,
                ..
            }
        ));
    }

    #[test]
    fn name_mismatch_is_malformed() {
        let mut registry = Registry::new();
        registry.register("members", users).unwrap();
        let err = registry.resolve("members", &RequestContext::startup()).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MalformedDescriptor {
                source: DescriptorError::NameMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn cached_builder_runs_once_per_language() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut registry = Registry::new();
        registry
            .register_cached("users", |ctx: &RequestContext| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                users(ctx)
            })
            .unwrap();

        let en = RequestContext::startup();
        let cn = RequestContext::startup().with_language(Language::Cn);
        for _ in 0..3 {
            registry.resolve("users", &en).unwrap();
            registry.resolve("users", &cn).unwrap();
        }
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = Registry::new();
        registry
            .register("users", users)
            .unwrap()
            .register("authors", |_: &RequestContext| Err(DescriptorError::MissingPrimaryKey))
            .unwrap();
        assert_eq!(registry.names(), vec!["authors", "users"]);
        assert!(registry.contains("users"));
        assert_eq!(registry.len(), 2);
    }
}
