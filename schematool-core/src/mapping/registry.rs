//! Explicit entity registration and package-scoped discovery.

use super::{Entity, EntityDescriptor};
use crate::error::SchemaToolError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// JSON catalog of entity descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCatalog {
    /// Described entity types
    pub entities: Vec<EntityDescriptor>,
}

/// Registered entity descriptors, in registration order.
///
/// Registering a type name twice replaces the earlier descriptor, so every
/// type appears at most once.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    descriptors: Vec<EntityDescriptor>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        let name = descriptor.qualified_name();
        match self
            .descriptors
            .iter_mut()
            .find(|existing| existing.qualified_name() == name)
        {
            Some(existing) => {
                tracing::debug!("Replacing registered descriptor for {}", name);
                *existing = descriptor;
            }
            None => self.descriptors.push(descriptor),
        }
        self
    }

    /// Registers a statically described type.
    pub fn register_entity<E: Entity>(&mut self) -> &mut Self {
        self.register(E::descriptor())
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, descriptor: EntityDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Registers every descriptor of a parsed catalog.
    pub fn register_catalog(&mut self, catalog: EntityCatalog) -> usize {
        let count = catalog.entities.len();
        for descriptor in catalog.entities {
            self.register(descriptor);
        }
        count
    }

    /// Loads and registers a JSON catalog file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `Catalog` if it is not a
    /// valid catalog.
    pub fn load_catalog(&mut self, path: &Path) -> crate::Result<usize> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SchemaToolError::io(format!("Failed to read entity catalog {}", path.display()), e)
        })?;
        let catalog: EntityCatalog =
            serde_json::from_str(&text).map_err(|e| SchemaToolError::Catalog {
                context: path.display().to_string(),
                source: e,
            })?;

        let count = self.register_catalog(catalog);
        tracing::debug!("Loaded {} descriptors from {}", count, path.display());
        Ok(count)
    }

    /// Descriptors carrying the entity marker within a package hierarchy.
    pub fn discover(&self, package: &str) -> Vec<EntityDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.entity && descriptor.in_package(package))
            .cloned()
            .collect()
    }

    /// Every registered descriptor.
    pub fn descriptors(&self) -> &[EntityDescriptor] {
        &self.descriptors
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
