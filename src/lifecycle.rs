//! Index lifecycle management
//!
//! Creates indexes on first use, detects mapping drift, and recreates an
//! index only when the caller explicitly allows data loss. A plain restart
//! never drops data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HsError, Result};
use crate::schema::IndexSchema;
use crate::store::IndexStore;

/// What a lifecycle call did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LifecycleAction {
    Created,
    Unchanged,
    /// Deleted and created again; all documents were dropped.
    Recreated { previous_version: Option<u32> },
}

impl LifecycleAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Recreated { .. } => "recreated",
        }
    }
}

/// Provisions and migrates indexes through an [`IndexStore`].
pub struct LifecycleManager<S> {
    store: Arc<S>,
}

impl<S> Clone for LifecycleManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: IndexStore> LifecycleManager<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create the index if absent; leave a compatible one alone.
    ///
    /// An existing index whose mapping differs (dims, similarity or field
    /// names) is a [`HsError::SchemaConflict`]. Versions are not compared.
    pub async fn ensure_index(&self, schema: &IndexSchema) -> Result<LifecycleAction> {
        schema.validate()?;
        match self.store.get_schema(&schema.name).await? {
            Some(existing) => {
                check_compatible(schema, &existing)?;
                info!(index = %schema.name, "index already present");
                Ok(LifecycleAction::Unchanged)
            }
            None => self.create(schema).await,
        }
    }

    /// Delete and recreate the index. Destroys every document in it.
    pub async fn reset_index(&self, schema: &IndexSchema, confirmed: bool) -> Result<LifecycleAction> {
        schema.validate()?;
        if !confirmed {
            return Err(HsError::DestructiveBlocked(format!(
                "reset of index {} drops all documents and must be confirmed",
                schema.name
            )));
        }
        let previous_version = self
            .store
            .get_schema(&schema.name)
            .await?
            .map(|existing| existing.version);
        self.recreate(schema, previous_version).await
    }

    /// Bring the index to `schema`, recreating it only if `allow_reset`.
    ///
    /// Absent → created. Same version and compatible mapping → unchanged.
    /// Any other difference recreates the index when `allow_reset` is set
    /// and is a [`HsError::SchemaConflict`] otherwise.
    pub async fn migrate(&self, schema: &IndexSchema, allow_reset: bool) -> Result<LifecycleAction> {
        schema.validate()?;
        let Some(existing) = self.store.get_schema(&schema.name).await? else {
            return self.create(schema).await;
        };

        let drift = schema.incompatibility(&existing).or_else(|| {
            (existing.version != schema.version).then(|| {
                format!(
                    "schema version is {}, expected {}",
                    existing.version, schema.version
                )
            })
        });

        match drift {
            None => {
                info!(index = %schema.name, version = schema.version, "index up to date");
                Ok(LifecycleAction::Unchanged)
            }
            Some(reason) if allow_reset => {
                warn!(index = %schema.name, %reason, "recreating index");
                self.recreate(schema, Some(existing.version)).await
            }
            Some(reason) => Err(HsError::SchemaConflict {
                index: schema.name.clone(),
                reason,
            }),
        }
    }

    async fn create(&self, schema: &IndexSchema) -> Result<LifecycleAction> {
        match self.store.create_index(&schema.name, schema).await {
            Ok(()) => {
                info!(index = %schema.name, dims = schema.dims, version = schema.version, "index created");
                Ok(LifecycleAction::Created)
            }
            // Lost a creation race: accept the winner if it matches.
            Err(HsError::SchemaConflict { .. }) => {
                let existing = self
                    .store
                    .get_schema(&schema.name)
                    .await?
                    .ok_or_else(|| HsError::IndexNotFound(schema.name.clone()))?;
                check_compatible(schema, &existing)?;
                Ok(LifecycleAction::Unchanged)
            }
            Err(err) => Err(err),
        }
    }

    async fn recreate(
        &self,
        schema: &IndexSchema,
        previous_version: Option<u32>,
    ) -> Result<LifecycleAction> {
        let deleted = self.store.delete_index(&schema.name).await?;
        self.store.create_index(&schema.name, schema).await?;
        warn!(
            index = %schema.name,
            deleted,
            previous_version,
            version = schema.version,
            "index recreated"
        );
        Ok(LifecycleAction::Recreated { previous_version })
    }
}

fn check_compatible(schema: &IndexSchema, existing: &IndexSchema) -> Result<()> {
    match schema.incompatibility(existing) {
        None => Ok(()),
        Some(reason) => Err(HsError::SchemaConflict {
            index: schema.name.clone(),
            reason,
        }),
    }
}
