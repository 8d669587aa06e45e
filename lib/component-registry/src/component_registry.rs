//! System-scoped registry over any [`QueryExecutor`].
//!
//! The write path maps each component to a row (content hash, version,
//! unique flag) and inserts the whole batch with one statement inside one
//! transaction. The read path ranks rows by version per type and keeps the
//! highest, resolving unique keys to their entity first.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::row::NewRow;
use crate::{
    Component, ComponentData, ComponentSystem, ContentHash, Entity, Id, Insert, Query,
    QueryExecutor, Registry, RegistryConfig, RegistryError, Timestamp, Transaction,
    TransactionExecutor, TypeAndData, TypeTag, VersionPolicy, content_hash, sql,
};

/// A component after mapping, before a version is assigned.
struct MappedComponent {
    id: Id,
    entity_id: Id,
    type_and_data: TypeAndData,
    hash: ContentHash,
    unique: bool,
}

/// Registry bound to one [`ComponentSystem`] and one backing store.
///
/// Holds no state beyond the executor handle, the system and its config;
/// each call acquires and releases its own unit of work.
pub struct ComponentRegistry<E, D: ComponentData> {
    executor: E,
    system: ComponentSystem<D>,
    config: RegistryConfig,
}

impl<E: QueryExecutor, D: ComponentData> ComponentRegistry<E, D> {
    pub fn new(executor: E, system: ComponentSystem<D>) -> Self {
        Self {
            executor,
            system,
            config: RegistryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn system(&self) -> &ComponentSystem<D> {
        &self.system
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn map_components(
        &self,
        components: Vec<Component<D>>,
    ) -> Result<Vec<MappedComponent>, RegistryError> {
        let mapper = self.system.mapper();
        components
            .into_iter()
            .map(|component| -> Result<MappedComponent, RegistryError> {
                let type_and_data = mapper.map(component.data())?;
                let hash = content_hash(&type_and_data);
                Ok(MappedComponent {
                    id: component.id(),
                    entity_id: component.entity_id(),
                    type_and_data,
                    hash,
                    unique: component.is_unique(),
                })
            })
            .collect()
    }

    async fn assign_versions(
        &self,
        tx: &mut E::Transaction,
        mapped: &[MappedComponent],
    ) -> Result<Vec<i32>, RegistryError> {
        match self.config.version_policy {
            VersionPolicy::Fixed => Ok(vec![0; mapped.len()]),
            VersionPolicy::Incrementing => {
                let entity_ids: Vec<Id> = mapped
                    .iter()
                    .map(|c| c.entity_id)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                let statement = sql::select_current_versions(self.system.id(), &entity_ids);
                let current: HashMap<(Id, TypeTag), i32> = tx
                    .fetch_versions(&statement)
                    .await?
                    .into_iter()
                    .map(|row| ((row.entity_id, row.type_tag), row.version))
                    .collect();

                Ok(mapped
                    .iter()
                    .map(|c| {
                        current
                            .get(&(c.entity_id, c.type_and_data.type_tag))
                            .map_or(0, |version| version + 1)
                    })
                    .collect())
            }
        }
    }

    async fn insert_batch(
        &self,
        tx: &mut E::Transaction,
        mapped: Vec<MappedComponent>,
    ) -> Result<(), RegistryError> {
        let versions = self.assign_versions(tx, &mapped).await?;
        let created_at = Timestamp::now();
        let system = self.system.id();
        let expected = mapped.len() as u64;

        let rows = mapped.into_iter().zip(versions).map(|(c, version)| {
            NewRow {
                system,
                id: c.id,
                entity_id: c.entity_id,
                type_and_data: c.type_and_data,
                hash: c.hash,
                version,
                created_at,
                unique: c.unique,
            }
            .into_insert_row()
        });
        let statement = Insert::of(sql::TABLE_NAME).rows(rows).build();

        let actual = tx.execute(&statement).await?;
        if actual != expected {
            error!(
                system = %system,
                expected,
                actual,
                "Store applied a different number of component rows than submitted"
            );
            return Err(RegistryError::RowCountMismatch { expected, actual });
        }

        Ok(())
    }

    async fn write(&self, components: Vec<Component<D>>) -> Result<(), RegistryError> {
        if components.is_empty() {
            debug!(system = %self.system.id(), "Skipping empty component batch");
            return Ok(());
        }

        // Mapper failures surface before any unit of work is opened
        let mapped = self.map_components(components)?;
        let count = mapped.len();

        let mut tx = self.executor.begin_transaction().await?;
        match self.insert_batch(&mut tx, mapped).await {
            Ok(()) => {
                tx.commit().await?;
                debug!(system = %self.system.id(), count, "Committed component batch");
                Ok(())
            }
            Err(e) => {
                warn!(system = %self.system.id(), count, error = %e, "Component batch rejected");
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(error = %rollback_error, "Rollback of rejected batch failed");
                }
                Err(e)
            }
        }
    }

    async fn find_current(
        &self,
        entity_id: Id,
        types: &[TypeTag],
    ) -> Result<Option<Entity<D>>, RegistryError> {
        let statement = sql::select_current_components(self.system.id(), entity_id, types);
        let rows = self.executor.fetch_components(&statement).await?;
        if rows.is_empty() {
            debug!(system = %self.system.id(), entity = %entity_id, "No current components");
            return Ok(None);
        }

        let mapper = self.system.mapper();
        let components = rows
            .into_iter()
            .map(|row| -> Result<Component<D>, RegistryError> {
                let data = mapper.unmap(&row.type_and_data())?;
                Ok(Component::from_parts(row.id, row.entity_id, data, row.unique))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Entity::new(entity_id, components)))
    }

    async fn find_by_entity_id(
        &self,
        entity_id: Id,
        selected_types: &[D::Kind],
    ) -> Result<Option<Entity<D>>, RegistryError> {
        let types = self.system.mapper().resolve_types(selected_types)?;
        self.find_current(entity_id, &types).await
    }

    async fn find_by_unique_key(
        &self,
        key: &D,
        selected_types: &[D::Kind],
    ) -> Result<Option<Entity<D>>, RegistryError> {
        let mapper = self.system.mapper();
        let types = mapper.resolve_types(selected_types)?;
        let hash = content_hash(&mapper.map(key)?);

        let statement = sql::select_entity_by_hash(self.system.id(), &hash);
        match self.executor.fetch_entity_id(&statement).await? {
            Some(entity_id) => {
                debug!(system = %self.system.id(), entity = %entity_id, "Resolved unique key");
                self.find_current(entity_id, &types).await
            }
            None => {
                debug!(system = %self.system.id(), hash = %hash, "Unique key not claimed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl<E: QueryExecutor, D: ComponentData> Registry<D> for ComponentRegistry<E, D> {
    async fn execute<T>(&self, transaction: &T) -> Result<(), RegistryError>
    where
        T: Transaction<D> + ?Sized,
    {
        let components = transaction.components();
        self.write(components).await
    }

    async fn query(&self, query: &Query<D>) -> Result<Option<Entity<D>>, RegistryError> {
        match query {
            Query::ByEntityId { id, selected_types } => {
                self.find_by_entity_id(*id, selected_types).await
            }
            Query::ByUniqueKey {
                key,
                selected_types,
            } => self.find_by_unique_key(key, selected_types).await,
        }
    }
}
