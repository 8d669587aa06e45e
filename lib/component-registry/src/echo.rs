use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::info;

use crate::{ComponentData, Entity, Query, Registry, RegistryError, Transaction};

/// Non-persistent registry: logs every written component and finds nothing.
///
/// Useful as a stand-in where a `Registry` is required but storage is not.
#[derive(Debug)]
pub struct EchoRegistry<D> {
    _marker: PhantomData<fn() -> D>,
}

impl<D> EchoRegistry<D> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<D> Default for EchoRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: ComponentData + Debug> Registry<D> for EchoRegistry<D> {
    async fn execute<T>(&self, transaction: &T) -> Result<(), RegistryError>
    where
        T: Transaction<D> + ?Sized,
    {
        for component in transaction.components() {
            info!(
                id = %component.id(),
                entity = %component.entity_id(),
                unique = component.is_unique(),
                data = ?component.data(),
                "Component"
            );
        }
        Ok(())
    }

    async fn query(&self, _query: &Query<D>) -> Result<Option<Entity<D>>, RegistryError> {
        Ok(None)
    }
}
