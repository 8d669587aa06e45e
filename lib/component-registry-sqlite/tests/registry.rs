//! End-to-end registry behavior against in-memory and file-backed SQLite databases.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::Arc;

use component_registry_sqlite::{
    Component, ComponentData, ComponentSystem, Id, JsonMapper, Query, Registry, RegistryConfig,
    RegistryConnection, RegistryError, SqlitePool, SqliteRegistry, SystemId, TypeTable, TypeTag,
    VersionPolicy,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Account {
    Email(String),
    DisplayName(String),
    Balance(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AccountKind {
    Email,
    DisplayName,
    Balance,
}

impl ComponentData for Account {
    type Kind = AccountKind;

    fn kind(&self) -> AccountKind {
        match self {
            Account::Email(_) => AccountKind::Email,
            Account::DisplayName(_) => AccountKind::DisplayName,
            Account::Balance(_) => AccountKind::Balance,
        }
    }
}

fn system(id: u8) -> ComponentSystem<Account> {
    let table = TypeTable::new([
        (AccountKind::Email, TypeTag(1)),
        (AccountKind::DisplayName, TypeTag(2)),
        (AccountKind::Balance, TypeTag(3)),
    ])
    .unwrap();
    ComponentSystem::new(SystemId(id), JsonMapper::new(table))
}

async fn pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    pool.initialize().await.unwrap();
    pool
}

async fn registry() -> SqliteRegistry<Account> {
    SqliteRegistry::new(pool().await, system(1))
}

async fn row_count(registry: &SqliteRegistry<Account>) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM component")
        .fetch_one(registry.executor().inner())
        .await
        .unwrap()
}

fn email(entity: Id, address: &str) -> Component<Account> {
    Component::unique(Id::generate(), entity, Account::Email(address.to_string()))
}

fn name(entity: Id, value: &str) -> Component<Account> {
    Component::new(
        Id::generate(),
        entity,
        Account::DisplayName(value.to_string()),
    )
}

fn balance(entity: Id, amount: i64) -> Component<Account> {
    Component::new(Id::generate(), entity, Account::Balance(amount))
}

#[tokio::test]
async fn written_components_read_back_by_entity_id() {
    let registry = registry().await;
    let entity = Id::generate();
    let batch = vec![
        balance(entity, 10),
        email(entity, "ada@example.com"),
        name(entity, "Ada"),
    ];

    registry.execute(&batch).await.unwrap();

    let found = registry
        .query(&Query::by_entity_id(entity))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), entity);
    assert_eq!(found.len(), 3);

    // Ordered by type tag
    let kinds: Vec<AccountKind> = found.components().iter().map(|c| c.data().kind()).collect();
    assert_eq!(
        kinds,
        vec![AccountKind::Email, AccountKind::DisplayName, AccountKind::Balance]
    );

    let stored_email = found.component(AccountKind::Email).unwrap();
    assert_eq!(stored_email, &batch[1]);
    assert!(stored_email.is_unique());
    assert!(!found.component(AccountKind::Balance).unwrap().is_unique());
}

#[tokio::test]
async fn type_filter_limits_returned_components() {
    let registry = registry().await;
    let entity = Id::generate();
    registry
        .execute(&vec![
            email(entity, "bob@example.com"),
            name(entity, "Bob"),
            balance(entity, 5),
        ])
        .await
        .unwrap();

    let found = registry
        .query(&Query::by_entity_id(entity).with_types([AccountKind::Balance]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found.components()[0].data(), &Account::Balance(5));
}

#[tokio::test]
async fn type_filter_matching_nothing_is_absent() {
    let registry = registry().await;
    let entity = Id::generate();
    registry.execute(&vec![name(entity, "Cy")]).await.unwrap();

    let found = registry
        .query(&Query::by_entity_id(entity).with_types([AccountKind::Balance]))
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn unique_key_resolves_whole_entity() {
    let registry = registry().await;
    let entity = Id::generate();
    registry
        .execute(&vec![email(entity, "dee@example.com"), name(entity, "Dee")])
        .await
        .unwrap();

    let by_key = registry
        .query(&Query::by_unique_key(Account::Email(
            "dee@example.com".to_string(),
        )))
        .await
        .unwrap()
        .unwrap();
    let by_id = registry
        .query(&Query::by_entity_id(entity))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(by_key.id(), entity);
    assert_eq!(by_key, by_id);
}

#[tokio::test]
async fn unique_key_query_honors_type_filter() {
    let registry = registry().await;
    let entity = Id::generate();
    registry
        .execute(&vec![email(entity, "eve@example.com"), balance(entity, 42)])
        .await
        .unwrap();

    let found = registry
        .query(
            &Query::by_unique_key(Account::Email("eve@example.com".to_string()))
                .with_types([AccountKind::Balance]),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found.components()[0].data(), &Account::Balance(42));
}

#[tokio::test]
async fn non_unique_content_is_not_a_key() {
    let registry = registry().await;
    registry
        .execute(&vec![name(Id::generate(), "Fay")])
        .await
        .unwrap();

    let found = registry
        .query(&Query::by_unique_key(Account::DisplayName(
            "Fay".to_string(),
        )))
        .await
        .unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn unknown_entity_and_key_are_absent() {
    let registry = registry().await;

    assert!(
        registry
            .query(&Query::by_entity_id(Id::generate()))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        registry
            .query(&Query::by_unique_key(Account::Email(
                "nobody@example.com".to_string()
            )))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let registry = registry().await;

    registry
        .execute(&Vec::<Component<Account>>::new())
        .await
        .unwrap();

    assert_eq!(row_count(&registry).await, 0);
}

#[tokio::test]
async fn claimed_unique_key_rejects_whole_batch() {
    let registry = registry().await;
    let owner = Id::generate();
    registry
        .execute(&vec![email(owner, "gil@example.com")])
        .await
        .unwrap();

    let intruder = Id::generate();
    let result = registry
        .execute(&vec![
            name(intruder, "Not Gil"),
            email(intruder, "gil@example.com"),
        ])
        .await;

    assert!(matches!(result, Err(RegistryError::DuplicateUniqueKey(_))));
    assert_eq!(row_count(&registry).await, 1);
    assert!(
        registry
            .query(&Query::by_entity_id(intruder))
            .await
            .unwrap()
            .is_none()
    );

    let resolved = registry
        .query(&Query::by_unique_key(Account::Email(
            "gil@example.com".to_string(),
        )))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id(), owner);
}

#[tokio::test]
async fn reused_component_id_is_duplicate_identifier() {
    let registry = registry().await;
    let first = name(Id::generate(), "Hal");
    registry.execute(&vec![first.clone()]).await.unwrap();

    let reused = Component::new(first.id(), Id::generate(), Account::Balance(1));
    let result = registry.execute(&vec![reused]).await;

    assert!(matches!(result, Err(RegistryError::DuplicateIdentifier(_))));
    assert_eq!(row_count(&registry).await, 1);
}

#[tokio::test]
async fn later_writes_become_current() {
    let registry = registry().await;
    let entity = Id::generate();
    registry
        .execute(&vec![email(entity, "ivy@example.com"), balance(entity, 1)])
        .await
        .unwrap();
    registry.execute(&vec![balance(entity, 2)]).await.unwrap();
    registry.execute(&vec![balance(entity, 3)]).await.unwrap();

    let found = registry
        .query(&Query::by_entity_id(entity))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(
        found.component(AccountKind::Balance).unwrap().data(),
        &Account::Balance(3)
    );
    // Superseded versions stay stored
    assert_eq!(row_count(&registry).await, 4);
}

#[tokio::test]
async fn same_attribute_twice_in_one_batch_is_rejected() {
    let registry = registry().await;
    let entity = Id::generate();

    let result = registry
        .execute(&vec![balance(entity, 1), balance(entity, 2)])
        .await;

    assert!(matches!(result, Err(RegistryError::DuplicateAttribute(_))));
    assert_eq!(row_count(&registry).await, 0);
}

#[tokio::test]
async fn fixed_versions_reject_rewriting_an_attribute() {
    let registry = SqliteRegistry::new(pool().await, system(1))
        .with_config(RegistryConfig::default().with_version_policy(VersionPolicy::Fixed));
    let entity = Id::generate();
    registry.execute(&vec![balance(entity, 1)]).await.unwrap();

    let result = registry.execute(&vec![balance(entity, 2)]).await;

    assert!(matches!(result, Err(RegistryError::DuplicateAttribute(_))));
    let found = registry
        .query(&Query::by_entity_id(entity))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.components()[0].data(), &Account::Balance(1));
}

#[tokio::test]
async fn systems_do_not_see_each_other() {
    let pool = pool().await;
    let first = SqliteRegistry::new(pool.clone(), system(1));
    let second = SqliteRegistry::new(pool, system(2));
    let entity = Id::generate();

    first
        .execute(&vec![email(entity, "jo@example.com")])
        .await
        .unwrap();

    assert!(
        second
            .query(&Query::by_entity_id(entity))
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        second
            .query(&Query::by_unique_key(Account::Email(
                "jo@example.com".to_string()
            )))
            .await
            .unwrap()
            .is_none()
    );

    // The same key may be claimed once per system
    second
        .execute(&vec![email(Id::generate(), "jo@example.com")])
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_type_tag_in_storage_is_a_mapper_error() {
    let registry = registry().await;
    let entity = Id::generate();
    registry.execute(&vec![name(entity, "Kit")]).await.unwrap();

    sqlx::query("UPDATE component SET type = 99")
        .execute(registry.executor().inner())
        .await
        .unwrap();

    let result = registry.query(&Query::by_entity_id(entity)).await;
    assert!(matches!(result, Err(RegistryError::MapperError(_))));
}

#[tokio::test]
async fn file_database_persists_across_pools() {
    let path = std::env::temp_dir().join(format!("component-registry-{}.db", Id::generate()));
    let url = format!("sqlite://{}", path.display());
    let entity = Id::generate();

    {
        let pool = SqlitePool::connect(&url).await.unwrap();
        pool.initialize().await.unwrap();
        SqliteRegistry::new(pool.clone(), system(1))
            .execute(&vec![name(entity, "Lee")])
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = SqlitePool::connect(&url).await.unwrap();
    pool.initialize().await.unwrap();
    let found = SqliteRegistry::new(pool.clone(), system(1))
        .query(&Query::by_entity_id(entity))
        .await
        .unwrap();
    pool.close().await;
    let _ = std::fs::remove_file(&path);

    assert_eq!(found.unwrap().len(), 1);
}

#[tokio::test]
async fn failing_batch_leaves_every_entity_untouched() {
    let registry = registry().await;
    let owner = Id::generate();
    registry
        .execute(&vec![email(owner, "max@example.com")])
        .await
        .unwrap();

    let bystander = Id::generate();
    let intruder = Id::generate();
    let result = registry
        .execute(&vec![
            name(bystander, "Innocent"),
            balance(bystander, 7),
            email(intruder, "max@example.com"),
        ])
        .await;

    assert!(matches!(result, Err(RegistryError::DuplicateUniqueKey(_))));
    for entity in [bystander, intruder] {
        assert!(
            registry
                .query(&Query::by_entity_id(entity))
                .await
                .unwrap()
                .is_none()
        );
    }
    assert_eq!(row_count(&registry).await, 1);
}

async fn file_registry(policy: VersionPolicy) -> (Arc<SqliteRegistry<Account>>, PathBuf) {
    let path = std::env::temp_dir().join(format!("component-registry-{}.db", Id::generate()));
    let pool = SqlitePool::connect(format!("sqlite://{}", path.display()))
        .await
        .unwrap();
    pool.initialize().await.unwrap();
    let registry = SqliteRegistry::new(pool, system(1))
        .with_config(RegistryConfig::default().with_version_policy(policy));
    (Arc::new(registry), path)
}

async fn write_concurrently(
    registry: &Arc<SqliteRegistry<Account>>,
    batches: Vec<Vec<Component<Account>>>,
) -> Vec<Result<(), RegistryError>> {
    let handles: Vec<_> = batches
        .into_iter()
        .map(|batch| {
            let registry = Arc::clone(registry);
            tokio::spawn(async move { registry.execute(&batch).await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_to_distinct_entities_all_commit() {
    let (registry, path) = file_registry(VersionPolicy::Incrementing).await;
    let entities: Vec<Id> = (0..16).map(|_| Id::generate()).collect();
    let batches = entities
        .iter()
        .enumerate()
        .map(|(i, entity)| vec![balance(*entity, i as i64)])
        .collect();

    let results = write_concurrently(&registry, batches).await;

    for result in &results {
        assert!(result.is_ok(), "{:?}", result);
    }
    for entity in &entities {
        assert!(
            registry
                .query(&Query::by_entity_id(*entity))
                .await
                .unwrap()
                .is_some()
        );
    }
    assert_eq!(row_count(&registry).await, 16);

    registry.executor().close().await;
    let _ = std::fs::remove_file(&path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_to_one_entity_append_versions() {
    let (registry, path) = file_registry(VersionPolicy::Incrementing).await;
    let entity = Id::generate();
    let batches = (0..16).map(|i| vec![balance(entity, i)]).collect();

    let results = write_concurrently(&registry, batches).await;

    for result in &results {
        assert!(result.is_ok(), "{:?}", result);
    }
    let versions: Vec<i32> = sqlx::query_scalar("SELECT version FROM component ORDER BY version")
        .fetch_all(registry.executor().inner())
        .await
        .unwrap();
    assert_eq!(versions, (0..16).collect::<Vec<i32>>());

    registry.executor().close().await;
    let _ = std::fs::remove_file(&path);
}
