//! End-to-end behavior of partition creation, routing, and bootstrap
//! against the in-memory backend.

use std::sync::Arc;

use chrono::NaiveDate;
use partition_types::keys::{Key, KeySet};
use partition_types::values::{KeyValues, RangeValue, Scalar};
use partitioned::backend::ColumnType;
use partitioned::factory::{Error, PartitionFactory, PartitionOptions};
use partitioned::mem::MemBackend;

fn domain_date_keys() -> KeySet {
    let mut keys = KeySet::new();
    keys.push(Key::discrete("domain")).unwrap();
    keys.push(Key::continuous("date")).unwrap();
    keys
}

fn date(y: i32, m: u32, d: u32) -> Scalar {
    Scalar::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn january() -> RangeValue {
    RangeValue::inclusive(date(2020, 1, 1), date(2020, 1, 31)).unwrap()
}

fn example_january() -> KeyValues {
    KeyValues::new()
        .with("domain", "example.com")
        .with("date", january())
}

async fn bootstrapped_factory(
    parent: &str,
    backend: &Arc<MemBackend>,
) -> PartitionFactory<MemBackend> {
    let factory = PartitionFactory::new(
        parent,
        domain_date_keys(),
        Arc::clone(backend),
        PartitionOptions::default(),
    )
    .unwrap();
    factory.initialize_catalog(false).await.unwrap();
    factory
}

#[tokio::test]
async fn create_builds_catalog_row_and_child_table() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    let partition = factory.create(&example_january()).await.unwrap();

    assert_eq!(partition.table_name(), "weblogs_part_0");
    assert_eq!(partition.parent_table(), "weblogs");
    assert_eq!(backend.partition_count(), 1);
    assert!(backend.has_table("weblogs_part_0"));
}

#[tokio::test]
async fn creating_the_same_values_twice_conflicts_exactly_once() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    factory.create(&example_january()).await.unwrap();
    let err = factory.create(&example_january()).await.unwrap_err();

    assert!(matches!(err, Error::UniquenessConflict { .. }));
    assert_eq!(backend.partition_count(), 1);
    assert!(!backend.has_table("weblogs_part_1"));
}

#[tokio::test]
async fn distinct_key_values_partition_independently() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    factory.create(&example_january()).await.unwrap();
    let other = KeyValues::new()
        .with("domain", "other.example")
        .with("date", january());
    let partition = factory.create(&other).await.unwrap();

    assert_eq!(partition.table_name(), "weblogs_part_1");
    assert_eq!(backend.partition_count(), 2);
}

#[tokio::test]
async fn routing_finds_the_containing_partition() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    let created = factory.create(&example_january()).await.unwrap();

    let inside = KeyValues::new()
        .with("domain", "example.com")
        .with("date", date(2020, 1, 15));
    let found = factory.find_for(&inside).await.unwrap().unwrap();
    assert_eq!(found, created);

    let boundary_day = KeyValues::new()
        .with("domain", "example.com")
        .with("date", date(2020, 1, 31));
    assert!(factory.find_for(&boundary_day).await.unwrap().is_some());
}

#[tokio::test]
async fn routing_misses_outside_the_boundary() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    factory.create(&example_january()).await.unwrap();

    let next_year = KeyValues::new()
        .with("domain", "example.com")
        .with("date", date(2021, 1, 1));
    assert!(factory.find_for(&next_year).await.unwrap().is_none());

    let other_domain = KeyValues::new()
        .with("domain", "other.example")
        .with("date", date(2020, 1, 15));
    assert!(factory.find_for(&other_domain).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_routing_values_fail_without_querying() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    let err = factory
        .find_for(&KeyValues::new().with("domain", "example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Routing { .. }));
}

#[tokio::test]
async fn failed_table_creation_rolls_back_the_catalog_row() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    // The next identifier will be 0; occupy its physical name so the DDL
    // step fails after the catalog insert.
    backend.register_table("weblogs_part_0");

    let err = factory.create(&example_january()).await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert_eq!(backend.partition_count(), 0);

    // The failed attempt burned its identifier but left no state; the
    // retry lands on the next physical name.
    let partition = factory.create(&example_january()).await.unwrap();
    assert_eq!(partition.table_name(), "weblogs_part_1");
    assert_eq!(backend.partition_count(), 1);
}

#[tokio::test]
async fn bad_create_input_never_reaches_the_backend() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    let missing_date = KeyValues::new().with("domain", "example.com");
    let err = factory.create(&missing_date).await.unwrap_err();

    assert!(matches!(err, Error::Boundary { .. }));
    assert_eq!(backend.partition_count(), 0);
    assert!(!backend.has_table("weblogs_part_0"));
}

#[tokio::test]
async fn schema_qualified_parents_name_children_in_schema() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("logs.weblogs", &backend).await;

    let partition = factory.create(&example_january()).await.unwrap();
    assert_eq!(partition.table_name(), "logs.weblogs_part_0");
    assert!(backend.has_table("logs.weblogs_part_0"));
}

#[tokio::test]
async fn exclusive_ranges_still_route_inclusively_at_the_stored_end() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    let values = KeyValues::new().with("domain", "example.com").with(
        "date",
        RangeValue::exclusive(date(2020, 1, 1), date(2020, 2, 1)).unwrap(),
    );
    factory.create(&values).await.unwrap();

    // Routing tests containment against the stored begin/end values with
    // inclusive bounds on both ends, whatever exclusivity the partition
    // was created with.
    let stored_end = KeyValues::new()
        .with("domain", "example.com")
        .with("date", date(2020, 2, 1));
    assert!(factory.find_for(&stored_end).await.unwrap().is_some());
}

#[tokio::test]
async fn bootstrap_force_resets_the_catalog() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    factory.create(&example_january()).await.unwrap();
    assert_eq!(backend.partition_count(), 1);

    // Plain re-initialization is idempotent.
    factory.initialize_catalog(false).await.unwrap();
    assert_eq!(backend.partition_count(), 1);

    factory.initialize_catalog(true).await.unwrap();
    assert_eq!(backend.partition_count(), 0);
    assert!(!backend.has_table("weblogs_part_0"));
}

#[tokio::test]
async fn column_types_are_advisory_metadata() {
    test_helpers::maybe_start_logging();
    let backend = Arc::new(MemBackend::new());
    let factory = bootstrapped_factory("weblogs", &backend).await;

    backend.set_column_type("domain", ColumnType::Text);
    backend.set_column_type("date", ColumnType::Date);

    assert_eq!(
        factory.column_type("domain").await.unwrap(),
        Some(ColumnType::Text)
    );
    assert_eq!(
        factory.column_type("date").await.unwrap(),
        Some(ColumnType::Date)
    );
    assert_eq!(factory.column_type("bytes").await.unwrap(), None);
}
