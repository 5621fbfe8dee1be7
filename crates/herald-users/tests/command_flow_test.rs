//! End-to-end tests for the Users context: full middleware pipelines,
//! transactional event dispatch, and the cached directory listing.

use std::sync::Arc;

use herald_bus::{CommandBus, EventBus, QueryBus, install_modules, value_as};
use herald_core::clock::Clock;
use herald_core::error::AppError;
use herald_middleware::{
    AuditMiddleware, AuditStatus, AuditStore, CacheStore, CachingMiddleware, EventStore,
    EventStoreMiddleware, InMemoryAuditStore, InMemoryCacheStore, InMemoryEventStore,
    LoggingMiddleware, PerformanceMiddleware, UnitOfWorkMiddleware, ValidationMiddleware,
};
use herald_test_support::{FixedClock, RecordingTransactionProvider};
use herald_uow::{TransactionProvider, UnitOfWork};
use herald_users::application::dto::{UserDto, UserPage};
use herald_users::application::projector::UserDirectoryProjector;
use herald_users::domain::commands::CreateUser;
use herald_users::domain::queries::{GetUsers, SortOrder};
use herald_users::domain::repository::UserRepository;
use herald_users::memory::InMemoryUserRepository;
use herald_users::module::UsersModule;

struct TestApp {
    command_bus: CommandBus,
    query_bus: QueryBus,
    provider: Arc<RecordingTransactionProvider>,
    audit: Arc<InMemoryAuditStore>,
    event_log: Arc<InMemoryEventStore>,
    projector: UserDirectoryProjector,
    repository: Arc<InMemoryUserRepository>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(FixedClock::epoch());

    let event_log = Arc::new(InMemoryEventStore::new());
    let event_bus = Arc::new(EventBus::new());
    event_bus.add_middleware(Arc::new(LoggingMiddleware::new()));
    event_bus.add_middleware(Arc::new(EventStoreMiddleware::new(
        Arc::clone(&event_log) as Arc<dyn EventStore>
    )));

    let provider = Arc::new(RecordingTransactionProvider::new());
    let uow = Arc::new(UnitOfWork::new(
        Arc::clone(&provider) as Arc<dyn TransactionProvider>,
        Arc::clone(&event_bus),
    ));
    let repository = Arc::new(InMemoryUserRepository::new(Arc::clone(&uow)));
    let projector = UserDirectoryProjector::new();
    let audit = Arc::new(InMemoryAuditStore::new());

    let command_bus = CommandBus::new();
    command_bus.add_middleware(Arc::new(LoggingMiddleware::new()));
    command_bus.add_middleware(Arc::new(ValidationMiddleware::new()));
    command_bus.add_middleware(Arc::new(AuditMiddleware::new(
        Arc::clone(&audit) as Arc<dyn AuditStore>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )));
    command_bus.add_middleware(Arc::new(UnitOfWorkMiddleware::new(Arc::clone(&uow))));

    let query_bus = QueryBus::new();
    query_bus.add_middleware(Arc::new(LoggingMiddleware::new()));
    query_bus.add_middleware(Arc::new(CachingMiddleware::new(Arc::new(
        InMemoryCacheStore::new(Arc::clone(&clock) as Arc<dyn Clock>),
    ) as Arc<dyn CacheStore>)));
    query_bus.add_middleware(Arc::new(PerformanceMiddleware::new()));

    let module = UsersModule::new(
        Arc::clone(&repository) as Arc<dyn UserRepository>,
        clock as Arc<dyn Clock>,
        projector.clone(),
    );
    install_modules(&[&module], &command_bus, &query_bus, &event_bus);

    TestApp {
        command_bus,
        query_bus,
        provider,
        audit,
        event_log,
        projector,
        repository,
    }
}

fn create_user(email: &str, name: Option<&str>) -> CreateUser {
    CreateUser {
        email: email.to_owned(),
        password: "difference engine".to_owned(),
        name: name.map(ToOwned::to_owned),
    }
}

#[tokio::test]
async fn test_create_user_commits_then_projects_and_logs_the_event() {
    // Arrange
    let app = test_app();

    // Act
    let result = app
        .command_bus
        .dispatch(&create_user("ada@lovelace.dev", Some("Ada")))
        .await
        .unwrap();

    // Assert: the handler's DTO reaches the caller.
    let dto = value_as::<UserDto>(&result).unwrap();
    assert_eq!(dto.email, "ada@lovelace.dev");

    // The transaction committed before any event was dispatched.
    assert_eq!(app.provider.log(), ["begin", "commit"]);

    // The projector saw UserWasCreated after the commit.
    let entries = app.projector.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].email, "ada@lovelace.dev");
    assert_eq!(entries[0].user_id, dto.id);

    // The event log recorded the event once.
    let rows = app.event_log.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_name, "users.user_was_created");
    assert!(rows[0].payload.get("password_hash").is_none());

    // The audit trail concluded with success, password redacted.
    let records = app.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, AuditStatus::Succeeded);
    assert_eq!(records[0].payload["password"], "[redacted]");
}

#[tokio::test]
async fn test_invalid_create_user_stops_before_audit_and_transaction() {
    let app = test_app();

    let result = app
        .command_bus
        .dispatch(&CreateUser {
            email: "not-an-email".to_owned(),
            password: "short".to_owned(),
            name: None,
        })
        .await;

    match result.unwrap_err() {
        AppError::Validation { message, violations } => {
            assert_eq!(message, "users.create_user");
            assert_eq!(violations.len(), 2);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert!(app.audit.records().is_empty());
    assert_eq!(app.provider.begins(), 0);
    assert!(app.repository.is_empty());
}

#[tokio::test]
async fn test_duplicate_email_rolls_back_and_audits_the_failure() {
    let app = test_app();
    app.command_bus
        .dispatch(&create_user("ada@lovelace.dev", None))
        .await
        .unwrap();

    let result = app
        .command_bus
        .dispatch(&create_user("ada@lovelace.dev", None))
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Domain(_)));
    assert_eq!(app.provider.log(), ["begin", "commit", "begin", "rollback"]);
    assert_eq!(app.projector.entries().len(), 1);

    let records = app.audit.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].status, AuditStatus::Failed);
}

#[tokio::test]
async fn test_forced_commit_failure_dispatches_no_events() {
    let app = test_app();
    app.provider.fail_on_commit();

    let result = app
        .command_bus
        .dispatch(&create_user("ada@lovelace.dev", None))
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Persistence(_)));
    assert!(app.projector.entries().is_empty());
    assert!(app.event_log.rows().is_empty());
    assert_eq!(app.provider.log(), ["begin", "commit:error", "rollback"]);
}

#[tokio::test]
async fn test_get_users_filters_sorts_and_paginates() {
    let app = test_app();
    for (email, name) in [
        ("carol@example.com", Some("Carol")),
        ("alice@example.com", Some("Alice")),
        ("bob@example.com", Some("Bob")),
    ] {
        app.command_bus
            .dispatch(&create_user(email, name))
            .await
            .unwrap();
    }

    let page = app
        .query_bus
        .ask_as::<UserPage>(&GetUsers {
            sort: "email".to_owned(),
            order: SortOrder::Asc,
            per_page: 2,
            ..GetUsers::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.users.len(), 2);
    assert_eq!(page.users[0].email, "alice@example.com");
    assert_eq!(page.users[1].email, "bob@example.com");

    let searched = app
        .query_bus
        .ask_as::<UserPage>(&GetUsers {
            search: Some("bob".to_owned()),
            ..GetUsers::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
    assert_eq!(searched.users[0].name.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_get_users_rejects_unknown_sort_fields() {
    let app = test_app();

    let result = app
        .query_bus
        .ask(&GetUsers {
            sort: "password_hash".to_owned(),
            ..GetUsers::default()
        })
        .await;

    assert!(matches!(result.unwrap_err(), AppError::Configuration(_)));
}

#[tokio::test]
async fn test_cached_listing_stays_stale_until_its_ttl_expires() {
    let app = test_app();
    app.command_bus
        .dispatch(&create_user("ada@lovelace.dev", None))
        .await
        .unwrap();

    let listing = GetUsers {
        cache_ttl: 300,
        ..GetUsers::default()
    };
    let first = app.query_bus.ask_as::<UserPage>(&listing).await.unwrap();

    app.command_bus
        .dispatch(&create_user("grace@hopper.dev", None))
        .await
        .unwrap();
    let second = app.query_bus.ask_as::<UserPage>(&listing).await.unwrap();

    // Same key, live entry: the second ask is served from the cache and
    // does not see the new user.
    assert_eq!(first.total, 1);
    assert_eq!(second.total, 1);

    // A different page size is a different key and sees fresh data.
    let fresh = app
        .query_bus
        .ask_as::<UserPage>(&GetUsers {
            cache_ttl: 300,
            per_page: 50,
            ..GetUsers::default()
        })
        .await
        .unwrap();
    assert_eq!(fresh.total, 2);
}
