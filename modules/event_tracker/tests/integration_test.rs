use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use event_tracker::{
    config::EventTrackerConfig,
    contract::{
        ConflictPolicy, EventRequest, EventTrackerApi, EventTrackerError, NewCategory, SortOrder,
        UserId,
    },
    domain::{
        datetime::format_date,
        error::DomainError,
        events::EventDomainEvent,
        ports::NotificationSender,
        repo::{UsernameExists, UsersRepository},
    },
    infra::storage::{migrations::Migrator, SeaOrmRepository},
    module::{assemble, EventTrackerModule},
};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Captures every text instead of sending it.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, destination: &str, message: &str) -> Result<(), DomainError> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), message.to_string()));
        Ok(())
    }
}

struct FailingSender;

#[async_trait]
impl NotificationSender for FailingSender {
    async fn send(&self, _: &str, _: &str) -> Result<(), DomainError> {
        Err(DomainError::external("sms", "gateway down"))
    }
}

async fn create_module(cfg: EventTrackerConfig, sender: Arc<dyn NotificationSender>) -> EventTrackerModule {
    assemble(create_test_db().await, &cfg, sender, None)
}

async fn create_test_client() -> Arc<dyn EventTrackerApi> {
    create_module(EventTrackerConfig::default(), Arc::new(RecordingSender::default()))
        .await
        .client()
}

async fn registered(client: &Arc<dyn EventTrackerApi>, name: &str) -> UserId {
    client.register(name, "secret1").await.expect("register")
}

fn request(user: UserId, name: &str, date: &str, time: Option<&str>) -> EventRequest {
    EventRequest::builder(user)
        .name(name)
        .date(date)
        .time_opt(time.map(str::to_string))
        .build()
        .expect("valid request")
}

#[tokio::test]
async fn test_register_login_and_default_categories() -> Result<()> {
    let client = create_test_client().await;

    let id = client.register("alice", "secret1").await?;
    assert_eq!(client.login("alice", "secret1").await?, id);
    assert_eq!(client.user_id("alice").await?, id);

    assert!(matches!(
        client.login("alice", "wrong").await,
        Err(EventTrackerError::Unauthorized)
    ));
    assert!(matches!(
        client.login("nobody", "secret1").await,
        Err(EventTrackerError::Unauthorized)
    ));
    assert!(matches!(
        client.register("alice", "other1").await,
        Err(EventTrackerError::Duplicate { .. })
    ));
    assert!(matches!(
        client.register("al", "secret1").await,
        Err(EventTrackerError::Validation { .. })
    ));

    let names: Vec<String> = client
        .categories(id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["Education", "Health", "Personal", "Social", "Work"]);
    Ok(())
}

#[tokio::test]
async fn test_failed_category_seed_rolls_back_registration() -> Result<()> {
    let db = create_test_db().await;
    db.execute_unprepared(
        "CREATE TRIGGER reject_categories BEFORE INSERT ON categories \
         BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;",
    )
    .await?;
    let client = assemble(
        db.clone(),
        &EventTrackerConfig::default(),
        Arc::new(RecordingSender::default()),
        None,
    )
    .client();

    assert!(matches!(
        client.register("alice", "secret1").await,
        Err(EventTrackerError::Internal)
    ));
    assert!(matches!(
        client.user_id("alice").await,
        Err(EventTrackerError::NotFound { .. })
    ));
    assert!(matches!(
        client.login("alice", "secret1").await,
        Err(EventTrackerError::Unauthorized)
    ));

    db.execute_unprepared("DROP TRIGGER reject_categories;").await?;
    let id = client.register("alice", "secret1").await?;
    assert_eq!(client.categories(id).await?.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_unique_username_violation_is_typed() -> Result<()> {
    let repo = SeaOrmRepository::new(create_test_db().await);
    repo.insert_user_with_categories("alice", "hash", &[("Work", "#FF5722")])
        .await?;

    let err = repo
        .insert_user_with_categories("alice", "hash", &[("Work", "#FF5722")])
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<UsernameExists>().is_some());
    Ok(())
}

#[tokio::test]
async fn test_phone_number_roundtrip_and_validation() -> Result<()> {
    let client = create_test_client().await;
    let id = registered(&client, "bob").await;

    assert_eq!(client.phone_number(id).await?, None);
    client.set_phone_number(id, " 5551234567 ").await?;
    assert_eq!(client.phone_number(id).await?.as_deref(), Some("5551234567"));

    assert!(matches!(
        client.set_phone_number(id, "12ab").await,
        Err(EventTrackerError::Validation { .. })
    ));
    assert!(matches!(
        client.set_phone_number(999, "5551234567").await,
        Err(EventTrackerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_overlapping_events_conflict() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "carol").await;

    let sync = client
        .add_event(
            request(user, "Team Sync", "3/10/2025", Some("2:00 PM")),
            ConflictPolicy::Warn,
        )
        .await?;

    let standup = request(user, "Standup", "3/10/2025", Some("2:30 PM"));
    let conflicts = client.check_conflicts(&standup, None).await?;
    assert_eq!(conflicts, vec![sync.clone()]);

    match client.add_event(standup.clone(), ConflictPolicy::Warn).await {
        Err(EventTrackerError::Conflict { conflicts }) => assert_eq!(conflicts[0].id, sync.id),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(client.list_events(user, SortOrder::DateAsc).await?.len(), 1);

    client.add_event(standup, ConflictPolicy::Proceed).await?;
    assert_eq!(client.list_events(user, SortOrder::DateAsc).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_events_three_hours_apart_do_not_conflict() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "dave").await;

    client
        .add_event(
            request(user, "Team Sync", "3/10/2025", Some("2:00 PM")),
            ConflictPolicy::Warn,
        )
        .await?;
    let later = request(user, "Standup", "3/10/2025", Some("5:00 PM"));
    assert!(client.check_conflicts(&later, None).await?.is_empty());
    client.add_event(later, ConflictPolicy::Warn).await?;
    Ok(())
}

#[tokio::test]
async fn test_invalid_month_is_rejected() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "erin").await;

    match client
        .add_event(request(user, "Trip", "13/1/2025", None), ConflictPolicy::Warn)
        .await
    {
        Err(EventTrackerError::Validation { field, .. }) => assert_eq!(field, "date"),
        other => panic!("expected validation error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_upcoming_window_excludes_far_events() -> Result<()> {
    let module = create_module(
        EventTrackerConfig::default(),
        Arc::new(RecordingSender::default()),
    )
    .await;
    let client = module.client();
    let user = registered(&client, "frank").await;

    let today = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
    for (name, offset) in [("Today", 0), ("Soon", 3), ("Later", 10)] {
        let date = format_date(today + Duration::days(offset));
        client
            .add_event(request(user, name, &date, None), ConflictPolicy::Warn)
            .await?;
    }

    let names: Vec<String> = module
        .service()
        .upcoming_events_from(user, today)
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["Today", "Soon"]);
    Ok(())
}

#[tokio::test]
async fn test_deleted_event_leaves_no_stale_lookup() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "grace").await;

    let event = client
        .add_event(request(user, "Dentist", "4/2/2025", Some("9:00 AM")), ConflictPolicy::Warn)
        .await?;
    assert!(client.find_by_name(user, "Dentist").await?.is_some());

    client.delete_event(user, event.id).await?;
    assert!(client.find_by_name(user, "Dentist").await?.is_none());
    assert!(client.events_on_date(user, "4/2/2025").await?.is_empty());
    assert!(matches!(
        client.delete_event(user, event.id).await,
        Err(EventTrackerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_name_and_date_rejected_on_add_only() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "heidi").await;

    let first = client
        .add_event(request(user, "Gym", "5/5/2025", None), ConflictPolicy::Warn)
        .await?;
    assert!(matches!(
        client
            .add_event(request(user, "Gym", "5/5/2025", None), ConflictPolicy::Proceed)
            .await,
        Err(EventTrackerError::Duplicate { .. })
    ));

    // Same name on another date is a different event.
    client
        .add_event(request(user, "Gym", "5/6/2025", None), ConflictPolicy::Warn)
        .await?;

    let updated = client
        .update_event(
            first.id,
            request(user, "Gym", "5/5/2025", Some("7:00 AM")),
            ConflictPolicy::Warn,
        )
        .await?;
    assert_eq!(updated.time.as_deref(), Some("7:00 AM"));
    assert_eq!(
        client
            .find_by_name_and_date(user, "Gym", "5/5/2025")
            .await?
            .map(|e| e.id),
        Some(first.id)
    );
    Ok(())
}

#[tokio::test]
async fn test_update_ignores_own_time_when_checking_conflicts() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "ivan").await;

    let event = client
        .add_event(request(user, "Review", "6/1/2025", Some("10:00 AM")), ConflictPolicy::Warn)
        .await?;
    let moved = client
        .update_event(
            event.id,
            request(user, "Review", "6/1/2025", Some("10:30 AM")),
            ConflictPolicy::Warn,
        )
        .await?;
    assert_eq!(moved.time.as_deref(), Some("10:30 AM"));

    assert!(matches!(
        client
            .update_event(9999, request(user, "Ghost", "6/1/2025", None), ConflictPolicy::Warn)
            .await,
        Err(EventTrackerError::NotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_users_do_not_see_each_other() -> Result<()> {
    let client = create_test_client().await;
    let a = registered(&client, "judy").await;
    let b = registered(&client, "mallory").await;

    let event = client
        .add_event(request(a, "Private", "7/1/2025", Some("1:00 PM")), ConflictPolicy::Warn)
        .await?;

    assert!(client.list_events(b, SortOrder::DateAsc).await?.is_empty());
    assert!(client.find_by_name(b, "Private").await?.is_none());
    assert!(client
        .check_conflicts(&request(b, "Mine", "7/1/2025", Some("1:00 PM")), None)
        .await?
        .is_empty());
    assert!(matches!(
        client.delete_event(b, event.id).await,
        Err(EventTrackerError::NotFound { .. })
    ));
    assert_eq!(client.list_events(a, SortOrder::DateAsc).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_categories_and_counts() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "niaj").await;
    let other = registered(&client, "olivia").await;

    let hobby = client
        .add_category(NewCategory {
            user_id: user,
            name: "Hobby".into(),
            color: None,
        })
        .await?;
    assert_eq!(hobby.color, "#2196F3");
    assert!(matches!(
        client
            .add_category(NewCategory {
                user_id: user,
                name: "Bad".into(),
                color: Some("blue".into()),
            })
            .await,
        Err(EventTrackerError::Validation { .. })
    ));

    let tagged = EventRequest::builder(user)
        .name("Painting")
        .date("8/1/2025")
        .category(Some(hobby.id))
        .build()?;
    let event = client.add_event(tagged, ConflictPolicy::Warn).await?;
    assert_eq!(event.category_name(), Some("Hobby"));
    client
        .add_event(request(user, "Loose", "8/2/2025", None), ConflictPolicy::Warn)
        .await?;

    let foreign = client.categories(other).await?[0].id;
    let stolen = EventRequest::builder(user)
        .name("Sneaky")
        .date("8/3/2025")
        .category(Some(foreign))
        .build()?;
    assert!(matches!(
        client.add_event(stolen, ConflictPolicy::Warn).await,
        Err(EventTrackerError::NotFound { .. })
    ));

    let counts = client.category_counts(user).await?;
    assert_eq!(counts.len(), 6);
    let hobby_count = counts.iter().find(|c| c.category.name == "Hobby").unwrap();
    assert_eq!(hobby_count.count, 1);
    assert!(counts
        .iter()
        .filter(|c| c.category.name != "Hobby")
        .all(|c| c.count == 0));
    Ok(())
}

#[tokio::test]
async fn test_sorting_next_event_and_completion() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "peggy").await;

    for (name, date, time) in [
        ("Beta", "2/1/2025", Some("3:00 PM")),
        ("alpha", "1/15/2025", None),
        ("Gamma", "12/31/2024", Some("8:00 AM")),
    ] {
        client
            .add_event(request(user, name, date, time), ConflictPolicy::Warn)
            .await?;
    }

    let by_date: Vec<String> = client
        .list_events(user, SortOrder::DateAsc)
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(by_date, ["Gamma", "alpha", "Beta"]);

    let by_name: Vec<String> = client
        .list_events(user, SortOrder::NameAsc)
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(by_name, ["alpha", "Beta", "Gamma"]);

    assert_eq!(
        client.next_event(user).await?.map(|e| e.name).as_deref(),
        Some("Gamma")
    );
    assert_eq!(client.complete_name(user, "ga").await?, ["Gamma"]);
    assert!(client.complete_name(user, "g").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_filter_by_category_and_date_range() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "quentin").await;
    let work = client
        .categories(user)
        .await?
        .into_iter()
        .find(|c| c.name == "Work")
        .unwrap();

    let tagged = |name: &str, date: &str| {
        EventRequest::builder(user)
            .name(name)
            .date(date)
            .category(Some(work.id))
            .build()
    };
    for req in [
        tagged("Kickoff", "3/1/2025")?,
        tagged("Review", "10/1/2025")?,
        request(user, "Picnic", "3/15/2025", None),
        request(user, "Ski Trip", "1/20/2026", None),
    ] {
        client.add_event(req, ConflictPolicy::Warn).await?;
    }

    let names = |events: Vec<event_tracker::contract::Event>| -> Vec<String> {
        events.into_iter().map(|e| e.name).collect()
    };

    assert_eq!(
        names(client.filter_events(user, None, None, None).await?),
        ["Kickoff", "Picnic", "Review", "Ski Trip"]
    );
    assert_eq!(
        names(client.filter_events(user, Some(work.id), None, None).await?),
        ["Kickoff", "Review"]
    );
    // As text "10/1/2025" < "3/1/2025"; as dates it is later.
    assert_eq!(
        names(client.filter_events(user, None, Some("3/1/2025"), Some("12/31/2025")).await?),
        ["Kickoff", "Picnic", "Review"]
    );
    assert_eq!(
        names(client.filter_events(user, None, None, Some("3/1/2025")).await?),
        ["Kickoff"]
    );
    assert_eq!(
        names(client.filter_events(user, Some(work.id), Some("4/1/2025"), Some(" ")).await?),
        ["Review"]
    );
    assert!(matches!(
        client.filter_events(user, None, Some("2025-03-01"), None).await,
        Err(EventTrackerError::Validation { .. })
    ));

    let other = registered(&client, "rupert").await;
    assert!(client
        .filter_events(other, Some(work.id), None, None)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn test_export_csv_and_summary() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "rupert").await;
    let work = client
        .categories(user)
        .await?
        .into_iter()
        .find(|c| c.name == "Work")
        .unwrap();

    let req = EventRequest::builder(user)
        .name("Plan, \"Q3\"")
        .date("9/1/2025")
        .time("9:00 AM")
        .category(Some(work.id))
        .build()?;
    let plan = client.add_event(req, ConflictPolicy::Warn).await?;
    let walk = client
        .add_event(request(user, "Walk", "9/2/2025", None), ConflictPolicy::Warn)
        .await?;

    let dir = tempfile::tempdir()?;
    let csv_path = dir.path().join("out/events.csv");
    assert_eq!(client.export_csv(user, &csv_path).await?, 2);
    let csv = std::fs::read_to_string(&csv_path)?;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Event ID,Event Name,Date,Time,Category"));
    assert_eq!(
        lines.next(),
        Some(format!("{},\"Plan, \"\"Q3\"\"\",9/1/2025,9:00 AM,Work", plan.id).as_str())
    );
    assert_eq!(
        lines.next(),
        Some(format!("{},\"Walk\",9/2/2025,,", walk.id).as_str())
    );

    let summary_path = dir.path().join("summary.txt");
    client.export_summary(user, &summary_path).await?;
    let summary = std::fs::read_to_string(&summary_path)?;
    assert!(summary.starts_with(&format!("Event Summary for User ID: {user}\n")));
    assert!(summary.contains("Category Summary:\nCategory,Event Count\n"));
    assert!(summary.contains("Work,1\n"));
    assert!(summary.contains("Uncategorized,1"));
    assert_eq!(client.events_summary(user).await?, summary);
    Ok(())
}

#[tokio::test]
async fn test_notifications_follow_permission_and_phone() -> Result<()> {
    let mut cfg = EventTrackerConfig::default();
    cfg.notifications.enabled = true;
    let sender = Arc::new(RecordingSender::default());
    let client = create_module(cfg, sender.clone()).await.client();
    let user = registered(&client, "sybil").await;

    client
        .add_event(request(user, "Silent", "10/1/2025", None), ConflictPolicy::Warn)
        .await?;
    assert!(sender.messages().is_empty(), "no phone on file yet");

    client.set_phone_number(user, "5550001111").await?;
    let event = client
        .add_event(request(user, "Lunch", "10/2/2025", None), ConflictPolicy::Warn)
        .await?;
    client.delete_event(user, event.id).await?;

    let messages = sender.messages();
    assert_eq!(
        messages,
        vec![
            (
                "5550001111".to_string(),
                "Your event 'Lunch' on 10/2/2025 has been added.".to_string()
            ),
            (
                "5550001111".to_string(),
                "Your event 'Lunch' has been deleted.".to_string()
            ),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_notifications_off_by_default_and_failures_do_not_block() -> Result<()> {
    let sender = Arc::new(RecordingSender::default());
    let client = create_module(EventTrackerConfig::default(), sender.clone())
        .await
        .client();
    let user = registered(&client, "trent").await;
    client.set_phone_number(user, "5550001111").await?;
    client
        .add_event(request(user, "Quiet", "10/3/2025", None), ConflictPolicy::Warn)
        .await?;
    assert!(sender.messages().is_empty());

    let mut cfg = EventTrackerConfig::default();
    cfg.notifications.enabled = true;
    let client = create_module(cfg, Arc::new(FailingSender)).await.client();
    let user = registered(&client, "victor").await;
    client.set_phone_number(user, "5550001111").await?;
    client
        .add_event(request(user, "Saved", "10/4/2025", None), ConflictPolicy::Warn)
        .await?;
    assert_eq!(client.list_events(user, SortOrder::DateAsc).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_mutations_are_broadcast() -> Result<()> {
    let module = create_module(
        EventTrackerConfig::default(),
        Arc::new(RecordingSender::default()),
    )
    .await;
    let client = module.client();
    let mut rx = module.subscribe();
    let user = registered(&client, "walter").await;

    let event = client
        .add_event(request(user, "Party", "11/1/2025", Some("8:00 PM")), ConflictPolicy::Warn)
        .await?;
    client
        .update_event(
            event.id,
            request(user, "Party", "11/1/2025", Some("9:00 PM")),
            ConflictPolicy::Warn,
        )
        .await?;
    client.delete_event(user, event.id).await?;

    assert!(matches!(rx.recv().await?, EventDomainEvent::Created { id, .. } if id == event.id));
    assert!(matches!(rx.recv().await?, EventDomainEvent::Updated { id, .. } if id == event.id));
    let deleted = rx.recv().await?;
    assert!(matches!(deleted, EventDomainEvent::Deleted { .. }));
    assert_eq!(deleted.user_id(), user);
    Ok(())
}

#[tokio::test]
async fn test_local_suggestion_without_remote() -> Result<()> {
    let client = create_test_client().await;
    let user = registered(&client, "yolanda").await;

    let title = client
        .suggest_title(user, event_tracker::contract::TimeContext::Morning, None)
        .await?;
    assert!(!title.trim().is_empty());
    Ok(())
}
