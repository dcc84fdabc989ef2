use chrono::{Duration, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};

use registry::entity::{event, maybe_participant, participant};
use registry::{NewEvent, Registry, RegistryError};

/// In-memory store. A single pooled connection keeps every operation on the
/// same SQLite memory database.
async fn setup() -> (DatabaseConnection, Registry) {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect in-memory db");
    db.get_schema_registry("registry::entity::*")
        .sync(&db)
        .await
        .expect("schema sync");

    let tz = "Europe/Paris".parse().expect("valid timezone");
    (db.clone(), Registry::new(db, tz))
}

fn sample_event(ctftime_id: &str, message_id: &str, start: &str) -> NewEvent {
    NewEvent {
        ctftime_id: ctftime_id.to_string(),
        message_id: message_id.to_string(),
        title: format!("CTF {ctftime_id}"),
        url: format!("https://ctftime.org/event/{ctftime_id}"),
        start: start.to_string(),
        end: "à venir".to_string(),
        description: "Jeopardy style, online.".to_string(),
    }
}

fn days_from_now(days: i64) -> String {
    (Utc::now() + Duration::days(days)).to_rfc3339()
}

mod upsert {
    use super::*;

    #[tokio::test]
    async fn creates_then_overwrites_in_place() {
        let (db, reg) = setup().await;

        reg.upsert_event(sample_event("100", "900", "à venir"))
            .await
            .expect("create");
        reg.add_participant("100", "alice").await.expect("add");

        let mut updated = sample_event("100", "900", "à venir");
        updated.title = "Renamed CTF".to_string();
        reg.upsert_event(updated).await.expect("update");

        let rows = event::Entity::find().all(&db).await.expect("select");
        assert_eq!(rows.len(), 1, "upsert must never duplicate the row");
        assert_eq!(rows[0].title, "Renamed CTF");

        // Existing participation edges survive the overwrite.
        let record = reg.get_event("100").await.expect("get");
        assert_eq!(record.participants, vec!["alice"]);
    }

    #[tokio::test]
    async fn stores_date_text_verbatim() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("100", "900", "04 July 2025, 17:00 UTC"))
            .await
            .expect("create");

        let record = reg.get_event("100").await.expect("get");
        assert_eq!(record.start, "04 July 2025, 17:00 UTC");
        assert_eq!(record.end, "à venir");
    }
}

mod resolution {
    use super::*;

    #[tokio::test]
    async fn resolves_both_keys_to_the_same_event() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("12345", "987654321", "à venir"))
            .await
            .expect("create");

        assert_eq!(reg.resolve("12345").await.expect("by catalog id"), "12345");
        assert_eq!(
            reg.resolve("987654321").await.expect("by message id"),
            "12345"
        );
        assert!(reg.exists("12345").await.expect("exists catalog"));
        assert!(reg.exists("987654321").await.expect("exists message"));
        assert!(!reg.exists("555").await.expect("exists unknown"));
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let (_db, reg) = setup().await;
        let err = reg.get_event("nope").await.expect_err("must fail");
        assert!(matches!(err, RegistryError::NotFound(_)));

        let err = reg
            .add_participant("nope", "alice")
            .await
            .expect_err("must fail before writing");
        assert!(matches!(err, RegistryError::NotFound(_)));
    }
}

mod participation {
    use super::*;

    #[tokio::test]
    async fn add_is_idempotent() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");

        reg.add_participant("1", "alice").await.expect("first add");
        reg.add_participant("1", "alice").await.expect("second add");

        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["alice"]);
    }

    #[tokio::test]
    async fn remove_of_absent_edge_is_a_no_op() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");
        reg.add_participant("1", "alice").await.expect("add");

        reg.remove_participant("1", "bob")
            .await
            .expect("removing an absent name succeeds");

        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["alice"]);
    }

    #[tokio::test]
    async fn roles_are_independent_and_may_co_occur() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");

        reg.add_participant("1", "alice").await.expect("confirmed");
        reg.add_maybe_participant("1", "alice")
            .await
            .expect("tentative");

        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["alice"]);
        assert_eq!(record.maybe_participants, vec!["alice"]);

        reg.remove_maybe_participant("1", "alice")
            .await
            .expect("remove tentative");
        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["alice"]);
        assert!(record.maybe_participants.is_empty());
    }

    #[tokio::test]
    async fn bulk_add_and_remove_by_message_id() {
        let (_db, reg) = setup().await;
        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");

        let names = vec![
            "charlie".to_string(),
            "alice".to_string(),
            "bob".to_string(),
            "alice".to_string(),
        ];
        reg.add_participants("10", &names).await.expect("bulk add");

        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["alice", "bob", "charlie"]);

        reg.remove_participants("10", &["alice".to_string(), "charlie".to_string()])
            .await
            .expect("bulk remove");
        let record = reg.get_event("1").await.expect("get");
        assert_eq!(record.participants, vec!["bob"]);
    }
}

mod selection {
    use super::*;

    #[tokio::test]
    async fn next_event_concrete_scenario() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        reg.upsert_event(sample_event("42", "111", &days_from_now(5)))
            .await
            .expect("create");
        reg.add_participant("42", "alice").await.expect("add");

        let record = reg.next_event(now).await.expect("next");
        assert_eq!(record.ctftime_id, "42");
        assert_eq!(record.participants, vec!["alice"]);
        assert!(record.maybe_participants.is_empty());
    }

    #[tokio::test]
    async fn events_without_interest_are_excluded() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        // Valid future start, but nobody signaled interest.
        reg.upsert_event(sample_event("1", "10", &days_from_now(3)))
            .await
            .expect("create");

        let err = reg.next_event(now).await.expect_err("must be empty");
        assert!(matches!(err, RegistryError::NoUpcomingEvent));
        let err = reg
            .events_in_window(now, 30)
            .await
            .expect_err("must be empty");
        assert!(matches!(err, RegistryError::NoUpcomingEvent));
    }

    #[tokio::test]
    async fn unparseable_start_is_excluded_even_with_interest() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");
        reg.add_participant("1", "alice").await.expect("add");

        let err = reg.next_event(now).await.expect_err("sentinel start");
        assert!(matches!(err, RegistryError::NoUpcomingEvent));
    }

    #[tokio::test]
    async fn tentative_interest_alone_satisfies_the_gate() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        reg.upsert_event(sample_event("1", "10", &days_from_now(2)))
            .await
            .expect("create");
        reg.add_maybe_participant("1", "dave").await.expect("add");

        let record = reg.next_event(now).await.expect("next");
        assert_eq!(record.ctftime_id, "1");
        assert_eq!(record.maybe_participants, vec!["dave"]);
    }

    #[tokio::test]
    async fn window_returns_ascending_start_order() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        for (id, msg, days) in [("a", "1", 1), ("b", "2", 3), ("c", "3", 2)] {
            reg.upsert_event(sample_event(id, msg, &days_from_now(days)))
                .await
                .expect("create");
            reg.add_participant(id, "alice").await.expect("add");
        }

        let records = reg.events_in_window(now, 30).await.expect("window");
        let ids: Vec<&str> = records.iter().map(|r| r.ctftime_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn window_excludes_past_and_beyond_span() {
        let (_db, reg) = setup().await;
        let now = Utc::now();

        reg.upsert_event(sample_event("past", "1", &days_from_now(-1)))
            .await
            .expect("create");
        reg.add_participant("past", "alice").await.expect("add");

        reg.upsert_event(sample_event("far", "2", &days_from_now(45)))
            .await
            .expect("create");
        reg.add_participant("far", "alice").await.expect("add");

        reg.upsert_event(sample_event("near", "3", &days_from_now(5)))
            .await
            .expect("create");
        reg.add_participant("near", "alice").await.expect("add");

        let records = reg.events_in_window(now, 30).await.expect("window");
        let ids: Vec<&str> = records.iter().map(|r| r.ctftime_id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_cascades_to_both_edge_sets() {
        let (db, reg) = setup().await;
        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");
        reg.add_participant("1", "alice").await.expect("confirmed");
        reg.add_maybe_participant("1", "bob").await.expect("maybe");

        reg.delete_event("1").await.expect("delete");

        assert!(!reg.exists("1").await.expect("exists"));
        let confirmed = participant::Entity::find().all(&db).await.expect("select");
        assert!(confirmed.is_empty());
        let tentative = maybe_participant::Entity::find()
            .all(&db)
            .await
            .expect("select");
        assert!(tentative.is_empty());
    }
}

mod storage {
    use super::*;

    #[tokio::test]
    async fn init_db_creates_the_storage_file_and_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("events.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let db = registry::database::init_db(&url).await.expect("init");
        let tz = "Europe/Paris".parse().expect("tz");
        let reg = Registry::new(db, tz);

        reg.upsert_event(sample_event("1", "10", "à venir"))
            .await
            .expect("create");
        assert!(path.exists());
    }
}
