//! Transaction control tests against an in-memory SQLite database.

use ledger_store::{
    ClientId, ClientSeed, DEFAULT_DATABASE_URL, LedgerSession, StorageError, TransactionState,
    schema,
};

/// Fresh session with the ledger schema and the default client fixture.
async fn seeded_session() -> LedgerSession {
    let mut session = LedgerSession::connect(DEFAULT_DATABASE_URL).await.unwrap();
    let conn = session.connection().await.unwrap();
    schema::bootstrap(conn).await.unwrap();
    schema::seed_client(conn, &ClientSeed::default()).await.unwrap();
    session
}

async fn insert_item(session: &mut LedgerSession, item_id: i64) {
    sqlx::query("INSERT INTO order_items (client_id, order_id, item_id) VALUES (1, 1, ?)")
        .bind(item_id)
        .execute(session.connection().await.unwrap())
        .await
        .unwrap();
}

async fn item_ids(session: &mut LedgerSession) -> Vec<i64> {
    let mut ids: Vec<i64> =
        sqlx::query_scalar("SELECT item_id FROM order_items WHERE client_id = 1")
            .fetch_all(session.connection().await.unwrap())
            .await
            .unwrap();
    ids.sort_unstable();
    ids
}

mod boundaries {
    use super::*;

    #[tokio::test]
    async fn new_session_is_in_auto_commit_mode() {
        let session = seeded_session().await;
        assert!(session.is_auto_commit());
        assert_eq!(session.state(), TransactionState::NoTransaction);
        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn commit_keeps_changes() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        assert_eq!(session.state(), TransactionState::Open);

        insert_item(&mut session, 5).await;
        session.commit().await.unwrap();
        assert_eq!(session.state(), TransactionState::Committed);

        // A later rollback must not touch committed work.
        session.rollback().await.unwrap();
        assert_eq!(item_ids(&mut session).await, vec![5]);
    }

    #[tokio::test]
    async fn rollback_discards_changes() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        insert_item(&mut session, 5).await;
        insert_item(&mut session, 6).await;
        assert_eq!(item_ids(&mut session).await, vec![5, 6]);

        session.rollback().await.unwrap();
        assert_eq!(session.state(), TransactionState::RolledBack);
        assert!(item_ids(&mut session).await.is_empty());
    }

    #[tokio::test]
    async fn next_statement_after_commit_opens_new_transaction() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        session.commit().await.unwrap();

        insert_item(&mut session, 7).await;
        assert_eq!(session.state(), TransactionState::Open);

        session.rollback().await.unwrap();
        assert!(item_ids(&mut session).await.is_empty());
    }

    #[tokio::test]
    async fn begin_twice_keeps_the_open_transaction() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        insert_item(&mut session, 5).await;

        session.begin_manual_transaction().await.unwrap();
        session.rollback().await.unwrap();
        assert!(item_ids(&mut session).await.is_empty());
    }

    #[tokio::test]
    async fn commit_fails_in_auto_commit_mode() {
        let mut session = seeded_session().await;
        let err = session.commit().await.unwrap_err();
        assert!(matches!(err, StorageError::AutoCommitEnabled { .. }));

        let err = session.rollback().await.unwrap_err();
        assert!(matches!(err, StorageError::AutoCommitEnabled { .. }));
    }

    #[tokio::test]
    async fn enabling_auto_commit_commits_open_transaction() {
        let mut session = seeded_session().await;
        session.set_auto_commit(false).await.unwrap();
        insert_item(&mut session, 5).await;

        session.set_auto_commit(true).await.unwrap();
        assert!(session.is_auto_commit());
        assert_eq!(session.state(), TransactionState::Committed);

        insert_item(&mut session, 6).await;
        assert_eq!(session.state(), TransactionState::Committed);
        assert_eq!(item_ids(&mut session).await, vec![5, 6]);
    }

    #[tokio::test]
    async fn close_with_open_transaction_succeeds() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        insert_item(&mut session, 5).await;
        session.close().await.unwrap();
    }
}

mod savepoints {
    use super::*;

    #[tokio::test]
    async fn rollback_to_undoes_only_later_work() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        insert_item(&mut session, 1).await;
        let first = session.create_savepoint("first").await.unwrap();
        insert_item(&mut session, 2).await;
        let second = session.create_savepoint("second").await.unwrap();
        insert_item(&mut session, 3).await;
        let _third = session.create_savepoint("third").await.unwrap();

        session.rollback_to(&second).await.unwrap();
        assert_eq!(item_ids(&mut session).await, vec![1, 2]);
        assert_eq!(session.state(), TransactionState::Open);

        let live: Vec<_> = session.savepoints().map(|sp| sp.name().to_string()).collect();
        assert_eq!(live, vec!["first", "second"]);

        session.release_savepoint(&first).await.unwrap();
        assert_eq!(session.savepoints().count(), 0);

        session.commit().await.unwrap();
        assert_eq!(item_ids(&mut session).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn savepoint_survives_rollback_to_it() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        let sp = session.create_savepoint("retry").await.unwrap();
        insert_item(&mut session, 1).await;
        session.rollback_to(&sp).await.unwrap();
        insert_item(&mut session, 2).await;
        session.rollback_to(&sp).await.unwrap();

        assert!(item_ids(&mut session).await.is_empty());
    }

    #[tokio::test]
    async fn rollback_to_released_savepoint_fails() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        insert_item(&mut session, 1).await;
        let first = session.create_savepoint("first").await.unwrap();
        insert_item(&mut session, 2).await;

        session.release_savepoint(&first).await.unwrap();
        let err = session.rollback_to(&first).await.unwrap_err();
        assert!(matches!(err, StorageError::SavepointInvalidated { ref name } if name == "first"));

        // Releasing does not touch data.
        assert_eq!(item_ids(&mut session).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn savepoints_after_rollback_target_are_invalidated() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        let second = session.create_savepoint("second").await.unwrap();
        let third = session.create_savepoint("third").await.unwrap();
        session.rollback_to(&second).await.unwrap();

        assert!(matches!(
            session.rollback_to(&third).await,
            Err(StorageError::SavepointInvalidated { .. })
        ));
        assert!(matches!(
            session.release_savepoint(&third).await,
            Err(StorageError::SavepointInvalidated { .. })
        ));
    }

    #[tokio::test]
    async fn commit_invalidates_savepoints() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        let sp = session.create_savepoint("first").await.unwrap();
        session.commit().await.unwrap();

        let err = session.rollback_to(&sp).await.unwrap_err();
        assert!(matches!(err, StorageError::SavepointInvalidated { .. }));
    }

    #[tokio::test]
    async fn reused_name_does_not_revive_old_handle() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        let old = session.create_savepoint("first").await.unwrap();
        session.release_savepoint(&old).await.unwrap();
        let new = session.create_savepoint("first").await.unwrap();

        assert!(session.rollback_to(&old).await.is_err());
        assert!(session.rollback_to(&new).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_live_name_is_rejected() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        session.create_savepoint("first").await.unwrap();

        let err = session.create_savepoint("first").await.unwrap_err();
        assert!(matches!(err, StorageError::DuplicateSavepoint { .. }));
        assert_eq!(session.savepoints().count(), 1);
    }

    #[tokio::test]
    async fn malformed_name_is_rejected() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();

        let err = session.create_savepoint("x\"; DROP TABLE clients; --").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidSavepointName { .. }));
    }

    #[tokio::test]
    async fn savepoint_requires_manual_mode() {
        let mut session = seeded_session().await;
        let err = session.create_savepoint("first").await.unwrap_err();
        assert!(matches!(err, StorageError::AutoCommitEnabled { .. }));
    }

    #[tokio::test]
    async fn savepoint_after_commit_opens_new_transaction() {
        let mut session = seeded_session().await;
        session.begin_manual_transaction().await.unwrap();
        session.commit().await.unwrap();

        let sp = session.create_savepoint("first").await.unwrap();
        assert_eq!(session.state(), TransactionState::Open);
        insert_item(&mut session, 9).await;
        session.rollback_to(&sp).await.unwrap();
        session.commit().await.unwrap();

        assert!(item_ids(&mut session).await.is_empty());
    }
}

mod schema_setup {
    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let mut session = seeded_session().await;
        schema::bootstrap(session.connection().await.unwrap())
            .await
            .unwrap();

        let account: i64 = sqlx::query_scalar("SELECT account FROM clients WHERE id = 1")
            .fetch_one(session.connection().await.unwrap())
            .await
            .unwrap();
        assert_eq!(account, 675);
    }

    #[tokio::test]
    async fn reseeding_resets_client_and_items() {
        let mut session = seeded_session().await;
        insert_item(&mut session, 5).await;

        let seed = ClientSeed::new(ClientId::new(1), "alice", 1000);
        schema::seed_client(session.connection().await.unwrap(), &seed)
            .await
            .unwrap();

        let (login, account): (String, i64) =
            sqlx::query_as("SELECT login, account FROM clients WHERE id = 1")
                .fetch_one(session.connection().await.unwrap())
                .await
                .unwrap();
        assert_eq!(login, "alice");
        assert_eq!(account, 1000);
        assert!(item_ids(&mut session).await.is_empty());
    }

    #[tokio::test]
    async fn order_item_for_unknown_client_is_rejected() {
        let mut session = seeded_session().await;
        let result = sqlx::query(
            "INSERT INTO order_items (client_id, order_id, item_id) VALUES (99, 1, 5)",
        )
        .execute(session.connection().await.unwrap())
        .await;
        assert!(result.is_err());
    }
}
