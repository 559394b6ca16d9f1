//! Integration tests for accounts and login sessions.

use taskdeck::auth;
use taskdeck::db::Database;

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

mod user_tests {
    use super::*;

    #[test]
    fn usernames_are_stored_lowercased() {
        let db = setup_db();

        let user = db.create_user("Alice.B", "hash").unwrap();
        assert_eq!(user.username, "alice.b");
    }

    #[test]
    fn duplicate_usernames_are_rejected_case_insensitively() {
        let db = setup_db();

        db.create_user("alice", "hash").unwrap();
        assert!(db.create_user("ALICE", "other-hash").is_err());
    }

    #[test]
    fn lookup_by_username_ignores_case() {
        let db = setup_db();

        let created = db.create_user("alice", "hash").unwrap();
        let found = db.get_user_by_username("AlIcE").unwrap().unwrap();
        assert_eq!(found.id, created.id);
    }

    #[test]
    fn unknown_user_resolves_to_none() {
        let db = setup_db();
        assert!(db.get_user_by_username("nobody").unwrap().is_none());
        assert!(db.get_user("no-such-id").unwrap().is_none());
    }
}

mod session_tests {
    use super::*;

    #[test]
    fn session_round_trip_resolves_the_user() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let token = auth::generate_token();
        db.create_session(&user.id, &auth::token_hash(&token), 24)
            .unwrap();

        let resolved = db
            .resolve_session(&auth::token_hash(&token))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.username, "alice");
    }

    #[test]
    fn wrong_token_resolves_to_none() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let token = auth::generate_token();
        db.create_session(&user.id, &auth::token_hash(&token), 24)
            .unwrap();

        let other = auth::generate_token();
        assert!(
            db.resolve_session(&auth::token_hash(&other))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn expired_session_does_not_resolve() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let token = auth::generate_token();
        // Zero TTL: expires immediately.
        db.create_session(&user.id, &auth::token_hash(&token), 0)
            .unwrap();

        assert!(
            db.resolve_session(&auth::token_hash(&token))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn logout_invalidates_the_session() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let token = auth::generate_token();
        let hash = auth::token_hash(&token);
        db.create_session(&user.id, &hash, 24).unwrap();

        db.delete_session(&hash).unwrap();
        assert!(db.resolve_session(&hash).unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_expired_sessions() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let live = auth::token_hash(&auth::generate_token());
        let dead = auth::token_hash(&auth::generate_token());
        db.create_session(&user.id, &live, 24).unwrap();
        db.create_session(&user.id, &dead, 0).unwrap();

        let purged = db.purge_expired_sessions().unwrap();
        assert_eq!(purged, 1);
        assert!(db.resolve_session(&live).unwrap().is_some());
    }

    #[test]
    fn sessions_vanish_with_their_user() {
        let db = setup_db();
        let user = db.create_user("alice", "hash").unwrap();

        let hash = auth::token_hash(&auth::generate_token());
        db.create_session(&user.id, &hash, 24).unwrap();

        // Foreign keys cascade when a user row is removed outright.
        db.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", [&user.id])?;
            Ok(())
        })
        .unwrap();

        assert!(db.resolve_session(&hash).unwrap().is_none());
    }
}

mod credential_tests {
    use super::*;

    #[test]
    fn stored_digest_verifies_the_original_password() {
        let db = setup_db();
        let digest = auth::hash_password("a strong passphrase");
        db.create_user("alice", &digest).unwrap();

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert!(auth::verify_password(
            "a strong passphrase",
            &user.password_hash
        ));
        assert!(!auth::verify_password("wrong guess", &user.password_hash));
    }
}
