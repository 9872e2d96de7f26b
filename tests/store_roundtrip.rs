use chrono::Utc;
use p256::elliptic_curve::sec1::ToEncodedPoint;

use webauthn_vault::store::{
    Credential, CredentialStore, Database, PublicKey, RelyingPartyRegistry, SessionStore,
    SqliteCredentialStore, SqliteRelyingPartyRegistry, SqliteSessionStore, SqliteUserRegistry,
    StoreError, User, UserRegistry,
};
use webauthn_vault::{Config, VaultError};

fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::from_lookup(|_| None).unwrap();
    config.db_path = dir.join("data").join("webauthn.db");
    config
}

fn make_credential(user_id: i64, rp_id: &str, credential_id: &str) -> Credential {
    let point = p256::SecretKey::from_slice(&[0x11u8; 32])
        .unwrap()
        .public_key()
        .to_encoded_point(false);

    Credential {
        id: 0,
        created_at: Utc::now(),
        counter: vec![0, 0, 0, 1],
        relying_party_id: rp_id.to_string(),
        user_id,
        credential_type: "public-key".to_string(),
        format: "none".to_string(),
        flags: vec![0x45],
        credential_id: credential_id.to_string(),
        public_key: PublicKey {
            key_type: 2,
            algorithm: -7,
            x: point.x().unwrap().to_vec(),
            y: point.y().unwrap().to_vec(),
            curve: 1,
            credential: 0,
        },
    }
}

#[test]
fn test_init_twice_seeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    drop(webauthn_vault::init(&config).unwrap());
    let db = webauthn_vault::init(&config).unwrap();

    let rps = SqliteRelyingPartyRegistry::new(&db).list().unwrap();
    assert_eq!(rps.len(), 1);
    assert_eq!(rps[0].id, "localhost");

    let users = SqliteUserRegistry::new(&db).list().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "admin");
}

#[test]
fn test_reinit_keeps_user_associations() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let alice = {
        let db = webauthn_vault::init(&config).unwrap();
        let mut alice = User::new("alice", "Alice");
        SqliteUserRegistry::new(&db).put(&mut alice).unwrap();
        SqliteRelyingPartyRegistry::new(&db)
            .add_user("localhost", alice.id)
            .unwrap();
        alice
    };

    let db = webauthn_vault::init(&config).unwrap();
    let rps = SqliteRelyingPartyRegistry::new(&db).for_user(&alice).unwrap();
    assert_eq!(rps.len(), 1);
    assert_eq!(rps[0].id, "localhost");
    assert_eq!(SqliteUserRegistry::new(&db).list().unwrap().len(), 2);
}

#[test]
fn test_init_with_unreadable_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    // A directory cannot be opened as a database file.
    config.db_path = dir.path().to_path_buf();

    assert!(matches!(
        webauthn_vault::init(&config),
        Err(VaultError::FatalInit(_))
    ));
}

#[test]
fn test_duplicate_registration_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let db = webauthn_vault::init(&config_in(dir.path())).unwrap();

    let admin = SqliteUserRegistry::new(&db).get_by_id(1).unwrap();
    let rp = SqliteRelyingPartyRegistry::new(&db).get_default().unwrap();
    let store = SqliteCredentialStore::new(&db);

    store
        .create(&mut make_credential(admin.id, &rp.id, "abc"))
        .unwrap();
    let err = store
        .create(&mut make_credential(admin.id, &rp.id, "xyz"))
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));

    let all = store.get_all_for_user(&admin).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].credential_id, "abc");
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());

    let (credential, session_id) = {
        let db = webauthn_vault::init(&config).unwrap();
        let admin = SqliteUserRegistry::new(&db).get_by_username("admin").unwrap();
        let rp = SqliteRelyingPartyRegistry::new(&db).get_default().unwrap();

        let mut cred = make_credential(admin.id, &rp.id, "abc");
        SqliteCredentialStore::new(&db).create(&mut cred).unwrap();
        let session = SqliteSessionStore::new(&db)
            .create_session(&admin, &rp, "reg")
            .unwrap();
        (cred, session.id)
    };

    let db = Database::open(&config.db_path, None).unwrap();
    let admin = SqliteUserRegistry::new(&db).get_by_username("admin").unwrap();
    let store = SqliteCredentialStore::new(&db);

    let loaded = store.get_for_user(&admin, "abc").unwrap();
    assert_eq!(loaded, credential);
    assert_eq!(
        store.public_key_for(&loaded).unwrap(),
        p256::SecretKey::from_slice(&[0x11u8; 32]).unwrap().public_key()
    );

    let session = SqliteSessionStore::new(&db).get_by_id(session_id).unwrap();
    assert_eq!(session.challenge.len(), 16);

    // Ids keep increasing after a reopen.
    let rp = SqliteRelyingPartyRegistry::new(&db).get_default().unwrap();
    let next = SqliteSessionStore::new(&db)
        .create_session(&admin, &rp, "att")
        .unwrap();
    assert!(next.id > session_id);
}
