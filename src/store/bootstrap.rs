// WebAuthn Vault — Store bootstrap
//
// Seeds the default relying party and the admin user when they are missing.
// Records that already exist are left as they are, apart from the seed's user
// ids being added to the RP's user set, so running bootstrap on every start
// keeps operator edits and user associations.

use super::db::Database;
use super::engine::Bucket;
use super::models::{RelyingParty, User};
use super::relying_party::DEFAULT_RP_ID;
use super::StoreError;

/// Id reserved for the seeded admin user.
pub const ADMIN_USER_ID: i64 = 1;

/// What bootstrap writes.
#[derive(Debug, Clone)]
pub struct Seed {
    pub rp: RelyingParty,
    pub admin: User,
}

impl Default for Seed {
    fn default() -> Self {
        let admin = User {
            id: ADMIN_USER_ID,
            name: "admin".to_string(),
            display_name: "Mr. Admin Face".to_string(),
            icon: None,
        };

        let mut rp = RelyingParty::new(DEFAULT_RP_ID, "Acme, Inc");
        rp.icon = Some("lol.catpics.png".to_string());
        rp.users.insert(admin.id);

        Self { rp, admin }
    }
}

/// Write whichever seed records are missing, in one transaction.
/// Re-running leaves exactly one copy of each.
pub fn bootstrap(db: &Database, seed: &Seed) -> Result<(), StoreError> {
    db.immediate(|tx| {
        seed_admin(&Bucket::new(tx), &seed.admin)?;
        seed_rp(&Bucket::new(tx), &seed.rp)
    })?;

    tracing::info!(
        rp_id = %seed.rp.id,
        admin = %seed.admin.name,
        "Store bootstrapped"
    );
    Ok(())
}

fn seed_admin(users: &Bucket<'_, User>, admin: &User) -> Result<(), StoreError> {
    match users.get_one("name", admin.name.clone()) {
        Ok(existing) if existing.id == admin.id => return Ok(()),
        Ok(_) => return Err(StoreError::UsernameTaken(admin.name.clone())),
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    match users.get_one("id", admin.id) {
        Ok(existing) => Err(StoreError::AlreadyExists(format!(
            "user {} is '{}', not the seeded '{}'",
            admin.id, existing.name, admin.name
        ))),
        Err(StoreError::NotFound(_)) => users.save(&mut admin.clone()).map_err(|e| match e {
            StoreError::AlreadyExists(_) => StoreError::UsernameTaken(admin.name.clone()),
            other => other,
        }),
        Err(e) => Err(e),
    }
}

fn seed_rp(rps: &Bucket<'_, RelyingParty>, seed: &RelyingParty) -> Result<(), StoreError> {
    let mut rp = match rps.get_one("id", seed.id.clone()) {
        Ok(existing) => existing,
        Err(StoreError::NotFound(_)) => return rps.save(&mut seed.clone()),
        Err(e) => return Err(e),
    };

    let before = rp.users.len();
    rp.users.extend(seed.users.iter().copied());
    if rp.users.len() != before {
        rps.save(&mut rp)?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::relying_party::{RelyingPartyRegistry, SqliteRelyingPartyRegistry};
    use crate::store::user::{SqliteUserRegistry, UserRegistry};

    #[test]
    fn test_bootstrap_seeds_default_rp_and_admin() {
        let db = Database::open_in_memory().unwrap();
        bootstrap(&db, &Seed::default()).unwrap();

        let rp = SqliteRelyingPartyRegistry::new(&db).get_default().unwrap();
        assert_eq!(rp.id, "localhost");
        assert_eq!(rp.display_name, "Acme, Inc");
        assert!(rp.users.contains(&ADMIN_USER_ID));

        let admin = SqliteUserRegistry::new(&db).get_by_username("admin").unwrap();
        assert_eq!(admin.id, ADMIN_USER_ID);
        assert_eq!(admin.display_name, "Mr. Admin Face");
    }

    #[test]
    fn test_bootstrap_twice_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        bootstrap(&db, &Seed::default()).unwrap();
        bootstrap(&db, &Seed::default()).unwrap();

        let rps = SqliteRelyingPartyRegistry::new(&db).list().unwrap();
        assert_eq!(rps.len(), 1);
        assert_eq!(rps[0].id, "localhost");

        let users = SqliteUserRegistry::new(&db).list().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "admin");
    }

    #[test]
    fn test_users_registered_after_bootstrap_get_later_ids() {
        let db = Database::open_in_memory().unwrap();
        bootstrap(&db, &Seed::default()).unwrap();

        let id = SqliteUserRegistry::new(&db)
            .put(&mut User::new("alice", "Alice"))
            .unwrap();
        assert!(id > ADMIN_USER_ID);
    }

    #[test]
    fn test_bootstrap_fails_when_admin_name_is_taken() {
        let db = Database::open_in_memory().unwrap();
        let users = SqliteUserRegistry::new(&db);
        let mut squatter = User::new("placeholder", "Placeholder");
        users.put(&mut squatter).unwrap();
        users.put(&mut User::new("admin", "Not The Admin")).unwrap();

        let err = bootstrap(&db, &Seed::default()).unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(ref n) if n == "admin"));
    }

    #[test]
    fn test_rebootstrap_keeps_user_associations_and_edits() {
        let db = Database::open_in_memory().unwrap();
        bootstrap(&db, &Seed::default()).unwrap();

        let users = SqliteUserRegistry::new(&db);
        let rps = SqliteRelyingPartyRegistry::new(&db);
        let mut alice = User::new("alice", "Alice");
        users.put(&mut alice).unwrap();
        let mut rp = rps.add_user("localhost", alice.id).unwrap();
        rp.display_name = "Acme Renamed".to_string();
        rps.put(&rp).unwrap();

        bootstrap(&db, &Seed::default()).unwrap();

        let for_alice = rps.for_user(&alice).unwrap();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].display_name, "Acme Renamed");
        assert!(for_alice[0].users.contains(&ADMIN_USER_ID));
    }

    #[test]
    fn test_rebootstrap_restores_admin_association() {
        let db = Database::open_in_memory().unwrap();
        let rps = SqliteRelyingPartyRegistry::new(&db);
        rps.put(&RelyingParty::new("localhost", "Existing")).unwrap();

        bootstrap(&db, &Seed::default()).unwrap();

        let rp = rps.get_default().unwrap();
        assert_eq!(rp.display_name, "Existing");
        assert!(rp.users.contains(&ADMIN_USER_ID));
    }

    #[test]
    fn test_bootstrap_does_not_overwrite_user_holding_admin_id() {
        let db = Database::open_in_memory().unwrap();
        let users = SqliteUserRegistry::new(&db);
        users.put(&mut User::new("placeholder", "Placeholder")).unwrap();

        let err = bootstrap(&db, &Seed::default()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(users.get_by_id(ADMIN_USER_ID).unwrap().name, "placeholder");
        assert!(SqliteRelyingPartyRegistry::new(&db).list().unwrap().is_empty());
    }
}
