// WebAuthn Vault — Collection engine
//
// A small document layer over the SQLite tables created in `db.rs`. Records
// are stored as JSON bodies; the primary key lives in the `id` column and is
// spliced back into the body on every read, so the column is the single source
// of truth for identity.

use std::marker::PhantomData;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::StoreError;

/// The named collections of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    RelyingParties,
    Users,
    Credentials,
    Sessions,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::RelyingParties => "rps",
            Collection::Users => "users",
            Collection::Credentials => "credentials",
            Collection::Sessions => "sessions",
        }
    }
}

/// Primary key of a record. `Key::Int(0)` means "not assigned yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(id) => Value::Integer(id),
            Key::Text(id) => Value::Text(id),
        }
    }
}

/// A type that can be persisted in one of the collections.
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn key(&self) -> Key;

    /// Called after an insert that had no id; collections with text keys never see it.
    fn assign_id(&mut self, _id: i64) {}
}

/// Equality predicate on a record field.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: &'static str,
    value: Value,
}

/// Build an equality predicate: `field == value`.
pub fn eq(field: &'static str, value: impl Into<Value>) -> Predicate {
    Predicate {
        field,
        value: value.into(),
    }
}

/// Result ordering by primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    /// Most recently inserted first.
    Reverse,
}

impl Order {
    fn sql(self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Reverse => "DESC",
        }
    }
}

fn column(field: &str) -> String {
    if field == "id" {
        "id".to_string()
    } else {
        format!("json_extract(body, '$.{}')", field)
    }
}

/// Typed view of one collection on a borrowed connection (or transaction).
pub struct Bucket<'c, R> {
    conn: &'c Connection,
    _record: PhantomData<R>,
}

impl<'c, R: Record> Bucket<'c, R> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    fn table(&self) -> &'static str {
        R::COLLECTION.name()
    }

    /// Upsert by primary key. A record whose numeric id is unset gets the next
    /// id from the table's sequence and has it written back.
    pub fn save(&self, record: &mut R) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)?;

        match record.key() {
            Key::Int(0) => {
                self.conn.execute_batch("SAVEPOINT vault_insert")?;
                match self.insert_new(record, &body) {
                    Ok(()) => self.conn.execute_batch("RELEASE vault_insert")?,
                    Err(e) => {
                        self.conn
                            .execute_batch("ROLLBACK TO vault_insert; RELEASE vault_insert")?;
                        return Err(e);
                    }
                }
            }
            key => {
                self.conn
                    .execute(
                        &format!(
                            "INSERT INTO {} (id, body) VALUES (?1, ?2)
                             ON CONFLICT(id) DO UPDATE SET body = excluded.body",
                            self.table()
                        ),
                        params![Value::from(key), body],
                    )
                    .map_err(|e| self.write_error(e))?;
            }
        }

        Ok(())
    }

    fn insert_new(&self, record: &mut R, body: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                &format!("INSERT INTO {} (body) VALUES (?1)", self.table()),
                params![body],
            )
            .map_err(|e| self.write_error(e))?;
        let id = self.conn.last_insert_rowid();
        record.assign_id(id);

        // Back-references to the new id live inside the body too.
        self.conn.execute(
            &format!("UPDATE {} SET body = ?1 WHERE id = ?2", self.table()),
            params![serde_json::to_string(record)?, id],
        )?;
        Ok(())
    }

    /// First record whose `field` equals `value`.
    pub fn get_one(&self, field: &'static str, value: impl Into<Value>) -> Result<R, StoreError> {
        self.first(&[eq(field, value)], Order::Ascending)
    }

    /// Every record in the collection, in insertion order.
    pub fn all(&self) -> Result<Vec<R>, StoreError> {
        self.select(&[], Order::Ascending)
    }

    /// Every record whose `field` equals `value`.
    pub fn find(&self, field: &'static str, value: impl Into<Value>) -> Result<Vec<R>, StoreError> {
        self.select(&[eq(field, value)], Order::Ascending)
    }

    /// Every record matching all predicates.
    pub fn select(&self, predicates: &[Predicate], order: Order) -> Result<Vec<R>, StoreError> {
        let sql = self.query(predicates, order, None);
        let mut stmt = self.conn.prepare(&sql)?;
        let bodies = stmt
            .query_map(params_from_iter(predicates.iter().map(|p| &p.value)), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(StoreError::from))
            .collect()
    }

    /// First record matching all predicates, or `NotFound`.
    pub fn first(&self, predicates: &[Predicate], order: Order) -> Result<R, StoreError> {
        let sql = self.query(predicates, order, Some(1));
        let body: Option<String> = self
            .conn
            .query_row(
                &sql,
                params_from_iter(predicates.iter().map(|p| &p.value)),
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Err(StoreError::NotFound(self.describe(predicates))),
        }
    }

    /// Delete by primary key. Returns true if a row was removed.
    pub fn delete_by_key(&self, record: &R) -> Result<bool, StoreError> {
        let affected = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", self.table()),
            params![Value::from(record.key())],
        )?;
        Ok(affected > 0)
    }

    fn query(&self, predicates: &[Predicate], order: Order, limit: Option<usize>) -> String {
        let mut sql = format!("SELECT json_set(body, '$.id', id) FROM {}", self.table());

        if !predicates.is_empty() {
            let clauses: Vec<String> = predicates
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{} = ?{}", column(p.field), i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        sql.push_str(&format!(" ORDER BY id {}", order.sql()));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }

    fn describe(&self, predicates: &[Predicate]) -> String {
        let fields: Vec<String> = predicates
            .iter()
            .map(|p| format!("{}={}", p.field, display_value(&p.value)))
            .collect();
        format!("{} [{}]", self.table(), fields.join(", "))
    }

    fn write_error(&self, e: rusqlite::Error) -> StoreError {
        match e.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => {
                StoreError::AlreadyExists(format!("{}: {}", self.table(), e))
            }
            _ => StoreError::Database(e),
        }
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
