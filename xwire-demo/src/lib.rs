//! Sample wiring: a payments report over a user store.
//!
//! The real providers query a SQLite database addressed by a
//! `sqlite://` URL (see [`SCHEMA`]); the fakes stand in for them under
//! the `fake_users` and `fake_payments` environments.
//!
//! ```text
//! xwire-demo --dependencies 'fake_users, fake_payments'
//! xwire-demo --dependencies fake_payments
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::OpenFlags;
use thiserror::Error;
use tracing::debug;
use xwire::{Dependencies, Entrypoint, injectable};

pub const SCHEME: &str = "sqlite://";

/// Table the real providers query.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS payments (
    user TEXT NOT NULL,
    amount INTEGER NOT NULL
);";

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("unsupported connection string '{0}', expected sqlite://<path>")]
    Scheme(String),

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Connection to an existing SQLite database.
///
/// The file is never created: a missing database is an open error.
#[derive(Debug)]
pub struct Connection {
    path: PathBuf,
    inner: Mutex<rusqlite::Connection>,
}

impl Connection {
    pub fn open(url: &str) -> Result<Self, ConnectError> {
        let path = url
            .strip_prefix(SCHEME)
            .map(Path::new)
            .ok_or_else(|| ConnectError::Scheme(url.to_string()))?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let inner =
            rusqlite::Connection::open_with_flags(path, flags).map_err(|source| ConnectError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "Opened connection");
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(inner),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Distinct users in first-seen order.
    pub fn users(&self) -> Result<Vec<String>, ConnectError> {
        let db = self.inner.lock();
        let mut statement =
            db.prepare("SELECT user FROM payments GROUP BY user ORDER BY MIN(rowid)")?;
        let users = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Sum of amounts per user.
    ///
    /// SQLite reports an integer overflow in the sum as a query error.
    pub fn payment_totals(&self) -> Result<HashMap<String, i64>, ConnectError> {
        let db = self.inner.lock();
        let mut statement = db.prepare("SELECT user, SUM(amount) FROM payments GROUP BY user")?;
        let totals = statement
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(totals)
    }
}

#[injectable]
pub fn db_string() -> String {
    format!("{SCHEME}/prod.db")
}

#[injectable]
pub fn dbcnx(db_string: &String) -> Result<Connection, ConnectError> {
    Connection::open(db_string)
}

#[injectable]
pub fn users(dbcnx: &Connection) -> Result<Vec<String>, ConnectError> {
    dbcnx.users()
}

#[injectable(name = "users", environment = "fake_users")]
pub fn fake_users() -> Vec<String> {
    vec!["u1".into(), "u2".into(), "u3".into()]
}

#[injectable]
pub fn payments(dbcnx: &Connection) -> Result<HashMap<String, i64>, ConnectError> {
    dbcnx.payment_totals()
}

#[injectable(name = "payments", environment = "fake_payments")]
pub fn fake_payments(_: u8) -> HashMap<String, i64> {
    HashMap::from([("u1".to_string(), 100), ("u2".to_string(), 200)])
}

/// Report lines for every user with recorded payments.
pub fn report(users: &[String], payments: &HashMap<String, i64>) -> Vec<String> {
    users
        .iter()
        .filter_map(|user| {
            payments
                .get(user)
                .map(|total| format!("The user {user} has {total} payments"))
        })
        .collect()
}

/// The `render(users, payments)` entry point.
pub fn render() -> Entrypoint<impl Fn(&Dependencies) -> xwire::Result<Vec<String>>> {
    Entrypoint::new(
        "render",
        ["users", "payments"],
        |deps: &Dependencies| -> xwire::Result<Vec<String>> {
            let users = deps.get::<Vec<String>>("users")?;
            let payments = deps.get::<HashMap<String, i64>>("payments")?;
            Ok(report(&users, &payments))
        },
    )
}
