//! SQLite-backed named stores.
//!
//! Every store is a row in `stores`; its entries live in `entries` and are
//! removed by cascade when the store is deleted. Request URLs are hashed
//! into `request_key`, and each body is stored with its SHA-256 digest so a
//! damaged row reads as a miss instead of serving corrupt bytes.

use super::connection::CacheDb;
use super::hash::{compute_body_digest, compute_request_key};
use super::store::{CacheStorage, CacheStore};
use crate::Error;
use crate::http::{Request, Response};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Store registry over a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    db: CacheDb,
}

impl SqliteStorage {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }
}

/// Handle to one named store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: CacheDb,
    name: String,
}

#[async_trait::async_trait]
impl CacheStorage for SqliteStorage {
    type Store = SqliteStore;

    async fn open(&self, name: &str) -> Result<SqliteStore, Error> {
        let store = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(SqliteStore { db: self.db.clone(), name: name.to_string() })
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl CacheStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        let store = self.name.clone();
        let key = compute_request_key(&request.url);
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(String, u16, String, Vec<u8>, String)>, Error> {
                let result = conn.query_row(
                    "SELECT url, status, headers_json, body, body_sha256
                     FROM entries WHERE store = ?1 AND request_key = ?2",
                    params![store, key],
                    |row| {
                        let url: String = row.get(0)?;
                        let status: u16 = row.get(1)?;
                        let headers_json: String = row.get(2)?;
                        let body: Vec<u8> = row.get(3)?;
                        let digest: String = row.get(4)?;
                        Ok((url, status, headers_json, body, digest))
                    },
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((url, status, headers_json, body, digest)) = row else {
            return Ok(None);
        };

        if compute_body_digest(&body) != digest {
            tracing::warn!(store = %self.name, url = %url, "body digest mismatch, treating as miss");
            return Ok(None);
        }

        let headers: Vec<(String, String)> = match serde_json::from_str(&headers_json) {
            Ok(headers) => headers,
            Err(e) => {
                tracing::warn!(store = %self.name, url = %url, error = %e, "corrupt headers, treating as miss");
                return Ok(None);
            }
        };

        Ok(Some(Response { url, status, headers, body: body.into() }))
    }

    async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        let store = self.name.clone();
        let key = compute_request_key(&request.url);
        let url = request.url.clone();
        let status = response.status;
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to serialize headers: {e}")))?;
        let digest = compute_body_digest(&response.body);
        let body = response.body.to_vec();
        let now = chrono::Utc::now().to_rfc3339();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)",
                    params![store],
                    |row| row.get(0),
                )?;
                if !exists {
                    return Err(Error::StoreUnavailable(format!("store {store} has been deleted")));
                }

                conn.execute(
                    "INSERT INTO entries (store, request_key, url, status, headers_json, body, body_sha256, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(store, request_key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        body_sha256 = excluded.body_sha256,
                        stored_at = excluded.stored_at",
                    params![store, key, url, status, headers_json, body, digest, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let store = self.name.clone();
        let key = compute_request_key(&request.url);
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM entries WHERE store = ?1 AND request_key = ?2", params![store, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<Request>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<Request>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE store = ?1 ORDER BY rowid")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls.into_iter().map(Request::get).collect())
            })
            .await
            .map_err(Error::from)
    }
}
