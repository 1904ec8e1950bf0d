use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::UserStore;
use super::sql;
use crate::config::InsertFormat;
use crate::error::StorageError;
use crate::models::{CountRow, NewUser, User};

// Connection settings for the ClickHouse HTTP interface
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub timeout: Duration,
    pub insert_format: InsertFormat,
}

pub struct ClickHouseStore {
    client: reqwest::Client, // shared by every request
    base: Url,
    user: String,
    password: String,
    database: String,
    insert_format: InsertFormat,
}

impl ClickHouseStore {
    pub fn new(config: ClickHouseConfig) -> Result<Self, StorageError> {
        let base = Url::parse(&config.url)
            .map_err(|e| StorageError::Config(format!("{}: {}", config.url, e)))?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base,
            user: config.user,
            password: config.password,
            database: config.database,
            insert_format: config.insert_format,
        })
    }

    // Endpoint URL with the database and any extra parameters attached
    fn endpoint(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("database", &self.database);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    // POST one statement; the response body is returned on success
    async fn execute(&self, url: Url, body: String) -> Result<String, StorageError> {
        let res = self
            .client
            .post(url)
            .header("X-ClickHouse-User", &self.user)
            .header("X-ClickHouse-Key", &self.password)
            .body(body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl UserStore for ClickHouseStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.execute(self.endpoint(&[]), sql::CREATE_USERS_TABLE.to_string())
            .await
            .map(|_| ())
    }

    async fn insert_users(&self, rows: &[NewUser]) -> Result<(), StorageError> {
        if rows.is_empty() {
            return Ok(());
        }

        let (url, body) = match self.insert_format {
            InsertFormat::JsonEachRow => {
                let body = sql::json_each_row_body(rows)
                    .map_err(|e| StorageError::Decode(e.to_string()))?;
                (self.endpoint(&[("query", sql::INSERT_JSON_EACH_ROW)]), body)
            }
            InsertFormat::Values => (self.endpoint(&[]), sql::values_statement(rows)),
        };
        debug!("[ClickHouse] insert {} rows ({} bytes)", rows.len(), body.len());

        self.execute(url, body).await.map(|_| ())
    }

    async fn recent_users(&self, limit: u32) -> Result<Vec<User>, StorageError> {
        let limit = limit.to_string();
        let url = self.endpoint(&[("param_limit", limit.as_str())]);
        let text = self.execute(url, sql::SELECT_RECENT.to_string()).await?;
        parse_json_each_row(&text)
    }

    async fn count_users(&self) -> Result<Option<u64>, StorageError> {
        let text = self
            .execute(self.endpoint(&[]), sql::SELECT_COUNT.to_string())
            .await?;
        let rows: Vec<CountRow> = parse_json_each_row(&text)?;
        Ok(rows.first().map(|r| r.c))
    }
}

pub fn parse_json_each_row<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, StorageError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_str(line).map_err(|e| StorageError::Decode(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ClickHouseConfig {
        ClickHouseConfig {
            url: url.to_string(),
            user: "default".to_string(),
            password: String::new(),
            database: "analytics".to_string(),
            timeout: Duration::from_secs(1),
            insert_format: InsertFormat::JsonEachRow,
        }
    }

    #[test]
    fn bad_url_is_a_config_error() {
        let err = ClickHouseStore::new(config("not a url")).err().unwrap();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn endpoint_binds_parameters_in_the_query_string() {
        let store = ClickHouseStore::new(config("http://localhost:8123")).unwrap();
        let url = store.endpoint(&[("param_limit", "100")]);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("database".to_string(), "analytics".to_string()),
                ("param_limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn json_each_row_output_parses() {
        let text = "{\"c\":\"3\"}\n\n";
        let rows: Vec<CountRow> = parse_json_each_row(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].c, 3);

        let empty: Vec<CountRow> = parse_json_each_row("").unwrap();
        assert!(empty.is_empty());

        let bad = parse_json_each_row::<CountRow>("Code: 60. DB::Exception");
        assert!(matches!(bad, Err(StorageError::Decode(_))));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let store = ClickHouseStore::new(config("http://127.0.0.1:9")).unwrap();
        let err = store.count_users().await.unwrap_err();
        assert!(matches!(err, StorageError::Transport(_)));
    }
}
