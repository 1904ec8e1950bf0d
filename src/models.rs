use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// POST /users body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CreateUserRequest {
    pub name: String,
    pub age: u8,
}

// A row about to be inserted; created_at is left to the server
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
}

impl NewUser {
    pub fn new(name: String, age: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            age,
        }
    }
}

// A persisted row as read back from ClickHouse
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub age: u8,
    #[serde(with = "clickhouse_datetime")]
    pub created_at: NaiveDateTime,
}

// GET /users/count response
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCount {
    pub user_count: u64,
}

// Plain `{message}` acknowledgement
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

// Row of `SELECT count() AS c`; ClickHouse quotes 64-bit ints by default
#[derive(Deserialize, Debug)]
pub struct CountRow {
    #[serde(deserialize_with = "u64_from_str_or_number")]
    pub c: u64,
}

fn u64_from_str_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

// ClickHouse DateTime text form: `2024-05-01 13:45:00`
pub mod clickhouse_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
