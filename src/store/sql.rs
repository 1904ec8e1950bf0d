use crate::models::NewUser;

pub const CREATE_USERS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS users (
    id UUID,
    name String,
    age UInt8,
    created_at DateTime DEFAULT now()
) ENGINE = MergeTree()
ORDER BY id";

// created_at comes from now() in the statement, not the column default, so
// tables created without a default still get server time
pub const INSERT_JSON_EACH_ROW: &str = "\
INSERT INTO users (id, name, age, created_at) \
SELECT id, name, age, now() FROM input('id UUID, name String, age UInt8') \
FORMAT JSONEachRow";

// `limit` is bound through the `param_limit` URL parameter
pub const SELECT_RECENT: &str = "\
SELECT id, name, age, created_at FROM users \
ORDER BY created_at DESC LIMIT {limit:UInt32} FORMAT JSONEachRow";

pub const SELECT_COUNT: &str = "SELECT count() AS c FROM users FORMAT JSONEachRow";

// Quote a value for a ClickHouse string literal. Single quotes are doubled;
// backslashes are doubled too since ClickHouse treats them as escapes.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for ch in raw.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}

// One multi-row `INSERT ... VALUES` for the whole batch
pub fn values_statement(rows: &[NewUser]) -> String {
    let tuples: Vec<String> = rows
        .iter()
        .map(|r| format!("('{}', '{}', {}, now())", r.id, escape_literal(&r.name), r.age))
        .collect();
    format!(
        "INSERT INTO users (id, name, age, created_at) VALUES {}",
        tuples.join(",")
    )
}

// Newline-delimited JSON body for `FORMAT JSONEachRow`
pub fn json_each_row_body(rows: &[NewUser]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for row in rows {
        body.push_str(&serde_json::to_string(row)?);
        body.push('\n');
    }
    Ok(body)
}
