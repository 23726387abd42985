//! Catalog backed by `SHOW CREATE TABLE`.
//!
//! The statement text is the only source of truth here: primary key,
//! foreign keys and integer columns are all recovered from it with regular
//! expressions. Parsed tables are cached for the lifetime of the catalog.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use sqlx::{MySqlPool, Row};
use tokio::sync::RwLock;
use tracing::debug;

use crate::dialect::{MysqlDialect, WidenDialect};
use crate::error::{Result, WidenError};
use crate::schema::{
    DefaultValue, ForeignKeyAction, ForeignKeyConstraint, IntegerColumn, IntegerType, TableName,
    TableSnapshot,
};

use super::SchemaCatalog;

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"CONSTRAINT `([^`]+)` FOREIGN KEY \(`([^`]+)`\) REFERENCES (?:`([^`]+)`\.)?`([^`]+)` \(`([^`]+)`\)((?: ON (?:DELETE|UPDATE) (?:CASCADE|SET NULL|SET DEFAULT|NO ACTION|RESTRICT))*)",
    )
    .expect("Invalid foreign key regex")
});

static REFERENTIAL_ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ON (DELETE|UPDATE) (CASCADE|SET NULL|SET DEFAULT|NO ACTION|RESTRICT)")
        .expect("Invalid referential action regex")
});

static PRIMARY_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PRIMARY KEY \(([^)]+)\)").expect("Invalid primary key regex")
});

static COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s+`([^`]+)` ([A-Za-z]+(?:\(\d+\))?)((?: (?:unsigned|signed|zerofill))*)(.*?),?\s*$")
        .expect("Invalid column regex")
});

static DEFAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DEFAULT (?:'((?:[^']|'')*)'|(NULL)\b|(\(.*\)|[^\s,]+))")
        .expect("Invalid default regex")
});

/// Parses a `CREATE TABLE` statement into a table snapshot.
///
/// Only single-column foreign keys are recovered. Actions left out of the
/// statement are reported as `None`.
#[must_use]
pub fn parse_create_table(table: &TableName, create_sql: &str) -> TableSnapshot {
    TableSnapshot {
        name: table.clone(),
        primary_key: parse_primary_key(create_sql),
        foreign_keys: parse_foreign_keys(table, create_sql),
        integer_columns: parse_integer_columns(table, create_sql),
    }
}

fn parse_primary_key(create_sql: &str) -> Vec<String> {
    PRIMARY_KEY_RE
        .captures(create_sql)
        .map(|caps| {
            caps[1]
                .split(',')
                .map(|c| c.trim().trim_matches('`').to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn parse_foreign_keys(table: &TableName, create_sql: &str) -> Vec<ForeignKeyConstraint> {
    FOREIGN_KEY_RE
        .captures_iter(create_sql)
        .map(|caps| {
            let referenced_table = match caps.get(3) {
                Some(schema) => TableName::qualified(schema.as_str(), &caps[4]),
                None => table.sibling(&caps[4]),
            };

            let mut fk = ForeignKeyConstraint {
                name: caps[1].to_string(),
                table: table.clone(),
                column: caps[2].to_string(),
                referenced_table,
                referenced_column: caps[5].to_string(),
                on_delete: None,
                on_update: None,
            };

            for action in REFERENTIAL_ACTION_RE.captures_iter(&caps[6]) {
                let parsed = ForeignKeyAction::parse(&action[2]);
                match &action[1] {
                    "DELETE" => fk.on_delete = parsed,
                    _ => fk.on_update = parsed,
                }
            }

            fk
        })
        .collect()
}

fn parse_integer_columns(table: &TableName, create_sql: &str) -> Vec<IntegerColumn> {
    COLUMN_RE
        .captures_iter(create_sql)
        .filter_map(|caps| {
            let integer_type = IntegerType::parse(&caps[2])?;
            let modifiers = caps[3].to_ascii_lowercase();
            // Comments may contain anything, including "NOT NULL".
            let attributes = caps[4]
                .split(" COMMENT '")
                .next()
                .unwrap_or_default();

            Some(IntegerColumn {
                table: table.clone(),
                name: caps[1].to_string(),
                integer_type,
                unsigned: modifiers.contains("unsigned"),
                nullable: !attributes.contains("NOT NULL"),
                default: parse_default(attributes),
                auto_increment: attributes.contains("AUTO_INCREMENT"),
            })
        })
        .collect()
}

fn parse_default(attributes: &str) -> DefaultValue {
    let Some(caps) = DEFAULT_RE.captures(attributes) else {
        return DefaultValue::None;
    };

    if let Some(literal) = caps.get(1) {
        DefaultValue::Literal(literal.as_str().replace("''", "'"))
    } else if caps.get(2).is_some() {
        DefaultValue::Null
    } else {
        DefaultValue::Expression(caps[3].to_string())
    }
}

/// MySQL catalog that parses `SHOW CREATE TABLE` output.
pub struct MysqlCreateTableCatalog {
    pool: MySqlPool,
    dialect: MysqlDialect,
    tables: RwLock<HashMap<TableName, TableSnapshot>>,
}

impl MysqlCreateTableCatalog {
    /// Creates a catalog over `pool`.
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            dialect: MysqlDialect::new(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the parsed table, fetching its create statement on first use.
    async fn table(&self, table: &TableName) -> Result<TableSnapshot> {
        if let Some(parsed) = self.tables.read().await.get(table) {
            return Ok(parsed.clone());
        }

        let sql = format!("SHOW CREATE TABLE {}", self.dialect.quote_table(table));
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| WidenError::catalog(sql.as_str(), e))?;
        let create_sql: String = row
            .try_get(1)
            .map_err(|e| WidenError::catalog(sql.as_str(), e))?;

        debug!(table = %table, "Parsing create statement");
        let parsed = parse_create_table(table, &create_sql);
        self.tables
            .write()
            .await
            .insert(table.clone(), parsed.clone());

        Ok(parsed)
    }
}

#[async_trait]
impl SchemaCatalog for MysqlCreateTableCatalog {
    fn name(&self) -> &'static str {
        "create-table"
    }

    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableName>> {
        let sql = match schema {
            Some(schema) => format!(
                "SHOW FULL TABLES FROM {} WHERE Table_type = 'BASE TABLE'",
                self.dialect.quote_identifier(schema)
            ),
            None => "SHOW FULL TABLES WHERE Table_type = 'BASE TABLE'".to_string(),
        };

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| WidenError::catalog(sql.as_str(), e))?;

        rows.iter()
            .map(|row| {
                let name: String = row
                    .try_get(0)
                    .map_err(|e| WidenError::catalog(sql.as_str(), e))?;
                Ok(match schema {
                    Some(schema) => TableName::qualified(schema, name),
                    None => TableName::new(name),
                })
            })
            .collect()
    }

    async fn primary_key_columns(&self, table: &TableName) -> Result<Vec<String>> {
        Ok(self.table(table).await?.primary_key)
    }

    async fn foreign_key_constraints(&self, table: &TableName) -> Result<Vec<ForeignKeyConstraint>> {
        Ok(self.table(table).await?.foreign_keys)
    }

    async fn integer_columns(&self, table: &TableName) -> Result<Vec<IntegerColumn>> {
        Ok(self.table(table).await?.integer_columns)
    }
}
