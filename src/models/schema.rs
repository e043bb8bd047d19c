//! Directory schema registry.
//!
//! An explicit metadata object constructed once at startup and passed by
//! reference into the error translator, statement producers and seeder.
//! Never global state.

use std::fmt;

/// Storage engine, selected from the connection URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Postgres,
    Sqlite,
}

impl Engine {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgresql"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// A foreign-key column and the table it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    pub column: &'static str,
    pub referenced_table: &'static str,
}

/// Table and column metadata for the two directory tables.
#[derive(Debug, Clone)]
pub struct Schema {
    pub users_table: &'static str,
    pub cities_table: &'static str,
    /// The identity-bearing unique column on the users table.
    pub identity_column: &'static str,
    pub references: Vec<ForeignKeyTarget>,
}

impl Schema {
    pub fn directory() -> Self {
        Self {
            users_table: "users",
            cities_table: "city",
            identity_column: "email",
            references: vec![ForeignKeyTarget {
                column: "city_id",
                referenced_table: "city",
            }],
        }
    }

    /// DDL for the persisted layout, in dependency order.
    pub fn create_tables_sql(&self, engine: Engine) -> Vec<String> {
        let id = match engine {
            Engine::Postgres => "id SERIAL PRIMARY KEY",
            Engine::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        };
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {} ({id}, name TEXT UNIQUE)",
                self.cities_table
            ),
            format!(
                "CREATE TABLE IF NOT EXISTS {} ({id}, \
                 first_name TEXT, last_name TEXT, other_name TEXT, \
                 email TEXT UNIQUE, phone TEXT, birthday DATE, \
                 city_id INTEGER REFERENCES {}(id), \
                 additional_info TEXT, is_admin BOOLEAN, password_hash TEXT)",
                self.users_table, self.cities_table
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{0}_city_id ON {0} (city_id)",
                self.users_table
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_scheme() {
        assert_eq!(Engine::from_scheme("postgres"), Some(Engine::Postgres));
        assert_eq!(Engine::from_scheme("PostgreSQL"), Some(Engine::Postgres));
        assert_eq!(Engine::from_scheme("sqlite"), Some(Engine::Sqlite));
        assert_eq!(Engine::from_scheme("mysql"), None);
    }

    #[test]
    fn test_ddl_creates_referenced_table_first() {
        let schema = Schema::directory();
        let ddl = schema.create_tables_sql(Engine::Sqlite);
        assert!(ddl[0].contains("city"));
        assert!(ddl[1].contains("REFERENCES city(id)"));
        assert!(ddl[1].contains("email TEXT UNIQUE"));
    }

    #[test]
    fn test_identity_and_references() {
        let schema = Schema::directory();
        assert_eq!(schema.identity_column, "email");
        assert_eq!(schema.references.len(), 1);
        assert_eq!(schema.references[0].column, "city_id");
    }
}
