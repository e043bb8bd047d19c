//! Statement producers for the directory routes.
//!
//! Builders for the query shapes the route layer issues against the two
//! directory tables. The persistence core treats their output as opaque;
//! only the shape tag and parameters matter to it.

use crate::models::{ParamValue, Schema, Statement};
use chrono::NaiveDate;

/// A user row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub city_id: Option<i64>,
    pub additional_info: Option<String>,
    pub is_admin: bool,
    pub password_hash: String,
}

/// A partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub other_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub city_id: Option<i64>,
    pub additional_info: Option<String>,
    pub is_admin: Option<bool>,
    pub password_hash: Option<String>,
}

impl UserUpdate {
    fn changed_fields(&self) -> Vec<(&'static str, ParamValue)> {
        let mut fields = Vec::new();
        if let Some(v) = &self.first_name {
            fields.push(("first_name", ParamValue::from(v.clone())));
        }
        if let Some(v) = &self.last_name {
            fields.push(("last_name", ParamValue::from(v.clone())));
        }
        if let Some(v) = &self.other_name {
            fields.push(("other_name", ParamValue::from(v.clone())));
        }
        if let Some(v) = &self.email {
            fields.push(("email", ParamValue::from(v.clone())));
        }
        if let Some(v) = &self.phone {
            fields.push(("phone", ParamValue::from(v.clone())));
        }
        if let Some(v) = self.birthday {
            fields.push(("birthday", ParamValue::from(v)));
        }
        if let Some(v) = self.city_id {
            fields.push(("city_id", ParamValue::from(v)));
        }
        if let Some(v) = &self.additional_info {
            fields.push(("additional_info", ParamValue::from(v.clone())));
        }
        if let Some(v) = self.is_admin {
            fields.push(("is_admin", ParamValue::from(v)));
        }
        if let Some(v) = &self.password_hash {
            fields.push(("password_hash", ParamValue::from(v.clone())));
        }
        fields
    }
}

/// Builds the statements the directory routes need.
#[derive(Debug, Clone)]
pub struct DirectoryStatements {
    users: &'static str,
    cities: &'static str,
}

impl DirectoryStatements {
    pub fn new(schema: &Schema) -> Self {
        Self {
            users: schema.users_table,
            cities: schema.cities_table,
        }
    }

    pub fn insert_user(&self, user: &NewUser) -> Statement {
        Statement::insert(format!(
            "INSERT INTO {} (first_name, last_name, other_name, email, phone, birthday, \
             city_id, additional_info, is_admin, password_hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            self.users
        ))
        .bind("first_name", user.first_name.clone())
        .bind("last_name", user.last_name.clone())
        .bind("other_name", user.other_name.clone())
        .bind("email", user.email.clone())
        .bind("phone", user.phone.clone())
        .bind("birthday", user.birthday)
        .bind("city_id", user.city_id)
        .bind("additional_info", user.additional_info.clone())
        .bind("is_admin", user.is_admin)
        .bind("password_hash", user.password_hash.clone())
    }

    /// `None` when the update carries no fields.
    pub fn update_user(&self, id: i64, changes: &UserUpdate) -> Option<Statement> {
        let fields = changes.changed_fields();
        if fields.is_empty() {
            return None;
        }

        let assignments = fields
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = Statement::update(format!(
            "UPDATE {} SET {} WHERE id = ?",
            self.users, assignments
        ));
        for (name, value) in fields {
            stmt = stmt.bind(name, value);
        }
        Some(stmt.bind("id", id))
    }

    pub fn delete_user(&self, id: i64) -> Statement {
        Statement::delete(format!("DELETE FROM {} WHERE id = ?", self.users)).bind("id", id)
    }

    pub fn select_user_by_id(&self, id: i64) -> Statement {
        Statement::row(format!(
            "SELECT id, first_name, last_name, other_name, email, phone, birthday, \
             city_id, additional_info, is_admin, password_hash \
             FROM {} WHERE id = ?",
            self.users
        ))
        .bind("id", id)
    }

    pub fn select_user_by_email(&self, email: &str) -> Statement {
        Statement::row(format!(
            "SELECT id, first_name, last_name, other_name, email, phone, birthday, \
             city_id, additional_info, is_admin, password_hash \
             FROM {} WHERE email = ?",
            self.users
        ))
        .bind("email", email)
    }

    pub fn select_users(&self) -> Statement {
        Statement::list(format!(
            "SELECT id, first_name, last_name, email, city_id, is_admin \
             FROM {} ORDER BY id",
            self.users
        ))
    }

    /// Total user count, for deriving page totals next to [`Self::select_users`].
    pub fn count_users(&self) -> Statement {
        Statement::scalar(format!("SELECT count(*) FROM {}", self.users))
    }

    pub fn count_users_by_email(&self, email: &str) -> Statement {
        Statement::scalar(format!(
            "SELECT count(*) FROM {} WHERE email = ?",
            self.users
        ))
        .bind("email", email)
    }

    /// Probe for an existing account with the given identity.
    pub fn admin_exists(&self, email: &str) -> Statement {
        Statement::scalar(format!(
            "SELECT is_admin FROM {} WHERE email = ?",
            self.users
        ))
        .bind("email", email)
    }

    pub fn insert_city(&self, name: &str) -> Statement {
        Statement::insert(format!(
            "INSERT INTO {} (name) VALUES (?) RETURNING id",
            self.cities
        ))
        .bind("name", name)
    }

    pub fn select_cities(&self) -> Statement {
        Statement::list(format!("SELECT id, name FROM {} ORDER BY id", self.cities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MutationKind, StatementKind};

    fn statements() -> DirectoryStatements {
        DirectoryStatements::new(&Schema::directory())
    }

    #[test]
    fn test_insert_user_shape_and_params() {
        let user = NewUser {
            email: "a@x.com".into(),
            password_hash: "h".into(),
            ..Default::default()
        };
        let stmt = statements().insert_user(&user);
        assert_eq!(stmt.kind, StatementKind::Mutation(MutationKind::Insert));
        assert!(stmt.sql.contains("RETURNING id"));
        assert_eq!(stmt.params.len(), 10);
        assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
    }

    #[test]
    fn test_insert_user_absent_fields_keep_their_types() {
        // NULLs must carry the column's type; PostgreSQL rejects a text-typed
        // NULL bound into an integer, date or boolean placeholder.
        let user = NewUser {
            email: "a@x.com".into(),
            password_hash: "h".into(),
            ..Default::default()
        };
        let stmt = statements().insert_user(&user);
        let param = |name: &str| {
            stmt.params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(param("birthday"), ParamValue::Date(None));
        assert_eq!(param("city_id"), ParamValue::Int(None));
        assert_eq!(param("phone"), ParamValue::Text(None));
        assert_eq!(param("is_admin"), ParamValue::Bool(Some(false)));
    }

    #[test]
    fn test_count_users_is_scalar_over_all_rows() {
        let stmt = statements().count_users();
        assert_eq!(stmt.kind, StatementKind::ScalarRead);
        assert_eq!(stmt.sql, "SELECT count(*) FROM users");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_update_user_builds_only_changed_fields() {
        let changes = UserUpdate {
            first_name: Some("New".into()),
            ..Default::default()
        };
        let stmt = statements().update_user(7, &changes).unwrap();
        assert_eq!(stmt.sql, "UPDATE users SET first_name = ? WHERE id = ?");
        assert_eq!(stmt.params.len(), 2);
        assert_eq!(stmt.params[1].0, "id");
    }

    #[test]
    fn test_update_user_with_no_fields_is_none() {
        assert!(statements().update_user(7, &UserUpdate::default()).is_none());
    }

    #[test]
    fn test_placeholder_count_matches_params() {
        let stmt = statements().select_user_by_email("a@x.com");
        assert_eq!(stmt.sql.matches('?').count(), stmt.params.len());
    }
}
