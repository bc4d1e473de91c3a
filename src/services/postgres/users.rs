use super::{PostgresClient, PostgresError};
use crate::models::{UpdateUserRequest, User};

const USER_COLUMNS: &str =
    "id, email, full_name, phone, company_name, is_active, created_at, last_login";

/// User row together with its stored password hash
#[derive(Debug, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Fields of a new client account
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub phone: Option<&'a str>,
    pub company_name: Option<&'a str>,
}

impl PostgresClient {
    pub async fn create_user(&self, user: NewUser<'_>) -> Result<User, PostgresError> {
        let query = format!(
            r#"
            INSERT INTO users (email, password_hash, full_name, phone, company_name)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, User>(&query)
            .bind(user.email.trim())
            .bind(user.password_hash)
            .bind(user.full_name.trim())
            .bind(user.phone)
            .bind(user.company_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PostgresError::conflict_on_unique(e, "User with this email already exists"))?;

        tracing::info!("Registered user {}", created.id);
        Ok(created)
    }

    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, PostgresError> {
        let query = format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = LOWER($1)"
        );

        let credentials = sqlx::query_as::<_, UserCredentials>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(credentials)
    }

    /// Stamp a successful login and return the refreshed account
    pub async fn record_login(&self, id: i32) -> Result<User, PostgresError> {
        let query = format!(
            "UPDATE users SET last_login = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, PostgresError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get_user(&self, id: i32) -> Result<User, PostgresError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("User {} not found", id)))
    }

    /// Partial update; absent fields keep their stored value
    pub async fn update_user(
        &self,
        id: i32,
        update: &UpdateUserRequest,
    ) -> Result<User, PostgresError> {
        let query = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                phone = COALESCE($2, phone),
                company_name = COALESCE($3, company_name),
                is_active = COALESCE($4, is_active)
            WHERE id = $5
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(update.full_name.as_deref())
            .bind(update.phone.as_deref())
            .bind(update.company_name.as_deref())
            .bind(update.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound(format!("User {} not found", id)))
    }

    /// Accounts are never removed, only switched off
    pub async fn deactivate_user(&self, id: i32) -> Result<(), PostgresError> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(PostgresError::NotFound(format!("User {} not found", id)));
        }
        tracing::info!("Deactivated user {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{test_client, unique};
    use super::*;
    use crate::error::ApiError;
    use actix_web::ResponseError;

    fn new_user<'a>(email: &'a str, phone: Option<&'a str>) -> NewUser<'a> {
        NewUser {
            email,
            password_hash: "hash",
            full_name: "Иван Петров",
            phone,
            company_name: Some("ООО Ромашка"),
        }
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_emails_are_unique_case_insensitively() {
        let client = test_client().await;
        let email = format!("{}@Example.com", unique("Ivan"));

        let user = client.create_user(new_user(&email, None)).await.unwrap();
        assert_eq!(user.email, email.to_lowercase());
        assert!(user.is_active);

        let duplicate = client
            .create_user(new_user(&email.to_uppercase(), None))
            .await
            .unwrap_err();
        assert!(matches!(duplicate, PostgresError::Conflict(_)));
        assert_eq!(ApiError::from(duplicate).status_code().as_u16(), 409);

        let found = client.find_credentials_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.user.id, user.id);
        assert_eq!(found.password_hash, "hash");
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_partial_update_keeps_absent_fields() {
        let client = test_client().await;
        let email = format!("{}@example.com", unique("update"));
        let user = client
            .create_user(new_user(&email, Some("+7 900 000-00-00")))
            .await
            .unwrap();

        let update = UpdateUserRequest {
            phone: Some("+7 911 111-11-11".to_string()),
            ..Default::default()
        };
        let updated = client.update_user(user.id, &update).await.unwrap();
        assert_eq!(updated.phone.as_deref(), Some("+7 911 111-11-11"));
        assert_eq!(updated.full_name, "Иван Петров");
        assert_eq!(updated.company_name.as_deref(), Some("ООО Ромашка"));
        assert!(updated.is_active);

        let logged_in = client.record_login(user.id).await.unwrap();
        assert!(logged_in.last_login.is_some());

        client.deactivate_user(user.id).await.unwrap();
        let deactivated = client.get_user(user.id).await.unwrap();
        assert!(!deactivated.is_active);
        assert_eq!(deactivated.email, email);

        assert!(matches!(client.deactivate_user(-1).await, Err(PostgresError::NotFound(_))));
        assert!(matches!(
            client.update_user(-1, &update).await,
            Err(PostgresError::NotFound(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_overlong_value_maps_to_bad_request() {
        let client = test_client().await;
        let email = format!("{}@example.com", unique("long"));
        let phone = "7".repeat(40);

        let err = client.create_user(new_user(&email, Some(&phone))).await.unwrap_err();
        let api: ApiError = err.into();
        assert_eq!(api.status_code().as_u16(), 400);
        assert_eq!(api.to_string(), "Value is too long");
    }
}
