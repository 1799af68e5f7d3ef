//! SQLite-Implementierung des UserRepository

use chrono::Utc;
use sqlx::sqlite::SqliteRow;

use passierschein_core::UserId;

use crate::error::DbError;
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SitzungsToken};
use crate::repository::{DbResult, UserRepository};
use crate::sqlite::pool::SqliteDb;

const SPALTEN: &str =
    "id, email, name, lastname, password_hash, role, image, token, token_exp, created_at";

impl UserRepository for SqliteDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let id = UserId::new();
        let email = data.email.trim();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, email, name, lastname, password_hash, role, image, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(email)
        .bind(data.name)
        .bind(data.lastname)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.image)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE") || msg.contains("unique") {
                DbError::Eindeutigkeit(format!("E-Mail '{email}' bereits vergeben"))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        tracing::debug!(user_id = %id, "Benutzer angelegt");

        Ok(BenutzerRecord {
            id,
            email: email.to_string(),
            name: data.name.map(str::to_string),
            lastname: data.lastname.map(str::to_string),
            password_hash: data.password_hash.to_string(),
            role: data.role,
            image: data.image.map(str::to_string),
            token: None,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE email = ?");
        let row = sqlx::query(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn get_by_token(&self, token: &str) -> DbResult<Option<BenutzerRecord>> {
        let sql = format!("SELECT {SPALTEN} FROM users WHERE token = ?");
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| row_to_benutzer(&r)).transpose()
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        if data.ist_leer() {
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")));
        }

        // Dynamisches UPDATE – nur gesetzte Felder aendern
        let mut sets: Vec<&str> = Vec::new();
        if data.name.is_some() {
            sets.push("name = ?");
        }
        if data.lastname.is_some() {
            sets.push("lastname = ?");
        }
        if data.password_hash.is_some() {
            sets.push("password_hash = ?");
        }
        if data.role.is_some() {
            sets.push("role = ?");
        }
        if data.image.is_some() {
            sets.push("image = ?");
        }
        if data.token.is_some() {
            sets.push("token = ?");
            sets.push("token_exp = ?");
        }

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut q = sqlx::query(&sql);

        if let Some(v) = data.name {
            q = q.bind(v);
        }
        if let Some(v) = data.lastname {
            q = q.bind(v);
        }
        if let Some(v) = data.password_hash {
            q = q.bind(v);
        }
        if let Some(v) = data.role {
            q = q.bind(v);
        }
        if let Some(v) = data.image {
            q = q.bind(v);
        }
        if let Some(token) = data.token {
            let (wert, ablauf) = match token {
                Some(t) => (Some(t.wert), Some(t.laeuft_ab_am)),
                None => (None, None),
            };
            q = q.bind(wert).bind(ablauf);
        }
        q = q.bind(id.to_string());

        let affected = q.execute(&self.pool).await?.rows_affected();
        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!("User {id}")));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::intern("User nach Update nicht gefunden"))
    }
}

fn row_to_benutzer(row: &SqliteRow) -> DbResult<BenutzerRecord> {
    use sqlx::Row as _;

    let id_str: String = row.try_get("id")?;
    let id = id_str
        .parse::<UserId>()
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{id_str}': {e}")))?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?
        .with_timezone(&Utc);

    let token: Option<String> = row.try_get("token")?;
    let token_exp: Option<i64> = row.try_get("token_exp")?;
    let token = match (token, token_exp) {
        (Some(wert), Some(laeuft_ab_am)) => Some(SitzungsToken { wert, laeuft_ab_am }),
        (None, None) => None,
        _ => {
            return Err(DbError::UngueltigeDaten(format!(
                "User {id}: token und token_exp nicht gepaart"
            )))
        }
    };

    Ok(BenutzerRecord {
        id,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        lastname: row.try_get("lastname")?,
        password_hash: row.try_get("password_hash")?,
        role: row.try_get("role")?,
        image: row.try_get("image")?,
        token,
        created_at,
    })
}
