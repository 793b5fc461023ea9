//! Contact queries. Contacts have no list surface of their own; they
//! exist for the polymorphic search and company drill-downs.

use super::tickets::{like_pattern, parse_id};
use super::{backend, Store};
use desk_common::{Contact, DeskError};
use rusqlite::{params, Row};
use uuid::Uuid;

const CONTACT_COLS: &str = "id, name, email, company_id, created_at";

impl Store {
    pub async fn insert_contact(&self, contact: &Contact) -> Result<(), DeskError> {
        let c = contact.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (id, name, email, company_id, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    c.id.to_string(),
                    c.name,
                    c.email,
                    c.company_id.map(|id| id.to_string()),
                    c.created_at,
                ],
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
    }

    pub async fn search_contacts(
        &self,
        pattern: &str,
        exact_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<Contact>, DeskError> {
        let pattern = like_pattern(pattern);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {CONTACT_COLS} FROM contacts \
                     WHERE name LIKE ?1 OR email LIKE ?1 OR id = ?2 \
                     ORDER BY name ASC, id ASC LIMIT ?3"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(
                    params![pattern, exact_id.map(|id| id.to_string()), limit as i64],
                    contact_from_row,
                )
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }
}

fn contact_from_row(row: &Row) -> rusqlite::Result<Contact> {
    let id: String = row.get(0)?;
    let company_id: Option<String> = row.get(3)?;
    Ok(Contact {
        id: parse_id(&id)?,
        name: row.get(1)?,
        email: row.get(2)?,
        company_id: company_id.as_deref().map(parse_id).transpose()?,
        created_at: row.get(4)?,
    })
}
