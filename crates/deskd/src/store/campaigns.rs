//! Campaign queries.

use super::tickets::{like_pattern, parse_id};
use super::{backend, Store};
use desk_common::filter::{normalize_search, Sort};
use desk_common::{Campaign, CampaignStatus, DeskError, ListQuery, Page};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

const CAMPAIGN_COLS: &str = "id, name, status, starts_at, ends_at, created_at";

impl Store {
    pub async fn list_campaigns(
        &self,
        query: ListQuery,
        search: Option<&str>,
        sort: Sort,
    ) -> Result<Page<Campaign>, DeskError> {
        let search = normalize_search(search);
        self.call(move |conn| {
            let (where_sql, params) = match &search {
                Some(s) => (
                    " WHERE name LIKE ?1".to_string(),
                    vec![Value::from(like_pattern(s))],
                ),
                None => (String::new(), Vec::new()),
            };

            let total = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM campaigns{where_sql}"),
                    params_from_iter(params.iter()),
                    |r| r.get::<_, i64>(0),
                )
                .map_err(backend)? as u64;

            let page_sql = format!(
                "SELECT {CAMPAIGN_COLS} FROM campaigns{where_sql} \
                 ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
                sort.column.as_sql(),
                sort.direction.as_sql()
            );
            let mut page_params = params;
            page_params.push(Value::from(query.limit as i64));
            page_params.push(Value::from(query.offset as i64));

            let mut stmt = conn.prepare(&page_sql).map_err(backend)?;
            let items = stmt
                .query_map(params_from_iter(page_params.iter()), campaign_from_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend)?;

            Ok(Page::new(items, query.offset, total))
        })
        .await
    }

    pub async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), DeskError> {
        let c = campaign.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO campaigns (id, name, status, starts_at, ends_at, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    c.id.to_string(),
                    c.name,
                    c.status.as_str(),
                    c.starts_at,
                    c.ends_at,
                    c.created_at,
                ],
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
    }

    pub async fn search_campaigns(
        &self,
        pattern: &str,
        exact_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<Campaign>, DeskError> {
        let pattern = like_pattern(pattern);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {CAMPAIGN_COLS} FROM campaigns \
                     WHERE name LIKE ?1 OR id = ?2 \
                     ORDER BY name ASC, id ASC LIMIT ?3"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(
                    params![pattern, exact_id.map(|id| id.to_string()), limit as i64],
                    campaign_from_row,
                )
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }
}

fn campaign_from_row(row: &Row) -> rusqlite::Result<Campaign> {
    let id: String = row.get(0)?;
    let status: String = row.get(2)?;
    Ok(Campaign {
        id: parse_id(&id)?,
        name: row.get(1)?,
        status: CampaignStatus::parse(&status).unwrap_or_default(),
        starts_at: row.get(3)?,
        ends_at: row.get(4)?,
        created_at: row.get(5)?,
    })
}
