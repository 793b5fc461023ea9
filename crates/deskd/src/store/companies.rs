//! Company queries.

use super::tickets::{like_pattern, parse_id};
use super::{backend, Store};
use desk_common::filter::{normalize_search, Sort};
use desk_common::{Company, DeskError, ListQuery, Page};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

const COMPANY_COLS: &str = "id, name, domain, created_at";

impl Store {
    pub async fn list_companies(
        &self,
        query: ListQuery,
        search: Option<&str>,
        sort: Sort,
    ) -> Result<Page<Company>, DeskError> {
        let search = normalize_search(search);
        self.call(move |conn| {
            let (where_sql, params) = match &search {
                Some(s) => {
                    let pattern = like_pattern(s);
                    (
                        " WHERE (name LIKE ?1 OR domain LIKE ?1)".to_string(),
                        vec![Value::from(pattern)],
                    )
                }
                None => (String::new(), Vec::new()),
            };

            let total = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM companies{where_sql}"),
                    params_from_iter(params.iter()),
                    |r| r.get::<_, i64>(0),
                )
                .map_err(backend)? as u64;

            let page_sql = format!(
                "SELECT {COMPANY_COLS} FROM companies{where_sql} \
                 ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
                sort.column.as_sql(),
                sort.direction.as_sql()
            );
            let mut page_params = params;
            page_params.push(Value::from(query.limit as i64));
            page_params.push(Value::from(query.offset as i64));

            let mut stmt = conn.prepare(&page_sql).map_err(backend)?;
            let items = stmt
                .query_map(params_from_iter(page_params.iter()), company_from_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend)?;

            Ok(Page::new(items, query.offset, total))
        })
        .await
    }

    pub async fn insert_company(&self, company: &Company) -> Result<(), DeskError> {
        let c = company.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO companies (id, name, domain, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![c.id.to_string(), c.name, c.domain, c.created_at],
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
    }

    pub async fn search_companies(
        &self,
        pattern: &str,
        exact_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<Company>, DeskError> {
        let pattern = like_pattern(pattern);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {COMPANY_COLS} FROM companies \
                     WHERE name LIKE ?1 OR domain LIKE ?1 OR id = ?2 \
                     ORDER BY name ASC, id ASC LIMIT ?3"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(
                    params![pattern, exact_id.map(|id| id.to_string()), limit as i64],
                    company_from_row,
                )
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }
}

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    let id: String = row.get(0)?;
    Ok(Company {
        id: parse_id(&id)?,
        name: row.get(1)?,
        domain: row.get(2)?,
        created_at: row.get(3)?,
    })
}
