//! Ticket queries: paginated list, webhook intake, aggregation reads.

use super::{backend, Store};
use chrono::{DateTime, Utc};
use desk_common::{
    DeskError, ListQuery, Page, QuickFilter, Ticket, TicketFilter, TicketKind, TicketStatus,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

const TICKET_COLS: &str = "id, key, subject, kind, status, company_id, assignee, \
     time_spent_minutes, created_at, updated_at, resolved_at";

impl Store {
    /// One range-bounded page plus the filtered total.
    ///
    /// Ordering is the requested sort column tie-broken by `id ASC`;
    /// without the tie-break, identical-timestamp rows can be skipped
    /// or duplicated across pages.
    pub async fn list_tickets(
        &self,
        query: ListQuery,
        filter: &TicketFilter,
    ) -> Result<Page<Ticket>, DeskError> {
        let filter = filter.clone();
        self.call(move |conn| {
            let (where_sql, params) = ticket_where(&filter);

            let count_sql = format!("SELECT COUNT(*) FROM tickets{where_sql}");
            let total = conn
                .query_row(&count_sql, params_from_iter(params.iter()), |r| {
                    r.get::<_, i64>(0)
                })
                .map_err(backend)? as u64;

            let page_sql = format!(
                "SELECT {TICKET_COLS} FROM tickets{where_sql} \
                 ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
                filter.sort.column.as_sql(),
                filter.sort.direction.as_sql()
            );
            let mut page_params = params;
            page_params.push(Value::from(query.limit as i64));
            page_params.push(Value::from(query.offset as i64));

            let mut stmt = conn.prepare(&page_sql).map_err(backend)?;
            let items = stmt
                .query_map(params_from_iter(page_params.iter()), ticket_from_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend)?;

            Ok(Page::new(items, query.offset, total))
        })
        .await
    }

    pub async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), DeskError> {
        let t = ticket.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO tickets (id, key, subject, kind, status, company_id, assignee, \
                 time_spent_minutes, created_at, updated_at, resolved_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    t.id.to_string(),
                    t.key,
                    t.subject,
                    t.kind.as_str(),
                    t.status.as_str(),
                    t.company_id.map(|id| id.to_string()),
                    t.assignee,
                    t.time_spent_minutes,
                    t.created_at,
                    t.updated_at,
                    t.resolved_at,
                ],
            )
            .map_err(backend)?;
            Ok(())
        })
        .await
    }

    pub async fn get_ticket_by_key(&self, key: &str) -> Result<Option<Ticket>, DeskError> {
        let key = key.to_string();
        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {TICKET_COLS} FROM tickets WHERE key = ?1"),
                params![key],
                ticket_from_row,
            )
            .optional()
            .map_err(backend)
        })
        .await
    }

    /// Webhook intake: update status (and resolution timestamp when the
    /// new status is terminal). Returns false when no ticket has `key`.
    pub async fn update_ticket_status(
        &self,
        key: &str,
        status: TicketStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, DeskError> {
        let key = key.to_string();
        self.call(move |conn| {
            let resolved_at = status.is_resolved().then_some(at);
            let changed = conn
                .execute(
                    "UPDATE tickets SET status = ?1, resolved_at = ?2, updated_at = ?3 \
                     WHERE key = ?4",
                    params![status.as_str(), resolved_at, at, key],
                )
                .map_err(backend)?;
            Ok(changed > 0)
        })
        .await
    }

    /// Single global-range read for creation-dated aggregation.
    pub async fn tickets_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, DeskError> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {TICKET_COLS} FROM tickets \
                     WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at ASC"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(params![start, end], ticket_from_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }

    /// Single global-range read for resolution-dated aggregation.
    /// Unresolved tickets never appear here.
    pub async fn tickets_resolved_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, DeskError> {
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {TICKET_COLS} FROM tickets \
                     WHERE resolved_at IS NOT NULL \
                     AND resolved_at >= ?1 AND resolved_at <= ?2 ORDER BY resolved_at ASC"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(params![start, end], ticket_from_row)
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }

    /// Open backlog for the strategic block. When `created_after` is
    /// set, older tickets are excluded (the `include_old = false` view).
    pub async fn count_open_tickets(
        &self,
        created_after: Option<DateTime<Utc>>,
    ) -> Result<u64, DeskError> {
        self.call(move |conn| {
            let count: i64 = match created_after {
                Some(after) => conn
                    .query_row(
                        "SELECT COUNT(*) FROM tickets \
                         WHERE status IN ('open', 'in_progress') AND created_at >= ?1",
                        params![after],
                        |r| r.get(0),
                    )
                    .map_err(backend)?,
                None => conn
                    .query_row(
                        "SELECT COUNT(*) FROM tickets WHERE status IN ('open', 'in_progress')",
                        [],
                        |r| r.get(0),
                    )
                    .map_err(backend)?,
            };
            Ok(count as u64)
        })
        .await
    }

    /// Pattern search over subject and key, plus exact-id lookup when
    /// the query text was UUID-shaped.
    pub async fn search_tickets(
        &self,
        pattern: &str,
        exact_id: Option<Uuid>,
        limit: u64,
    ) -> Result<Vec<Ticket>, DeskError> {
        let pattern = like_pattern(pattern);
        self.call(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {TICKET_COLS} FROM tickets \
                     WHERE subject LIKE ?1 OR key LIKE ?1 OR id = ?2 \
                     ORDER BY created_at DESC, id ASC LIMIT ?3"
                ))
                .map_err(backend)?;
            let out = stmt
                .query_map(
                    params![pattern, exact_id.map(|id| id.to_string()), limit as i64],
                    ticket_from_row,
                )
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend);
            out
        })
        .await
    }
}

/// WHERE clause + params for the typed ticket filter.
fn ticket_where(filter: &TicketFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(search) = &filter.search {
        params.push(Value::from(like_pattern(search)));
        let idx = params.len();
        clauses.push(format!("(subject LIKE ?{idx} OR key LIKE ?{idx})"));
    }

    if let Some(quick) = filter.quick {
        clauses.push(
            match quick {
                QuickFilter::Open => "status IN ('open', 'in_progress')",
                QuickFilter::Resolved => "status IN ('resolved', 'closed')",
                QuickFilter::Bugs => "kind = 'bug'",
                QuickFilter::Requests => "kind = 'request'",
                QuickFilter::Assistances => "kind = 'assistance'",
            }
            .to_string(),
        );
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

pub(crate) fn like_pattern(search: &str) -> String {
    format!("%{}%", search.trim())
}

pub(crate) fn parse_id(raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn ticket_from_row(row: &Row) -> rusqlite::Result<Ticket> {
    let id: String = row.get(0)?;
    let kind: String = row.get(3)?;
    let status: String = row.get(4)?;
    let company_id: Option<String> = row.get(5)?;

    Ok(Ticket {
        id: parse_id(&id)?,
        key: row.get(1)?,
        subject: row.get(2)?,
        kind: TicketKind::parse(&kind).unwrap_or_default(),
        status: TicketStatus::parse(&status).unwrap_or_default(),
        company_id: company_id.as_deref().map(parse_id).transpose()?,
        assignee: row.get(6)?,
        time_spent_minutes: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        resolved_at: row.get(10)?,
    })
}
