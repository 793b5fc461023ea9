//! Incremental list loading with id de-duplication.
//!
//! The loader owns the accumulated items for one list view. Pages are
//! merged in arrival order with already-present ids filtered out, so a
//! server-side insert between two fetches can never duplicate a row.
//! A failed fetch leaves the accumulated state untouched and the next
//! load retries from the same offset. Changing filters hard-resets the
//! loader and bumps a generation token; a stale response that resolves
//! after the reset is detected by its token and discarded.

use crate::retry::FetchError;
use desk_common::{Campaign, Company, Contact, Page, Ticket};
use std::collections::HashSet;
use std::future::Future;
use thiserror::Error;
use uuid::Uuid;

/// Entities mergeable by id
pub trait Keyed {
    fn key_id(&self) -> Uuid;
}

impl Keyed for Ticket {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Company {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Contact {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

impl Keyed for Campaign {
    fn key_id(&self) -> Uuid {
        self.id
    }
}

/// Loader lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("A page load is already in progress")]
    Busy,
}

/// Token handed out by [`Loader::begin`]; completion is only applied
/// when the token's generation still matches the loader's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    offset: u64,
}

impl LoadTicket {
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Accumulated list state for one view.
#[derive(Debug)]
pub struct Loader<T> {
    items: Vec<T>,
    total: u64,
    has_more: bool,
    phase: Phase,
    generation: u64,
    /// Bumped on every applied state change; unchanged on no-op merges
    version: u64,
}

impl<T: Keyed> Loader<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            has_more: true,
            phase: Phase::Idle,
            generation: 0,
            version: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Offset for the next page: everything accumulated so far.
    /// Unchanged by failures, so an error retry resumes where it left off.
    pub fn next_offset(&self) -> u64 {
        self.items.len() as u64
    }

    /// Start a load. Rejected while another load is pending; allowed
    /// from both `Idle` and `Error` (the error retry path).
    pub fn begin(&mut self) -> Result<LoadTicket, LoadError> {
        if self.phase == Phase::Loading {
            return Err(LoadError::Busy);
        }
        self.phase = Phase::Loading;
        Ok(LoadTicket {
            generation: self.generation,
            offset: self.next_offset(),
        })
    }

    /// Apply a finished fetch. Returns false when the ticket is stale
    /// (the loader was reset after `begin`) and nothing was applied.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Page<T>, FetchError>) -> bool {
        if ticket.generation != self.generation {
            // Late response for superseded filters; drop it
            return false;
        }

        match result {
            Ok(page) => {
                self.merge(page);
                self.phase = Phase::Idle;
            }
            Err(error) => {
                // Accumulated items stay intact; only the phase changes
                self.phase = Phase::Error(error.to_string());
                self.version += 1;
            }
        }
        true
    }

    /// Hard reset for a filter change: empty list, offset 0, and a new
    /// generation so in-flight responses for the old filters are
    /// ignored when they land.
    pub fn reset(&mut self) {
        self.items.clear();
        self.total = 0;
        self.has_more = true;
        self.phase = Phase::Idle;
        self.generation += 1;
        self.version += 1;
    }

    /// Drive one begin -> fetch -> complete cycle.
    pub async fn load_more<F, Fut>(&mut self, fetch: F) -> Result<(), LoadError>
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = Result<Page<T>, FetchError>>,
    {
        let ticket = self.begin()?;
        let result = fetch(ticket.offset()).await;
        self.complete(ticket, result);
        Ok(())
    }

    /// Append only unseen ids, preserving arrival order. An all-dup
    /// page skips the state update entirely so watchers keyed on
    /// `version` see a no-op.
    fn merge(&mut self, page: Page<T>) {
        let present: HashSet<Uuid> = self.items.iter().map(Keyed::key_id).collect();
        let fresh: Vec<T> = page
            .items
            .into_iter()
            .filter(|item| !present.contains(&item.key_id()))
            .collect();

        let changed =
            !fresh.is_empty() || self.total != page.total || self.has_more != page.has_more;

        self.items.extend(fresh);
        self.total = page.total;
        self.has_more = page.has_more;
        if changed {
            self.version += 1;
        }
    }
}

impl<T: Keyed> Default for Loader<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use desk_common::{TicketKind, TicketStatus};

    fn ticket(n: usize) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: Uuid::new_v4(),
            key: format!("SUP-{n}"),
            subject: format!("Ticket {n}"),
            kind: TicketKind::Bug,
            status: TicketStatus::Open,
            company_id: None,
            assignee: None,
            time_spent_minutes: 0,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }

    fn page(items: Vec<Ticket>, offset: u64, total: u64) -> Page<Ticket> {
        Page::new(items, offset, total)
    }

    #[test]
    fn merge_appends_and_updates_counters() {
        let mut loader = Loader::new();
        let ticket_a = ticket(0);
        let ticket_b = ticket(1);

        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(vec![ticket_a, ticket_b], 0, 5)));

        assert_eq!(loader.items().len(), 2);
        assert_eq!(loader.total(), 5);
        assert!(loader.has_more());
        assert_eq!(*loader.phase(), Phase::Idle);
        assert_eq!(loader.next_offset(), 2);
    }

    #[test]
    fn overlapping_page_grows_by_size_minus_overlap() {
        let mut loader = Loader::new();
        let shared = ticket(0);
        let first = vec![shared.clone(), ticket(1), ticket(2)];

        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(first, 0, 6)));
        assert_eq!(loader.items().len(), 3);

        // Second page overlaps by one id
        let second = vec![shared, ticket(3), ticket(4)];
        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(second, 3, 6)));

        assert_eq!(loader.items().len(), 3 + (3 - 1));
    }

    #[test]
    fn all_duplicate_page_is_a_version_no_op() {
        let mut loader = Loader::new();
        let items = vec![ticket(0), ticket(1)];

        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(items.clone(), 0, 2)));
        let version = loader.version();

        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(items, 0, 2)));

        assert_eq!(loader.version(), version);
        assert_eq!(loader.items().len(), 2);
    }

    #[test]
    fn begin_while_loading_is_busy() {
        let mut loader: Loader<Ticket> = Loader::new();
        let _handle = loader.begin().unwrap();
        assert_eq!(loader.begin(), Err(LoadError::Busy));
    }

    #[test]
    fn failure_keeps_items_and_allows_retry_from_same_offset() {
        let mut loader = Loader::new();
        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(vec![ticket(0), ticket(1)], 0, 4)));

        let handle = loader.begin().unwrap();
        assert_eq!(handle.offset(), 2);
        loader.complete(handle, Err(FetchError::Status(502)));

        assert!(matches!(loader.phase(), Phase::Error(_)));
        assert_eq!(loader.items().len(), 2);

        // Retry resumes from the same offset
        let handle = loader.begin().unwrap();
        assert_eq!(handle.offset(), 2);
    }

    #[test]
    fn stale_response_after_reset_is_discarded() {
        let mut loader = Loader::new();
        let handle = loader.begin().unwrap();
        loader.complete(handle, Ok(page(vec![ticket(0)], 0, 10)));

        // A fetch goes out, then the filters change mid-flight
        let stale = loader.begin().unwrap();
        loader.reset();

        let applied = loader.complete(stale, Ok(page(vec![ticket(1), ticket(2)], 1, 10)));
        assert!(!applied);
        assert!(loader.items().is_empty());
        assert_eq!(*loader.phase(), Phase::Idle);
        assert_eq!(loader.next_offset(), 0);

        // The new-filter fetch proceeds normally
        let fresh = loader.begin().unwrap();
        assert_eq!(fresh.offset(), 0);
        loader.complete(fresh, Ok(page(vec![ticket(3)], 0, 1)));
        assert_eq!(loader.items().len(), 1);
        assert!(!loader.has_more());
    }

    #[tokio::test]
    async fn load_more_drives_a_full_cycle() {
        let mut loader = Loader::new();
        loader
            .load_more(|offset| {
                assert_eq!(offset, 0);
                async move { Ok(page(vec![ticket(0)], offset, 3)) }
            })
            .await
            .unwrap();

        assert_eq!(loader.items().len(), 1);
        assert!(loader.has_more());
    }

    #[test]
    fn paging_to_exhaustion_accumulates_total_unique_items() {
        // Fixed backing list; pages served by offset
        let backing: Vec<Ticket> = (0..23).map(ticket).collect();
        let mut loader = Loader::new();

        while loader.has_more() {
            let handle = loader.begin().unwrap();
            let offset = handle.offset() as usize;
            let slice: Vec<Ticket> = backing[offset..(offset + 10).min(backing.len())].to_vec();
            loader.complete(handle, Ok(page(slice, offset as u64, backing.len() as u64)));
        }

        assert_eq!(loader.items().len(), 23);
        let mut ids: Vec<Uuid> = loader.items().iter().map(|t| t.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 23);
    }
}
