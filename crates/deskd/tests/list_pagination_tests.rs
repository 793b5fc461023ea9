//! Pagination determinism tests for the store list queries.

use chrono::{DateTime, Duration, Utc};
use desk_common::{
    ListQuery, QuickFilter, Ticket, TicketFilter, TicketKind, TicketStatus,
};
use deskd::store::Store;
use std::collections::HashSet;
use uuid::Uuid;

fn base_time() -> DateTime<Utc> {
    "2026-03-01T12:00:00Z".parse().unwrap()
}

fn make_ticket(n: usize, created_at: DateTime<Utc>, kind: TicketKind) -> Ticket {
    Ticket {
        id: Uuid::new_v4(),
        key: format!("SUP-{n}"),
        subject: format!("Ticket number {n}"),
        kind,
        status: TicketStatus::Open,
        company_id: None,
        assignee: None,
        time_spent_minutes: 0,
        created_at,
        updated_at: created_at,
        resolved_at: None,
    }
}

async fn seeded_store(count: usize) -> Store {
    let store = Store::open_in_memory().await.unwrap();
    for n in 0..count {
        // Pairs share a creation timestamp so pagination must rely on
        // the id tie-break to stay deterministic
        let created = base_time() + Duration::minutes((n / 2) as i64);
        let kind = match n % 3 {
            0 => TicketKind::Bug,
            1 => TicketKind::Request,
            _ => TicketKind::Assistance,
        };
        store.insert_ticket(&make_ticket(n, created, kind)).await.unwrap();
    }
    store
}

#[tokio::test]
async fn paging_to_exhaustion_yields_total_unique_items() {
    let store = seeded_store(57).await;
    let filter = TicketFilter::default();

    let mut seen = HashSet::new();
    let mut offset = 0u64;
    let mut reported_total = None;

    loop {
        let page = store
            .list_tickets(ListQuery::new(offset, 10), &filter)
            .await
            .unwrap();

        assert!(page.items.len() <= 10);
        reported_total.get_or_insert(page.total);
        assert_eq!(page.total, reported_total.unwrap());

        for ticket in &page.items {
            assert!(seen.insert(ticket.id), "id {} repeated", ticket.id);
        }

        offset += page.items.len() as u64;
        if !page.has_more {
            break;
        }
    }

    assert_eq!(seen.len() as u64, reported_total.unwrap());
    assert_eq!(seen.len(), 57);
}

#[tokio::test]
async fn has_more_is_false_exactly_at_the_end() {
    let store = seeded_store(25).await;
    let filter = TicketFilter::default();

    let page = store
        .list_tickets(ListQuery::new(0, 25), &filter)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 25);
    assert!(!page.has_more);

    let page = store
        .list_tickets(ListQuery::new(0, 24), &filter)
        .await
        .unwrap();
    assert!(page.has_more);
}

#[tokio::test]
async fn identical_timestamps_never_skip_or_duplicate_across_pages() {
    // Every ticket shares one timestamp: ordering is id-tie-break only
    let store = Store::open_in_memory().await.unwrap();
    for n in 0..30 {
        store
            .insert_ticket(&make_ticket(n, base_time(), TicketKind::Bug))
            .await
            .unwrap();
    }

    let filter = TicketFilter::default();
    let mut seen = HashSet::new();
    for offset in (0..30).step_by(7) {
        let page = store
            .list_tickets(ListQuery::new(offset, 7), &filter)
            .await
            .unwrap();
        for ticket in &page.items {
            assert!(seen.insert(ticket.id));
        }
    }
    assert_eq!(seen.len(), 30);
}

#[tokio::test]
async fn quick_filter_restricts_total_and_items() {
    let store = seeded_store(30).await;
    let filter = TicketFilter {
        quick: Some(QuickFilter::Bugs),
        ..Default::default()
    };

    let page = store
        .list_tickets(ListQuery::new(0, 100), &filter)
        .await
        .unwrap();
    assert_eq!(page.total, 10); // every third of 30
    assert!(page.items.iter().all(|t| t.kind == TicketKind::Bug));
}

#[tokio::test]
async fn search_matches_subject_and_key() {
    let store = seeded_store(12).await;
    let filter = TicketFilter::from_params(Some("number 7"), None, None);

    let page = store
        .list_tickets(ListQuery::new(0, 25), &filter)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].key, "SUP-7");

    let by_key = TicketFilter::from_params(Some("SUP-11"), None, None);
    let page = store.list_tickets(ListQuery::new(0, 25), &by_key).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn sort_direction_is_respected() {
    let store = seeded_store(10).await;

    let filter = TicketFilter::from_params(None, None, Some("created_at:asc"));
    let page = store
        .list_tickets(ListQuery::new(0, 10), &filter)
        .await
        .unwrap();
    let times: Vec<_> = page.items.iter().map(|t| t.created_at).collect();
    let mut sorted = times.clone();
    sorted.sort();
    assert_eq!(times, sorted);

    let filter = TicketFilter::from_params(None, None, Some("created_at:desc"));
    let page = store
        .list_tickets(ListQuery::new(0, 10), &filter)
        .await
        .unwrap();
    let times: Vec<_> = page.items.iter().map(|t| t.created_at).collect();
    let mut sorted = times.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(times, sorted);
}
