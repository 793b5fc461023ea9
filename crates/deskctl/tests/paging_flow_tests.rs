//! End-to-end client data-layer flow: loader paging through a flaky
//! transport behind the retry wrapper.

use chrono::Utc;
use desk_common::{Page, Ticket, TicketKind, TicketStatus};
use deskctl::loader::Loader;
use deskctl::retry::{fetch_with_retry, FetchError, RetryPolicy, SingleFlight};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use uuid::Uuid;

fn make_ticket(n: usize) -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::new_v4(),
        key: format!("SUP-{n}"),
        subject: format!("Flow ticket {n}"),
        kind: TicketKind::Request,
        status: TicketStatus::Open,
        company_id: None,
        assignee: None,
        time_spent_minutes: 0,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        retry_delay: Duration::from_millis(5),
        timeout: Duration::from_millis(200),
    }
}

#[tokio::test(start_paused = true)]
async fn flaky_transport_still_pages_to_exhaustion() {
    let backing: Vec<Ticket> = (0..40).map(make_ticket).collect();
    let policy = fast_policy();
    let flight = SingleFlight::new();
    let failures = AtomicU32::new(0);

    let mut loader = Loader::new();

    while loader.has_more() {
        let backing = &backing;
        let failures = &failures;
        let flight = &flight;
        let policy = &policy;

        loader
            .load_more(|offset| async move {
                fetch_with_retry(policy, flight, |_| async move {
                    // Every other call fails once with a retryable 503
                    if failures.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                        return Err(FetchError::Status(503));
                    }
                    let offset = offset as usize;
                    let slice = backing[offset..(offset + 10).min(backing.len())].to_vec();
                    Ok(Page::new(slice, offset as u64, backing.len() as u64))
                })
                .await
            })
            .await
            .unwrap();

        assert_eq!(*loader.phase(), deskctl::loader::Phase::Idle);
    }

    assert_eq!(loader.items().len(), 40);
    assert_eq!(loader.total(), 40);

    // No id repeated across the accumulated sequence
    let mut ids: Vec<Uuid> = loader.items().iter().map(|t| t.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 40);
}

#[tokio::test(start_paused = true)]
async fn hard_failure_surfaces_as_loader_error_and_preserves_rows() {
    let backing: Vec<Ticket> = (0..10).map(make_ticket).collect();
    let policy = fast_policy();
    let flight = SingleFlight::new();

    let mut loader = Loader::new();

    // First page succeeds
    loader
        .load_more(|offset| {
            let slice = backing[..5].to_vec();
            let total = backing.len() as u64;
            async move { Ok(Page::new(slice, offset, total)) }
        })
        .await
        .unwrap();
    assert_eq!(loader.items().len(), 5);

    // Second page exhausts the retry budget
    loader
        .load_more(|_| async {
            fetch_with_retry(&policy, &flight, |_| async { Err(FetchError::Status(500)) }).await
        })
        .await
        .unwrap();

    assert!(matches!(loader.phase(), deskctl::loader::Phase::Error(_)));
    assert_eq!(loader.items().len(), 5);
    assert_eq!(loader.next_offset(), 5);
}
