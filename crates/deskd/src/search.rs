//! Polymorphic entity search.
//!
//! One template for every entity kind: match by text pattern, and also
//! by exact id when the query text is UUID-shaped. Dispatch is a sum
//! type over the kind rather than one endpoint per entity.

use crate::store::Store;
use desk_common::{Campaign, Company, Contact, DeskError, Ticket};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SEARCH_LIMIT: u64 = 20;

/// Searchable entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Ticket,
    Company,
    Contact,
    Campaign,
}

impl EntityKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ticket" | "tickets" => Some(Self::Ticket),
            "company" | "companies" => Some(Self::Company),
            "contact" | "contacts" => Some(Self::Contact),
            "campaign" | "campaigns" => Some(Self::Campaign),
            _ => None,
        }
    }
}

/// Search hits, tagged by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum SearchHits {
    Tickets(Vec<Ticket>),
    Companies(Vec<Company>),
    Contacts(Vec<Contact>),
    Campaigns(Vec<Campaign>),
}

impl SearchHits {
    pub fn len(&self) -> usize {
        match self {
            Self::Tickets(v) => v.len(),
            Self::Companies(v) => v.len(),
            Self::Contacts(v) => v.len(),
            Self::Campaigns(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run the shared search template for one entity kind.
pub async fn search_entities(
    store: &Store,
    kind: EntityKind,
    query: &str,
) -> Result<SearchHits, DeskError> {
    let query = query.trim();
    let exact_id = Uuid::parse_str(query).ok();

    Ok(match kind {
        EntityKind::Ticket => {
            SearchHits::Tickets(store.search_tickets(query, exact_id, SEARCH_LIMIT).await?)
        }
        EntityKind::Company => {
            SearchHits::Companies(store.search_companies(query, exact_id, SEARCH_LIMIT).await?)
        }
        EntityKind::Contact => {
            SearchHits::Contacts(store.search_contacts(query, exact_id, SEARCH_LIMIT).await?)
        }
        EntityKind::Campaign => {
            SearchHits::Campaigns(store.search_campaigns(query, exact_id, SEARCH_LIMIT).await?)
        }
    })
}
