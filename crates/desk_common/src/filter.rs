//! Filter/sort parsing for list endpoints.
//!
//! The parser is total over all string inputs: unknown sort columns or
//! directions fall back to the documented default (`created_at:desc`),
//! unknown quick filters are dropped, blank search collapses to `None`.
//! Nothing in here ever returns an error.

use serde::{Deserialize, Serialize};

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Sortable columns across the list surfaces.
///
/// Each list endpoint accepts a subset (see the `TICKET_SORT`,
/// `COMPANY_SORT`, `CAMPAIGN_SORT` allow-lists); anything outside the
/// subset degrades to the default sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    CreatedAt,
    UpdatedAt,
    Subject,
    Status,
    Kind,
    Company,
    Name,
    StartsAt,
}

impl SortColumn {
    /// Column name as it appears in the schema
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Subject => "subject",
            Self::Status => "status",
            Self::Kind => "kind",
            Self::Company => "company_id",
            Self::Name => "name",
            Self::StartsAt => "starts_at",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "subject" => Some(Self::Subject),
            "status" => Some(Self::Status),
            "kind" => Some(Self::Kind),
            "company" | "company_id" => Some(Self::Company),
            "name" => Some(Self::Name),
            "starts_at" => Some(Self::StartsAt),
            _ => None,
        }
    }
}

/// Columns accepted by the tickets list
pub const TICKET_SORT: &[SortColumn] = &[
    SortColumn::CreatedAt,
    SortColumn::UpdatedAt,
    SortColumn::Subject,
    SortColumn::Status,
    SortColumn::Kind,
    SortColumn::Company,
];

/// Columns accepted by the companies list
pub const COMPANY_SORT: &[SortColumn] = &[SortColumn::Name, SortColumn::CreatedAt];

/// Columns accepted by the campaigns list
pub const CAMPAIGN_SORT: &[SortColumn] = &[
    SortColumn::Name,
    SortColumn::StartsAt,
    SortColumn::CreatedAt,
];

/// One sort column plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Sort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Sort {
    /// Parse `"<column>:<direction>"` against an allow-list.
    ///
    /// Unknown columns, unknown directions, missing separators, and
    /// columns outside the allow-list all yield the default
    /// `created_at:desc`.
    pub fn parse(input: Option<&str>, allowed: &[SortColumn]) -> Self {
        let Some(raw) = input else {
            return Self::default();
        };

        let mut parts = raw.trim().splitn(2, ':');
        let column = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let direction = parts.next().unwrap_or("").trim().to_ascii_lowercase();

        let Some(column) = SortColumn::parse(&column) else {
            return Self::default();
        };
        if !allowed.contains(&column) {
            return Self::default();
        }
        let Some(direction) = SortDirection::parse(&direction) else {
            return Self::default();
        };

        Self { column, direction }
    }
}

impl std::fmt::Display for Sort {
    /// The wire format the parser accepts: `"<column>:<direction>"`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.column.as_sql(), self.direction.as_str())
    }
}

/// Predefined filter shortcuts exposed as UI toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickFilter {
    Open,
    Resolved,
    Bugs,
    Requests,
    Assistances,
}

impl QuickFilter {
    /// Unknown values drop to `None` rather than erroring.
    pub fn parse(input: Option<&str>) -> Option<Self> {
        match input.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("open") => Some(Self::Open),
            Some("resolved") => Some(Self::Resolved),
            Some("bugs") => Some(Self::Bugs),
            Some("requests") => Some(Self::Requests),
            Some("assistances") => Some(Self::Assistances),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Resolved => "resolved",
            Self::Bugs => "bugs",
            Self::Requests => "requests",
            Self::Assistances => "assistances",
        }
    }
}

/// Typed filter set for the tickets list.
///
/// Immutable once parsed; a change of any field invalidates accumulated
/// list state on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TicketFilter {
    pub search: Option<String>,
    pub quick: Option<QuickFilter>,
    pub sort: Sort,
}

impl TicketFilter {
    /// Assemble from raw string-keyed query parameters.
    pub fn from_params(search: Option<&str>, quick: Option<&str>, sort: Option<&str>) -> Self {
        Self {
            search: normalize_search(search),
            quick: QuickFilter::parse(quick),
            sort: Sort::parse(sort, TICKET_SORT),
        }
    }
}

/// Blank or whitespace-only search means "no search".
pub fn normalize_search(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parses_known_column_and_direction() {
        let sort = Sort::parse(Some("subject:asc"), TICKET_SORT);
        assert_eq!(sort.column, SortColumn::Subject);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn unknown_column_yields_default() {
        let sort = Sort::parse(Some("unknownColumn:asc"), TICKET_SORT);
        assert_eq!(sort, Sort::default());
    }

    #[test]
    fn malformed_sort_yields_default() {
        for raw in ["whatever", "", ":", "subject:", ":asc", "subject:sideways"] {
            assert_eq!(Sort::parse(Some(raw), TICKET_SORT), Sort::default(), "{raw:?}");
        }
        assert_eq!(Sort::parse(None, TICKET_SORT), Sort::default());
    }

    #[test]
    fn column_outside_allow_list_yields_default() {
        // `subject` is a real column but not sortable on the companies list
        let sort = Sort::parse(Some("subject:asc"), COMPANY_SORT);
        assert_eq!(sort, Sort::default());
    }

    #[test]
    fn default_sort_is_created_at_desc() {
        let sort = Sort::default();
        assert_eq!(sort.column, SortColumn::CreatedAt);
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn quick_filter_drops_unknown_values() {
        assert_eq!(QuickFilter::parse(Some("open")), Some(QuickFilter::Open));
        assert_eq!(QuickFilter::parse(Some("OPEN")), Some(QuickFilter::Open));
        assert_eq!(QuickFilter::parse(Some("urgent")), None);
        assert_eq!(QuickFilter::parse(None), None);
    }

    #[test]
    fn blank_search_collapses_to_none() {
        let filter = TicketFilter::from_params(Some("   "), None, None);
        assert_eq!(filter.search, None);

        let filter = TicketFilter::from_params(Some(" printer "), None, None);
        assert_eq!(filter.search.as_deref(), Some("printer"));
    }
}
