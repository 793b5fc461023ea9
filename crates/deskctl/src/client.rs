//! HTTP client for the deskd API.
//!
//! All calls go through the retry wrapper: bounded retries for
//! transient failures, per-attempt timeouts, and a single-flight guard
//! per client instance so two commands can't interleave page fetches.

use crate::retry::{fetch_with_retry, FetchError, RetryPolicy, SingleFlight};
use crate::views::{DashboardView, HealthView};
use anyhow::{anyhow, Result};
use desk_common::{Campaign, Company, Page, Ticket, TicketFilter};
use serde::de::DeserializeOwned;

/// Client for one deskd instance.
pub struct DeskClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    policy: RetryPolicy,
    flight: SingleFlight,
}

impl DeskClient {
    pub fn new(base_url: &str, token: &str, policy: RetryPolicy) -> Result<Self> {
        // No per-request reqwest timeout: the retry wrapper bounds
        // every attempt itself
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow!("Cannot build HTTP client: {e}"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
            policy,
            flight: SingleFlight::new(),
        })
    }

    pub async fn list_tickets(
        &self,
        offset: u64,
        limit: u64,
        filter: &TicketFilter,
    ) -> Result<Page<Ticket>, FetchError> {
        let mut query = vec![
            ("offset".to_string(), offset.to_string()),
            ("limit".to_string(), limit.to_string()),
            ("sort".to_string(), filter.sort.to_string()),
        ];
        if let Some(search) = &filter.search {
            query.push(("search".to_string(), search.clone()));
        }
        if let Some(quick) = filter.quick {
            query.push(("quick".to_string(), quick.as_str().to_string()));
        }
        self.get_json("/api/tickets/list", &query).await
    }

    pub async fn list_companies(
        &self,
        offset: u64,
        limit: u64,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Page<Company>, FetchError> {
        self.get_json("/api/companies/list", &list_query(offset, limit, search, sort))
            .await
    }

    pub async fn list_campaigns(
        &self,
        offset: u64,
        limit: u64,
        search: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Page<Campaign>, FetchError> {
        self.get_json("/api/campaigns/list", &list_query(offset, limit, search, sort))
            .await
    }

    pub async fn dashboard(
        &self,
        period: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        include_old: bool,
    ) -> Result<DashboardView, FetchError> {
        let mut query = Vec::new();
        if let Some(period) = period {
            query.push(("period".to_string(), period.to_string()));
        }
        if let Some(start) = start_date {
            query.push(("start_date".to_string(), start.to_string()));
        }
        if let Some(end) = end_date {
            query.push(("end_date".to_string(), end.to_string()));
        }
        if include_old {
            query.push(("include_old".to_string(), "true".to_string()));
        }
        self.get_json("/api/dashboard/filtered", &query).await
    }

    pub async fn health(&self) -> Result<HealthView, FetchError> {
        self.get_json("/v1/health", &[]).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        fetch_with_retry(&self.policy, &self.flight, |_| self.send(&url, query)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Network(format!("unparsable response: {e}")))
    }
}

fn list_query(
    offset: u64,
    limit: u64,
    search: Option<&str>,
    sort: Option<&str>,
) -> Vec<(String, String)> {
    let mut query = vec![
        ("offset".to_string(), offset.to_string()),
        ("limit".to_string(), limit.to_string()),
    ];
    if let Some(search) = search {
        query.push(("search".to_string(), search.to_string()));
    }
    if let Some(sort) = sort {
        query.push(("sort".to_string(), sort.to_string()));
    }
    query
}

fn map_reqwest(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Network(e.to_string())
    }
}
