// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use dealdesk_app::{
    ActivityEntry, Customer, CustomerId, CustomerMetrics, DashboardSummary, Deal, DealId,
    DealMetrics, DealStatus, SalesPoint, Task, TaskId, TaskStatus,
};

pub mod mock;

/// Blocking client for the Flowgrid CRM REST API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn customers(&self) -> Result<Vec<Customer>> {
        self.get_json("/customers")
    }

    /// One page of the customer feed. Pages are 1-based; the backend
    /// returns a short or empty page at the end of the collection.
    pub fn customer_page(&self, page: usize, page_size: usize) -> Result<Vec<Customer>> {
        self.get_json(&format!("/customers?page={page}&pageSize={page_size}"))
    }

    pub fn customer(&self, id: &CustomerId) -> Result<Customer> {
        self.get_json(&format!("/customers/{id}"))
    }

    pub fn deals(&self) -> Result<Vec<Deal>> {
        self.get_json("/deals")
    }

    /// Moves a deal to a new pipeline stage and returns the updated deal.
    pub fn update_deal_status(&self, id: &DealId, status: DealStatus) -> Result<Deal> {
        let response = self
            .http
            .patch(format!("{}/deals/{id}/status", self.base_url))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        decode(check(response)?).context("decode updated deal")
    }

    pub fn delete_deal(&self, id: &DealId) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/deals/{id}", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check(response)?;
        Ok(())
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.get_json("/tasks")
    }

    pub fn update_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let response = self
            .http
            .patch(format!("{}/tasks/{id}/status", self.base_url))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        decode(check(response)?).context("decode updated task")
    }

    pub fn delete_task(&self, id: &TaskId) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/tasks/{id}", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check(response)?;
        Ok(())
    }

    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        self.get_json("/dashboard/summary")
    }

    pub fn recent_activity(&self) -> Result<Vec<ActivityEntry>> {
        self.get_json("/dashboard/activity")
    }

    pub fn sales_overview(&self) -> Result<Vec<SalesPoint>> {
        self.get_json("/analytics/sales")
    }

    pub fn customer_metrics(&self) -> Result<CustomerMetrics> {
        self.get_json("/analytics/customers")
    }

    pub fn deal_metrics(&self) -> Result<DealMetrics> {
        self.get_json("/analytics/deals")
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        decode(check(response)?).with_context(|| format!("decode response for {path}"))
    }
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    Ok(response)
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    response.json().map_err(Into::into)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check api.base_url or run with --mock ({} )",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if let Some(message) = parsed.message.filter(|message| !message.is_empty()) {
            return anyhow!("server error ({}): {}", status.as_u16(), message);
        }
        if let Some(error) = parsed.error.filter(|error| !error.is_empty()) {
            return anyhow!("server error ({}): {}", status.as_u16(), error);
        }
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::Client;
    use std::time::Duration;

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        let client =
            Client::new("http://localhost:8080/api/", Duration::from_secs(5)).expect("client");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let error = Client::new("", Duration::from_secs(5)).expect_err("must reject");
        assert!(error.to_string().contains("api.base_url"));
    }
}
