// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use dealdesk_api::Client;
use dealdesk_api::mock::MockData;
use dealdesk_app::{
    ActivityEntry, Customer, CustomerMetrics, DashboardSummary, Deal, DealId, DealMetrics,
    DealStatus, SalesPoint, Task, TaskId, TaskStatus,
};
use time::OffsetDateTime;

/// Production runtime: every call goes straight to the CRM backend over
/// the blocking HTTP client.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl dealdesk_tui::AppRuntime for HttpRuntime {
    fn load_customer_page(&mut self, page: usize, page_size: usize) -> Result<Vec<Customer>> {
        self.client.customer_page(page, page_size)
    }

    fn load_deals(&mut self) -> Result<Vec<Deal>> {
        self.client.deals()
    }

    fn load_tasks(&mut self) -> Result<Vec<Task>> {
        self.client.tasks()
    }

    fn load_summary(&mut self) -> Result<DashboardSummary> {
        self.client.dashboard_summary()
    }

    fn load_activity(&mut self) -> Result<Vec<ActivityEntry>> {
        self.client.recent_activity()
    }

    fn load_sales(&mut self) -> Result<Vec<SalesPoint>> {
        self.client.sales_overview()
    }

    fn load_customer_metrics(&mut self) -> Result<CustomerMetrics> {
        self.client.customer_metrics()
    }

    fn load_deal_metrics(&mut self) -> Result<DealMetrics> {
        self.client.deal_metrics()
    }

    fn update_deal_status(&mut self, id: &DealId, status: DealStatus) -> Result<Deal> {
        self.client.update_deal_status(id, status)
    }

    fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        self.client.update_task_status(id, status)
    }

    fn delete_deal(&mut self, id: &DealId) -> Result<()> {
        self.client.delete_deal(id)
    }

    fn delete_task(&mut self, id: &TaskId) -> Result<()> {
        self.client.delete_task(id)
    }
}

/// Offline runtime over the seeded in-memory dataset. Mutations stick for
/// the lifetime of the process.
pub struct MockRuntime {
    data: MockData,
}

impl MockRuntime {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            data: MockData::seed(now),
        }
    }
}

impl dealdesk_tui::AppRuntime for MockRuntime {
    fn load_customer_page(&mut self, page: usize, page_size: usize) -> Result<Vec<Customer>> {
        Ok(self.data.customer_page(page, page_size))
    }

    fn load_deals(&mut self) -> Result<Vec<Deal>> {
        Ok(self.data.deals().to_vec())
    }

    fn load_tasks(&mut self) -> Result<Vec<Task>> {
        Ok(self.data.tasks().to_vec())
    }

    fn load_summary(&mut self) -> Result<DashboardSummary> {
        Ok(self.data.summary())
    }

    fn load_activity(&mut self) -> Result<Vec<ActivityEntry>> {
        Ok(self.data.activity())
    }

    fn load_sales(&mut self) -> Result<Vec<SalesPoint>> {
        Ok(self.data.sales())
    }

    fn load_customer_metrics(&mut self) -> Result<CustomerMetrics> {
        Ok(self.data.customer_metrics())
    }

    fn load_deal_metrics(&mut self) -> Result<DealMetrics> {
        Ok(self.data.deal_metrics())
    }

    fn update_deal_status(&mut self, id: &DealId, status: DealStatus) -> Result<Deal> {
        self.data.update_deal_status(id, status)
    }

    fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        self.data.update_task_status(id, status)
    }

    fn delete_deal(&mut self, id: &DealId) -> Result<()> {
        self.data.delete_deal(id)
    }

    fn delete_task(&mut self, id: &TaskId) -> Result<()> {
        self.data.delete_task(id)
    }
}

#[cfg(test)]
mod tests {
    use super::MockRuntime;
    use dealdesk_app::{DealId, DealStatus, TaskId, TaskStatus};
    use dealdesk_tui::AppRuntime;
    use time::OffsetDateTime;

    fn runtime() -> MockRuntime {
        MockRuntime::new(OffsetDateTime::UNIX_EPOCH)
    }

    #[test]
    fn mock_runtime_pages_customers() {
        let mut runtime = runtime();
        let first = runtime.load_customer_page(1, 10).expect("page 1");
        let second = runtime.load_customer_page(2, 10).expect("page 2");
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert_ne!(first[0].id, second[0].id);
    }

    #[test]
    fn mock_runtime_mutations_stick() {
        let mut runtime = runtime();
        let updated = runtime
            .update_deal_status(&DealId::from("deal5"), DealStatus::Qualified)
            .expect("update deal");
        assert_eq!(updated.status, DealStatus::Qualified);

        let deals = runtime.load_deals().expect("load deals");
        let deal = deals
            .iter()
            .find(|deal| deal.id.as_str() == "deal5")
            .expect("deal present");
        assert_eq!(deal.status, DealStatus::Qualified);

        runtime
            .delete_task(&TaskId::from("task1"))
            .expect("delete task");
        let tasks = runtime.load_tasks().expect("load tasks");
        assert!(tasks.iter().all(|task| task.id.as_str() != "task1"));
    }

    #[test]
    fn mock_runtime_rejects_unknown_ids() {
        let mut runtime = runtime();
        assert!(
            runtime
                .update_task_status(&TaskId::from("task99"), TaskStatus::Completed)
                .is_err()
        );
        assert!(runtime.delete_deal(&DealId::from("deal99")).is_err());
    }
}
