// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Built-in dataset for running without a backend. The five named
//! customers, deals, and tasks mirror the seed data the Flowgrid backend
//! ships with; a tail of synthesized customers makes the feed long enough
//! to exercise paging.

use anyhow::{Result, bail};
use time::{Duration, OffsetDateTime};

use dealdesk_app::{
    AcquisitionPoint, ActivityEntry, ActivityKind, ActivityUser, Customer, CustomerId,
    CustomerMetrics, CustomerStatus, DashboardSummary, Deal, DealId, DealMetrics, DealStatus,
    RelatedKind, RelatedRecord, SalesPoint, StageSlice, StatusSlice, Task, TaskId, TaskPriority,
    TaskStatus, UserId,
};

const EXTRA_COMPANIES: [&str; 20] = [
    "Northwind Traders",
    "Initech Systems",
    "Umbrella Supply Co",
    "Wayne Logistics",
    "Stark Components",
    "Pied Piper Labs",
    "Hooli Ventures",
    "Aperture Fixtures",
    "Vandelay Exports",
    "Dunder Paper Group",
    "Cyberdyne Tooling",
    "Tyrell Designs",
    "Soylent Foods",
    "Wonka Confections",
    "Gringotts Advisory",
    "Oscorp Research",
    "Prestige Worldwide",
    "Bluth Development",
    "Sterling Media",
    "Monarch Analytics",
];

/// In-memory stand-in for the CRM backend.
#[derive(Debug, Clone)]
pub struct MockData {
    now: OffsetDateTime,
    customers: Vec<Customer>,
    deals: Vec<Deal>,
    tasks: Vec<Task>,
}

impl MockData {
    pub fn seed(now: OffsetDateTime) -> Self {
        Self {
            now,
            customers: seed_customers(now),
            deals: seed_deals(now),
            tasks: seed_tasks(now),
        }
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// 1-based page of the customer list; short or empty at the tail,
    /// matching the backend's paging contract.
    pub fn customer_page(&self, page: usize, page_size: usize) -> Vec<Customer> {
        let start = page.saturating_sub(1).saturating_mul(page_size);
        self.customers
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect()
    }

    pub fn customer(&self, id: &CustomerId) -> Result<Customer> {
        match self.customers.iter().find(|customer| customer.id == *id) {
            Some(customer) => Ok(customer.clone()),
            None => bail!("customer {id} not found"),
        }
    }

    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    pub fn update_deal_status(&mut self, id: &DealId, status: DealStatus) -> Result<Deal> {
        let now = self.now;
        let Some(deal) = self.deals.iter_mut().find(|deal| deal.id == *id) else {
            bail!("deal {id} not found");
        };
        deal.status = status;
        deal.updated_at = now;
        Ok(deal.clone())
    }

    pub fn delete_deal(&mut self, id: &DealId) -> Result<()> {
        let before = self.deals.len();
        self.deals.retain(|deal| deal.id != *id);
        if self.deals.len() == before {
            bail!("deal {id} not found");
        }
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
        let now = self.now;
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == *id) else {
            bail!("task {id} not found");
        };
        task.status = status;
        task.updated_at = now;
        Ok(task.clone())
    }

    pub fn delete_task(&mut self, id: &TaskId) -> Result<()> {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != *id);
        if self.tasks.len() == before {
            bail!("task {id} not found");
        }
        Ok(())
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            total_customers: 156,
            total_deals: 32,
            total_tasks: 18,
            total_revenue: 287_500,
            revenue_change: 12.5,
            customer_change: 8.3,
            deals_change: 15.2,
            tasks_change: -5.1,
        }
    }

    pub fn activity(&self) -> Vec<ActivityEntry> {
        let entry = |id: &str, kind, action: &str, subject: &str, minutes_ago: i64, user: &str| {
            ActivityEntry {
                id: id.to_owned(),
                kind,
                action: action.to_owned(),
                subject: subject.to_owned(),
                timestamp: self.now - Duration::minutes(minutes_ago),
                user: ActivityUser {
                    name: user.to_owned(),
                    avatar: String::new(),
                },
            }
        };
        vec![
            entry(
                "act1",
                ActivityKind::Customer,
                "added a new customer",
                "Acme Inc",
                30,
                "John Doe",
            ),
            entry(
                "act2",
                ActivityKind::Deal,
                "closed a deal with",
                "TechCorp Solutions",
                120,
                "Jane Smith",
            ),
            entry(
                "act3",
                ActivityKind::Task,
                "completed a task for",
                "Quarterly Review",
                5 * 60,
                "John Doe",
            ),
            entry(
                "act4",
                ActivityKind::Deal,
                "updated the status of",
                "Enterprise Agreement",
                8 * 60,
                "Jane Smith",
            ),
            entry(
                "act5",
                ActivityKind::Customer,
                "added notes to",
                "Global Industries",
                24 * 60,
                "John Doe",
            ),
        ]
    }

    pub fn sales(&self) -> Vec<SalesPoint> {
        [
            ("Jan", 18_500),
            ("Feb", 22_300),
            ("Mar", 19_800),
            ("Apr", 24_500),
            ("May", 28_900),
            ("Jun", 32_400),
            ("Jul", 35_700),
            ("Aug", 33_200),
            ("Sep", 37_800),
            ("Oct", 42_100),
            ("Nov", 39_600),
            ("Dec", 45_200),
        ]
        .into_iter()
        .map(|(date, revenue)| SalesPoint {
            date: date.to_owned(),
            revenue,
        })
        .collect()
    }

    pub fn customer_metrics(&self) -> CustomerMetrics {
        let months = [
            ("Jan", 12),
            ("Feb", 8),
            ("Mar", 15),
            ("Apr", 10),
            ("May", 14),
            ("Jun", 12),
            ("Jul", 16),
            ("Aug", 13),
            ("Sep", 17),
            ("Oct", 15),
            ("Nov", 14),
            ("Dec", 10),
        ];
        CustomerMetrics {
            total: 156,
            active: 98,
            inactive: 32,
            leads: 26,
            growth: 8.3,
            acquisition: months
                .into_iter()
                .map(|(date, new_customers)| AcquisitionPoint {
                    date: date.to_owned(),
                    new_customers,
                })
                .collect(),
        }
    }

    pub fn deal_metrics(&self) -> DealMetrics {
        let stages = [
            ("Lead", 12),
            ("Qualified", 8),
            ("Proposal", 6),
            ("Negotiation", 4),
            ("Closed Won", 10),
            ("Closed Lost", 5),
        ];
        let statuses = [
            ("Lead", 85_000),
            ("Qualified", 62_000),
            ("Proposal", 48_000),
            ("Negotiation", 32_000),
            ("Closed Won", 45_000),
            ("Closed Lost", 15_500),
        ];
        DealMetrics {
            total_value: 287_500,
            avg_deal_size: 24_500,
            win_rate: 68.0,
            conversion_time: 32.0,
            growth: 12.5,
            stages: stages
                .into_iter()
                .map(|(stage, count)| StageSlice {
                    stage: stage.to_owned(),
                    count,
                })
                .collect(),
            statuses: statuses
                .into_iter()
                .map(|(status, value)| StatusSlice {
                    status: status.to_owned(),
                    value,
                })
                .collect(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn customer(
    now: OffsetDateTime,
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    status: CustomerStatus,
    notes: &str,
    contact_days_ago: i64,
    created_days_ago: i64,
) -> Customer {
    Customer {
        id: CustomerId::from(id),
        name: name.to_owned(),
        email: email.to_owned(),
        phone: phone.to_owned(),
        company: name.to_owned(),
        status,
        notes: notes.to_owned(),
        last_contact: Some(now - Duration::days(contact_days_ago)),
        created_at: now - Duration::days(created_days_ago),
        updated_at: now - Duration::days(contact_days_ago),
    }
}

fn seed_customers(now: OffsetDateTime) -> Vec<Customer> {
    let mut customers = vec![
        customer(
            now,
            "cust1",
            "Acme Inc",
            "contact@acmeinc.com",
            "+1 (555) 123-4567",
            CustomerStatus::Active,
            "Key enterprise client with multiple ongoing projects",
            3,
            90,
        ),
        customer(
            now,
            "cust2",
            "TechCorp Solutions",
            "info@techcorp.com",
            "+1 (555) 987-6543",
            CustomerStatus::Active,
            "Expanding their contract next quarter",
            5,
            120,
        ),
        customer(
            now,
            "cust3",
            "Global Industries",
            "contact@globalind.com",
            "+1 (555) 456-7890",
            CustomerStatus::Inactive,
            "Need to follow up on renewal",
            30,
            180,
        ),
        customer(
            now,
            "cust4",
            "Startup Innovators",
            "hello@startupinnovators.com",
            "+1 (555) 234-5678",
            CustomerStatus::Lead,
            "Interested in our premium plan",
            2,
            15,
        ),
        customer(
            now,
            "cust5",
            "Local Business LLC",
            "info@localbusiness.com",
            "+1 (555) 876-5432",
            CustomerStatus::Active,
            "Small account with growth potential",
            7,
            60,
        ),
    ];

    for (index, company) in EXTRA_COMPANIES.iter().enumerate() {
        let slug: String = company
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect();
        let status = CustomerStatus::ALL[index % CustomerStatus::ALL.len()];
        customers.push(customer(
            now,
            &format!("cust{}", index + 6),
            company,
            &format!("contact@{slug}.example.com"),
            &format!("+1 (555) 200-{:04}", index + 1),
            status,
            "",
            (index as i64 + 1) * 2,
            (index as i64 + 1) * 9,
        ));
    }
    customers
}

#[allow(clippy::too_many_arguments)]
fn deal(
    now: OffsetDateTime,
    id: &str,
    title: &str,
    value: i64,
    status: DealStatus,
    customer_id: &str,
    customer_name: &str,
    description: &str,
    closing_in_days: i64,
    probability: u8,
    assigned_to: &str,
    created_days_ago: i64,
    updated_days_ago: i64,
) -> Deal {
    Deal {
        id: DealId::from(id),
        title: title.to_owned(),
        value,
        status,
        customer_id: CustomerId::from(customer_id),
        customer_name: customer_name.to_owned(),
        description: description.to_owned(),
        closing_date: Some(now + Duration::days(closing_in_days)),
        probability: Some(probability),
        assigned_to: Some(UserId::from(assigned_to)),
        created_at: now - Duration::days(created_days_ago),
        updated_at: now - Duration::days(updated_days_ago),
    }
}

fn seed_deals(now: OffsetDateTime) -> Vec<Deal> {
    vec![
        deal(
            now,
            "deal1",
            "Enterprise License Agreement",
            75_000,
            DealStatus::Negotiation,
            "cust1",
            "Acme Inc",
            "Annual enterprise license renewal with additional seats",
            15,
            80,
            "user1",
            30,
            2,
        ),
        deal(
            now,
            "deal2",
            "Software Implementation",
            45_000,
            DealStatus::Proposal,
            "cust2",
            "TechCorp Solutions",
            "Implementation of our software platform with custom integrations",
            30,
            60,
            "user2",
            15,
            3,
        ),
        deal(
            now,
            "deal3",
            "Consulting Services",
            28_000,
            DealStatus::ClosedWon,
            "cust3",
            "Global Industries",
            "Strategic consulting services for Q3",
            -5,
            100,
            "user1",
            45,
            5,
        ),
        deal(
            now,
            "deal4",
            "Starter Package",
            12_000,
            DealStatus::Qualified,
            "cust4",
            "Startup Innovators",
            "Starter package with basic features",
            20,
            50,
            "user2",
            10,
            2,
        ),
        deal(
            now,
            "deal5",
            "Support Contract",
            18_000,
            DealStatus::Lead,
            "cust5",
            "Local Business LLC",
            "Annual support and maintenance contract",
            45,
            30,
            "user1",
            5,
            1,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn task(
    now: OffsetDateTime,
    id: &str,
    title: &str,
    description: &str,
    status: TaskStatus,
    priority: TaskPriority,
    due_in_days: i64,
    assigned_to: &str,
    related: (RelatedKind, &str, &str),
    created_days_ago: i64,
    updated_days_ago: i64,
) -> Task {
    let (kind, related_id, related_name) = related;
    Task {
        id: TaskId::from(id),
        title: title.to_owned(),
        description: description.to_owned(),
        status,
        priority,
        due_date: Some(now + Duration::days(due_in_days)),
        assigned_to: Some(UserId::from(assigned_to)),
        related_to: Some(RelatedRecord {
            kind,
            id: related_id.to_owned(),
            name: related_name.to_owned(),
        }),
        created_at: now - Duration::days(created_days_ago),
        updated_at: now - Duration::days(updated_days_ago),
    }
}

fn seed_tasks(now: OffsetDateTime) -> Vec<Task> {
    vec![
        task(
            now,
            "task1",
            "Follow up on proposal",
            "Send follow-up email regarding the submitted proposal",
            TaskStatus::Todo,
            TaskPriority::High,
            2,
            "user1",
            (
                RelatedKind::Deal,
                "deal2",
                "Software Implementation - TechCorp Solutions",
            ),
            3,
            1,
        ),
        task(
            now,
            "task2",
            "Prepare contract",
            "Draft the contract for the enterprise agreement",
            TaskStatus::InProgress,
            TaskPriority::High,
            1,
            "user2",
            (
                RelatedKind::Deal,
                "deal1",
                "Enterprise License Agreement - Acme Inc",
            ),
            5,
            1,
        ),
        task(
            now,
            "task3",
            "Schedule kickoff meeting",
            "Arrange a kickoff meeting with the client team",
            TaskStatus::Todo,
            TaskPriority::Medium,
            5,
            "user1",
            (RelatedKind::Customer, "cust4", "Startup Innovators"),
            2,
            2,
        ),
        task(
            now,
            "task4",
            "Send invoice",
            "Generate and send invoice for the closed deal",
            TaskStatus::Todo,
            TaskPriority::Medium,
            3,
            "user2",
            (
                RelatedKind::Deal,
                "deal3",
                "Consulting Services - Global Industries",
            ),
            1,
            1,
        ),
        task(
            now,
            "task5",
            "Quarterly review",
            "Conduct quarterly review of account performance",
            TaskStatus::Todo,
            TaskPriority::Low,
            10,
            "user1",
            (RelatedKind::Customer, "cust1", "Acme Inc"),
            7,
            7,
        ),
    ]
}
