// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic CRM fixtures for tests. Everything derives from the
//! `now` you pass in, so assertions on dates stay stable.

use time::{Duration, OffsetDateTime};

use dealdesk_app::{
    Customer, CustomerId, CustomerStatus, Deal, DealId, DealStatus, RelatedKind, RelatedRecord,
    Task, TaskId, TaskPriority, TaskStatus, UserId,
};

const COMPANY_ADJECTIVES: [&str; 10] = [
    "Summit", "Harbor", "Beacon", "Cascade", "Meridian", "Juniper", "Atlas", "Crescent", "Vista",
    "Lantern",
];
const COMPANY_NOUNS: [&str; 8] = [
    "Systems", "Partners", "Labs", "Logistics", "Consulting", "Holdings", "Works", "Analytics",
];

/// Synthesized customer feed of the requested length, cycling through
/// the status values. Ids run `cust1..custN` in order.
pub fn sample_customers(now: OffsetDateTime, count: usize) -> Vec<Customer> {
    (0..count)
        .map(|index| {
            let adjective = COMPANY_ADJECTIVES[index % COMPANY_ADJECTIVES.len()];
            let noun = COMPANY_NOUNS[(index / COMPANY_ADJECTIVES.len() + index) % COMPANY_NOUNS.len()];
            let name = format!("{adjective} {noun}");
            let status = CustomerStatus::ALL[index % CustomerStatus::ALL.len()];
            let days = index as i64 + 1;
            Customer {
                id: CustomerId::new(format!("cust{}", index + 1)),
                name: name.clone(),
                email: format!(
                    "contact@{}{}.example.com",
                    adjective.to_lowercase(),
                    noun.to_lowercase()
                ),
                phone: format!("+1 (555) 010-{:04}", index + 1),
                company: name,
                status,
                notes: String::new(),
                last_contact: Some(now - Duration::days(days)),
                created_at: now - Duration::days(days * 10),
                updated_at: now - Duration::days(days),
            }
        })
        .collect()
}

/// Five deals spread across the pipeline, one per customer. Values and
/// stages match the stock CRM dataset, so kanban column totals are easy
/// to assert against.
pub fn sample_deals(now: OffsetDateTime) -> Vec<Deal> {
    let specs: [(&str, &str, i64, DealStatus, &str, &str, u8); 5] = [
        (
            "deal1",
            "Enterprise License Agreement",
            75_000,
            DealStatus::Negotiation,
            "cust1",
            "Acme Inc",
            80,
        ),
        (
            "deal2",
            "Software Implementation",
            45_000,
            DealStatus::Proposal,
            "cust2",
            "TechCorp Solutions",
            60,
        ),
        (
            "deal3",
            "Consulting Services",
            28_000,
            DealStatus::ClosedWon,
            "cust3",
            "Global Industries",
            100,
        ),
        (
            "deal4",
            "Starter Package",
            12_000,
            DealStatus::Qualified,
            "cust4",
            "Startup Innovators",
            50,
        ),
        (
            "deal5",
            "Support Contract",
            18_000,
            DealStatus::Lead,
            "cust5",
            "Local Business LLC",
            30,
        ),
    ];

    specs
        .into_iter()
        .enumerate()
        .map(
            |(index, (id, title, value, status, customer_id, customer_name, probability))| Deal {
                id: DealId::from(id),
                title: title.to_owned(),
                value,
                status,
                customer_id: CustomerId::from(customer_id),
                customer_name: customer_name.to_owned(),
                description: String::new(),
                closing_date: Some(now + Duration::days(15 + index as i64 * 5)),
                probability: Some(probability),
                assigned_to: Some(UserId::from(if index % 2 == 0 { "user1" } else { "user2" })),
                created_at: now - Duration::days(30 - index as i64 * 5),
                updated_at: now - Duration::days(index as i64 + 1),
            },
        )
        .collect()
}

/// Five tasks with due dates clustered in the days after `now`, linked
/// back to the sample deals and customers.
pub fn sample_tasks(now: OffsetDateTime) -> Vec<Task> {
    let specs: [(&str, &str, TaskStatus, TaskPriority, i64, RelatedKind, &str, &str); 5] = [
        (
            "task1",
            "Follow up on proposal",
            TaskStatus::Todo,
            TaskPriority::High,
            2,
            RelatedKind::Deal,
            "deal2",
            "Software Implementation",
        ),
        (
            "task2",
            "Prepare contract",
            TaskStatus::InProgress,
            TaskPriority::High,
            1,
            RelatedKind::Deal,
            "deal1",
            "Enterprise License Agreement",
        ),
        (
            "task3",
            "Schedule kickoff meeting",
            TaskStatus::Todo,
            TaskPriority::Medium,
            5,
            RelatedKind::Customer,
            "cust4",
            "Startup Innovators",
        ),
        (
            "task4",
            "Send invoice",
            TaskStatus::Todo,
            TaskPriority::Medium,
            3,
            RelatedKind::Deal,
            "deal3",
            "Consulting Services",
        ),
        (
            "task5",
            "Quarterly review",
            TaskStatus::Completed,
            TaskPriority::Low,
            10,
            RelatedKind::Customer,
            "cust1",
            "Acme Inc",
        ),
    ];

    specs
        .into_iter()
        .enumerate()
        .map(
            |(index, (id, title, status, priority, due_in, kind, related_id, related_name))| Task {
                id: TaskId::from(id),
                title: title.to_owned(),
                description: String::new(),
                status,
                priority,
                due_date: Some(now + Duration::days(due_in)),
                assigned_to: Some(UserId::from(if index % 2 == 0 { "user1" } else { "user2" })),
                related_to: Some(RelatedRecord {
                    kind,
                    id: related_id.to_owned(),
                    name: related_name.to_owned(),
                }),
                created_at: now - Duration::days(index as i64 + 1),
                updated_at: now - Duration::days(1),
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{sample_customers, sample_deals, sample_tasks};
    use dealdesk_app::DealStatus;
    use time::OffsetDateTime;

    #[test]
    fn fixtures_are_deterministic() {
        let now = OffsetDateTime::UNIX_EPOCH;
        assert_eq!(sample_customers(now, 30), sample_customers(now, 30));
        assert_eq!(sample_deals(now), sample_deals(now));
        assert_eq!(sample_tasks(now), sample_tasks(now));
    }

    #[test]
    fn customer_ids_are_sequential() {
        let customers = sample_customers(OffsetDateTime::UNIX_EPOCH, 12);
        assert_eq!(customers.len(), 12);
        assert_eq!(customers[0].id.as_str(), "cust1");
        assert_eq!(customers[11].id.as_str(), "cust12");
    }

    #[test]
    fn deals_cover_distinct_pipeline_stages() {
        let deals = sample_deals(OffsetDateTime::UNIX_EPOCH);
        let negotiation: i64 = deals
            .iter()
            .filter(|deal| deal.status == DealStatus::Negotiation)
            .map(|deal| deal.value)
            .sum();
        assert_eq!(negotiation, 75_000);
    }
}
