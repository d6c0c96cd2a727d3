// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::debounce::Debouncer;
use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Accessor for a free-text searchable field. `None` never matches.
pub type SearchField<T> = fn(&T) -> Option<String>;

/// A named filter resolved at construction time: either strict equality
/// against an extracted value, or an arbitrary predicate over the item and
/// the raw filter value.
#[derive(Debug, Clone, Copy)]
pub enum FilterField<T> {
    Equals(fn(&T) -> String),
    Predicate(fn(&T, &str) -> bool),
}

/// A filter selection. `Any` is the "all"/empty sentinel and never excludes
/// items; it is how a select widget says "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FilterValue {
    #[default]
    Any,
    Is(String),
}

impl FilterValue {
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() || raw == "all" {
            Self::Any
        } else {
            Self::Is(raw.to_owned())
        }
    }

    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Is(_))
    }
}

/// Derives a filtered view of a source slice from a debounced free-text
/// query over declared search fields plus a set of named filters.
///
/// The engine never mutates or stores the source; `apply` recomputes the
/// derived array synchronously from whatever slice the owner currently
/// holds.
#[derive(Debug)]
pub struct FilterEngine<T> {
    search_fields: Vec<SearchField<T>>,
    filter_fields: BTreeMap<&'static str, FilterField<T>>,
    query: String,
    filters: BTreeMap<&'static str, String>,
    debouncer: Debouncer,
}

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

impl<T> FilterEngine<T> {
    pub fn new(debounce: Duration) -> Self {
        Self {
            search_fields: Vec::new(),
            filter_fields: BTreeMap::new(),
            query: String::new(),
            filters: BTreeMap::new(),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn with_search_field(mut self, field: SearchField<T>) -> Self {
        self.search_fields.push(field);
        self
    }

    pub fn with_filter_field(mut self, key: &'static str, field: FilterField<T>) -> Self {
        self.filter_fields.insert(key, field);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Schedules a query commit through the debounce channel. The message
    /// built by `build` must carry the returned token and the text back to
    /// [`FilterEngine::commit_query`].
    pub fn queue_query<M, F>(&mut self, text: &str, tx: &Sender<M>, build: F) -> u64
    where
        M: Send + 'static,
        F: FnOnce(u64, String) -> M,
    {
        let text = text.to_owned();
        self.debouncer.schedule(tx, move |token| build(token, text))
    }

    /// Applies a debounced query if its token is still current. Stale
    /// tokens (a newer keystroke was queued meanwhile) are dropped.
    pub fn commit_query(&mut self, token: u64, text: &str) -> bool {
        if !self.debouncer.accepts(token) {
            return false;
        }
        self.query = text.to_owned();
        true
    }

    /// Immediate query update, bypassing the debounce window.
    pub fn set_query(&mut self, text: &str) {
        self.debouncer.cancel();
        self.query = text.to_owned();
    }

    pub fn set_filter(&mut self, key: &'static str, value: FilterValue) {
        match value {
            FilterValue::Any => {
                self.filters.remove(key);
            }
            FilterValue::Is(raw) => {
                self.filters.insert(key, raw);
            }
        }
    }

    pub fn filter(&self, key: &str) -> FilterValue {
        self.filters
            .get(key)
            .map_or(FilterValue::Any, |raw| FilterValue::Is(raw.clone()))
    }

    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.query.clear();
        self.filters.clear();
    }

    pub fn is_pristine(&self) -> bool {
        self.query.is_empty() && self.filters.is_empty()
    }

    /// Recomputes the derived view: search first, then each active filter.
    /// Filter keys with no registered field never exclude anything.
    pub fn apply(&self, items: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = items.to_vec();

        if !self.query.is_empty() && !self.search_fields.is_empty() {
            let needle = self.query.to_lowercase();
            out.retain(|item| {
                self.search_fields.iter().any(|field| {
                    field(item).is_some_and(|value| value.to_lowercase().contains(&needle))
                })
            });
        }

        for (key, raw) in &self.filters {
            match self.filter_fields.get(key) {
                Some(FilterField::Equals(extract)) => out.retain(|item| extract(item) == *raw),
                Some(FilterField::Predicate(matches)) => out.retain(|item| matches(item, raw)),
                None => {}
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterEngine, FilterField, FilterValue};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Contact {
        name: &'static str,
        email: Option<&'static str>,
        company: &'static str,
        status: &'static str,
    }

    fn contacts() -> Vec<Contact> {
        vec![
            Contact {
                name: "John Doe",
                email: Some("john@acme.com"),
                company: "Acme Inc",
                status: "active",
            },
            Contact {
                name: "Jane Smith",
                email: Some("jane@techcorp.com"),
                company: "TechCorp",
                status: "active",
            },
            Contact {
                name: "Sam Lee",
                email: None,
                company: "Global Industries",
                status: "inactive",
            },
            Contact {
                name: "Ada Park",
                email: Some("ada@startup.io"),
                company: "Startup Innovators",
                status: "lead",
            },
            Contact {
                name: "Lee Wong",
                email: Some("lee@local.biz"),
                company: "Local Business LLC",
                status: "active",
            },
        ]
    }

    fn engine() -> FilterEngine<Contact> {
        FilterEngine::new(Duration::ZERO)
            .with_search_field(|contact: &Contact| Some(contact.name.to_owned()))
            .with_search_field(|contact| contact.email.map(str::to_owned))
            .with_search_field(|contact| Some(contact.company.to_owned()))
            .with_filter_field(
                "status",
                FilterField::Equals(|contact| contact.status.to_owned()),
            )
    }

    #[test]
    fn search_is_case_insensitive_substring_over_declared_fields() {
        let mut engine = engine();
        engine.set_query("JOHN");

        let matched = engine.apply(&contacts());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "John Doe");
    }

    #[test]
    fn missing_field_values_never_match() {
        let mut engine = engine();
        engine.set_query("sam");

        // "Sam Lee" matches on name even though email is None; searching
        // for an email-only fragment of another contact excludes Sam.
        assert_eq!(engine.apply(&contacts()).len(), 1);

        engine.set_query("@");
        let with_email = engine.apply(&contacts());
        assert!(with_email.iter().all(|contact| contact.email.is_some()));
    }

    #[test]
    fn output_is_a_subset_of_input() {
        let mut engine = engine();
        let source = contacts();
        for query in ["a", "acme", "zzz", ""] {
            engine.set_query(query);
            let out = engine.apply(&source);
            assert!(out.iter().all(|contact| source.contains(contact)));
        }
    }

    #[test]
    fn any_filter_value_is_a_no_op() {
        let mut engine = engine();
        let unfiltered = engine.apply(&contacts());

        engine.set_filter("status", FilterValue::from_raw("all"));
        assert_eq!(engine.apply(&contacts()), unfiltered);

        engine.set_filter("status", FilterValue::from_raw(""));
        assert_eq!(engine.apply(&contacts()), unfiltered);
    }

    #[test]
    fn equality_filter_keeps_exact_matches() {
        let mut engine = engine();
        engine.set_filter("status", FilterValue::Is("lead".to_owned()));

        let matched = engine.apply(&contacts());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Ada Park");
    }

    #[test]
    fn equality_filter_applies_even_when_search_already_emptied_the_set() {
        let mut engine = engine();
        engine.set_query("no such contact");
        engine.set_filter("status", FilterValue::Is("active".to_owned()));
        assert!(engine.apply(&contacts()).is_empty());
    }

    #[test]
    fn unregistered_filter_key_never_excludes() {
        let mut engine = engine();
        engine.set_filter("priority", FilterValue::Is("high".to_owned()));
        assert_eq!(engine.apply(&contacts()).len(), contacts().len());
    }

    #[test]
    fn custom_predicate_receives_item_and_value() {
        let mut engine = FilterEngine::new(Duration::ZERO).with_filter_field(
            "company-starts-with",
            FilterField::Predicate(|contact: &Contact, value| contact.company.starts_with(value)),
        );
        engine.set_filter("company-starts-with", FilterValue::Is("Tech".to_owned()));

        let matched = engine.apply(&contacts());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].company, "TechCorp");
    }

    #[test]
    fn stale_debounce_token_is_dropped() {
        let (tx, rx) = mpsc::channel();
        let mut engine = engine();

        let first = engine.queue_query("jo", &tx, |token, text| (token, text));
        let second = engine.queue_query("john", &tx, |token, text| (token, text));
        assert_ne!(first, second);

        let mut committed = Vec::new();
        for _ in 0..2 {
            let (token, text) = rx
                .recv_timeout(Duration::from_secs(2))
                .expect("debounced query should arrive");
            if engine.commit_query(token, &text) {
                committed.push(text);
            }
        }

        assert_eq!(committed, vec!["john".to_owned()]);
        assert_eq!(engine.query(), "john");
    }

    #[test]
    fn reset_clears_query_and_filters() {
        let mut engine = engine();
        engine.set_query("john");
        engine.set_filter("status", FilterValue::Is("active".to_owned()));
        assert!(!engine.is_pristine());

        engine.reset();
        assert!(engine.is_pristine());
        assert_eq!(engine.apply(&contacts()).len(), contacts().len());
    }
}
