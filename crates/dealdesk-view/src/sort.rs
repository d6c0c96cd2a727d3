// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Typed sort key extracted from an item. `Missing` compares below every
/// present value, so absent fields group first ascending and last
/// descending once the direction flip is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(OffsetDateTime),
    Missing,
}

impl SortValue {
    fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Date(value) => value.to_string(),
            Self::Missing => String::new(),
        }
    }

    fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Missing, Self::Missing) => Ordering::Equal,
            (Self::Missing, _) => Ordering::Less,
            (_, Self::Missing) => Ordering::Greater,
            (Self::Text(left), Self::Text(right)) => {
                left.to_lowercase().cmp(&right.to_lowercase())
            }
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (Self::Float(left), Self::Float(right)) => left.total_cmp(right),
            (Self::Integer(left), Self::Float(right)) => (*left as f64).total_cmp(right),
            (Self::Float(left), Self::Integer(right)) => left.total_cmp(&(*right as f64)),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            _ => self
                .display()
                .to_lowercase()
                .cmp(&other.display().to_lowercase()),
        }
    }
}

pub type SortField<T> = fn(&T) -> SortValue;

/// Field/direction sort state plus the derived ordering. `sort` never
/// mutates its input and relies on the standard library's stable sort, so
/// equal keys keep their relative input order.
#[derive(Debug)]
pub struct Sorter<T> {
    fields: Vec<(&'static str, SortField<T>)>,
    field: Option<&'static str>,
    direction: SortDirection,
}

impl<T> Sorter<T> {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            field: None,
            direction: SortDirection::Asc,
        }
    }

    pub fn with_field(mut self, key: &'static str, field: SortField<T>) -> Self {
        self.fields.push((key, field));
        self
    }

    pub fn with_initial(mut self, key: &'static str, direction: SortDirection) -> Self {
        self.field = Some(key);
        self.direction = direction;
        self
    }

    pub const fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Registered sort keys, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(key, _)| *key)
    }

    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Same field flips direction; a new field selects ascending.
    pub fn toggle(&mut self, key: &'static str) {
        if self.field == Some(key) {
            self.direction = self.direction.flipped();
        } else {
            self.field = Some(key);
            self.direction = SortDirection::Asc;
        }
    }

    pub fn clear(&mut self) {
        self.field = None;
        self.direction = SortDirection::Asc;
    }

    /// Returns a sorted copy. With no field selected (or a field with no
    /// registered accessor) the input order is preserved.
    pub fn sort(&self, items: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = items.to_vec();
        let Some(selected) = self.field else {
            return out;
        };
        let Some(&(_, accessor)) = self.fields.iter().find(|(key, _)| *key == selected) else {
            return out;
        };

        out.sort_by(|left, right| {
            let order = accessor(left).cmp_value(&accessor(right));
            match self.direction {
                SortDirection::Asc => order,
                SortDirection::Desc => order.reverse(),
            }
        });
        out
    }
}

impl<T> Default for Sorter<T> {
    fn default() -> Self {
        Self::new()
    }
}
