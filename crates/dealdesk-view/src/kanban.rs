// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Anything that can sit on a board column.
pub trait BoardItem {
    type Status: Copy + Eq;

    fn id(&self) -> &str;
    fn status(&self) -> Self::Status;
    /// Contribution to a column's total, e.g. a deal's dollar value.
    fn weight(&self) -> i64;
}

/// Status change the owner must persist; the matching completion is
/// reported back through [`DragBoard::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange<S> {
    pub request_id: u64,
    pub item_id: String,
    pub status: S,
}

/// Outcome of dropping the picked-up item onto a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome<S> {
    /// A previous drop is still being persisted; this one is discarded.
    /// The item stays picked up so the user can drop again.
    Busy,
    /// Nothing was picked up.
    NoDrag,
    /// The dragged id no longer exists in the item list.
    NotFound,
    /// Dropped onto the column the item already lives in.
    AlreadyThere,
    /// The status change to persist.
    Change(StatusChange<S>),
}

/// Drag state for a kanban board. The board never mutates items itself;
/// a successful drop yields a [`StatusChange`] and the owner applies it
/// to its own list once persistence succeeds. At most one change is in
/// flight at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragBoard {
    dragging: Option<String>,
    in_flight: Option<u64>,
    next_request_id: u64,
}

impl Default for DragBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DragBoard {
    pub const fn new() -> Self {
        Self {
            dragging: None,
            in_flight: None,
            next_request_id: 0,
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub const fn is_processing(&self) -> bool {
        self.in_flight.is_some()
    }

    pub const fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn drag_start(&mut self, item_id: &str) {
        self.dragging = Some(item_id.to_owned());
    }

    pub fn drag_cancel(&mut self) {
        self.dragging = None;
    }

    pub fn drop_on<T: BoardItem>(
        &mut self,
        items: &[T],
        target: T::Status,
    ) -> DropOutcome<T::Status> {
        if self.in_flight.is_some() {
            return DropOutcome::Busy;
        }
        let Some(item_id) = self.dragging.take() else {
            return DropOutcome::NoDrag;
        };
        let Some(item) = items.iter().find(|item| item.id() == item_id) else {
            return DropOutcome::NotFound;
        };
        if item.status() == target {
            return DropOutcome::AlreadyThere;
        }
        self.next_request_id += 1;
        self.in_flight = Some(self.next_request_id);
        DropOutcome::Change(StatusChange {
            request_id: self.next_request_id,
            item_id,
            status: target,
        })
    }

    /// Clears the in-flight guard for the matching request and surfaces
    /// the error, if any. The guard is released on failure too, so a
    /// failed persist never wedges the board.
    pub fn complete(&mut self, request_id: u64, result: Result<(), String>) -> Option<String> {
        if self.in_flight != Some(request_id) {
            return None;
        }
        self.in_flight = None;
        result.err()
    }
}

/// Items belonging to one column, in input order.
pub fn column_items<'a, T: BoardItem>(items: &'a [T], status: T::Status) -> Vec<&'a T> {
    items.iter().filter(|item| item.status() == status).collect()
}

/// Sum of weights in one column.
pub fn column_total<T: BoardItem>(items: &[T], status: T::Status) -> i64 {
    items
        .iter()
        .filter(|item| item.status() == status)
        .map(BoardItem::weight)
        .sum()
}
