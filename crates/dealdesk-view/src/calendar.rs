// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::util::days_in_year_month;
use time::{Date, Duration, Month, OffsetDateTime};

fn first_of(year: i32, month: Month) -> Date {
    Date::from_calendar_date(year, month, 1).expect("day 1 exists in every month")
}

/// Month view with a selected day. Weeks run Sunday through Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarState {
    month_start: Date,
    selected: Date,
}

impl CalendarState {
    pub fn new(now: OffsetDateTime) -> Self {
        let today = now.date();
        Self {
            month_start: first_of(today.year(), today.month()),
            selected: today,
        }
    }

    pub const fn month_start(&self) -> Date {
        self.month_start
    }

    pub const fn selected(&self) -> Date {
        self.selected
    }

    pub fn next_month(&mut self) {
        self.month_start = match self.month_start.month() {
            Month::December => first_of(self.month_start.year() + 1, Month::January),
            month => first_of(self.month_start.year(), month.next()),
        };
    }

    pub fn prev_month(&mut self) {
        self.month_start = match self.month_start.month() {
            Month::January => first_of(self.month_start.year() - 1, Month::December),
            month => first_of(self.month_start.year(), month.previous()),
        };
    }

    /// Jumps back to the current month and selects today.
    pub fn today(&mut self, now: OffsetDateTime) {
        *self = Self::new(now);
    }

    pub fn select(&mut self, day: Date) {
        self.selected = day;
    }

    fn month_end(&self) -> Date {
        let days = days_in_year_month(self.month_start.year(), self.month_start.month());
        Date::from_calendar_date(self.month_start.year(), self.month_start.month(), days)
            .expect("last day exists in every month")
    }

    /// Every day shown for the month: whole weeks, so the list starts on
    /// the Sunday at or before the 1st and ends on the Saturday at or
    /// after the last day. Always a multiple of seven days.
    pub fn grid(&self) -> Vec<Date> {
        let lead = i64::from(self.month_start.weekday().number_days_from_sunday());
        let last = self.month_end();
        let trail = 6 - i64::from(last.weekday().number_days_from_sunday());

        let mut day = self.month_start - Duration::days(lead);
        let end = last + Duration::days(trail);
        let mut days = Vec::new();
        while day <= end {
            days.push(day);
            day += Duration::days(1);
        }
        days
    }

    pub fn in_month(&self, day: Date) -> bool {
        day.year() == self.month_start.year() && day.month() == self.month_start.month()
    }
}

/// Whether a timestamp falls on the given calendar day.
pub fn same_day(moment: OffsetDateTime, day: Date) -> bool {
    moment.date() == day
}
