// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::TabKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Search,
}

/// How the deals tab presents its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealViewMode {
    Kanban,
    List,
}

impl DealViewMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Kanban => Self::List,
            Self::List => Self::Kanban,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Kanban => "board",
            Self::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskViewMode {
    List,
    Calendar,
}

impl TaskViewMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::List => Self::Calendar,
            Self::Calendar => Self::List,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Calendar => "calendar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_tab: TabKind,
    pub deal_view: DealViewMode,
    pub task_view: TaskViewMode,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            active_tab: TabKind::Dashboard,
            deal_view: DealViewMode::Kanban,
            task_view: TaskViewMode::List,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextTab,
    PrevTab,
    GoToTab(TabKind),
    EnterSearch,
    ExitSearch,
    ToggleDealView,
    ToggleTaskView,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    TabChanged(TabKind),
    DealViewChanged(DealViewMode),
    TaskViewChanged(TaskViewMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextTab => self.rotate_tab(1),
            AppCommand::PrevTab => self.rotate_tab(-1),
            AppCommand::GoToTab(tab) => {
                self.active_tab = tab;
                vec![AppEvent::TabChanged(self.active_tab)]
            }
            AppCommand::EnterSearch => {
                self.mode = AppMode::Search;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitSearch => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("nav")]
            }
            AppCommand::ToggleDealView => {
                self.deal_view = self.deal_view.toggled();
                vec![
                    AppEvent::DealViewChanged(self.deal_view),
                    self.set_status(self.deal_view.label()),
                ]
            }
            AppCommand::ToggleTaskView => {
                self.task_view = self.task_view.toggled();
                vec![
                    AppEvent::TaskViewChanged(self.task_view),
                    self.set_status(self.task_view.label()),
                ]
            }
            AppCommand::SetStatus(message) => {
                vec![self.set_status(&message)]
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_tab(&mut self, delta: isize) -> Vec<AppEvent> {
        let tabs = TabKind::ALL;
        let current = tabs
            .iter()
            .position(|tab| *tab == self.active_tab)
            .unwrap_or(0) as isize;
        let len = tabs.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_tab = tabs[next];
        vec![AppEvent::TabChanged(self.active_tab)]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
