// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use dealdesk_app::{
    ActivityEntry, AppCommand, AppMode, AppState, Customer, CustomerMetrics, CustomerStatus,
    DashboardSummary, Deal, DealId, DealMetrics, DealStatus, DealViewMode, SalesPoint, TabKind,
    Task, TaskId, TaskStatus, TaskViewMode,
};
use dealdesk_view::{
    CalendarState, DragBoard, DropOutcome, FilterEngine, FilterField, FilterValue, InfiniteScroll,
    SortDirection, SortValue, Sorter, column_items, column_total, same_day,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{Date, Month, OffsetDateTime};

const CUSTOMER_PAGE_SIZE: usize = 10;

/// Everything the terminal client needs from the outside world. The CLI
/// wires in either the HTTP client or the in-memory mock; tests stub it
/// with fixture data.
pub trait AppRuntime {
    fn load_customer_page(&mut self, page: usize, page_size: usize) -> Result<Vec<Customer>>;
    fn load_deals(&mut self) -> Result<Vec<Deal>>;
    fn load_tasks(&mut self) -> Result<Vec<Task>>;
    fn load_summary(&mut self) -> Result<DashboardSummary>;
    fn load_activity(&mut self) -> Result<Vec<ActivityEntry>>;
    fn load_sales(&mut self) -> Result<Vec<SalesPoint>>;
    fn load_customer_metrics(&mut self) -> Result<CustomerMetrics>;
    fn load_deal_metrics(&mut self) -> Result<DealMetrics>;
    fn update_deal_status(&mut self, id: &DealId, status: DealStatus) -> Result<Deal>;
    fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task>;
    fn delete_deal(&mut self, id: &DealId) -> Result<()>;
    fn delete_task(&mut self, id: &TaskId) -> Result<()>;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    /// Fetches one feed page and reports the outcome through the internal
    /// event channel. Completions are matched by request id, so a late
    /// result can never clobber a feed that was reset meanwhile.
    fn spawn_customer_page(
        &mut self,
        request_id: u64,
        page: usize,
        page_size: usize,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .load_customer_page(page, page_size)
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::CustomerPage { request_id, result })
            .map_err(|_| anyhow!("internal event channel closed"))
    }

    fn spawn_deal_status(
        &mut self,
        request_id: u64,
        id: &DealId,
        status: DealStatus,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .update_deal_status(id, status)
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::DealStatusSaved { request_id, result })
            .map_err(|_| anyhow!("internal event channel closed"))
    }

    fn spawn_task_status(
        &mut self,
        request_id: u64,
        id: &TaskId,
        status: TaskStatus,
        tx: &Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .update_task_status(id, status)
            .map_err(|error| error.to_string());
        tx.send(InternalEvent::TaskStatusSaved { request_id, result })
            .map_err(|_| anyhow!("internal event channel closed"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    /// A debounced search query survived its quiet window.
    SearchCommitted {
        tab: TabKind,
        token: u64,
        query: String,
    },
    CustomerPage {
        request_id: u64,
        result: Result<Vec<Customer>, String>,
    },
    DealStatusSaved {
        request_id: u64,
        result: Result<Deal, String>,
    },
    TaskStatusSaved {
        request_id: u64,
        result: Result<Task, String>,
    },
}

pub struct CustomerView {
    pub feed: InfiniteScroll<Customer>,
    pub filter: FilterEngine<Customer>,
    pub sorter: Sorter<Customer>,
    pub selected: usize,
}

impl CustomerView {
    fn new(debounce: Duration, page_size: usize) -> Self {
        Self {
            feed: InfiniteScroll::new(page_size),
            filter: FilterEngine::new(debounce)
                .with_search_field(|customer: &Customer| Some(customer.name.clone()))
                .with_search_field(|customer: &Customer| Some(customer.email.clone()))
                .with_search_field(|customer: &Customer| {
                    if customer.company.is_empty() {
                        None
                    } else {
                        Some(customer.company.clone())
                    }
                })
                .with_filter_field(
                    "status",
                    FilterField::Equals(|customer: &Customer| customer.status.as_str().to_owned()),
                ),
            sorter: Sorter::new()
                .with_field("name", |customer: &Customer| {
                    SortValue::Text(customer.name.clone())
                })
                .with_field("company", |customer: &Customer| {
                    SortValue::Text(customer.company.clone())
                })
                .with_field("status", |customer: &Customer| {
                    SortValue::Text(customer.status.as_str().to_owned())
                })
                .with_field("contact", |customer: &Customer| {
                    customer
                        .last_contact
                        .map_or(SortValue::Missing, SortValue::Date)
                }),
            selected: 0,
        }
    }

    pub fn visible(&self) -> Vec<Customer> {
        self.sorter.sort(&self.filter.apply(self.feed.items()))
    }
}

pub struct DealView {
    pub deals: Vec<Deal>,
    pub filter: FilterEngine<Deal>,
    pub sorter: Sorter<Deal>,
    pub board: DragBoard,
    pub column: usize,
    pub card: usize,
    pub selected: usize,
}

impl DealView {
    fn new(debounce: Duration) -> Self {
        Self {
            deals: Vec::new(),
            filter: FilterEngine::new(debounce)
                .with_search_field(|deal: &Deal| Some(deal.title.clone()))
                .with_search_field(|deal: &Deal| Some(deal.customer_name.clone()))
                .with_filter_field(
                    "stage",
                    FilterField::Equals(|deal: &Deal| deal.status.as_str().to_owned()),
                ),
            sorter: Sorter::new()
                .with_field("title", |deal: &Deal| SortValue::Text(deal.title.clone()))
                .with_field("value", |deal: &Deal| SortValue::Integer(deal.value))
                .with_field("stage", |deal: &Deal| {
                    SortValue::Text(deal.status.as_str().to_owned())
                })
                .with_field("closing", |deal: &Deal| {
                    deal.closing_date
                        .map_or(SortValue::Missing, SortValue::Date)
                }),
            board: DragBoard::new(),
            column: 0,
            card: 0,
            selected: 0,
        }
    }

    /// Search and stage filter applied, list order untouched. The kanban
    /// columns group this themselves.
    pub fn visible(&self) -> Vec<Deal> {
        self.filter.apply(&self.deals)
    }

    pub fn visible_sorted(&self) -> Vec<Deal> {
        self.sorter.sort(&self.visible())
    }

    fn apply_saved(&mut self, saved: Deal) {
        if let Some(deal) = self.deals.iter_mut().find(|deal| deal.id == saved.id) {
            *deal = saved;
        }
    }
}

pub struct TaskView {
    pub tasks: Vec<Task>,
    pub filter: FilterEngine<Task>,
    pub sorter: Sorter<Task>,
    pub calendar: CalendarState,
    pub selected: usize,
    saving: Option<u64>,
    next_request_id: u64,
}

impl TaskView {
    fn new(debounce: Duration, now: OffsetDateTime) -> Self {
        Self {
            tasks: Vec::new(),
            filter: FilterEngine::new(debounce)
                .with_search_field(|task: &Task| Some(task.title.clone()))
                .with_search_field(|task: &Task| {
                    if task.description.is_empty() {
                        None
                    } else {
                        Some(task.description.clone())
                    }
                })
                .with_filter_field(
                    "status",
                    FilterField::Equals(|task: &Task| task.status.as_str().to_owned()),
                ),
            sorter: Sorter::new()
                .with_field("title", |task: &Task| SortValue::Text(task.title.clone()))
                .with_field("priority", |task: &Task| {
                    SortValue::Integer(task.priority as i64)
                })
                .with_field("status", |task: &Task| SortValue::Integer(task.status as i64))
                .with_field("due", |task: &Task| {
                    task.due_date.map_or(SortValue::Missing, SortValue::Date)
                }),
            calendar: CalendarState::new(now),
            selected: 0,
            saving: None,
            next_request_id: 0,
        }
    }

    pub fn visible(&self) -> Vec<Task> {
        self.sorter.sort(&self.filter.apply(&self.tasks))
    }

    pub fn due_on(&self, day: Date) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.due_date.is_some_and(|due| same_day(due, day)))
            .cloned()
            .collect()
    }

    fn apply_saved(&mut self, saved: Task) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == saved.id) {
            *task = saved;
        }
    }
}

#[derive(Default)]
pub struct DashboardView {
    pub summary: Option<DashboardSummary>,
    pub activity: Vec<ActivityEntry>,
}

#[derive(Default)]
pub struct AnalyticsView {
    pub sales: Vec<SalesPoint>,
    pub customer_metrics: Option<CustomerMetrics>,
    pub deal_metrics: Option<DealMetrics>,
}

/// Per-tab derived view state, kept outside [`AppState`] because none of
/// it survives a restart.
pub struct ViewData {
    pub status_token: u64,
    pub search_input: String,
    pub customers: CustomerView,
    pub deals: DealView,
    pub tasks: TaskView,
    pub dashboard: DashboardView,
    pub analytics: AnalyticsView,
}

impl ViewData {
    pub fn new(debounce: Duration, now: OffsetDateTime) -> Self {
        Self {
            status_token: 0,
            search_input: String::new(),
            customers: CustomerView::new(debounce, CUSTOMER_PAGE_SIZE),
            deals: DealView::new(debounce),
            tasks: TaskView::new(debounce, now),
            dashboard: DashboardView::default(),
            analytics: AnalyticsView::default(),
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    debounce: Duration,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(debounce, runtime.now());
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(runtime, &mut view_data, &internal_tx) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(state, runtime, &mut view_data, &internal_tx, key)
        {
            break;
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

pub fn refresh_view_data<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> Result<()> {
    view_data.deals.deals = runtime.load_deals().context("load deals")?;
    view_data.tasks.tasks = runtime.load_tasks().context("load tasks")?;
    view_data.dashboard.summary = Some(runtime.load_summary().context("load dashboard summary")?);
    view_data.dashboard.activity = runtime.load_activity().context("load recent activity")?;
    view_data.analytics.sales = runtime.load_sales().context("load sales overview")?;
    view_data.analytics.customer_metrics = Some(
        runtime
            .load_customer_metrics()
            .context("load customer metrics")?,
    );
    view_data.analytics.deal_metrics =
        Some(runtime.load_deal_metrics().context("load deal metrics")?);
    ensure_customer_page(runtime, view_data, internal_tx)?;
    Ok(())
}

/// Issues a feed fetch when the selection sits at the tail of what the
/// user can see. The selection reaching the last visible row is the
/// terminal equivalent of the scroll sentinel coming into view, and the
/// visible list is what matters: an active search can shrink it well
/// below the loaded feed, and the matching rows may sit on pages not yet
/// fetched.
pub fn ensure_customer_page<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> Result<()> {
    let visible = view_data.customers.visible().len();
    let at_tail = visible == 0 || view_data.customers.selected + 1 >= visible;
    let Some(request) = view_data.customers.feed.poll(at_tail) else {
        return Ok(());
    };
    let page_size = view_data.customers.feed.page_size();
    runtime.spawn_customer_page(request.request_id, request.page, page_size, internal_tx)
}

pub fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::SearchCommitted { tab, token, query } => {
                apply_search_commit(view_data, tab, token, &query);
            }
            InternalEvent::CustomerPage { request_id, result } => {
                let failed = result.is_err();
                if view_data.customers.feed.complete(request_id, result) && failed {
                    let message = view_data
                        .customers
                        .feed
                        .error()
                        .unwrap_or("unknown error")
                        .to_owned();
                    emit_status(
                        state,
                        view_data,
                        tx,
                        format!("customer load failed: {message}"),
                    );
                }
            }
            InternalEvent::DealStatusSaved { request_id, result } => {
                handle_deal_saved(state, view_data, tx, request_id, result);
            }
            InternalEvent::TaskStatusSaved { request_id, result } => {
                handle_task_saved(state, view_data, tx, request_id, result);
            }
        }
    }
}

fn apply_search_commit(view_data: &mut ViewData, tab: TabKind, token: u64, query: &str) {
    let committed = match tab {
        TabKind::Customers => view_data.customers.filter.commit_query(token, query),
        TabKind::Deals => view_data.deals.filter.commit_query(token, query),
        TabKind::Tasks => view_data.tasks.filter.commit_query(token, query),
        _ => false,
    };
    if committed {
        clamp_selections(view_data);
    }
}

fn handle_deal_saved(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request_id: u64,
    result: Result<Deal, String>,
) {
    if view_data.deals.board.in_flight() != Some(request_id) {
        return;
    }
    let completion = result.as_ref().map(|_| ()).map_err(Clone::clone);
    let error = view_data.deals.board.complete(request_id, completion);
    match (result, error) {
        (Ok(deal), _) => {
            let message = format!("moved {:?} to {}", deal.title, deal.status.label());
            view_data.deals.apply_saved(deal);
            emit_status(state, view_data, tx, message);
        }
        (Err(_), Some(message)) => {
            emit_status(state, view_data, tx, format!("move failed: {message}"));
        }
        (Err(_), None) => {}
    }
}

fn handle_task_saved(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request_id: u64,
    result: Result<Task, String>,
) {
    if view_data.tasks.saving != Some(request_id) {
        return;
    }
    view_data.tasks.saving = None;
    match result {
        Ok(task) => {
            let message = format!("{:?} is now {}", task.title, task.status.label());
            view_data.tasks.apply_saved(task);
            emit_status(state, view_data, tx, message);
        }
        Err(error) => {
            emit_status(state, view_data, tx, format!("task update failed: {error}"));
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

/// Shows a transient status line and schedules its clearance. Bumping the
/// token first invalidates any clear still pending for an older message.
fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

pub fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.mode == AppMode::Search {
        handle_search_key(state, view_data, internal_tx, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Tab, _) => {
            state.dispatch(AppCommand::NextTab);
            clamp_selections(view_data);
        }
        (KeyCode::BackTab, _) => {
            state.dispatch(AppCommand::PrevTab);
            clamp_selections(view_data);
        }
        (KeyCode::Char('/'), KeyModifiers::NONE) => {
            if searchable(state.active_tab) {
                view_data.search_input = active_query(state.active_tab, view_data);
                state.dispatch(AppCommand::EnterSearch);
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            view_data.customers.feed.reset();
            view_data.customers.selected = 0;
            match refresh_view_data(runtime, view_data, internal_tx) {
                Ok(()) => emit_status(state, view_data, internal_tx, "reloaded"),
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("reload failed: {error}"),
                    );
                }
            }
        }
        (KeyCode::Char('v'), KeyModifiers::NONE) => match state.active_tab {
            TabKind::Deals => {
                state.dispatch(AppCommand::ToggleDealView);
            }
            TabKind::Tasks => {
                state.dispatch(AppCommand::ToggleTaskView);
            }
            _ => {}
        },
        (KeyCode::Char('g'), KeyModifiers::NONE) => {
            cycle_status_filter(state, view_data, internal_tx);
        }
        (KeyCode::Char('o'), KeyModifiers::NONE) => {
            cycle_sort_field(state, view_data, internal_tx);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            toggle_sort_direction(state, view_data, internal_tx);
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            delete_selected(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Enter, _) => {
            if state.active_tab == TabKind::Tasks {
                advance_selected_task(state, runtime, view_data, internal_tx);
            }
        }
        (KeyCode::Char(' '), KeyModifiers::NONE) => {
            if state.active_tab == TabKind::Deals && state.deal_view == DealViewMode::Kanban {
                pick_up_or_drop(state, runtime, view_data, internal_tx);
            }
        }
        (KeyCode::Esc, _) => {
            if view_data.deals.board.dragging().is_some() {
                view_data.deals.board.drag_cancel();
                emit_status(state, view_data, internal_tx, "drag canceled");
            }
        }
        (KeyCode::Char('j') | KeyCode::Down, _) => {
            move_selection(state, runtime, view_data, internal_tx, 1);
        }
        (KeyCode::Char('k') | KeyCode::Up, _) => {
            move_selection(state, runtime, view_data, internal_tx, -1);
        }
        (KeyCode::Char('h') | KeyCode::Left, _) => move_horizontal(state, view_data, -1),
        (KeyCode::Char('l') | KeyCode::Right, _) => move_horizontal(state, view_data, 1),
        (KeyCode::Char('['), KeyModifiers::NONE) => {
            if calendar_active(state) {
                view_data.tasks.calendar.prev_month();
            }
        }
        (KeyCode::Char(']'), KeyModifiers::NONE) => {
            if calendar_active(state) {
                view_data.tasks.calendar.next_month();
            }
        }
        (KeyCode::Char('t'), KeyModifiers::NONE) => {
            if calendar_active(state) {
                let now = runtime.now();
                view_data.tasks.calendar.today(now);
            }
        }
        _ => {}
    }
    false
}

fn handle_search_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            // Restore the committed query so keystrokes abandoned mid-edit
            // never land once their debounce fires.
            let committed = active_query(state.active_tab, view_data);
            set_active_query(state.active_tab, view_data, &committed);
            view_data.search_input = committed;
            state.dispatch(AppCommand::ExitSearch);
        }
        KeyCode::Enter => {
            let input = view_data.search_input.clone();
            set_active_query(state.active_tab, view_data, &input);
            clamp_selections(view_data);
            state.dispatch(AppCommand::ExitSearch);
        }
        KeyCode::Backspace => {
            view_data.search_input.pop();
            queue_active_query(state.active_tab, view_data, internal_tx);
        }
        KeyCode::Char(ch) => {
            view_data.search_input.push(ch);
            queue_active_query(state.active_tab, view_data, internal_tx);
        }
        _ => {}
    }
}

const fn searchable(tab: TabKind) -> bool {
    matches!(tab, TabKind::Customers | TabKind::Deals | TabKind::Tasks)
}

const fn calendar_active(state: &AppState) -> bool {
    matches!(state.active_tab, TabKind::Tasks) && matches!(state.task_view, TaskViewMode::Calendar)
}

fn active_query(tab: TabKind, view_data: &ViewData) -> String {
    match tab {
        TabKind::Customers => view_data.customers.filter.query().to_owned(),
        TabKind::Deals => view_data.deals.filter.query().to_owned(),
        TabKind::Tasks => view_data.tasks.filter.query().to_owned(),
        _ => String::new(),
    }
}

fn set_active_query(tab: TabKind, view_data: &mut ViewData, text: &str) {
    match tab {
        TabKind::Customers => view_data.customers.filter.set_query(text),
        TabKind::Deals => view_data.deals.filter.set_query(text),
        TabKind::Tasks => view_data.tasks.filter.set_query(text),
        _ => {}
    }
}

fn queue_active_query(tab: TabKind, view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    let text = view_data.search_input.clone();
    let build = move |token, query| InternalEvent::SearchCommitted { tab, token, query };
    match tab {
        TabKind::Customers => {
            view_data
                .customers
                .filter
                .queue_query(&text, internal_tx, build);
        }
        TabKind::Deals => {
            view_data.deals.filter.queue_query(&text, internal_tx, build);
        }
        TabKind::Tasks => {
            view_data.tasks.filter.queue_query(&text, internal_tx, build);
        }
        _ => {}
    }
}

fn cycle_status_filter(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let label = match state.active_tab {
        TabKind::Customers => {
            let options: Vec<&'static str> = CustomerStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect();
            cycle_filter(&mut view_data.customers.filter, "status", &options)
        }
        TabKind::Deals => {
            let options: Vec<&'static str> = DealStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect();
            cycle_filter(&mut view_data.deals.filter, "stage", &options)
        }
        TabKind::Tasks => {
            let options: Vec<&'static str> = TaskStatus::ALL
                .iter()
                .map(|status| status.as_str())
                .collect();
            cycle_filter(&mut view_data.tasks.filter, "status", &options)
        }
        _ => return,
    };
    clamp_selections(view_data);
    emit_status(state, view_data, internal_tx, format!("filter: {label}"));
}

/// Walks the named filter through none, each option in order, then back
/// to none.
fn cycle_filter<T>(
    engine: &mut FilterEngine<T>,
    key: &'static str,
    options: &[&'static str],
) -> &'static str {
    let next = match engine.filter(key) {
        FilterValue::Any => options.first().copied(),
        FilterValue::Is(current) => options
            .iter()
            .position(|option| *option == current)
            .and_then(|index| options.get(index + 1))
            .copied(),
    };
    match next {
        Some(value) => {
            engine.set_filter(key, FilterValue::Is(value.to_owned()));
            value
        }
        None => {
            engine.set_filter(key, FilterValue::Any);
            "all"
        }
    }
}

fn cycle_sort_field(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let field = match state.active_tab {
        TabKind::Customers => cycle_sorter(&mut view_data.customers.sorter),
        TabKind::Deals => cycle_sorter(&mut view_data.deals.sorter),
        TabKind::Tasks => cycle_sorter(&mut view_data.tasks.sorter),
        _ => return,
    };
    let label = field.unwrap_or("none");
    emit_status(state, view_data, internal_tx, format!("sort: {label}"));
}

/// none, first key, ..., last key, none again. Entering a key always
/// starts ascending.
fn cycle_sorter<T>(sorter: &mut Sorter<T>) -> Option<&'static str> {
    let keys: Vec<&'static str> = sorter.keys().collect();
    let next = match sorter.field() {
        None => keys.first().copied(),
        Some(current) => keys
            .iter()
            .position(|key| *key == current)
            .and_then(|index| keys.get(index + 1))
            .copied(),
    };
    match next {
        Some(key) => {
            sorter.toggle(key);
            if sorter.direction() == SortDirection::Desc {
                sorter.toggle(key);
            }
            Some(key)
        }
        None => {
            sorter.clear();
            None
        }
    }
}

fn toggle_sort_direction(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let sorter: &mut dyn SortControl = match state.active_tab {
        TabKind::Customers => &mut view_data.customers.sorter,
        TabKind::Deals => &mut view_data.deals.sorter,
        TabKind::Tasks => &mut view_data.tasks.sorter,
        _ => return,
    };
    let Some(field) = sorter.current_field() else {
        emit_status(state, view_data, internal_tx, "no sort column; press o first");
        return;
    };
    sorter.flip(field);
    let direction = sorter.current_direction();
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("sort: {field} {}", direction.label()),
    );
}

/// Object-safe facade so the direction toggle can address whichever tab's
/// sorter is active without repeating itself per item type.
trait SortControl {
    fn current_field(&self) -> Option<&'static str>;
    fn current_direction(&self) -> SortDirection;
    fn flip(&mut self, key: &'static str);
}

impl<T> SortControl for Sorter<T> {
    fn current_field(&self) -> Option<&'static str> {
        self.field()
    }

    fn current_direction(&self) -> SortDirection {
        self.direction()
    }

    fn flip(&mut self, key: &'static str) {
        self.toggle(key);
    }
}

fn move_selection<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    match state.active_tab {
        TabKind::Customers => {
            let len = view_data.customers.visible().len();
            view_data.customers.selected = step(view_data.customers.selected, delta, len);
            if let Err(error) = ensure_customer_page(runtime, view_data, internal_tx) {
                emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
            }
        }
        TabKind::Deals => match state.deal_view {
            DealViewMode::Kanban => {
                let visible = view_data.deals.visible();
                let status = DealStatus::ALL[view_data.deals.column];
                let len = column_items(&visible, status).len();
                view_data.deals.card = step(view_data.deals.card, delta, len);
            }
            DealViewMode::List => {
                let len = view_data.deals.visible_sorted().len();
                view_data.deals.selected = step(view_data.deals.selected, delta, len);
            }
        },
        TabKind::Tasks => {
            if state.task_view == TaskViewMode::Calendar {
                let moved = view_data.tasks.calendar.selected()
                    + time::Duration::days(delta as i64 * 7);
                view_data.tasks.calendar.select(moved);
            } else {
                let len = view_data.tasks.visible().len();
                view_data.tasks.selected = step(view_data.tasks.selected, delta, len);
            }
        }
        _ => {}
    }
}

fn move_horizontal(state: &mut AppState, view_data: &mut ViewData, delta: isize) {
    match state.active_tab {
        TabKind::Deals if state.deal_view == DealViewMode::Kanban => {
            let columns = DealStatus::ALL.len();
            view_data.deals.column = step(view_data.deals.column, delta, columns);
            view_data.deals.card = 0;
        }
        TabKind::Tasks if state.task_view == TaskViewMode::Calendar => {
            let moved = view_data.tasks.calendar.selected() + time::Duration::days(delta as i64);
            view_data.tasks.calendar.select(moved);
        }
        _ => {}
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let max = len as isize - 1;
    (current as isize + delta).clamp(0, max) as usize
}

fn clamp_selections(view_data: &mut ViewData) {
    let customers = view_data.customers.visible().len();
    view_data.customers.selected = view_data.customers.selected.min(customers.saturating_sub(1));
    let deals = view_data.deals.visible_sorted().len();
    view_data.deals.selected = view_data.deals.selected.min(deals.saturating_sub(1));
    let tasks = view_data.tasks.visible().len();
    view_data.tasks.selected = view_data.tasks.selected.min(tasks.saturating_sub(1));
    view_data.deals.card = 0;
}

fn selected_kanban_deal(view_data: &ViewData) -> Option<Deal> {
    let visible = view_data.deals.visible();
    let status = DealStatus::ALL[view_data.deals.column];
    column_items(&visible, status)
        .get(view_data.deals.card)
        .map(|deal| (*deal).clone())
}

pub fn pick_up_or_drop<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if view_data.deals.board.dragging().is_none() {
        let Some(deal) = selected_kanban_deal(view_data) else {
            return;
        };
        view_data.deals.board.drag_start(deal.id.as_str());
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("dragging {:?}", deal.title),
        );
        return;
    }

    let target = DealStatus::ALL[view_data.deals.column];
    // Drops resolve against the canonical deal list, not the filtered view.
    let outcome = view_data.deals.board.drop_on(&view_data.deals.deals, target);
    match outcome {
        DropOutcome::Change(change) => {
            let id = DealId::from(change.item_id.as_str());
            if let Err(error) =
                runtime.spawn_deal_status(change.request_id, &id, change.status, internal_tx)
            {
                emit_status(state, view_data, internal_tx, format!("move failed: {error}"));
            }
        }
        DropOutcome::Busy => {
            emit_status(state, view_data, internal_tx, "previous move still saving");
        }
        DropOutcome::AlreadyThere | DropOutcome::NoDrag => {}
        DropOutcome::NotFound => {
            emit_status(state, view_data, internal_tx, "deal vanished; reload with r");
        }
    }
}

fn advance_selected_task<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if state.task_view == TaskViewMode::Calendar {
        return;
    }
    if view_data.tasks.saving.is_some() {
        emit_status(
            state,
            view_data,
            internal_tx,
            "previous task update still saving",
        );
        return;
    }
    let Some(task) = view_data
        .tasks
        .visible()
        .get(view_data.tasks.selected)
        .cloned()
    else {
        return;
    };
    let next = match task.status {
        TaskStatus::Todo => TaskStatus::InProgress,
        TaskStatus::InProgress => TaskStatus::Completed,
        TaskStatus::Completed => TaskStatus::Todo,
    };
    view_data.tasks.next_request_id += 1;
    let request_id = view_data.tasks.next_request_id;
    view_data.tasks.saving = Some(request_id);
    if let Err(error) = runtime.spawn_task_status(request_id, &task.id, next, internal_tx) {
        view_data.tasks.saving = None;
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("task update failed: {error}"),
        );
    }
}

pub fn delete_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match state.active_tab {
        TabKind::Deals => {
            let deal = match state.deal_view {
                DealViewMode::Kanban => selected_kanban_deal(view_data),
                DealViewMode::List => view_data
                    .deals
                    .visible_sorted()
                    .get(view_data.deals.selected)
                    .cloned(),
            };
            let Some(deal) = deal else {
                return;
            };
            match runtime.delete_deal(&deal.id) {
                Ok(()) => {
                    view_data.deals.deals.retain(|kept| kept.id != deal.id);
                    clamp_selections(view_data);
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("deleted {:?}", deal.title),
                    );
                }
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("delete failed: {error}"),
                    );
                }
            }
        }
        TabKind::Tasks => {
            if state.task_view == TaskViewMode::Calendar {
                return;
            }
            let Some(task) = view_data
                .tasks
                .visible()
                .get(view_data.tasks.selected)
                .cloned()
            else {
                return;
            };
            match runtime.delete_task(&task.id) {
                Ok(()) => {
                    view_data.tasks.tasks.retain(|kept| kept.id != task.id);
                    clamp_selections(view_data);
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("deleted {:?}", task.title),
                    );
                }
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("delete failed: {error}"),
                    );
                }
            }
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, state: &AppState, view_data: &ViewData) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tab_bar(frame, state, chunks[0]);
    match state.active_tab {
        TabKind::Dashboard => render_dashboard(frame, view_data, chunks[1]),
        TabKind::Customers => render_customers(frame, view_data, chunks[1]),
        TabKind::Deals => match state.deal_view {
            DealViewMode::Kanban => render_kanban(frame, view_data, chunks[1]),
            DealViewMode::List => render_deal_list(frame, view_data, chunks[1]),
        },
        TabKind::Tasks => match state.task_view {
            TaskViewMode::List => render_task_list(frame, view_data, chunks[1]),
            TaskViewMode::Calendar => render_calendar(frame, view_data, chunks[1]),
        },
        TabKind::Analytics => render_analytics(frame, view_data, chunks[1]),
    }
    render_status_bar(frame, state, view_data, chunks[2]);
}

fn render_tab_bar(frame: &mut ratatui::Frame, state: &AppState, area: Rect) {
    let titles: Vec<&str> = TabKind::ALL.iter().map(|tab| tab.label()).collect();
    let selected = TabKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .block(Block::default().borders(Borders::ALL).title("dealdesk"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn render_status_bar(
    frame: &mut ratatui::Frame,
    state: &AppState,
    view_data: &ViewData,
    area: Rect,
) {
    let text = if state.mode == AppMode::Search {
        format!("search: {}_", view_data.search_input)
    } else if let Some(status) = &state.status_line {
        status.clone()
    } else {
        "tab switch / search g filter o/s sort v view space drag x delete r reload ^q quit"
            .to_owned()
    };
    frame.render_widget(Paragraph::new(text), area);
}

fn sort_mark<T>(sorter: &Sorter<T>, key: &'static str) -> &'static str {
    if sorter.field() == Some(key) {
        match sorter.direction() {
            SortDirection::Asc => "^",
            SortDirection::Desc => "v",
        }
    } else {
        ""
    }
}

fn render_customers(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let view = &view_data.customers;
    let customers = view.visible();
    let header = Row::new(vec![
        format!("name{}", sort_mark(&view.sorter, "name")),
        format!("company{}", sort_mark(&view.sorter, "company")),
        "email".to_owned(),
        format!("status{}", sort_mark(&view.sorter, "status")),
        format!("last contact{}", sort_mark(&view.sorter, "contact")),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = customers.iter().enumerate().map(|(index, customer)| {
        let row = Row::new(vec![
            Cell::from(customer.name.clone()),
            Cell::from(customer.company.clone()),
            Cell::from(customer.email.clone()),
            Cell::from(customer.status.label()),
            Cell::from(customer.last_contact.map_or(String::new(), format_date)),
        ]);
        if index == view.selected {
            row.style(Style::default().bg(Color::DarkGray))
        } else {
            row
        }
    });

    let footer = if view.feed.loading() {
        "loading...".to_owned()
    } else if let Some(error) = view.feed.error() {
        format!("load failed: {error}")
    } else if view.feed.has_more() {
        format!("{} loaded; j for more", view.feed.items().len())
    } else {
        format!("{} customers (end)", view.feed.items().len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(24),
            Constraint::Percentage(24),
            Constraint::Percentage(26),
            Constraint::Percentage(10),
            Constraint::Percentage(16),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(footer));
    frame.render_widget(table, area);
}

fn render_deal_list(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let view = &view_data.deals;
    let deals = view.visible_sorted();
    let header = Row::new(vec![
        format!("title{}", sort_mark(&view.sorter, "title")),
        "customer".to_owned(),
        format!("value{}", sort_mark(&view.sorter, "value")),
        format!("stage{}", sort_mark(&view.sorter, "stage")),
        format!("closing{}", sort_mark(&view.sorter, "closing")),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = deals.iter().enumerate().map(|(index, deal)| {
        let row = Row::new(vec![
            Cell::from(deal.title.clone()),
            Cell::from(deal.customer_name.clone()),
            Cell::from(format_money(deal.value)),
            Cell::from(deal.status.label()),
            Cell::from(deal.closing_date.map_or(String::new(), format_date)),
        ]);
        if index == view.selected {
            row.style(Style::default().bg(Color::DarkGray))
        } else {
            row
        }
    });

    let title = format!("{} deals", deals.len());
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(24),
            Constraint::Percentage(12),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_kanban(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let view = &view_data.deals;
    let visible = view.visible();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, DealStatus::ALL.len() as u32);
            DealStatus::ALL.len()
        ])
        .split(area);

    for (index, status) in DealStatus::ALL.iter().enumerate() {
        let cards = column_items(&visible, *status);
        let total = column_total(&visible, *status);
        let title = format!("{} {} {}", status.label(), cards.len(), format_money(total));

        let mut lines: Vec<Line> = Vec::new();
        for (card_index, deal) in cards.iter().enumerate() {
            let marker = if view.board.dragging() == Some(deal.id.as_str()) {
                "*"
            } else {
                " "
            };
            let text = format!("{marker} {} {}", deal.title, format_money(deal.value));
            if index == view.column && card_index == view.card {
                lines.push(Line::styled(text, Style::default().bg(Color::DarkGray)));
            } else {
                lines.push(Line::raw(text));
            }
        }

        let border_style = if index == view.column {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);
        frame.render_widget(Paragraph::new(lines).block(block), columns[index]);
    }
}

fn render_task_list(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let view = &view_data.tasks;
    let tasks = view.visible();
    let header = Row::new(vec![
        format!("title{}", sort_mark(&view.sorter, "title")),
        format!("status{}", sort_mark(&view.sorter, "status")),
        format!("priority{}", sort_mark(&view.sorter, "priority")),
        format!("due{}", sort_mark(&view.sorter, "due")),
        "related".to_owned(),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = tasks.iter().enumerate().map(|(index, task)| {
        let related = task
            .related_to
            .as_ref()
            .map_or(String::new(), |related| related.name.clone());
        let row = Row::new(vec![
            Cell::from(task.title.clone()),
            Cell::from(task.status.label()),
            Cell::from(task.priority.label()),
            Cell::from(task.due_date.map_or(String::new(), format_date)),
            Cell::from(related),
        ]);
        if index == view.selected {
            row.style(Style::default().bg(Color::DarkGray))
        } else {
            row
        }
    });

    let title = format!("{} tasks (enter advances status)", tasks.len());
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(32),
            Constraint::Percentage(14),
            Constraint::Percentage(12),
            Constraint::Percentage(16),
            Constraint::Percentage(26),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_calendar(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let calendar = &view_data.tasks.calendar;
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    // Fixed five-character cells so the weeks line up.
    let mut lines: Vec<Line> = vec![Line::raw("  Su   Mo   Tu   We   Th   Fr   Sa")];
    let mut week = String::new();
    for (index, day) in calendar.grid().into_iter().enumerate() {
        let mark = if view_data.tasks.due_on(day).is_empty() {
            ' '
        } else {
            '*'
        };
        let cell = if day == calendar.selected() {
            format!("[{:>2}{mark}]", day.day())
        } else if calendar.in_month(day) {
            format!(" {:>2}{mark} ", day.day())
        } else {
            "  .  ".to_owned()
        };
        week.push_str(&cell);
        if index % 7 == 6 {
            lines.push(Line::raw(std::mem::take(&mut week)));
        }
    }
    let title = format!(
        "{} {}  ([ ] month, t today)",
        month_name(calendar.month_start().month()),
        calendar.month_start().year()
    );
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        halves[0],
    );

    let due = view_data.tasks.due_on(calendar.selected());
    let mut task_lines: Vec<Line> = Vec::new();
    if due.is_empty() {
        task_lines.push(Line::raw("no tasks due"));
    }
    for task in &due {
        task_lines.push(Line::raw(format!(
            "{} [{}] {}",
            task.priority.label(),
            task.status.label(),
            task.title
        )));
    }
    let title = format!("due {}", calendar.selected());
    frame.render_widget(
        Paragraph::new(task_lines).block(Block::default().borders(Borders::ALL).title(title)),
        halves[1],
    );
}

fn render_dashboard(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(1)])
        .split(area);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(summary) = &view_data.dashboard.summary {
        lines.push(Line::raw(format!(
            "customers {} ({:+.1}%)",
            summary.total_customers, summary.customer_change
        )));
        lines.push(Line::raw(format!(
            "deals     {} ({:+.1}%)",
            summary.total_deals, summary.deals_change
        )));
        lines.push(Line::raw(format!(
            "tasks     {} ({:+.1}%)",
            summary.total_tasks, summary.tasks_change
        )));
        lines.push(Line::raw(format!(
            "revenue   {} ({:+.1}%)",
            format_money(summary.total_revenue),
            summary.revenue_change
        )));
    } else {
        lines.push(Line::raw("summary unavailable"));
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("overview")),
        halves[0],
    );

    let now = OffsetDateTime::now_utc();
    let activity: Vec<Line> = view_data
        .dashboard
        .activity
        .iter()
        .map(|entry| {
            Line::raw(format!(
                "{:>8}  {} {} {}",
                format_relative(now, entry.timestamp),
                entry.user.name,
                entry.action,
                entry.subject
            ))
        })
        .collect();
    frame.render_widget(
        Paragraph::new(activity).block(
            Block::default()
                .borders(Borders::ALL)
                .title("recent activity"),
        ),
        halves[1],
    );
}

fn render_analytics(frame: &mut ratatui::Frame, view_data: &ViewData, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let bars: Vec<(&str, u64)> = view_data
        .analytics
        .sales
        .iter()
        .map(|point| (point.date.as_str(), point.revenue.max(0) as u64 / 1000))
        .collect();
    let chart = BarChart::default().data(&bars).bar_width(4).block(
        Block::default()
            .borders(Borders::ALL)
            .title("monthly revenue ($k)"),
    );
    frame.render_widget(chart, halves[0]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(halves[1]);

    let mut customer_lines: Vec<Line> = Vec::new();
    if let Some(metrics) = &view_data.analytics.customer_metrics {
        customer_lines.push(Line::raw(format!(
            "total {}  active {}  inactive {}  leads {}",
            metrics.total, metrics.active, metrics.inactive, metrics.leads
        )));
        customer_lines.push(Line::raw(format!("growth {:+.1}%", metrics.growth)));
    } else {
        customer_lines.push(Line::raw("customer metrics unavailable"));
    }
    frame.render_widget(
        Paragraph::new(customer_lines)
            .block(Block::default().borders(Borders::ALL).title("customers")),
        bottom[0],
    );

    let mut deal_lines: Vec<Line> = Vec::new();
    if let Some(metrics) = &view_data.analytics.deal_metrics {
        deal_lines.push(Line::raw(format!(
            "pipeline {}  avg {}  win {:.0}%",
            format_money(metrics.total_value),
            format_money(metrics.avg_deal_size),
            metrics.win_rate
        )));
        for slice in &metrics.stages {
            deal_lines.push(Line::raw(format!("{:<12} {}", slice.stage, slice.count)));
        }
    } else {
        deal_lines.push(Line::raw("deal metrics unavailable"));
    }
    frame.render_widget(
        Paragraph::new(deal_lines).block(Block::default().borders(Borders::ALL).title("pipeline")),
        bottom[1],
    );
}

fn format_money(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn format_date(moment: OffsetDateTime) -> String {
    moment.date().to_string()
}

fn format_relative(now: OffsetDateTime, then: OffsetDateTime) -> String {
    let minutes = (now - then).whole_minutes();
    if minutes < 1 {
        "now".to_owned()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if minutes < 60 * 24 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / (60 * 24))
    }
}

const fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, InternalEvent, ViewData, delete_selected, format_money, format_relative,
        handle_key_event, pick_up_or_drop, process_internal_events, refresh_view_data,
    };
    use anyhow::{Result, bail};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use dealdesk_app::{
        ActivityEntry, AppCommand, AppState, Customer, CustomerMetrics, CustomerStatus,
        DashboardSummary, Deal, DealId, DealMetrics, DealStatus, SalesPoint, TabKind, Task, TaskId,
        TaskStatus,
    };
    use dealdesk_testkit::{sample_customers, sample_deals, sample_tasks};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::time::Duration;
    use time::OffsetDateTime;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-08-30 12:00 UTC);

    struct StubRuntime {
        customers: Vec<Customer>,
        deals: Vec<Deal>,
        tasks: Vec<Task>,
        page_calls: Vec<usize>,
        deal_updates: Vec<(DealId, DealStatus)>,
        fail_deal_update: bool,
    }

    impl StubRuntime {
        fn new(customer_count: usize) -> Self {
            Self {
                customers: sample_customers(NOW, customer_count),
                deals: sample_deals(NOW),
                tasks: sample_tasks(NOW),
                page_calls: Vec::new(),
                deal_updates: Vec::new(),
                fail_deal_update: false,
            }
        }
    }

    impl AppRuntime for StubRuntime {
        fn load_customer_page(&mut self, page: usize, page_size: usize) -> Result<Vec<Customer>> {
            self.page_calls.push(page);
            let start = (page - 1) * page_size;
            Ok(self
                .customers
                .iter()
                .skip(start)
                .take(page_size)
                .cloned()
                .collect())
        }

        fn load_deals(&mut self) -> Result<Vec<Deal>> {
            Ok(self.deals.clone())
        }

        fn load_tasks(&mut self) -> Result<Vec<Task>> {
            Ok(self.tasks.clone())
        }

        fn load_summary(&mut self) -> Result<DashboardSummary> {
            Ok(DashboardSummary::default())
        }

        fn load_activity(&mut self) -> Result<Vec<ActivityEntry>> {
            Ok(Vec::new())
        }

        fn load_sales(&mut self) -> Result<Vec<SalesPoint>> {
            Ok(vec![SalesPoint {
                date: "Jan".to_owned(),
                revenue: 18_500,
            }])
        }

        fn load_customer_metrics(&mut self) -> Result<CustomerMetrics> {
            Ok(CustomerMetrics {
                total: 10,
                active: 6,
                inactive: 2,
                leads: 2,
                growth: 1.0,
                acquisition: Vec::new(),
            })
        }

        fn load_deal_metrics(&mut self) -> Result<DealMetrics> {
            Ok(DealMetrics {
                total_value: 178_000,
                avg_deal_size: 35_600,
                win_rate: 50.0,
                conversion_time: 30.0,
                growth: 2.0,
                stages: Vec::new(),
                statuses: Vec::new(),
            })
        }

        fn update_deal_status(&mut self, id: &DealId, status: DealStatus) -> Result<Deal> {
            if self.fail_deal_update {
                bail!("backend rejected the update");
            }
            self.deal_updates.push((id.clone(), status));
            let Some(deal) = self.deals.iter_mut().find(|deal| deal.id == *id) else {
                bail!("deal {id} not found");
            };
            deal.status = status;
            Ok(deal.clone())
        }

        fn update_task_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<Task> {
            let Some(task) = self.tasks.iter_mut().find(|task| task.id == *id) else {
                bail!("task {id} not found");
            };
            task.status = status;
            Ok(task.clone())
        }

        fn delete_deal(&mut self, id: &DealId) -> Result<()> {
            self.deals.retain(|deal| deal.id != *id);
            Ok(())
        }

        fn delete_task(&mut self, id: &TaskId) -> Result<()> {
            self.tasks.retain(|task| task.id != *id);
            Ok(())
        }

        fn now(&self) -> OffsetDateTime {
            NOW
        }
    }

    struct Fixture {
        state: AppState,
        runtime: StubRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    fn fixture(customer_count: usize) -> Fixture {
        let mut runtime = StubRuntime::new(customer_count);
        let mut view_data = ViewData::new(Duration::from_millis(1), NOW);
        let (tx, rx) = mpsc::channel();
        refresh_view_data(&mut runtime, &mut view_data, &tx).expect("initial load");
        let mut fixture = Fixture {
            state: AppState::default(),
            runtime,
            view_data,
            tx,
            rx,
        };
        pump(&mut fixture);
        fixture
    }

    fn pump(fixture: &mut Fixture) {
        process_internal_events(
            &mut fixture.state,
            &mut fixture.view_data,
            &fixture.tx,
            &fixture.rx,
        );
    }

    fn press(fixture: &mut Fixture, code: KeyCode) {
        handle_key_event(
            &mut fixture.state,
            &mut fixture.runtime,
            &mut fixture.view_data,
            &fixture.tx,
            KeyEvent::new(code, KeyModifiers::NONE),
        );
    }

    fn space(fixture: &mut Fixture) {
        pick_up_or_drop(
            &mut fixture.state,
            &mut fixture.runtime,
            &mut fixture.view_data,
            &fixture.tx,
        );
    }

    #[test]
    fn startup_loads_the_first_customer_page() {
        let fixture = fixture(25);
        assert_eq!(fixture.runtime.page_calls, vec![1]);
        assert_eq!(fixture.view_data.customers.feed.items().len(), 10);
        assert!(fixture.view_data.customers.feed.has_more());
    }

    #[test]
    fn selection_reaching_the_tail_fetches_the_next_page() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        for _ in 0..9 {
            press(&mut fixture, KeyCode::Char('j'));
            pump(&mut fixture);
        }
        assert_eq!(fixture.runtime.page_calls, vec![1, 2]);
        assert_eq!(fixture.view_data.customers.feed.items().len(), 20);
    }

    #[test]
    fn short_final_page_stops_the_feed() {
        let mut fixture = fixture(12);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        for _ in 0..20 {
            press(&mut fixture, KeyCode::Char('j'));
            pump(&mut fixture);
        }
        assert!(!fixture.view_data.customers.feed.has_more());
        assert_eq!(fixture.view_data.customers.feed.items().len(), 12);
        // Page 2 came back short; nothing past it is requested.
        assert_eq!(fixture.runtime.page_calls, vec![1, 2]);
    }

    #[test]
    fn kanban_drop_persists_exactly_one_status_change() {
        let mut fixture = fixture(5);
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));

        // Column 0 is Lead; deal5 is its only card.
        space(&mut fixture);
        assert_eq!(fixture.view_data.deals.board.dragging(), Some("deal5"));

        press(&mut fixture, KeyCode::Char('l'));
        space(&mut fixture);
        pump(&mut fixture);

        assert_eq!(
            fixture.runtime.deal_updates,
            vec![(DealId::from("deal5"), DealStatus::Qualified)]
        );
        let deal = fixture
            .view_data
            .deals
            .deals
            .iter()
            .find(|deal| deal.id.as_str() == "deal5")
            .expect("deal present");
        assert_eq!(deal.status, DealStatus::Qualified);
        assert!(!fixture.view_data.deals.board.is_processing());
        assert_eq!(fixture.view_data.deals.board.dragging(), None);
    }

    #[test]
    fn dropping_on_the_same_column_calls_nothing() {
        let mut fixture = fixture(5);
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));

        space(&mut fixture);
        space(&mut fixture);
        pump(&mut fixture);

        assert!(fixture.runtime.deal_updates.is_empty());
        assert_eq!(fixture.view_data.deals.board.dragging(), None);
    }

    #[test]
    fn failed_persist_keeps_the_deal_and_reports_the_error() {
        let mut fixture = fixture(5);
        fixture.runtime.fail_deal_update = true;
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));

        space(&mut fixture);
        press(&mut fixture, KeyCode::Char('l'));
        space(&mut fixture);
        pump(&mut fixture);

        let deal = fixture
            .view_data
            .deals
            .deals
            .iter()
            .find(|deal| deal.id.as_str() == "deal5")
            .expect("deal present");
        assert_eq!(deal.status, DealStatus::Lead);
        assert!(!fixture.view_data.deals.board.is_processing());
        let status = fixture.state.status_line.clone().unwrap_or_default();
        assert!(status.contains("move failed"), "status was {status:?}");
    }

    #[test]
    fn escape_cancels_a_drag_without_persisting() {
        let mut fixture = fixture(5);
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));

        space(&mut fixture);
        assert!(fixture.view_data.deals.board.dragging().is_some());
        press(&mut fixture, KeyCode::Esc);

        assert_eq!(fixture.view_data.deals.board.dragging(), None);
        assert!(fixture.runtime.deal_updates.is_empty());
    }

    #[test]
    fn debounced_search_narrows_the_customer_list() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        press(&mut fixture, KeyCode::Char('/'));
        press(&mut fixture, KeyCode::Char('s'));
        press(&mut fixture, KeyCode::Char('u'));
        press(&mut fixture, KeyCode::Char('m'));

        // Wait out the 1ms debounce window, then drain the channel.
        std::thread::sleep(Duration::from_millis(50));
        pump(&mut fixture);

        assert_eq!(fixture.view_data.customers.filter.query(), "sum");
        let visible = fixture.view_data.customers.visible();
        assert!(!visible.is_empty());
        assert!(
            visible
                .iter()
                .all(|customer| customer.name.to_lowercase().contains("sum"))
        );
    }

    #[test]
    fn stale_search_commit_is_dropped() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        press(&mut fixture, KeyCode::Char('/'));
        press(&mut fixture, KeyCode::Char('a'));
        press(&mut fixture, KeyCode::Char('b'));

        std::thread::sleep(Duration::from_millis(50));
        pump(&mut fixture);

        // Only the newest keystroke's token survives.
        assert_eq!(fixture.view_data.customers.filter.query(), "ab");
    }

    #[test]
    fn search_for_an_unloaded_customer_keeps_paging() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        // "Summit Logistics" is cust11, the first row of page 2, so the
        // committed query matches nothing in the loaded feed yet.
        press(&mut fixture, KeyCode::Char('/'));
        for ch in "summit logistics".chars() {
            press(&mut fixture, KeyCode::Char(ch));
        }
        press(&mut fixture, KeyCode::Enter);
        assert!(fixture.view_data.customers.visible().is_empty());

        for _ in 0..3 {
            press(&mut fixture, KeyCode::Char('j'));
            pump(&mut fixture);
        }
        assert_eq!(fixture.runtime.page_calls, vec![1, 2, 3]);
        assert!(!fixture.view_data.customers.feed.has_more());
        let visible = fixture.view_data.customers.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Summit Logistics");
    }

    #[test]
    fn escape_discards_an_unfinished_search() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        press(&mut fixture, KeyCode::Char('/'));
        press(&mut fixture, KeyCode::Char('s'));
        press(&mut fixture, KeyCode::Char('u'));
        press(&mut fixture, KeyCode::Char('m'));
        press(&mut fixture, KeyCode::Esc);

        // The queued commit still fires after the debounce window, but
        // its token was invalidated by the escape.
        std::thread::sleep(Duration::from_millis(50));
        pump(&mut fixture);

        assert_eq!(fixture.view_data.customers.filter.query(), "");
        assert_eq!(fixture.view_data.customers.visible().len(), 10);
    }

    #[test]
    fn delete_removes_the_selected_deal_from_the_list_view() {
        let mut fixture = fixture(5);
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));
        fixture.state.dispatch(AppCommand::ToggleDealView);

        let before = fixture.view_data.deals.deals.len();
        delete_selected(
            &mut fixture.state,
            &mut fixture.runtime,
            &mut fixture.view_data,
            &fixture.tx,
        );
        assert_eq!(fixture.view_data.deals.deals.len(), before - 1);
        assert_eq!(fixture.runtime.deals.len(), before - 1);
    }

    #[test]
    fn enter_advances_the_selected_task_status() {
        let mut fixture = fixture(5);
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Tasks));

        let first = fixture.view_data.tasks.visible()[0].clone();
        assert_eq!(first.status, TaskStatus::Todo);
        press(&mut fixture, KeyCode::Enter);
        pump(&mut fixture);

        let visible = fixture.view_data.tasks.visible();
        assert_eq!(visible[0].id, first.id);
        assert_eq!(visible[0].status, TaskStatus::InProgress);
    }

    #[test]
    fn calendar_lists_tasks_due_on_the_selected_day() {
        let fixture = fixture(5);
        // task2 falls due one day after NOW.
        let due = fixture
            .view_data
            .tasks
            .due_on(NOW.date().next_day().expect("next day"));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id.as_str(), "task2");
    }

    #[test]
    fn sort_and_filter_compose_on_customers() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        // First filter option is "active", first sort key is "name".
        press(&mut fixture, KeyCode::Char('g'));
        press(&mut fixture, KeyCode::Char('o'));

        let visible = fixture.view_data.customers.visible();
        assert!(!visible.is_empty());
        assert!(
            visible
                .iter()
                .all(|customer| customer.status == CustomerStatus::Active)
        );
        let names: Vec<String> = visible
            .iter()
            .map(|customer| customer.name.to_lowercase())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn feed_reset_drops_the_in_flight_page() {
        let mut fixture = fixture(25);
        fixture
            .state
            .dispatch(AppCommand::GoToTab(TabKind::Customers));

        for _ in 0..9 {
            press(&mut fixture, KeyCode::Char('j'));
        }
        // A page-2 fetch is now queued; reset before draining the channel.
        fixture.view_data.customers.feed.reset();
        pump(&mut fixture);

        assert!(fixture.view_data.customers.feed.items().is_empty());
        assert!(fixture.view_data.customers.feed.has_more());
    }

    #[test]
    fn render_smoke_test_covers_every_tab() {
        use ratatui::Terminal;
        use ratatui::backend::TestBackend;

        let mut fixture = fixture(25);
        let mut terminal = Terminal::new(TestBackend::new(120, 36)).expect("test terminal");
        for tab in TabKind::ALL {
            fixture.state.dispatch(AppCommand::GoToTab(tab));
            terminal
                .draw(|frame| super::render(frame, &fixture.state, &fixture.view_data))
                .expect("draw");
        }
        // The alternate deal and task layouts as well.
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Deals));
        fixture.state.dispatch(AppCommand::ToggleDealView);
        terminal
            .draw(|frame| super::render(frame, &fixture.state, &fixture.view_data))
            .expect("draw");
        fixture.state.dispatch(AppCommand::GoToTab(TabKind::Tasks));
        fixture.state.dispatch(AppCommand::ToggleTaskView);
        terminal
            .draw(|frame| super::render(frame, &fixture.state, &fixture.view_data))
            .expect("draw");
    }

    #[test]
    fn money_formatting_groups_thousands() {
        assert_eq!(format_money(75_000), "$75,000");
        assert_eq!(format_money(1_287_500), "$1,287,500");
        assert_eq!(format_money(900), "$900");
        assert_eq!(format_money(-12_000), "-$12,000");
    }

    #[test]
    fn relative_times_scale_with_distance() {
        assert_eq!(format_relative(NOW, NOW - time::Duration::minutes(30)), "30m ago");
        assert_eq!(format_relative(NOW, NOW - time::Duration::hours(5)), "5h ago");
        assert_eq!(format_relative(NOW, NOW - time::Duration::days(2)), "2d ago");
    }
}
