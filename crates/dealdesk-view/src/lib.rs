// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Derived-state engines for list-driven UIs: debounced filtering, sorting,
//! pagination, infinite scrolling, a kanban drag state machine, and a month
//! calendar grid. Everything here is pure state -- the owning view performs
//! I/O and feeds completions back in.

pub mod calendar;
pub mod debounce;
pub mod filter;
pub mod kanban;
pub mod page;
pub mod sort;

pub use calendar::*;
pub use debounce::*;
pub use filter::*;
pub use kanban::*;
pub use page::*;
pub use sort::*;
