// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Trailing-edge debounce built on the event channel: each `schedule` call
/// bumps the current token and arms a sleeper thread that delivers a
/// caller-built message after the delay. The receiver checks the delivered
/// token with [`Debouncer::accepts`]; only the latest scheduled message is
/// still current, so earlier calls collapse into the last one.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    token: u64,
}

impl Debouncer {
    pub const fn new(delay: Duration) -> Self {
        Self { delay, token: 0 }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Arms the timer and returns the token embedded in the message.
    pub fn schedule<M, F>(&mut self, tx: &Sender<M>, build: F) -> u64
    where
        M: Send + 'static,
        F: FnOnce(u64) -> M,
    {
        self.token = self.token.saturating_add(1);
        let message = build(self.token);
        let sender = tx.clone();
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            let _ = sender.send(message);
        });
        self.token
    }

    /// True when `token` is the most recently scheduled one.
    pub const fn accepts(&self, token: u64) -> bool {
        token == self.token
    }

    /// Invalidates any outstanding message without arming a new one.
    pub const fn cancel(&mut self) {
        self.token = self.token.saturating_add(1);
    }
}
