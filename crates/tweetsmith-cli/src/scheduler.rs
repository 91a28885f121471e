//! Daily schedule loop with at-most-one-post-per-slot dedup.
//!
//! Runs on the caller's (single-threaded) runtime. Each tick computes the
//! configured trigger times that fell in `(last_tick, now]` on the local
//! wall clock and runs them in order. Shutdown is observed while sleeping
//! and between triggers; a trigger in progress always runs to completion.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::sync::watch;
use tweetsmith_core::{ContentKind, ScheduleTable, TimeSlot};

use crate::pipeline::Pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    AwaitingNextSlot,
    Generating,
    Publishing,
    ShuttingDown,
}

/// Trigger instants in `(last_tick, now]`, oldest first.
///
/// Works on naive local times: a trigger inside a spring-forward gap is due
/// once the clock has passed it, and the repeated autumn hour cannot make a
/// trigger due twice because `last_tick` only moves forward.
#[must_use]
pub fn due_triggers(
    table: &ScheduleTable,
    last_tick: NaiveDateTime,
    now: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    let mut due = Vec::new();
    if now <= last_tick {
        return due;
    }
    let mut day = last_tick.date();
    while day <= now.date() {
        for time in table.times() {
            let at = day.and_time(time.as_naive());
            if at > last_tick && at <= now {
                due.push(at);
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    due
}

pub struct Scheduler {
    pipeline: Pipeline,
    table: ScheduleTable,
    kind: ContentKind,
    poll_interval: Duration,
    state: SchedulerState,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        pipeline: Pipeline,
        table: ScheduleTable,
        kind: ContentKind,
        poll_interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            table,
            kind,
            poll_interval,
            state: SchedulerState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn set_state(&mut self, next: SchedulerState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "scheduler: state change");
            self.state = next;
        }
    }

    /// Poll until `shutdown` flips to `true` (or its sender is dropped).
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            times = %self.table,
            kind = %self.kind,
            poll_secs = self.poll_interval.as_secs(),
            "scheduler: started"
        );
        let mut last_tick = Local::now().naive_local();

        while !*shutdown.borrow() {
            self.set_state(SchedulerState::AwaitingNextSlot);
            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            let now = Local::now().naive_local();
            self.tick(last_tick, now, &shutdown).await;
            last_tick = now;
        }

        self.set_state(SchedulerState::ShuttingDown);
        tracing::info!("scheduler: shutting down");
    }

    /// Run every trigger due in `(last_tick, now]`. Returns how many posts
    /// were published.
    pub async fn tick(
        &mut self,
        last_tick: NaiveDateTime,
        now: NaiveDateTime,
        shutdown: &watch::Receiver<bool>,
    ) -> usize {
        let mut posted = 0;
        for trigger in due_triggers(&self.table, last_tick, now) {
            if *shutdown.borrow() {
                tracing::info!(trigger = %trigger, "scheduler: shutdown requested; skipping remaining triggers");
                break;
            }
            if self.run_trigger(trigger, now).await {
                posted += 1;
            }
        }
        posted
    }

    async fn run_trigger(&mut self, trigger: NaiveDateTime, now: NaiveDateTime) -> bool {
        if self.pipeline.store().already_posted_in_current_slot(now) {
            tracing::info!(
                trigger = %trigger,
                slot = ?TimeSlot::of(&now),
                "scheduler: already posted in this slot; skipping"
            );
            return false;
        }

        tracing::info!(trigger = %trigger, kind = %self.kind, "scheduler: trigger due");
        self.set_state(SchedulerState::Generating);
        let draft = self.pipeline.prepare(self.kind).await;

        self.set_state(SchedulerState::Publishing);
        let outcome = self.pipeline.publish(draft, now).await;
        self.set_state(SchedulerState::Idle);

        match outcome {
            Ok(published) => {
                tracing::info!(
                    trigger = %trigger,
                    ids = ?published.ids,
                    "scheduler: trigger complete"
                );
                true
            }
            Err(e) => {
                tracing::error!(trigger = %trigger, error = %e, "scheduler: trigger failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
