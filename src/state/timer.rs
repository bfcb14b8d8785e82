//! Group countdown with proportional "hurry up" votes.
//!
//! A [`Timer`] counts down towards a deadline and runs its timeout callback
//! exactly once. Participants in its authorised set can each vote once to
//! shorten the wait: with `n` voters left after a vote, the remaining time is
//! scaled by `n / (n + 1)`, so the last vote ends the countdown immediately.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use time::OffsetDateTime;
use tokio::{
    sync::watch,
    time::{Instant, sleep_until},
};
use tracing::debug;
use uuid::Uuid;

use crate::state::session::ParticipantId;

/// Identifier of a timer, handed to its callback and observers.
pub type TimerId = Uuid;

/// What a timed message should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Running; ends at the given wall-clock instant.
    EndsAt(OffsetDateTime),
    /// Over.
    Elapsed,
}

impl Countdown {
    /// Countdown ending `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Countdown::EndsAt(OffsetDateTime::now_utc() + duration)
    }
}

type TimeoutCallback = Box<dyn FnOnce(TimerId) + Send>;
type DeadlineObserver = Box<dyn Fn(TimerId, Countdown) + Send>;

/// State shared between the timer handle and its countdown task.
struct Shared {
    on_timeout: Mutex<Option<TimeoutCallback>>,
    observers: Mutex<Vec<DeadlineObserver>>,
}

impl Shared {
    /// Run the timeout callback unless it already ran. Returns whether it ran.
    fn fire(&self, id: TimerId) -> bool {
        let callback = self
            .on_timeout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match callback {
            Some(callback) => {
                callback(id);
                true
            }
            None => false,
        }
    }

    /// Drop the timeout callback without running it.
    fn disarm(&self) -> bool {
        self.on_timeout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    fn is_armed(&self) -> bool {
        self.on_timeout
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn notify(&self, id: TimerId, countdown: Countdown) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(id, countdown);
        }
    }
}

/// Cancellable countdown owned by a phase (or by a stopping game).
///
/// Dropping the timer destroys it: the callback is never run afterwards.
pub struct Timer {
    id: TimerId,
    end_time: Instant,
    authorised: HashSet<ParticipantId>,
    deadline: Option<watch::Sender<Instant>>,
    shared: Arc<Shared>,
}

impl Timer {
    /// Start a countdown of `duration` and spawn the task that waits for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<I, F>(authorised: I, duration: Duration, on_timeout: F) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
        F: FnOnce(TimerId) + Send + 'static,
    {
        let id = Uuid::new_v4();
        let end_time = Instant::now() + duration;
        let (deadline_tx, deadline_rx) = watch::channel(end_time);
        let shared = Arc::new(Shared {
            on_timeout: Mutex::new(Some(Box::new(on_timeout))),
            observers: Mutex::new(Vec::new()),
        });

        tokio::spawn(run_countdown(id, deadline_rx, Arc::clone(&shared)));

        Self {
            id,
            end_time,
            authorised: authorised.into_iter().collect(),
            deadline: Some(deadline_tx),
            shared,
        }
    }

    /// Identifier passed to the callback and observers.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Current deadline.
    pub fn end_time(&self) -> Instant {
        self.end_time
    }

    /// Time left before the deadline, zero once finished.
    pub fn remaining(&self) -> Duration {
        if self.is_running() {
            self.end_time.saturating_duration_since(Instant::now())
        } else {
            Duration::ZERO
        }
    }

    /// Whether the callback may still run.
    pub fn is_running(&self) -> bool {
        self.deadline.is_some() && self.shared.is_armed()
    }

    /// Countdown to display for this timer.
    pub fn countdown(&self) -> Countdown {
        if self.is_running() {
            Countdown::after(self.remaining())
        } else {
            Countdown::Elapsed
        }
    }

    /// Participants still entitled to a hurry-up vote.
    pub fn authorised(&self) -> &HashSet<ParticipantId> {
        &self.authorised
    }

    /// Register an observer invoked on every deadline change.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(TimerId, Countdown) + Send + 'static,
    {
        self.shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(observer));
    }

    /// Add a participant to the authorised set. Returns false once finished.
    pub fn authorise(&mut self, participant: ParticipantId) -> bool {
        self.is_running() && self.authorised.insert(participant)
    }

    /// Apply a hurry-up vote from `participant`.
    ///
    /// Returns false without any effect when the timer is finished or the
    /// participant is not (or no longer) authorised.
    pub fn request_speed_up(&mut self, participant: &ParticipantId) -> bool {
        if !self.is_running() || !self.authorised.remove(participant) {
            return false;
        }

        let left = self.authorised.len() as u32;
        if left == 0 {
            debug!(timer_id = %self.id, %participant, "last hurry-up vote; stopping timer");
            self.stop();
            return true;
        }

        let now = Instant::now();
        let remaining = self.end_time.saturating_duration_since(now);
        self.end_time = now + remaining * left / (left + 1);
        if let Some(deadline) = &self.deadline {
            // The countdown task may already be gone after a natural expiry.
            let _ = deadline.send(self.end_time);
        }
        debug!(
            timer_id = %self.id,
            %participant,
            votes_left = left,
            remaining_ms = self.end_time.saturating_duration_since(now).as_millis() as u64,
            "hurry-up vote accepted"
        );
        self.shared.notify(self.id, self.countdown());
        true
    }

    /// Remove a participant from the authorised set without shortening the wait.
    ///
    /// When this empties the set, nobody is left to wait for and the timer stops.
    pub fn revoke(&mut self, participant: &ParticipantId) -> bool {
        if !self.authorised.remove(participant) {
            return false;
        }
        if self.authorised.is_empty() {
            self.stop();
        }
        true
    }

    /// End the countdown now and run the callback, unless it already ran.
    pub fn stop(&mut self) {
        let Some(deadline) = self.deadline.take() else {
            return;
        };
        drop(deadline);
        self.end_time = self.end_time.min(Instant::now());
        if self.shared.fire(self.id) {
            self.shared.notify(self.id, Countdown::Elapsed);
        }
    }

    /// Cancel the countdown without running the callback.
    pub fn destroy(&mut self) {
        self.deadline.take();
        if self.shared.disarm() {
            debug!(timer_id = %self.id, "timer destroyed before expiry");
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("end_time", &self.end_time)
            .field("authorised", &self.authorised)
            .field("running", &self.is_running())
            .finish()
    }
}

/// Sleep until the deadline, following every change, then fire once.
///
/// Exits silently when the sender side is dropped (stop or destroy).
async fn run_countdown(id: TimerId, mut deadline: watch::Receiver<Instant>, shared: Arc<Shared>) {
    loop {
        let end_time = *deadline.borrow_and_update();
        tokio::select! {
            () = sleep_until(end_time) => {
                if shared.fire(id) {
                    shared.notify(id, Countdown::Elapsed);
                }
                return;
            }
            changed = deadline.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|name| ParticipantId(name.to_string())).collect()
    }

    fn counting_timer(names: &[&str], duration: Duration) -> (Timer, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let timer = Timer::start(ids(names), duration, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_on_natural_expiry() {
        let (timer, fired) = counting_timer(&["a"], Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_running());
        assert_eq!(timer.countdown(), Countdown::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn one_vote_scales_remaining_time() {
        let (mut timer, _fired) = counting_timer(&["a", "b", "c", "d"], Duration::from_secs(120));
        let start = Instant::now();

        assert!(timer.request_speed_up(&ParticipantId("a".into())));
        // k = 4 voters, one vote: 120s * 3/4
        assert_eq!(timer.end_time() - start, Duration::from_secs(90));

        assert!(timer.request_speed_up(&ParticipantId("b".into())));
        assert_eq!(timer.end_time() - start, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn every_vote_strictly_shortens_until_last_stops() {
        let (mut timer, fired) =
            counting_timer(&["a", "b", "c", "d", "e"], Duration::from_secs(300));
        let mut previous = timer.end_time();

        for name in ["a", "b", "c", "d"] {
            tokio::time::advance(Duration::from_secs(7)).await;
            assert!(timer.request_speed_up(&ParticipantId(name.into())));
            assert!(timer.end_time() < previous);
            previous = timer.end_time();
            assert_eq!(fired.load(Ordering::SeqCst), 0);
        }

        assert!(timer.request_speed_up(&ParticipantId("e".into())));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.remaining(), Duration::ZERO);
        assert!(timer.end_time() <= Instant::now());
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_unauthorised_and_repeated_votes() {
        let (mut timer, _fired) = counting_timer(&["a", "b"], Duration::from_secs(60));
        let before = timer.end_time();

        assert!(!timer.request_speed_up(&ParticipantId("z".into())));
        assert_eq!(timer.end_time(), before);

        assert!(timer.request_speed_up(&ParticipantId("a".into())));
        let after_first = timer.end_time();
        assert!(!timer.request_speed_up(&ParticipantId("a".into())));
        assert_eq!(timer.end_time(), after_first);
    }

    #[tokio::test(start_paused = true)]
    async fn accelerated_deadline_is_honoured_by_the_countdown_task() {
        let (mut timer, fired) = counting_timer(&["a", "b"], Duration::from_secs(100));
        assert!(timer.request_speed_up(&ParticipantId("a".into())));

        tokio::time::sleep(Duration::from_secs(51)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_after_stop_does_not_fire_again() {
        let (mut timer, fired) = counting_timer(&["a"], Duration::from_secs(30));

        timer.stop();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        timer.destroy();
        timer.stop();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_prevents_expiry() {
        let (mut timer, fired) = counting_timer(&["a"], Duration::from_secs(30));
        timer.destroy();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.request_speed_up(&ParticipantId("a".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_it() {
        let (timer, fired) = counting_timer(&["a"], Duration::from_secs(5));
        drop(timer);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn revoking_the_last_authorised_participant_fires() {
        let (mut timer, fired) = counting_timer(&["a", "b"], Duration::from_secs(60));
        let before = timer.end_time();

        assert!(timer.revoke(&ParticipantId("a".into())));
        assert_eq!(timer.end_time(), before);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert!(timer.revoke(&ParticipantId("b".into())));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn observers_see_every_deadline_change() {
        let (mut timer, _fired) = counting_timer(&["a", "b"], Duration::from_secs(60));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        timer.observe(move |_, countdown| sink.lock().unwrap().push(countdown));

        timer.request_speed_up(&ParticipantId("a".into()));
        timer.request_speed_up(&ParticipantId("b".into()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Countdown::EndsAt(_)));
        assert_eq!(seen[1], Countdown::Elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_authorised_set_only_expires_naturally() {
        let (mut timer, fired) = counting_timer(&[], Duration::from_secs(5));
        assert!(!timer.request_speed_up(&ParticipantId("a".into())));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
