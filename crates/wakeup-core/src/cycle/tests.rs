//! End-to-end cycle scenarios against a real redb store and fake
//! collaborators. The scripted timer stands in for the external answer
//! recorder: answers it applies become visible at the end of the wait window.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use super::*;
use crate::config::CycleSettings;
use crate::error::{Result, WakeupError};
use crate::model::{CallAttempt, ContactRelation, ContactStatus, Subscriber};
use crate::slot::Slot;
use crate::store::{FinalizeSummary, WakeupDb, WakeupStore};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakePlacer {
    requests: Mutex<Vec<CallRequest>>,
    /// phone -> number of placements that still fail
    failures: Mutex<HashMap<String, u32>>,
}

impl FakePlacer {
    fn failing(phone: &str, times: u32) -> Self {
        let placer = Self::default();
        placer.failures.lock().unwrap().insert(phone.to_string(), times);
        placer
    }

    fn dials(&self, phone: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.to == phone)
            .count()
    }

    fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl CallPlacer for FakePlacer {
    async fn place_call(&self, request: &CallRequest) -> std::result::Result<String, DispatchError> {
        let n = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let mut failures = self.failures.lock().unwrap();
        if let Some(left) = failures.get_mut(&request.to) {
            if *left > 0 {
                *left -= 1;
                return Err(DispatchError {
                    code: "31005".into(),
                    message: "connection error".into(),
                });
            }
        }
        Ok(format!("CA{n:04}"))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    requested: Mutex<Vec<(String, String)>>,
    accepted: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn deliver(
        &self,
        log: &Mutex<Vec<(String, String)>>,
        from: &Subscriber,
        to: &Subscriber,
    ) -> std::result::Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError("mail endpoint unreachable".into()));
        }
        log.lock()
            .unwrap()
            .push((from.username.clone(), to.username.clone()));
        Ok(())
    }
}

impl Notifier for RecordingNotifier {
    async fn contact_requested(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> std::result::Result<(), NotifyError> {
        self.deliver(&self.requested, from, to)
    }

    async fn contact_accepted(
        &self,
        from: &Subscriber,
        to: &Subscriber,
    ) -> std::result::Result<(), NotifyError> {
        self.deliver(&self.accepted, from, to)
    }
}

/// Applies one batch of answers per wait window.
struct ScriptedTimer<'a> {
    store: &'a WakeupDb,
    slot: Slot,
    answers: Mutex<VecDeque<Vec<Uuid>>>,
    waits: Mutex<Vec<Duration>>,
}

impl<'a> ScriptedTimer<'a> {
    fn new(store: &'a WakeupDb, answers: Vec<Vec<Uuid>>) -> Self {
        Self {
            store,
            slot: slot(),
            answers: Mutex::new(answers.into()),
            waits: Mutex::new(Vec::new()),
        }
    }

    fn silent(store: &'a WakeupDb) -> Self {
        Self::new(store, Vec::new())
    }

    fn waits(&self) -> usize {
        self.waits.lock().unwrap().len()
    }
}

impl Timer for ScriptedTimer<'_> {
    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
        let batch = self.answers.lock().unwrap().pop_front().unwrap_or_default();
        for id in batch {
            self.store.mark_answered(self.slot, id).unwrap();
        }
    }
}

/// Requests shutdown, then never finishes the wait on its own.
struct HangingTimer {
    trigger: ShutdownTrigger,
}

impl Timer for HangingTimer {
    async fn wait(&self, _duration: Duration) {
        self.trigger.trigger();
        std::future::pending::<()>().await;
    }
}

/// Delegates to a real store but fails `mark_snoozed`.
struct FailingStore {
    inner: WakeupDb,
}

impl WakeupStore for FailingStore {
    fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        self.inner.insert_subscriber(subscriber)
    }
    fn update_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        self.inner.update_subscriber(subscriber)
    }
    fn get_subscriber(&self, id: Uuid) -> Result<Option<Subscriber>> {
        self.inner.get_subscriber(id)
    }
    fn find_subscriber(&self, username: &str) -> Result<Option<Subscriber>> {
        self.inner.find_subscriber(username)
    }
    fn list_subscribers(&self) -> Result<Vec<Subscriber>> {
        self.inner.list_subscribers()
    }
    fn select_due(&self, slot: Slot) -> Result<Vec<Subscriber>> {
        self.inner.select_due(slot)
    }
    fn create_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<CallAttempt> {
        self.inner.create_attempt(slot, subscriber)
    }
    fn get_attempt(&self, slot: Slot, subscriber: Uuid) -> Result<Option<CallAttempt>> {
        self.inner.get_attempt(slot, subscriber)
    }
    fn attempts_for_slot(&self, slot: Slot) -> Result<Vec<CallAttempt>> {
        self.inner.attempts_for_slot(slot)
    }
    fn attempts_for_subscriber(&self, subscriber: Uuid) -> Result<Vec<CallAttempt>> {
        self.inner.attempts_for_subscriber(subscriber)
    }
    fn list_attempts(&self) -> Result<Vec<CallAttempt>> {
        self.inner.list_attempts()
    }
    fn record_dispatch(
        &self,
        slot: Slot,
        subscriber: Uuid,
        redial: bool,
        error_code: Option<&str>,
    ) -> Result<()> {
        self.inner.record_dispatch(slot, subscriber, redial, error_code)
    }
    fn mark_answered(&self, slot: Slot, subscriber: Uuid) -> Result<()> {
        self.inner.mark_answered(slot, subscriber)
    }
    fn mark_snoozed(&self, _slot: Slot) -> Result<Vec<Uuid>> {
        Err(WakeupError::Store("disk full".into()))
    }
    fn insert_contact(&self, contact: &ContactRelation) -> Result<()> {
        self.inner.insert_contact(contact)
    }
    fn contacts_for_slot(
        &self,
        slot: Slot,
        status: ContactStatus,
    ) -> Result<Vec<ContactRelation>> {
        self.inner.contacts_for_slot(slot, status)
    }
    fn finalize_slot(&self, slot: Slot) -> Result<FinalizeSummary> {
        self.inner.finalize_slot(slot)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 06:58:12 rounds to the 07:00 slot.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 6, 58, 12).unwrap()
}

fn slot() -> Slot {
    Slot::quantize(now(), 60)
}

fn settings(max_rounds: u32) -> CycleSettings {
    CycleSettings {
        slot_granularity_minutes: 60,
        max_rounds,
        wait: Duration::from_secs(300),
    }
}

fn open_tmp() -> (TempDir, WakeupDb) {
    let dir = TempDir::new().unwrap();
    let db = WakeupDb::open(&dir.path().join("wakeup.db")).unwrap();
    (dir, db)
}

fn add_subscriber(db: &impl WakeupStore, name: &str, phone: &str) -> Subscriber {
    let mut s = Subscriber::new(name, phone, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    s.any_match = true;
    db.insert_subscriber(&s).unwrap();
    s
}

fn attempt(db: &WakeupDb, s: &Subscriber) -> CallAttempt {
    db.get_attempt(slot(), s.id).unwrap().expect("attempt exists")
}

const WEB_ROOT: &str = "https://wake.example/";

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_answers_in_first_round_other_never_does() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let b = add_subscriber(&db, "b", "+15550002");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::new(&db, vec![vec![a.id]]);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.slot, slot());
    assert_eq!(report.rounds, 2);
    assert_eq!(report.pending_after_round, vec![vec![b.id], vec![b.id]]);
    assert_eq!(placer.dials("+15550001"), 1);
    assert_eq!(placer.dials("+15550002"), 2);
    assert_eq!(timer.waits(), 2);

    let a_attempt = attempt(&db, &a);
    assert!(a_attempt.answered && !a_attempt.snoozed);
    let b_attempt = attempt(&db, &b);
    assert!(!b_attempt.answered && b_attempt.snoozed);
    assert_eq!(b_attempt.retry_count, 1);

    for s in [&a, &b] {
        let after = db.get_subscriber(s.id).unwrap().unwrap();
        assert!(!after.alarm_on, "{} alarm should be cleared", after.username);
        assert!(!after.any_match, "{} any_match should be cleared", after.username);
    }
    assert_eq!(
        report.finalize,
        FinalizeSummary {
            participants: 2,
            any_match_cleared: 2,
            alarm_cleared: 2,
        }
    );
}

#[tokio::test]
async fn empty_selection_goes_straight_to_finalizing() {
    let (_dir, db) = open_tmp();
    // Due an hour later, so not part of this slot.
    let mut later = Subscriber::new("late", "+15550009", NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    later.any_match = true;
    db.insert_subscriber(&later).unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert!(report.selected.is_empty());
    assert_eq!(report.rounds, 0);
    assert_eq!(report.finalize, FinalizeSummary::default());
    assert_eq!(report.notifications_sent, 0);
    assert!(db.attempts_for_slot(slot()).unwrap().is_empty());
    assert_eq!(placer.total(), 0);
    assert_eq!(timer.waits(), 0);

    let untouched = db.get_subscriber(later.id).unwrap().unwrap();
    assert!(untouched.alarm_on && untouched.any_match);
}

#[tokio::test]
async fn transient_dispatch_failure_is_retried_next_round() {
    let (_dir, db) = open_tmp();
    let c = add_subscriber(&db, "c", "+15550003");
    let placer = FakePlacer::failing("+15550003", 1);
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.dispatches, 2);
    assert_eq!(report.dispatch_failures, 1);
    assert_eq!(report.pending_after_round[0], vec![c.id]);
    assert_eq!(placer.dials("+15550003"), 2);

    let c_attempt = attempt(&db, &c);
    assert!(c_attempt.snoozed);
    assert_eq!(c_attempt.retry_count, 1);
    assert_eq!(c_attempt.error_code, None, "second placement succeeded");
}

#[tokio::test]
async fn one_failed_placement_does_not_stop_the_rest_of_the_round() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let b = add_subscriber(&db, "b", "+15550002");
    let placer = FakePlacer::failing("+15550001", 1);
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(report.dispatches, 2);
    assert_eq!(report.dispatch_failures, 1);
    assert_eq!(placer.dials("+15550001"), 1);
    assert_eq!(placer.dials("+15550002"), 1);
    assert_eq!(report.pending_after_round, vec![vec![a.id, b.id]]);

    let a_attempt = attempt(&db, &a);
    let b_attempt = attempt(&db, &b);
    assert!(a_attempt.snoozed && b_attempt.snoozed);
    assert_eq!(a_attempt.error_code.as_deref(), Some("31005"));
    assert_eq!(b_attempt.error_code, None);
}

#[tokio::test]
async fn failure_in_last_round_is_recorded_on_attempt() {
    let (_dir, db) = open_tmp();
    let c = add_subscriber(&db, "c", "+15550003");
    let placer = FakePlacer::failing("+15550003", 5);
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.dispatch_failures, 1);
    let c_attempt = attempt(&db, &c);
    assert_eq!(c_attempt.error_code.as_deref(), Some("31005"));
    assert!(c_attempt.snoozed);
}

#[tokio::test]
async fn single_round_budget_means_no_retries() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let b = add_subscriber(&db, "b", "+15550002");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(placer.total(), 2);
    assert_eq!(timer.waits(), 1);
    assert_eq!(report.unanswered(), &[a.id, b.id]);
    assert!(attempt(&db, &a).snoozed && attempt(&db, &b).snoozed);
}

#[tokio::test]
async fn loop_stops_once_everyone_answered() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::new(&db, vec![vec![a.id]]);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(3), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.rounds, 1);
    assert_eq!(placer.total(), 1);
    assert_eq!(timer.waits(), 1);
    assert!(report.unanswered().is_empty());
    assert!(!attempt(&db, &a).snoozed);
}

#[tokio::test]
async fn pending_only_shrinks_and_dials_stay_within_budget() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let b = add_subscriber(&db, "b", "+15550002");
    let c = add_subscriber(&db, "c", "+15550003");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    // b answers in round 2, a in round 3; c never does.
    let timer = ScriptedTimer::new(&db, vec![vec![], vec![b.id], vec![a.id]]);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(3), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    let mut previous: Vec<Uuid> = report.selected.clone();
    for pending in &report.pending_after_round {
        assert!(pending.iter().all(|id| previous.contains(id)));
        previous = pending.clone();
    }
    assert_eq!(report.unanswered(), &[c.id]);

    assert_eq!(placer.dials("+15550001"), 3);
    assert_eq!(placer.dials("+15550002"), 2);
    assert_eq!(placer.dials("+15550003"), 3);
    for s in [&a, &b, &c] {
        assert!(attempt(&db, s).snoozed, "everyone missed at least one window");
    }
}

#[tokio::test]
async fn recurring_subscriber_keeps_alarm() {
    let (_dir, db) = open_tmp();
    let mut daily = Subscriber::new("daily", "+15550004", NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    daily.recurring = true;
    daily.any_match = true;
    db.insert_subscriber(&daily).unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::new(&db, vec![vec![daily.id]]);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.finalize.alarm_cleared, 0);
    let after = db.get_subscriber(daily.id).unwrap().unwrap();
    assert!(after.alarm_on);
    assert!(!after.any_match);
}

#[tokio::test]
async fn contact_notifications_repeat_every_round() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let mut x = Subscriber::new("x", "+15550010", NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    x.alarm_on = false;
    db.insert_subscriber(&x).unwrap();
    let mut y = Subscriber::new("y", "+15550011", NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    y.alarm_on = false;
    db.insert_subscriber(&y).unwrap();

    db.insert_contact(&ContactRelation::new(a.id, x.id, ContactStatus::Pending))
        .unwrap();
    db.insert_contact(&ContactRelation::new(a.id, y.id, ContactStatus::Accepted))
        .unwrap();
    // Requester not part of the slot: never notified.
    db.insert_contact(&ContactRelation::new(x.id, y.id, ContactStatus::Pending))
        .unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    let pair = ("a".to_string(), "x".to_string());
    assert_eq!(*notifier.requested.lock().unwrap(), vec![pair.clone(), pair]);
    let pair = ("a".to_string(), "y".to_string());
    assert_eq!(*notifier.accepted.lock().unwrap(), vec![pair.clone(), pair]);
    assert_eq!(report.notifications_sent, 4);
    assert_eq!(report.notifications_failed, 0);
}

#[tokio::test]
async fn notification_failures_do_not_abort_the_cycle() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let b = add_subscriber(&db, "b", "+15550002");
    db.insert_contact(&ContactRelation::new(a.id, b.id, ContactStatus::Pending))
        .unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::failing();
    let timer = ScriptedTimer::silent(&db);

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    assert_eq!(report.rounds, 2);
    assert_eq!(report.notifications_sent, 0);
    assert_eq!(report.notifications_failed, 2);
    assert_eq!(report.finalize.participants, 2);
}

#[tokio::test]
async fn store_failure_aborts_without_finalizing() {
    let dir = TempDir::new().unwrap();
    let store = FailingStore {
        inner: WakeupDb::open(&dir.path().join("wakeup.db")).unwrap(),
    };
    let a = add_subscriber(&store, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&store.inner);

    let err = WakeupCycle::new(&store, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .run(now())
        .await
        .unwrap_err();

    assert!(matches!(err, WakeupError::Store(_)));
    assert_eq!(placer.total(), 1, "only the first round was dispatched");
    let after = store.get_subscriber(a.id).unwrap().unwrap();
    assert!(after.alarm_on && after.any_match, "cleanup must not run");
}

#[tokio::test]
async fn shutdown_during_wait_reconciles_then_finalizes() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let (trigger, shutdown) = shutdown_channel();
    let timer = HangingTimer { trigger };

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(3), WEB_ROOT)
        .with_shutdown(shutdown)
        .run(now())
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.rounds, 1);
    assert_eq!(report.pending_after_round, vec![vec![a.id]]);
    assert!(attempt(&db, &a).snoozed);
    assert_eq!(report.finalize.participants, 1);
    assert!(!db.get_subscriber(a.id).unwrap().unwrap().alarm_on);
}

#[tokio::test]
async fn shutdown_before_start_selects_nobody() {
    let (_dir, db) = open_tmp();
    let a = add_subscriber(&db, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);
    let (trigger, shutdown) = shutdown_channel();
    trigger.trigger();

    let report = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT)
        .with_shutdown(shutdown)
        .run(now())
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.selected.is_empty());
    assert_eq!(placer.total(), 0);
    assert!(db.get_subscriber(a.id).unwrap().unwrap().alarm_on);
}

#[tokio::test]
async fn calls_carry_slot_callbacks_and_are_silent() {
    let (_dir, db) = open_tmp();
    add_subscriber(&db, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);

    WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT)
        .run(now())
        .await
        .unwrap();

    let requests = placer.requests.lock().unwrap();
    let request = &requests[0];
    assert!(request.silent);
    assert_eq!(request.answer_url, "https://wake.example/wakeuprequest/03:06:24:07:00:00");
    assert_eq!(request.fallback_url, "https://wake.example/fallback/03:06:24:07:00:00");
    assert_eq!(
        request.no_answer_url,
        "https://wake.example/answercallback/03:06:24:07:00:00"
    );
}

#[tokio::test]
async fn rerunning_a_finished_slot_finds_nobody_due() {
    let (_dir, db) = open_tmp();
    add_subscriber(&db, "a", "+15550001");
    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::silent(&db);
    let cycle = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT);

    let first = cycle.run(now()).await.unwrap();
    assert_eq!(first.selected.len(), 1);

    // alarm_on was cleared by the first run.
    let second = cycle.run(now()).await.unwrap();
    assert!(second.selected.is_empty());
    assert_eq!(placer.total(), 1);
}

#[tokio::test]
async fn rerunning_a_slot_skips_recurring_subscribers_who_answered() {
    let (_dir, db) = open_tmp();
    let mut daily = Subscriber::new("daily", "+15550001", NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    daily.recurring = true;
    db.insert_subscriber(&daily).unwrap();
    let mut late = Subscriber::new("late", "+15550002", NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    late.recurring = true;
    db.insert_subscriber(&late).unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::new(&db, vec![vec![daily.id]]);
    let cycle = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(1), WEB_ROOT);

    cycle.run(now()).await.unwrap();
    assert!(attempt(&db, &daily).answered);
    assert_eq!(placer.dials("+15550001"), 1);

    let second = cycle.run(now()).await.unwrap();
    assert_eq!(second.selected, vec![daily.id, late.id]);
    assert_eq!(second.already_answered, vec![daily.id]);
    assert_eq!(second.dispatches, 1);
    assert_eq!(placer.dials("+15550001"), 1, "answered subscriber is not called again");
    assert_eq!(placer.dials("+15550002"), 2);
    assert_eq!(second.pending_after_round, vec![vec![late.id]]);
    assert!(!attempt(&db, &daily).snoozed);
}

#[tokio::test]
async fn rerunning_a_fully_answered_slot_dials_nobody() {
    let (_dir, db) = open_tmp();
    let mut daily = Subscriber::new("daily", "+15550001", NaiveTime::from_hms_opt(7, 0, 0).unwrap());
    daily.recurring = true;
    db.insert_subscriber(&daily).unwrap();

    let placer = FakePlacer::default();
    let notifier = RecordingNotifier::default();
    let timer = ScriptedTimer::new(&db, vec![vec![daily.id]]);
    let cycle = WakeupCycle::new(&db, &placer, &notifier, &timer, settings(2), WEB_ROOT);

    cycle.run(now()).await.unwrap();
    let second = cycle.run(now()).await.unwrap();

    assert_eq!(second.rounds, 0);
    assert_eq!(second.dispatches, 0);
    assert_eq!(second.already_answered, vec![daily.id]);
    assert!(second.unanswered().is_empty());
    assert_eq!(second.finalize.participants, 1);
    assert_eq!(placer.total(), 1);
    assert_eq!(timer.waits(), 1);
}
