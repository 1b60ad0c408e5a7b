//! Game embed loader.
//!
//! Owns the lifecycle of the embedded game frame: a cover screen until the
//! player opts in, then a load attempt guarded by a watchdog timer. Failed
//! attempts (native error signal or watchdog) are retried automatically after
//! `retry_interval_ms`, up to `max_retries` times; after that the error panel
//! shows the cause-specific text and waits for a manual retry.
//!
//! ```text
//! Covered --start()--> Loading --loaded--> Ready
//!                      Loading --failed, attempt < max--> Retrying --interval--> Loading
//!                      Loading --failed, attempt >= max--> Failed --retry_manually()--> Loading
//! ```
//!
//! The loader never touches the DOM or the clock directly; both come in
//! through `EmbedSurface` and `Scheduler` so the state machine runs natively
//! under `cargo test`.

use log::{debug, info, warn};

pub mod scheduler;
pub mod surface;

pub use scheduler::{BrowserScheduler, Scheduler, TimerId};
pub use surface::{DomSurface, EmbedSurface};

/// Why a load attempt failed. Preserved through to the displayed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// Watchdog fired before the frame reported a load
    Timeout,
    NotFound,
    /// Native error signal without more detail
    Generic,
}

impl FailureCause {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "timeout" => Some(FailureCause::Timeout),
            "notFound" | "not_found" => Some(FailureCause::NotFound),
            "generic" => Some(FailureCause::Generic),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            FailureCause::Timeout => "timeout",
            FailureCause::NotFound => "notFound",
            FailureCause::Generic => "generic",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderMessages {
    pub loading: String,
    pub timeout: String,
    pub not_found: String,
    pub generic: String,
}

impl LoaderMessages {
    pub fn for_cause(&self, cause: FailureCause) -> &str {
        match cause {
            FailureCause::Timeout => &self.timeout,
            FailureCause::NotFound => &self.not_found,
            FailureCause::Generic => &self.generic,
        }
    }
}

/// Fixed for the lifetime of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderSettings {
    pub target_url: String,
    pub load_timeout_ms: u32,
    pub max_retries: u32,
    pub retry_interval_ms: u32,
    pub messages: LoaderMessages,
}

/// Externally observable phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedStatus {
    Covered,
    Loading,
    /// Between a failed attempt and the next automatic one; no error shown.
    Retrying,
    Ready,
    Failed,
}

impl EmbedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedStatus::Covered => "covered",
            EmbedStatus::Loading => "loading",
            EmbedStatus::Retrying => "retrying",
            EmbedStatus::Ready => "ready",
            EmbedStatus::Failed => "failed",
        }
    }
}

// Timer handles live in the variant that owns them: a watchdog exists iff
// the session is Loading, a retry timer iff it is Retrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionState {
    Covered,
    Loading { watchdog: TimerId },
    Retrying { retry: TimerId },
    Ready,
    Failed { cause: FailureCause },
}

pub struct GameEmbedLoader<S: EmbedSurface, C: Scheduler> {
    surface: S,
    scheduler: C,
    settings: LoaderSettings,
    state: SessionState,
    attempt: u32,
}

impl<S: EmbedSurface, C: Scheduler> GameEmbedLoader<S, C> {
    pub fn new(surface: S, scheduler: C, settings: LoaderSettings) -> Self {
        Self {
            surface,
            scheduler,
            settings,
            state: SessionState::Covered,
            attempt: 0,
        }
    }

    pub fn status(&self) -> EmbedStatus {
        match self.state {
            SessionState::Covered => EmbedStatus::Covered,
            SessionState::Loading { .. } => EmbedStatus::Loading,
            SessionState::Retrying { .. } => EmbedStatus::Retrying,
            SessionState::Ready => EmbedStatus::Ready,
            SessionState::Failed { .. } => EmbedStatus::Failed,
        }
    }

    /// Automatic retries used since the last success or manual retry.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn watchdog(&self) -> Option<TimerId> {
        match self.state {
            SessionState::Loading { watchdog } => Some(watchdog),
            _ => None,
        }
    }

    pub fn pending_retry(&self) -> Option<TimerId> {
        match self.state {
            SessionState::Retrying { retry } => Some(retry),
            _ => None,
        }
    }

    /// Cause of the terminal failure, while `Failed`.
    pub fn failure(&self) -> Option<FailureCause> {
        match self.state {
            SessionState::Failed { cause } => Some(cause),
            _ => None,
        }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn scheduler(&self) -> &C {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    /// Player pressed start on the cover.
    pub fn start(&mut self) {
        if self.state != SessionState::Covered {
            warn!("start ignored in {} state", self.status().as_str());
            return;
        }
        self.surface.hide_cover();
        self.begin_attempt();
    }

    /// Frame reported a completed load.
    pub fn on_load_succeeded(&mut self) {
        let SessionState::Loading { watchdog } = self.state else {
            debug!("load signal ignored in {} state", self.status().as_str());
            return;
        };
        self.scheduler.cancel(watchdog);
        self.attempt = 0;
        self.surface.hide_error();
        self.surface.hide_loading();
        self.state = SessionState::Ready;
        info!("game ready ({})", self.settings.target_url);
    }

    /// Frame reported an error, or the page forwarded one. Racing signals
    /// after the first are dropped by the state guard.
    pub fn on_load_failed(&mut self, cause: FailureCause) {
        let SessionState::Loading { watchdog } = self.state else {
            debug!("{} failure ignored in {} state", cause.code(), self.status().as_str());
            return;
        };
        self.scheduler.cancel(watchdog);
        self.fail(cause);
    }

    /// User pressed retry on the error panel.
    pub fn retry_manually(&mut self) {
        if !matches!(self.state, SessionState::Failed { .. }) {
            warn!("manual retry ignored in {} state", self.status().as_str());
            return;
        }
        self.attempt = 0;
        self.begin_attempt();
    }

    /// Dispatch a fired timer. Ids that no longer match the current state
    /// payload are stale and ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        match self.state {
            SessionState::Loading { watchdog } if watchdog == id => {
                debug!("watchdog {id} fired after {} ms", self.settings.load_timeout_ms);
                self.fail(FailureCause::Timeout);
            }
            SessionState::Retrying { retry } if retry == id => self.begin_attempt(),
            _ => debug!("stale timer {id} ignored"),
        }
    }

    fn begin_attempt(&mut self) {
        if let SessionState::Loading { watchdog } = self.state {
            self.scheduler.cancel(watchdog);
        }
        self.surface.hide_error();
        self.surface.show_frame();
        self.surface.show_loading(&self.settings.messages.loading);
        self.surface.set_source(&self.settings.target_url);
        let watchdog = self.scheduler.schedule(self.settings.load_timeout_ms);
        self.state = SessionState::Loading { watchdog };
        debug!(
            "load attempt {} of {} armed watchdog {watchdog}",
            self.attempt + 1,
            self.settings.max_retries + 1
        );
    }

    // Watchdog already cancelled or fired by the caller.
    fn fail(&mut self, cause: FailureCause) {
        if self.attempt < self.settings.max_retries {
            self.attempt += 1;
            let retry = self.scheduler.schedule(self.settings.retry_interval_ms);
            self.state = SessionState::Retrying { retry };
            debug!(
                "{} failure, retry {}/{} in {} ms",
                cause.code(),
                self.attempt,
                self.settings.max_retries,
                self.settings.retry_interval_ms
            );
            return;
        }
        self.surface.hide_loading();
        self.surface.show_error(self.settings.messages.for_cause(cause));
        self.surface.hide_frame();
        self.state = SessionState::Failed { cause };
        info!("game failed to load after {} retries ({})", self.attempt, cause.code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeSurface {
        cover_visible: bool,
        frame_visible: bool,
        source: Option<String>,
        source_sets: usize,
        loading: Option<String>,
        error: Option<String>,
        error_shown_ever: bool,
    }

    impl FakeSurface {
        fn new() -> Self {
            Self {
                cover_visible: true,
                ..Default::default()
            }
        }
    }

    impl EmbedSurface for FakeSurface {
        fn hide_cover(&mut self) {
            self.cover_visible = false;
        }
        fn set_source(&mut self, url: &str) {
            self.source = Some(url.to_string());
            self.source_sets += 1;
        }
        fn show_frame(&mut self) {
            self.frame_visible = true;
        }
        fn hide_frame(&mut self) {
            self.frame_visible = false;
        }
        fn show_loading(&mut self, message: &str) {
            self.loading = Some(message.to_string());
        }
        fn hide_loading(&mut self) {
            self.loading = None;
        }
        fn show_error(&mut self, message: &str) {
            self.error = Some(message.to_string());
            self.error_shown_ever = true;
        }
        fn hide_error(&mut self) {
            self.error = None;
        }
        fn dimensions(&self) -> (u32, u32) {
            (1280, 720)
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Op {
        Arm(TimerId, u32),
        Cancel(TimerId),
    }

    /// Records every call; `armed` holds timers that are neither cancelled
    /// nor fired.
    #[derive(Debug, Default)]
    struct FakeScheduler {
        next: TimerId,
        armed: Vec<(TimerId, u32)>,
        ops: Vec<Op>,
        max_armed: usize,
    }

    impl FakeScheduler {
        fn take_fired(&mut self, id: TimerId) {
            self.armed.retain(|(t, _)| *t != id);
        }
    }

    impl Scheduler for FakeScheduler {
        fn schedule(&mut self, delay_ms: u32) -> TimerId {
            self.next += 1;
            self.armed.push((self.next, delay_ms));
            self.ops.push(Op::Arm(self.next, delay_ms));
            self.max_armed = self.max_armed.max(self.armed.len());
            self.next
        }
        fn cancel(&mut self, id: TimerId) {
            self.armed.retain(|(t, _)| *t != id);
            self.ops.push(Op::Cancel(id));
        }
    }

    type TestLoader = GameEmbedLoader<FakeSurface, FakeScheduler>;

    const URL: &str = "https://example.com/game/";

    fn settings(max_retries: u32) -> LoaderSettings {
        LoaderSettings {
            target_url: URL.into(),
            load_timeout_ms: 30_000,
            max_retries,
            retry_interval_ms: 1_000,
            messages: LoaderMessages {
                loading: "loading".into(),
                timeout: "timed out".into(),
                not_found: "not found".into(),
                generic: "broken".into(),
            },
        }
    }

    fn loader(max_retries: u32) -> TestLoader {
        GameEmbedLoader::new(FakeSurface::new(), FakeScheduler::default(), settings(max_retries))
    }

    /// Fire a timer the way the browser would: it leaves the armed set, then
    /// the loader is told.
    fn fire(l: &mut TestLoader, id: TimerId) {
        l.scheduler_mut().take_fired(id);
        l.on_timer(id);
    }

    fn fire_watchdog(l: &mut TestLoader) {
        let id = l.watchdog().expect("watchdog armed");
        fire(l, id);
    }

    fn fire_retry(l: &mut TestLoader) {
        let id = l.pending_retry().expect("retry pending");
        fire(l, id);
    }

    #[test]
    fn starts_covered_without_timers() {
        let l = loader(3);
        assert_eq!(l.status(), EmbedStatus::Covered);
        assert_eq!(l.attempt(), 0);
        assert!(l.watchdog().is_none());
        assert!(l.scheduler().ops.is_empty());
        assert!(l.surface().cover_visible);
    }

    #[test]
    fn start_hides_cover_and_arms_one_watchdog() {
        let mut l = loader(3);
        l.start();
        assert_eq!(l.status(), EmbedStatus::Loading);
        assert!(!l.surface().cover_visible);
        assert!(l.surface().frame_visible);
        assert_eq!(l.surface().source.as_deref(), Some(URL));
        assert_eq!(l.surface().loading.as_deref(), Some("loading"));
        assert_eq!(l.scheduler().armed, vec![(1, 30_000)]);
        assert_eq!(l.watchdog(), Some(1));
    }

    #[test]
    fn start_twice_is_ignored() {
        let mut l = loader(3);
        l.start();
        l.start();
        assert_eq!(l.scheduler().ops.len(), 1);
        assert_eq!(l.surface().source_sets, 1);
    }

    #[test]
    fn success_cancels_watchdog_and_becomes_ready() {
        let mut l = loader(3);
        l.start();
        l.on_load_succeeded();
        assert_eq!(l.status(), EmbedStatus::Ready);
        assert!(l.scheduler().armed.is_empty());
        assert_eq!(l.scheduler().ops, vec![Op::Arm(1, 30_000), Op::Cancel(1)]);
        assert!(l.surface().loading.is_none());
        assert!(l.surface().error.is_none());
    }

    #[test]
    fn signals_outside_loading_are_noops() {
        let mut l = loader(3);
        l.on_load_succeeded();
        l.on_load_failed(FailureCause::Generic);
        assert_eq!(l.status(), EmbedStatus::Covered);
        assert!(l.scheduler().ops.is_empty());

        l.start();
        l.on_load_succeeded();
        let ops_before = l.scheduler().ops.len();
        l.on_load_succeeded();
        l.on_load_failed(FailureCause::Timeout);
        l.retry_manually();
        assert_eq!(l.status(), EmbedStatus::Ready);
        assert_eq!(l.attempt(), 0);
        assert_eq!(l.scheduler().ops.len(), ops_before);
    }

    #[test]
    fn failure_schedules_retry_without_error_panel() {
        let mut l = loader(3);
        l.start();
        l.on_load_failed(FailureCause::Generic);
        assert_eq!(l.status(), EmbedStatus::Retrying);
        assert_eq!(l.attempt(), 1);
        assert!(l.watchdog().is_none());
        assert_eq!(l.scheduler().armed, vec![(2, 1_000)]);
        assert!(!l.surface().error_shown_ever);

        fire_retry(&mut l);
        assert_eq!(l.status(), EmbedStatus::Loading);
        assert_eq!(l.surface().source_sets, 2);
        assert_eq!(l.scheduler().armed, vec![(3, 30_000)]);
    }

    #[test]
    fn n_plus_one_failures_fail_for_every_n() {
        for n in 0..5 {
            let mut l = loader(n);
            l.start();
            for _ in 0..n {
                l.on_load_failed(FailureCause::Generic);
                assert_eq!(l.status(), EmbedStatus::Retrying);
                fire_retry(&mut l);
            }
            l.on_load_failed(FailureCause::Generic);
            assert_eq!(l.status(), EmbedStatus::Failed, "max_retries = {n}");
            assert_eq!(l.attempt(), n);
            assert!(!l.surface().frame_visible);
            assert!(l.scheduler().armed.is_empty());
            assert_eq!(l.surface().source_sets as u32, n + 1);
        }
    }

    #[test]
    fn repeated_timeouts_end_with_timeout_message() {
        let mut l = loader(3);
        l.start();
        for _ in 0..3 {
            fire_watchdog(&mut l);
            assert_eq!(l.status(), EmbedStatus::Retrying);
            fire_retry(&mut l);
        }
        fire_watchdog(&mut l);
        assert_eq!(l.status(), EmbedStatus::Failed);
        assert_eq!(l.failure(), Some(FailureCause::Timeout));
        assert_eq!(l.surface().error.as_deref(), Some("timed out"));
        assert!(l.scheduler().armed.is_empty());
        assert_eq!(l.surface().source_sets, 4);
    }

    #[test]
    fn three_retries_then_no_fourth_automatic_attempt() {
        let mut l = loader(3);
        l.start();
        for n in 1..=3 {
            fire_watchdog(&mut l);
            assert_eq!(l.attempt(), n);
            fire_retry(&mut l);
            assert_eq!(l.status(), EmbedStatus::Loading);
        }
        assert!(!l.surface().error_shown_ever);

        fire_watchdog(&mut l);
        assert_eq!(l.status(), EmbedStatus::Failed);
        assert!(l.pending_retry().is_none());
        let retries = l.scheduler().ops.iter().filter(|op| matches!(op, Op::Arm(_, 1_000))).count();
        assert_eq!(retries, 3);
        assert!(l.surface().error_shown_ever);
    }

    #[test]
    fn success_on_automatic_retry_resets_attempt() {
        let mut l = loader(3);
        l.start();
        l.on_load_failed(FailureCause::Generic);
        fire_retry(&mut l);
        l.on_load_succeeded();
        assert_eq!(l.status(), EmbedStatus::Ready);
        assert_eq!(l.attempt(), 0);
        assert!(!l.surface().error_shown_ever);
    }

    #[test]
    fn manual_retry_restarts_with_fresh_watchdog() {
        let mut l = loader(1);
        l.start();
        l.on_load_failed(FailureCause::NotFound);
        fire_retry(&mut l);
        l.on_load_failed(FailureCause::NotFound);
        assert_eq!(l.status(), EmbedStatus::Failed);
        assert_eq!(l.surface().error.as_deref(), Some("not found"));

        l.retry_manually();
        assert_eq!(l.status(), EmbedStatus::Loading);
        assert_eq!(l.attempt(), 0);
        let id = l.watchdog().unwrap();
        assert_eq!(l.scheduler().armed, vec![(id, 30_000)]);
        assert!(l.surface().error.is_none());
        assert!(l.surface().frame_visible);
    }

    #[test]
    fn racing_double_failure_is_idempotent() {
        let mut l = loader(0);
        l.start();
        l.on_load_failed(FailureCause::Generic);
        assert_eq!(l.status(), EmbedStatus::Failed);
        let ops = l.scheduler().ops.clone();
        l.on_load_failed(FailureCause::Timeout);
        assert_eq!(l.status(), EmbedStatus::Failed);
        assert_eq!(l.attempt(), 0);
        assert_eq!(l.failure(), Some(FailureCause::Generic));
        assert_eq!(l.surface().error.as_deref(), Some("broken"));
        assert_eq!(l.scheduler().ops, ops);
    }

    #[test]
    fn watchdog_queued_behind_native_error_is_stale() {
        let mut l = loader(3);
        l.start();
        let watchdog = l.watchdog().unwrap();
        l.on_load_failed(FailureCause::Generic);
        // cancelled timer callback still delivered
        l.on_timer(watchdog);
        assert_eq!(l.status(), EmbedStatus::Retrying);
        assert_eq!(l.attempt(), 1);
        assert_eq!(l.scheduler().armed.len(), 1);
    }

    #[test]
    fn at_most_one_timer_armed_and_cancel_precedes_arm() {
        let mut l = loader(3);
        l.start();
        l.on_load_failed(FailureCause::Generic);
        fire_retry(&mut l);
        fire_watchdog(&mut l);
        fire_retry(&mut l);
        l.on_load_succeeded();
        assert_eq!(l.scheduler().max_armed, 1);

        let ops = &l.scheduler().ops;
        assert_eq!(
            ops.as_slice(),
            &[
                Op::Arm(1, 30_000),
                Op::Cancel(1),
                Op::Arm(2, 1_000),
                Op::Arm(3, 30_000),
                Op::Arm(4, 1_000),
                Op::Arm(5, 30_000),
                Op::Cancel(5),
            ]
        );
    }

    #[test]
    fn failure_cause_codes() {
        for cause in [FailureCause::Timeout, FailureCause::NotFound, FailureCause::Generic] {
            assert_eq!(FailureCause::from_code(cause.code()), Some(cause));
        }
        assert_eq!(FailureCause::from_code("not_found"), Some(FailureCause::NotFound));
        assert_eq!(FailureCause::from_code("boom"), None);
    }
}
