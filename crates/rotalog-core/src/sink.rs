//! The rotating log sink.
//!
//! All mutable state of a sink lives in one [`SinkState`] behind a single
//! mutex. Writes, rotation checks and rotations each hold that mutex for
//! their whole critical section, so a write lands strictly before or strictly
//! after a rotation, never in between. The level threshold is the only field
//! read outside the lock.

use std::fmt;
use std::fs;
use std::io::Write;
use std::ops::ControlFlow;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::{RotationConfig, SinkConfig};
use crate::error::{LogError, LogResult};
use crate::level::Level;
use crate::logging::entry::render_line;
use crate::logging::writer::{Console, FileWriter};
use crate::rotation::executor::{self, RotationReport};
use crate::rotation::monitor::{Monitor, DEFAULT_MONITOR_INTERVAL};
use crate::rotation::{
    RotatingFile, RotationMode, RotationOutcome, RotationPolicy, SinkTarget, SizeUnit,
};

/// Tag used by [`Sink::console`] lines.
const CONSOLE_TAG: &str = "console";

/// Location written on lines the sink emits about itself.
const DIAGNOSTIC_SOURCE: &str = "rotalog";

/// A leveled log destination that rotates by size or by day.
///
/// Cheap to clone; all clones share the same file and lock.
///
/// ```no_run
/// use rotalog_core::{Level, Sink, SizeUnit};
///
/// let sink = Sink::builder().level(Level::Info).console(false).build();
/// sink.rotate_by_size("./logs", "app.log", 10, 5, SizeUnit::MB)?;
///
/// rotalog_core::info!(sink, "listening on {}", 8080);
/// sink.close();
/// # Ok::<(), rotalog_core::LogError>(())
/// ```
#[derive(Clone)]
pub struct Sink {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SinkState>,
    level: AtomicU8,
    monitor: Mutex<Option<Monitor>>,
    monitor_interval: Duration,
}

pub(crate) struct SinkState {
    phase: Phase,
    console: Console,
    clock: Arc<dyn Clock>,
}

enum Phase {
    Unset,
    Active(RotatingFile),
    Closed,
}

/// Builder for a [`Sink`].
pub struct SinkBuilder {
    level: Level,
    console: bool,
    console_writer: Option<Box<dyn Write + Send>>,
    monitor_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl Default for SinkBuilder {
    fn default() -> Self {
        Self {
            level: Level::default(),
            console: true,
            console_writer: None,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            clock: Arc::new(SystemClock),
        }
    }
}

impl SinkBuilder {
    /// Minimum level written (default: `Error`).
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Mirror lines to the console stream (default: on).
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Replace standard error as the console stream.
    pub fn console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console_writer = Some(Box::new(writer));
        self
    }

    /// Time between background rotation checks (default: 2 seconds).
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    /// Time source for timestamps and date rotation.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build an unconfigured sink. Nothing is written until
    /// [`Sink::rotate_by_size`] or [`Sink::rotate_by_date`] succeeds.
    pub fn build(self) -> Sink {
        let console = match self.console_writer {
            Some(writer) => Console::new(self.console, writer),
            None => Console::stderr(self.console),
        };
        Sink {
            inner: Arc::new(Inner {
                state: Mutex::new(SinkState {
                    phase: Phase::Unset,
                    console,
                    clock: self.clock,
                }),
                level: AtomicU8::new(self.level as u8),
                monitor: Mutex::new(None),
                monitor_interval: self.monitor_interval,
            }),
        }
    }
}

impl Default for Sink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink {
    /// An unconfigured sink with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SinkBuilder {
        SinkBuilder::default()
    }

    /// Build a sink and apply `config` to it.
    pub fn from_config(config: &SinkConfig) -> LogResult<Self> {
        let sink = Self::builder()
            .level(config.level)
            .console(config.console)
            .build();
        sink.configure_rotation(&config.rotation)?;
        Ok(sink)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Turn console mirroring on or off. Applies from the next write.
    pub fn set_console(&self, enabled: bool) {
        self.inner.state.lock().console.enabled = enabled;
    }

    pub fn set_level(&self, threshold: Level) {
        self.inner.level.store(threshold as u8, Ordering::Relaxed);
    }

    pub fn level(&self) -> Level {
        Level::try_from(self.inner.level.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Rotate once the active file reaches `max_size * unit` bytes, keeping
    /// at most `max_generations` numbered archives.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an empty `dir`/`base` or a zero size or
    /// generation count, `AlreadyConfigured` if a mode is already set (the
    /// existing configuration is left untouched), `Io` if the directory or
    /// file cannot be created.
    pub fn rotate_by_size(
        &self,
        dir: impl AsRef<Path>,
        base: &str,
        max_size: u64,
        max_generations: u32,
        unit: SizeUnit,
    ) -> LogResult<()> {
        let target = SinkTarget::new(dir, base)?;
        let policy = RotationPolicy::by_size(max_size, max_generations, unit)?;
        self.configure(target, policy).map(drop)
    }

    /// Rotate once per calendar day, archiving each day as
    /// `<base>.YYYY-MM-DD`.
    ///
    /// `interval_days` must be non-zero but does not change the daily cadence.
    ///
    /// # Errors
    ///
    /// Same as [`Sink::rotate_by_size`].
    pub fn rotate_by_date(
        &self,
        dir: impl AsRef<Path>,
        base: &str,
        interval_days: u32,
    ) -> LogResult<()> {
        let target = SinkTarget::new(dir, base)?;
        let today = self.inner.state.lock().clock.today();
        let policy = RotationPolicy::by_date(today, interval_days)?;
        self.configure(target, policy).map(drop)
    }

    /// Configure from a [`RotationConfig`].
    ///
    /// Returns `Rotated` when the existing active file already met the policy
    /// and was rotated as part of configuration, `NotDue` otherwise.
    pub fn configure_rotation(&self, rotation: &RotationConfig) -> LogResult<RotationOutcome> {
        let (target, policy) = match rotation {
            RotationConfig::BySize {
                dir,
                base,
                max_size,
                max_generations,
                unit,
            } => (
                SinkTarget::new(dir, base)?,
                RotationPolicy::by_size(*max_size, *max_generations, *unit)?,
            ),
            RotationConfig::ByDate {
                dir,
                base,
                interval_days,
            } => {
                let target = SinkTarget::new(dir, base)?;
                let today = self.inner.state.lock().clock.today();
                (target, RotationPolicy::by_date(today, *interval_days)?)
            }
        };
        self.configure(target, policy)
    }

    fn configure(&self, target: SinkTarget, policy: RotationPolicy) -> LogResult<RotationOutcome> {
        let monitor_name = format!("rotalog-monitor-{}", target.base());
        let report = {
            let mut state = self.inner.state.lock();
            match &state.phase {
                Phase::Unset => {}
                Phase::Active(file) => {
                    return Err(LogError::AlreadyConfigured(file.policy.mode()))
                }
                Phase::Closed => return Err(LogError::Closed),
            }

            fs::create_dir_all(target.dir()).map_err(|e| {
                LogError::io(format!("creating {}", target.dir().display()), e)
            })?;

            let today = state.clock.today();
            let (file, report) = if policy.should_rotate(target.active_path(), today) {
                let mut file = RotatingFile {
                    writer: FileWriter::detached(target.active_path()),
                    target,
                    policy,
                };
                let report = executor::rotate(&mut file, today);
                if !file.writer.is_open() {
                    return Err(LogError::io(
                        format!("creating {}", file.target.active_path().display()),
                        std::io::Error::other(report.failures.join("; ")),
                    ));
                }
                (file, Some(report))
            } else {
                let writer = FileWriter::open_append(target.active_path()).map_err(|e| {
                    LogError::io(format!("opening {}", target.active_path().display()), e)
                })?;
                let file = RotatingFile {
                    target,
                    policy,
                    writer,
                };
                (file, None)
            };

            tracing::debug!(
                active = %file.target.active_path().display(),
                mode = %file.policy.mode(),
                "log sink configured"
            );
            state.phase = Phase::Active(file);
            if let Some(report) = &report {
                state.write_diagnostics(report);
            }
            report
        };

        let outcome = match report {
            Some(report) => {
                report_failures(&report);
                report.outcome
            }
            None => RotationOutcome::NotDue,
        };
        self.start_monitor(monitor_name);
        Ok(outcome)
    }

    fn start_monitor(&self, name: String) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let spawned = Monitor::spawn(name, self.inner.monitor_interval, move || {
            match weak.upgrade() {
                Some(inner) if inner.check_rotation_logged() => ControlFlow::Continue(()),
                _ => ControlFlow::Break(()),
            }
        });

        match spawned {
            Ok(monitor) => *self.inner.monitor.lock() = Some(monitor),
            // Writes still trigger rotation, only the idle check is lost.
            Err(e) => tracing::error!(error = %e, "failed to start rotation monitor"),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Write `args` at `level`, tagged with the caller's file and line.
    #[track_caller]
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let caller = Location::caller();
        self.log_at(level, caller.file(), caller.line(), args);
    }

    /// Write `args` at `level` with an explicit source location.
    pub fn log_at(&self, level: Level, file: &str, line: u32, args: fmt::Arguments<'_>) {
        if !level.passes(self.level()) {
            return;
        }
        self.inner.write_entry(level.as_str(), file, line, args);
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    /// Logged like any other level; does not end the process.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Fatal, args);
    }

    /// Write a `console`-tagged line, only while console mirroring is on.
    /// Ignores the level threshold.
    #[track_caller]
    pub fn console(&self, args: fmt::Arguments<'_>) {
        let caller = Location::caller();
        self.inner
            .write_console_entry(caller.file(), caller.line(), args);
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Ask the policy and rotate if due; what the monitor does on each tick.
    pub fn check_rotation(&self) -> LogResult<RotationOutcome> {
        let (outcome, report) = self.inner.state.lock().check_rotation()?;
        if let Some(report) = report {
            report_failures(&report);
        }
        Ok(outcome)
    }

    /// Rotate regardless of the policy.
    pub fn rotate_now(&self) -> LogResult<RotationOutcome> {
        let report = self.inner.state.lock().rotate()?;
        report_failures(&report);
        Ok(report.outcome)
    }

    /// Sync file data to disk and flush the console stream.
    pub fn flush(&self) -> LogResult<()> {
        self.inner.state.lock().flush()
    }

    /// Stop the monitor, flush and close the file. Later writes are dropped
    /// and configuration calls fail with `Closed`.
    pub fn close(&self) {
        {
            let mut state = self.inner.state.lock();
            if let Phase::Active(file) = &mut state.phase {
                if let Err(e) = file.writer.close() {
                    tracing::warn!(error = %e, "failed to close log file");
                }
            }
            state.phase = Phase::Closed;
        }
        // Joined outside the state lock: a running tick needs it to finish.
        let monitor = self.inner.monitor.lock().take();
        if let Some(monitor) = monitor {
            monitor.stop();
        }
    }

    pub fn mode(&self) -> RotationMode {
        match &self.inner.state.lock().phase {
            Phase::Active(file) => file.policy.mode(),
            Phase::Unset | Phase::Closed => RotationMode::Unset,
        }
    }

    /// Current rotation settings, if configured.
    pub fn policy(&self) -> Option<RotationPolicy> {
        match &self.inner.state.lock().phase {
            Phase::Active(file) => Some(file.policy.clone()),
            Phase::Unset | Phase::Closed => None,
        }
    }

    /// Path of the active file, if configured.
    pub fn active_path(&self) -> Option<PathBuf> {
        match &self.inner.state.lock().phase {
            Phase::Active(file) => Some(file.target.active_path().to_path_buf()),
            Phase::Unset | Phase::Closed => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.inner.state.lock().phase, Phase::Closed)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("mode", &self.mode())
            .field("level", &self.level())
            .field("active_path", &self.active_path())
            .finish()
    }
}

impl Inner {
    fn write_entry(&self, tag: &str, file: &str, line: u32, args: fmt::Arguments<'_>) {
        let mut state = self.state.lock();
        let result = state.write_entry(tag, file, line, args);
        self.finish_write(state, result);
    }

    fn write_console_entry(&self, file: &str, line: u32, args: fmt::Arguments<'_>) {
        let mut state = self.state.lock();
        if !state.console.enabled {
            return;
        }
        let result = state.write_entry(CONSOLE_TAG, file, line, args);
        self.finish_write(state, result);
    }

    /// Recover from a failed write: note it through the sink's own writer,
    /// then report it once the lock is released. Never reaches the caller.
    fn finish_write(
        &self,
        mut state: parking_lot::MutexGuard<'_, SinkState>,
        result: LogResult<Option<RotationReport>>,
    ) {
        match result {
            Ok(Some(report)) => {
                drop(state);
                report_failures(&report);
            }
            Ok(None) => {}
            Err(err) => {
                state.write_diagnostic(format_args!("recovered: {}", err));
                drop(state);
                tracing::warn!(error = %err, "recovered from failed log write");
            }
        }
    }

    /// One monitor tick. Returns `false` once the sink is closed.
    fn check_rotation_logged(&self) -> bool {
        let result = self.state.lock().check_rotation();
        match result {
            Ok((_, Some(report))) => report_failures(&report),
            Ok((_, None)) => {}
            Err(LogError::Closed) => return false,
            Err(e) => tracing::warn!(error = %e, "background rotation check failed"),
        }
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Phase::Active(file) = &mut self.state.get_mut().phase {
            let _ = file.writer.close();
        }
    }
}

impl SinkState {
    fn active(&mut self) -> LogResult<&mut RotatingFile> {
        match &mut self.phase {
            Phase::Active(file) => Ok(file),
            Phase::Unset => Err(LogError::NotConfigured),
            Phase::Closed => Err(LogError::Closed),
        }
    }

    /// Rotate if due, then write one line to the file and the console.
    ///
    /// Lines for an unconfigured or closed sink are dropped.
    fn write_entry(
        &mut self,
        tag: &str,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> LogResult<Option<RotationReport>> {
        if !matches!(self.phase, Phase::Active(_)) {
            return Ok(None);
        }

        // Rendered up front: a failing Display must not leave partial bytes.
        let rendered = render_line(self.clock.now(), tag, file, line, args)?;

        let (_, report) = self.check_rotation()?;
        self.emit(rendered.as_bytes())?;
        Ok(report)
    }

    fn check_rotation(&mut self) -> LogResult<(RotationOutcome, Option<RotationReport>)> {
        let today = self.clock.today();
        let file = self.active()?;
        if !file.policy.should_rotate(file.target.active_path(), today) {
            return Ok((RotationOutcome::NotDue, None));
        }
        let report = executor::rotate(file, today);
        self.write_diagnostics(&report);
        Ok((report.outcome, Some(report)))
    }

    fn rotate(&mut self) -> LogResult<RotationReport> {
        let today = self.clock.today();
        let report = executor::rotate(self.active()?, today);
        self.write_diagnostics(&report);
        Ok(report)
    }

    fn flush(&mut self) -> LogResult<()> {
        if let Phase::Active(file) = &mut self.phase {
            let path = file.target.active_path().display().to_string();
            file.writer
                .sync()
                .map_err(|e| LogError::io(format!("syncing {}", path), e))?;
        }
        self.console
            .flush()
            .map_err(|e| LogError::io("flushing console", e))
    }

    /// Fan one rendered line out to the file, then the console.
    fn emit(&mut self, bytes: &[u8]) -> LogResult<()> {
        let file = self.active()?;
        file.writer.write_all(bytes).map_err(|e| {
            LogError::io(format!("writing {}", file.target.active_path().display()), e)
        })?;
        self.console
            .write_all(bytes)
            .map_err(|e| LogError::io("writing console", e))
    }

    fn write_diagnostics(&mut self, report: &RotationReport) {
        for failure in &report.failures {
            self.write_diagnostic(format_args!("rotation: {}", failure));
        }
    }

    /// Best-effort line about the sink itself, written through its own writer.
    fn write_diagnostic(&mut self, args: fmt::Arguments<'_>) {
        let rendered = render_line(
            self.clock.now(),
            Level::Warn.as_str(),
            DIAGNOSTIC_SOURCE,
            0,
            format_args!("rotalog: {}", args),
        );
        if let Ok(rendered) = rendered {
            let _ = self.emit(rendered.as_bytes());
        }
    }
}

fn report_failures(report: &RotationReport) {
    for failure in &report.failures {
        tracing::warn!(failure = %failure, "log rotation step failed");
    }
}
