//! Search monitors that bound the sandwich solver.
//!
//! A monitor observes every expansion of the search and may ask for the
//! search to stop. The solver stops as soon as any monitor returns
//! [`SearchCommand::Terminate`], reporting the given reason.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// What the search should do next.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SearchCommand {
    /// Keep searching.
    #[default]
    Continue,

    /// Stop searching for the given reason.
    Terminate(String),
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "continue"),
            SearchCommand::Terminate(reason) => write!(f, "terminate: {reason}"),
        }
    }
}

/// An observer of the sandwich search.
pub trait SearchMonitor {
    /// Gets the name of the monitor.
    fn name(&self) -> &str;

    /// Called once before the search starts over `vertices` vertices.
    fn on_enter_search(&mut self, vertices: usize);

    /// Called once after the search has finished.
    fn on_exit_search(&mut self) {}

    /// Called on every expansion of the search.
    fn on_step(&mut self);

    /// Gets what the search should do next.
    fn search_command(&self) -> SearchCommand;
}

impl std::fmt::Debug for dyn SearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Step limit
////////////////////////////////////////////////////////////////////////////////////////

/// Stops the search after a fixed number of expansions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepLimitMonitor {
    /// The number of expansions allowed.
    max_steps: u64,

    /// The number of expansions so far.
    steps: u64,
}

impl StepLimitMonitor {
    /// Creates a new [`StepLimitMonitor`].
    pub fn new(max_steps: u64) -> Self {
        Self {
            max_steps,
            steps: 0,
        }
    }
}

impl SearchMonitor for StepLimitMonitor {
    fn name(&self) -> &str {
        "StepLimitMonitor"
    }

    fn on_enter_search(&mut self, _: usize) {
        self.steps = 0;
    }

    fn on_step(&mut self) {
        self.steps = self.steps.saturating_add(1);
    }

    fn search_command(&self) -> SearchCommand {
        if self.steps > self.max_steps {
            SearchCommand::Terminate(format!("step limit of {} reached", self.max_steps))
        } else {
            SearchCommand::Continue
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Time limit
////////////////////////////////////////////////////////////////////////////////////////

/// Stops the search once a wall-clock budget is spent.
///
/// Reading the clock on every expansion is measurable, so the clock is only
/// read when the low bits of the step counter selected by the clock check
/// mask are all zero. With a mask of `2^k - 1`, this is every `2^k` steps.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TimeLimitMonitor {
    /// The step counter bits that must be zero for the clock to be read.
    clock_check_mask: u64,

    /// The number of expansions so far.
    steps: u64,

    /// The wall-clock budget.
    time_limit: Duration,

    /// When the search started.
    start_time: Instant,
}

impl TimeLimitMonitor {
    /// The default clock check mask: every 16,384 (`2^14`) steps.
    pub const DEFAULT_CLOCK_CHECK_MASK: u64 = 0x3FFF;

    /// Creates a new [`TimeLimitMonitor`] with the default clock check mask.
    pub fn new(time_limit: Duration) -> Self {
        Self::with_clock_check_mask(time_limit, Self::DEFAULT_CLOCK_CHECK_MASK)
    }

    /// Creates a new [`TimeLimitMonitor`] with a custom clock check mask.
    pub fn with_clock_check_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            clock_check_mask,
            steps: 0,
            time_limit,
            start_time: Instant::now(),
        }
    }
}

impl SearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _: usize) {
        self.start_time = Instant::now();
        self.steps = 0;
    }

    fn on_step(&mut self) {
        self.steps = self.steps.wrapping_add(1);
    }

    fn search_command(&self) -> SearchCommand {
        if (self.steps & self.clock_check_mask) == 0 && self.start_time.elapsed() >= self.time_limit
        {
            return SearchCommand::Terminate(format!(
                "time limit of {:.3}s reached",
                self.time_limit.as_secs_f64()
            ));
        }

        SearchCommand::Continue
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Interrupt
////////////////////////////////////////////////////////////////////////////////////////

/// Stops the search when a shared flag is raised.
///
/// The flag may be raised from any thread, for example by a signal handler
/// or by a caller enforcing its own deadline.
#[derive(Clone, Debug)]
pub struct InterruptMonitor {
    /// The shared flag.
    stop_flag: Arc<AtomicBool>,
}

impl InterruptMonitor {
    /// Creates a new [`InterruptMonitor`].
    pub fn new(stop_flag: Arc<AtomicBool>) -> Self {
        Self { stop_flag }
    }
}

impl SearchMonitor for InterruptMonitor {
    fn name(&self) -> &str {
        "InterruptMonitor"
    }

    fn on_enter_search(&mut self, _: usize) {}

    fn on_step(&mut self) {}

    fn search_command(&self) -> SearchCommand {
        if self.stop_flag.load(Ordering::Relaxed) {
            SearchCommand::Terminate(String::from("interrupt signal received"))
        } else {
            SearchCommand::Continue
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Composite
////////////////////////////////////////////////////////////////////////////////////////

/// A set of monitors acting as one.
///
/// The first monitor, in insertion order, asking to terminate wins.
#[derive(Default)]
pub struct CompositeMonitor {
    /// The monitors.
    monitors: Vec<Box<dyn SearchMonitor>>,
}

impl std::fmt::Debug for CompositeMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self
            .monitors
            .iter()
            .map(|monitor| monitor.name())
            .collect::<Vec<_>>()
            .join(", ");

        f.debug_struct("CompositeMonitor")
            .field("monitors", &names)
            .finish()
    }
}

impl CompositeMonitor {
    /// Creates an empty [`CompositeMonitor`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a monitor.
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: SearchMonitor + 'static,
    {
        self.monitors.push(Box::new(monitor));
    }

    /// Gets the number of monitors.
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Returns whether there are no monitors.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl SearchMonitor for CompositeMonitor {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self, vertices: usize) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_enter_search(vertices);
        }
    }

    fn on_exit_search(&mut self) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_exit_search();
        }
    }

    fn on_step(&mut self) {
        for monitor in self.monitors.iter_mut() {
            monitor.on_step();
        }
    }

    fn search_command(&self) -> SearchCommand {
        self.monitors
            .iter()
            .map(|monitor| monitor.search_command())
            .find(|command| matches!(command, SearchCommand::Terminate(_)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_limit() {
        let mut monitor = StepLimitMonitor::new(2);
        monitor.on_enter_search(10);

        monitor.on_step();
        monitor.on_step();
        assert_eq!(monitor.search_command(), SearchCommand::Continue);

        monitor.on_step();
        assert_eq!(
            monitor.search_command(),
            SearchCommand::Terminate(String::from("step limit of 2 reached"))
        );

        monitor.on_enter_search(10);
        assert_eq!(monitor.search_command(), SearchCommand::Continue);
    }

    #[test]
    fn test_time_limit_is_checked_on_masked_steps_only() {
        let mut monitor = TimeLimitMonitor::with_clock_check_mask(Duration::ZERO, 0b11);
        monitor.on_enter_search(10);

        // Zero steps: the clock is read and the (empty) budget is spent.
        assert!(matches!(
            monitor.search_command(),
            SearchCommand::Terminate(_)
        ));

        monitor.on_step();
        assert_eq!(monitor.search_command(), SearchCommand::Continue);

        monitor.on_step();
        monitor.on_step();
        monitor.on_step();
        assert!(matches!(
            monitor.search_command(),
            SearchCommand::Terminate(_)
        ));
    }

    #[test]
    fn test_time_limit_continues_within_budget() {
        let mut monitor = TimeLimitMonitor::new(Duration::from_secs(3600));
        monitor.on_enter_search(10);

        assert_eq!(TimeLimitMonitor::DEFAULT_CLOCK_CHECK_MASK, 0x3FFF);
        assert_eq!(monitor.search_command(), SearchCommand::Continue);
    }

    #[test]
    fn test_interrupt() {
        let flag = Arc::new(AtomicBool::new(false));
        let monitor = InterruptMonitor::new(Arc::clone(&flag));

        assert_eq!(monitor.search_command(), SearchCommand::Continue);

        flag.store(true, Ordering::Relaxed);
        assert_eq!(
            monitor.search_command().to_string(),
            "terminate: interrupt signal received"
        );
    }

    #[test]
    fn test_composite_reports_the_first_termination() {
        let flag = Arc::new(AtomicBool::new(true));

        let mut composite = CompositeMonitor::new();
        assert_eq!(composite.search_command(), SearchCommand::Continue);

        composite.add_monitor(StepLimitMonitor::new(0));
        composite.add_monitor(InterruptMonitor::new(flag));
        assert_eq!(composite.len(), 2);

        composite.on_enter_search(10);
        assert_eq!(
            composite.search_command(),
            SearchCommand::Terminate(String::from("interrupt signal received"))
        );

        composite.on_step();
        assert_eq!(
            composite.search_command(),
            SearchCommand::Terminate(String::from("step limit of 0 reached"))
        );

        assert_eq!(
            format!("{composite:?}"),
            "CompositeMonitor { monitors: \"StepLimitMonitor, InterruptMonitor\" }"
        );
    }
}
