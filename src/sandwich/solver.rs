//! A bounded solver for the interval sandwich problem.
//!
//! Given required and forbidden edges over a set of vertices, the solver
//! decides whether some interval graph contains every required edge and no
//! forbidden edge. When one exists, it returns a [`Layout`] assigning each
//! vertex a closed interval over a shared discrete order.
//!
//! # Method
//!
//! The vertices are split into the connected components of the required
//! graph. Components are laid out side by side, so a forbidden edge between
//! two components is always satisfied and each component is solved on its
//! own.
//!
//! Within a component, the solver searches over the order in which intervals
//! open. Each open or close is an event at its own position:
//!
//! * a vertex may open only if none of its forbidden neighbours are open;
//! * a vertex closes as soon as all of its required neighbours have opened;
//! * once the first vertex has opened, only vertices with an opened required
//!   neighbour are candidates.
//!
//! Since the set of open vertices follows from the set of opened vertices,
//! every dead end is remembered by its opened set and never explored again.
//!
//! The search is exponential in the worst case, so it runs under the
//! monitors described by its [`Config`] and reports [`Outcome::Aborted`] once
//! any of them asks it to stop.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use fixedbitset::FixedBitSet;

use crate::graph::EdgeSet;
use crate::sandwich::layout::IntervalForVertex;
use crate::sandwich::layout::Layout;
use crate::sandwich::monitor::CompositeMonitor;
use crate::sandwich::monitor::InterruptMonitor;
use crate::sandwich::monitor::SearchCommand;
use crate::sandwich::monitor::SearchMonitor;
use crate::sandwich::monitor::StepLimitMonitor;
use crate::sandwich::monitor::TimeLimitMonitor;
use crate::sandwich::Instance;

/// The default number of search steps allowed.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

////////////////////////////////////////////////////////////////////////////////////////
// Configuration
////////////////////////////////////////////////////////////////////////////////////////

/// The search budget of a [`Solver`].
#[derive(Clone, Debug)]
pub struct Config {
    /// The number of search steps allowed.
    max_steps: Option<u64>,

    /// The wall-clock time allowed.
    time_limit: Option<Duration>,

    /// How often the clock is read (see [`TimeLimitMonitor`]).
    clock_check_mask: u64,

    /// A flag that stops the search when raised.
    interrupt: Option<Arc<AtomicBool>>,
}

impl Config {
    /// Creates a [`ConfigBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use genogram::sandwich::solver::Config;
    ///
    /// let config = Config::builder()
    ///     .max_steps(None)
    ///     .time_limit(Some(Duration::from_secs(5)))
    ///     .build();
    ///
    /// assert_eq!(config.max_steps(), None);
    /// assert_eq!(config.time_limit(), Some(Duration::from_secs(5)));
    /// ```
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Gets the number of search steps allowed.
    pub fn max_steps(&self) -> Option<u64> {
        self.max_steps
    }

    /// Gets the wall-clock time allowed.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Gets the clock check mask.
    pub fn clock_check_mask(&self) -> u64 {
        self.clock_check_mask
    }

    /// Gets the interrupt flag.
    pub fn interrupt(&self) -> Option<&Arc<AtomicBool>> {
        self.interrupt.as_ref()
    }

    /// Creates the monitors enforcing this budget.
    fn monitor(&self) -> CompositeMonitor {
        let mut monitor = CompositeMonitor::new();

        if let Some(max_steps) = self.max_steps {
            monitor.add_monitor(StepLimitMonitor::new(max_steps));
        }

        if let Some(time_limit) = self.time_limit {
            monitor.add_monitor(TimeLimitMonitor::with_clock_check_mask(
                time_limit,
                self.clock_check_mask,
            ));
        }

        if let Some(flag) = &self.interrupt {
            monitor.add_monitor(InterruptMonitor::new(Arc::clone(flag)));
        }

        monitor
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

/// A builder for a [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    /// The number of search steps allowed.
    max_steps: Option<u64>,

    /// The wall-clock time allowed.
    time_limit: Option<Duration>,

    /// How often the clock is read.
    clock_check_mask: u64,

    /// A flag that stops the search when raised.
    interrupt: Option<Arc<AtomicBool>>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_STEPS),
            time_limit: None,
            clock_check_mask: TimeLimitMonitor::DEFAULT_CLOCK_CHECK_MASK,
            interrupt: None,
        }
    }
}

impl ConfigBuilder {
    /// Sets the number of search steps allowed. [`None`] means unlimited.
    pub fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the wall-clock time allowed. [`None`] means unlimited.
    pub fn time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the clock check mask.
    pub fn clock_check_mask(mut self, clock_check_mask: u64) -> Self {
        self.clock_check_mask = clock_check_mask;
        self
    }

    /// Sets a flag that stops the search when raised.
    pub fn interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Builds the [`Config`].
    pub fn build(self) -> Config {
        Config {
            max_steps: self.max_steps,
            time_limit: self.time_limit,
            clock_check_mask: self.clock_check_mask,
            interrupt: self.interrupt,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Results
////////////////////////////////////////////////////////////////////////////////////////

/// The outcome of solving an instance.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A layout satisfying every edge was found.
    Feasible(Layout),

    /// No interval graph satisfies the edges.
    Infeasible,

    /// The search was stopped before reaching a decision.
    Aborted(String),
}

impl Outcome {
    /// Gets the layout, if one was found.
    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Outcome::Feasible(layout) => Some(layout),
            _ => None,
        }
    }

    /// Returns whether a layout was found.
    pub fn is_feasible(&self) -> bool {
        matches!(self, Outcome::Feasible(_))
    }

    /// Returns whether infeasibility was proven.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Outcome::Infeasible)
    }

    /// Returns whether the search was stopped.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Outcome::Aborted(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Feasible(layout) => write!(f, "feasible ({} intervals)", layout.len()),
            Outcome::Infeasible => write!(f, "infeasible"),
            Outcome::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

/// Statistics collected while solving.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// The number of search steps taken.
    pub steps: u64,

    /// The number of dead ends remembered.
    pub memoized_states: usize,

    /// The number of components of the required graph.
    pub components: usize,

    /// The time spent solving.
    pub elapsed: Duration,
}

impl std::fmt::Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} steps, {} memoized states, {} components in {:.3}s",
            self.steps,
            self.memoized_states,
            self.components,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The [`Outcome`] and [`Statistics`] of one solver run.
#[derive(Clone, Debug)]
pub struct Report {
    /// The outcome.
    pub outcome: Outcome,

    /// The statistics.
    pub statistics: Statistics,
}

////////////////////////////////////////////////////////////////////////////////////////
// Solver
////////////////////////////////////////////////////////////////////////////////////////

/// A solver for the interval sandwich problem.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    /// The search budget.
    config: Config,
}

impl Solver {
    /// Creates a new [`Solver`].
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Gets the search budget.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Solves an instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::kinship;
    /// use genogram::kinship::Generations;
    /// use genogram::record::PersonRecord;
    /// use genogram::sandwich;
    /// use genogram::sandwich::Solver;
    ///
    /// let records = vec![
    ///     PersonRecord::new("c1", "mom", "dad"),
    ///     PersonRecord::new("c2", "mom", "dad"),
    /// ];
    ///
    /// let kinship = kinship::Builder::default().try_build_from(&records)?;
    /// let generations = Generations::rank(&kinship);
    /// let instance = sandwich::Builder.try_build_from(&kinship, &generations)?;
    ///
    /// let report = Solver::default().solve(&instance);
    /// let layout = report.outcome.layout().unwrap();
    ///
    /// assert!(layout.verify(&instance).is_ok());
    /// assert_eq!(report.statistics.components, 1);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn solve(&self, instance: &Instance) -> Report {
        self.solve_edges(instance.len(), instance.required(), instance.forbidden())
    }

    /// Solves the sandwich problem over bare edge sets on `len` vertices.
    pub(crate) fn solve_edges(
        &self,
        len: usize,
        required: &EdgeSet,
        forbidden: &EdgeSet,
    ) -> Report {
        let start = Instant::now();
        let mut statistics = Statistics::default();

        let mut monitor = self.config.monitor();
        monitor.on_enter_search(len);

        let outcome = if required.intersection(forbidden).is_empty() {
            search(len, required, forbidden, &mut monitor, &mut statistics)
        } else {
            Outcome::Infeasible
        };

        monitor.on_exit_search();
        statistics.elapsed = start.elapsed();

        tracing::debug!("sandwich search finished: {outcome}: {statistics}");

        Report {
            outcome,
            statistics,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Search
////////////////////////////////////////////////////////////////////////////////////////

/// An event of the layout under construction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Event {
    /// The interval of a vertex opens.
    Open(usize),

    /// The interval of a vertex closes.
    Close(usize),
}

/// The result of extending a partial layout.
enum Step {
    /// The component is fully laid out.
    Done,

    /// No extension of the partial layout succeeds.
    Dead,

    /// A monitor stopped the search.
    Aborted(String),
}

/// Solves every component of the required graph in turn.
fn search<M>(
    len: usize,
    required: &EdgeSet,
    forbidden: &EdgeSet,
    monitor: &mut M,
    statistics: &mut Statistics,
) -> Outcome
where
    M: SearchMonitor,
{
    let required = required.adjacency(len);
    let forbidden = forbidden
        .adjacency(len)
        .into_iter()
        .map(|neighbours| {
            let mut set = FixedBitSet::with_capacity(len);
            set.extend(neighbours);
            set
        })
        .collect::<Vec<_>>();

    let components = components(&required);
    statistics.components = components.len();

    let mut events = Vec::with_capacity(len * 2);

    for component in components {
        tracing::trace!("laying out component of {} vertices", component.len());

        let mut state = Component::new(&required, &forbidden, &component, monitor);
        let step = state.extend();

        statistics.steps += state.steps;
        statistics.memoized_states += state.failed.len();

        match step {
            Step::Done => events.append(&mut state.events),
            Step::Dead => return Outcome::Infeasible,
            Step::Aborted(reason) => return Outcome::Aborted(reason),
        }
    }

    Outcome::Feasible(layout(len, &events))
}

/// Splits the vertices into the connected components of the required graph,
/// ordered by their smallest vertex.
fn components(required: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut seen = FixedBitSet::with_capacity(required.len());
    let mut result = Vec::new();

    for root in 0..required.len() {
        if seen.contains(root) {
            continue;
        }

        seen.insert(root);

        let mut component = vec![root];
        let mut stack = vec![root];

        while let Some(vertex) = stack.pop() {
            for &neighbour in &required[vertex] {
                if !seen.contains(neighbour) {
                    seen.insert(neighbour);
                    component.push(neighbour);
                    stack.push(neighbour);
                }
            }
        }

        component.sort_unstable();
        result.push(component);
    }

    result
}

/// Assigns each event its own position.
fn layout(len: usize, events: &[Event]) -> Layout {
    let mut starts = vec![0; len];
    let mut intervals = Vec::with_capacity(len);

    for (position, event) in events.iter().enumerate() {
        match event {
            Event::Open(vertex) => starts[*vertex] = position,
            Event::Close(vertex) => {
                intervals.push(IntervalForVertex::new(*vertex, starts[*vertex], position));
            }
        }
    }

    Layout::new(intervals)
}

/// The search over the opening orders of one component.
struct Component<'a, M> {
    /// The required neighbours of each vertex.
    required: &'a [Vec<usize>],

    /// The forbidden neighbours of each vertex.
    forbidden: &'a [FixedBitSet],

    /// The vertices of the component.
    vertices: &'a [usize],

    /// The monitor bounding the search.
    monitor: &'a mut M,

    /// The vertices whose interval has opened.
    opened: FixedBitSet,

    /// The vertices whose interval has opened but not closed.
    open: FixedBitSet,

    /// The number of unopened required neighbours of each vertex.
    remaining: Vec<usize>,

    /// The events so far.
    events: Vec<Event>,

    /// The opened sets known to lead nowhere.
    failed: HashSet<FixedBitSet>,

    /// The number of search steps taken.
    steps: u64,
}

impl<'a, M> Component<'a, M>
where
    M: SearchMonitor,
{
    /// Creates the search over one component.
    fn new(
        required: &'a [Vec<usize>],
        forbidden: &'a [FixedBitSet],
        vertices: &'a [usize],
        monitor: &'a mut M,
    ) -> Self {
        let len = required.len();

        Self {
            required,
            forbidden,
            vertices,
            monitor,
            opened: FixedBitSet::with_capacity(len),
            open: FixedBitSet::with_capacity(len),
            remaining: required.iter().map(Vec::len).collect(),
            events: Vec::with_capacity(vertices.len() * 2),
            failed: HashSet::new(),
            steps: 0,
        }
    }

    /// Extends the partial layout until the component is laid out.
    fn extend(&mut self) -> Step {
        if self.opened.count_ones(..) == self.vertices.len() {
            return Step::Done;
        }

        if self.failed.contains(&self.opened) {
            return Step::Dead;
        }

        self.steps += 1;
        self.monitor.on_step();

        if let SearchCommand::Terminate(reason) = self.monitor.search_command() {
            return Step::Aborted(reason);
        }

        for vertex in self.candidates() {
            if !self.forbidden[vertex].is_disjoint(&self.open) {
                continue;
            }

            let mark = self.events.len();
            self.open_vertex(vertex);

            match self.extend() {
                Step::Dead => self.undo(vertex, mark),
                step => return step,
            }
        }

        self.failed.insert(self.opened.clone());
        Step::Dead
    }

    /// Gets the vertices that may open next, most promising first.
    ///
    /// Before anything has opened, every vertex of the component is a
    /// candidate. Afterwards, only unopened required neighbours of open
    /// vertices are.
    fn candidates(&self) -> Vec<usize> {
        let mut candidates = if self.open.is_clear() {
            self.vertices.to_vec()
        } else {
            let mut frontier = FixedBitSet::with_capacity(self.required.len());

            for vertex in self.open.ones() {
                for &neighbour in &self.required[vertex] {
                    if !self.opened.contains(neighbour) {
                        frontier.insert(neighbour);
                    }
                }
            }

            frontier.ones().collect()
        };

        candidates.sort_by_key(|&vertex| {
            (
                Reverse(self.closures(vertex)),
                self.remaining[vertex],
                vertex,
            )
        });
        candidates
    }

    /// Counts the intervals that would close if `vertex` opened now.
    fn closures(&self, vertex: usize) -> usize {
        let own = usize::from(self.remaining[vertex] == 0);

        let neighbours = self.required[vertex]
            .iter()
            .filter(|&&neighbour| {
                self.open.contains(neighbour) && self.remaining[neighbour] == 1
            })
            .count();

        own + neighbours
    }

    /// Opens the interval of `vertex` and closes every interval that no
    /// longer waits on an unopened required neighbour.
    fn open_vertex(&mut self, vertex: usize) {
        self.opened.insert(vertex);
        self.open.insert(vertex);
        self.events.push(Event::Open(vertex));

        for &neighbour in &self.required[vertex] {
            self.remaining[neighbour] -= 1;
        }

        if self.remaining[vertex] == 0 {
            self.close(vertex);
        }

        for &neighbour in &self.required[vertex] {
            if self.open.contains(neighbour) && self.remaining[neighbour] == 0 {
                self.close(neighbour);
            }
        }
    }

    /// Closes the interval of `vertex`.
    fn close(&mut self, vertex: usize) {
        self.open.set(vertex, false);
        self.events.push(Event::Close(vertex));
    }

    /// Reverts [`Component::open_vertex`], dropping every event after `mark`.
    fn undo(&mut self, vertex: usize, mark: usize) {
        for event in self.events.drain(mark..) {
            if let Event::Close(closed) = event {
                self.open.insert(closed);
            }
        }

        for &neighbour in &self.required[vertex] {
            self.remaining[neighbour] += 1;
        }

        self.open.set(vertex, false);
        self.opened.set(vertex, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(pairs: &[(usize, usize)]) -> EdgeSet {
        let mut edges = EdgeSet::new();

        for (u, v) in pairs {
            edges.insert(*u, *v);
        }

        edges
    }

    fn solve(len: usize, required: &EdgeSet, forbidden: &EdgeSet) -> Report {
        Solver::default().solve_edges(len, required, forbidden)
    }

    #[test]
    fn test_path_is_feasible() {
        let required = edges(&[(0, 1), (1, 2)]);
        let forbidden = edges(&[(0, 2)]);

        let report = solve(3, &required, &forbidden);
        let layout = report.outcome.layout().unwrap();

        assert!(layout.verify_edges(3, &required, &forbidden).is_ok());
        assert_eq!(layout.order(), vec![0, 1, 2]);
        assert_eq!(layout.span(), 6);
        assert_eq!(report.statistics.components, 1);
    }

    #[test]
    fn test_star_with_apart_leaves_is_feasible() {
        let required = edges(&[(0, 1), (0, 2), (0, 3)]);
        let forbidden = edges(&[(1, 2), (1, 3), (2, 3)]);

        let report = solve(4, &required, &forbidden);
        let layout = report.outcome.layout().unwrap();

        assert!(layout.verify_edges(4, &required, &forbidden).is_ok());
    }

    #[test]
    fn test_chordless_cycle_is_infeasible() {
        // Any interval supergraph of a four cycle has one of its chords.
        let required = edges(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let forbidden = edges(&[(0, 2), (1, 3)]);

        let report = solve(4, &required, &forbidden);

        assert!(report.outcome.is_infeasible());
        assert!(report.statistics.memoized_states > 0);
    }

    #[test]
    fn test_chordless_cycle_with_an_allowed_chord_is_feasible() {
        let required = edges(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let forbidden = edges(&[(1, 3)]);

        let report = solve(4, &required, &forbidden);
        let layout = report.outcome.layout().unwrap();

        assert!(layout.verify_edges(4, &required, &forbidden).is_ok());
        assert!(layout.get(0).unwrap().overlaps(layout.get(2).unwrap()));
    }

    #[test]
    fn test_components_are_laid_out_side_by_side() {
        let required = edges(&[(0, 1), (2, 3)]);
        let forbidden = edges(&[(0, 2), (1, 3), (0, 3), (1, 2)]);

        let report = solve(5, &required, &forbidden);
        let layout = report.outcome.layout().unwrap();

        assert_eq!(report.statistics.components, 3);
        assert!(layout.verify_edges(5, &required, &forbidden).is_ok());
        assert_eq!(layout.at(layout.get(4).unwrap().start()), vec![4]);
    }

    #[test]
    fn test_overlapping_edges_are_infeasible() {
        let required = edges(&[(0, 1)]);
        let forbidden = edges(&[(1, 0)]);

        let report = solve(2, &required, &forbidden);

        assert!(report.outcome.is_infeasible());
        assert_eq!(report.statistics.steps, 0);
    }

    #[test]
    fn test_empty_instance_is_feasible() {
        let report = Solver::default().solve(&Instance::default());

        assert!(report.outcome.layout().unwrap().is_empty());
        assert_eq!(report.statistics.components, 0);
    }

    #[test]
    fn test_step_limit_aborts() {
        let required = edges(&[(0, 1), (1, 2)]);
        let solver = Solver::new(Config::builder().max_steps(Some(0)).build());

        let report = solver.solve_edges(3, &required, &EdgeSet::new());

        match report.outcome {
            Outcome::Aborted(reason) => assert_eq!(reason, "step limit of 0 reached"),
            outcome => panic!("expected an aborted search, got {outcome}"),
        }
    }

    #[test]
    fn test_interrupt_aborts() {
        let flag = Arc::new(AtomicBool::new(true));
        let solver = Solver::new(Config::builder().interrupt(flag).build());

        let report = solver.solve_edges(1, &EdgeSet::new(), &EdgeSet::new());

        assert!(report.outcome.is_aborted());
        assert_eq!(report.outcome.to_string(), "aborted: interrupt signal received");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.max_steps(), Some(DEFAULT_MAX_STEPS));
        assert_eq!(config.time_limit(), None);
        assert_eq!(config.clock_check_mask(), 0x3FFF);
        assert!(config.interrupt().is_none());
        assert_eq!(config.monitor().len(), 1);
    }

    #[test]
    fn test_search_is_deterministic() {
        let required = edges(&[(0, 1), (1, 2), (2, 3), (3, 4), (1, 4)]);
        let forbidden = edges(&[(0, 2), (0, 3), (2, 4)]);

        let first = solve(5, &required, &forbidden);
        let second = solve(5, &required, &forbidden);

        let first = first.outcome.layout().unwrap();
        let second = second.outcome.layout().unwrap();

        assert_eq!(first.intervals(), second.intervals());
        assert!(first.verify_edges(5, &required, &forbidden).is_ok());
    }
}
