//! Deciding whether a family can be drawn as a crossing-free genogram.
//!
//! An [`Analyzer`] runs the full pipeline over the person records of one
//! family:
//!
//! 1. the records are assembled into a [`Kinship`] graph;
//! 2. every individual is given a generation (see [`Generations`]);
//! 3. the kinship graph and generations are turned into a sandwich
//!    [`Instance`];
//! 4. the instance is handed to the sandwich [`Solver`].
//!
//! The outcome is a [`Verdict`]. A family that cannot be drawn is not an
//! error: [`Verdict::NotDrawable`] tells the caller to fall back to some other
//! layout strategy, while [`Verdict::Aborted`] means the solver's budget ran
//! out before a decision was reached.

use crate::kinship;
use crate::kinship::Generations;
use crate::kinship::Individual;
use crate::kinship::Kinship;
use crate::kinship::MalformedPolicy;
use crate::record::PersonRecord;
use crate::sandwich;
use crate::sandwich::solver::Config;
use crate::sandwich::solver::Statistics;
use crate::sandwich::Instance;
use crate::sandwich::Layout;
use crate::sandwich::Outcome;
use crate::sandwich::Solver;
use crate::sandwich::Vertex;

////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////

/// An error related to analyzing a family.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A person record is malformed.
    Kinship(kinship::builder::Error),

    /// Some individuals are not connected to the rest of the family.
    Disconnected(Vec<String>),

    /// The sandwich instance could not be built.
    Instance(sandwich::builder::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Kinship(err) => write!(f, "kinship error: {err}"),
            Error::Disconnected(names) => write!(
                f,
                "individuals are not connected to the rest of the family: {}",
                names.join(", ")
            ),
            Error::Instance(err) => write!(f, "sandwich error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////
// Verdicts
////////////////////////////////////////////////////////////////////////////////////////

/// Whether a family can be drawn as a crossing-free genogram.
#[derive(Clone, Debug)]
pub enum Verdict {
    /// The family can be drawn, in the order given by the layout.
    Drawable(Layout),

    /// The family cannot be drawn without crossings.
    NotDrawable,

    /// The solver stopped before reaching a decision.
    Aborted(String),
}

impl Verdict {
    /// Returns whether the family can be drawn.
    pub fn is_drawable(&self) -> bool {
        matches!(self, Verdict::Drawable(_))
    }

    /// Gets the layout, if the family can be drawn.
    pub fn layout(&self) -> Option<&Layout> {
        match self {
            Verdict::Drawable(layout) => Some(layout),
            _ => None,
        }
    }
}

impl From<Outcome> for Verdict {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Feasible(layout) => Verdict::Drawable(layout),
            Outcome::Infeasible => Verdict::NotDrawable,
            Outcome::Aborted(reason) => Verdict::Aborted(reason),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Drawable(_) => write!(f, "drawable"),
            Verdict::NotDrawable => write!(f, "not drawable"),
            Verdict::Aborted(reason) => write!(f, "aborted: {reason}"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Analysis
////////////////////////////////////////////////////////////////////////////////////////

/// The result of analyzing one family.
#[derive(Clone, Debug)]
pub struct Analysis {
    /// The verdict.
    verdict: Verdict,

    /// The kinship graph.
    kinship: Kinship,

    /// The generation of every individual.
    generations: Generations,

    /// The sandwich instance.
    instance: Instance,

    /// The solver statistics.
    statistics: Statistics,
}

impl Analysis {
    /// Gets the verdict.
    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    /// Gets the kinship graph.
    pub fn kinship(&self) -> &Kinship {
        &self.kinship
    }

    /// Gets the generation of every individual.
    pub fn generations(&self) -> &Generations {
        &self.generations
    }

    /// Gets the sandwich instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Gets the solver statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Gets every individual reconstructed from the records, whatever the
    /// verdict.
    pub fn individuals(&self) -> &[Individual] {
        self.kinship.individuals()
    }

    /// Gets the vertices in draw order, if the family can be drawn.
    pub fn draw_order(&self) -> Option<Vec<Vertex>> {
        let layout = self.verdict.layout()?;

        Some(
            layout
                .order()
                .into_iter()
                .map(|i| self.instance.vertices()[i])
                .collect(),
        )
    }
}

////////////////////////////////////////////////////////////////////////////////////////
// Analyzer
////////////////////////////////////////////////////////////////////////////////////////

/// Runs the drawability pipeline over the person records of a family.
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    /// How malformed records are handled.
    policy: MalformedPolicy,

    /// The sandwich solver.
    solver: Solver,
}

impl Analyzer {
    /// Sets how malformed records are handled.
    pub fn policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the search budget of the solver.
    pub fn config(mut self, config: Config) -> Self {
        self.solver = Solver::new(config);
        self
    }

    /// Analyzes the person records of one family.
    ///
    /// # Examples
    ///
    /// ```
    /// use genogram::drawability::Analyzer;
    /// use genogram::record::PersonRecord;
    ///
    /// let records = vec![
    ///     PersonRecord::new("c1", "mom", "dad"),
    ///     PersonRecord::new("c2", "mom", "dad"),
    /// ];
    ///
    /// let analysis = Analyzer::default().analyze(&records)?;
    ///
    /// assert!(analysis.verdict().is_drawable());
    /// assert_eq!(analysis.individuals().len(), 4);
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn analyze(&self, records: &[PersonRecord]) -> Result<Analysis> {
        let kinship = kinship::Builder::default()
            .policy(self.policy)
            .try_build_from(records)
            .map_err(Error::Kinship)?;

        tracing::debug!(
            "built kinship graph: {} individuals, {} mating units",
            kinship.len(),
            kinship.mating_units().len()
        );

        let generations = Generations::rank(&kinship);

        let disconnected = generations.disconnected();
        if !disconnected.is_empty() {
            let names = disconnected
                .into_iter()
                .map(|id| kinship.individual(id).name().to_string())
                .collect();

            return Err(Error::Disconnected(names));
        }

        for inconsistency in generations.inconsistencies(&kinship) {
            tracing::warn!("inconsistent generations: {inconsistency:?}");
        }

        let instance = sandwich::Builder
            .try_build_from(&kinship, &generations)
            .map_err(Error::Instance)?;

        let report = self.solver.solve(&instance);
        let verdict = Verdict::from(report.outcome);

        tracing::debug!("family is {verdict}");

        Ok(Analysis {
            verdict,
            kinship,
            generations,
            instance,
            statistics: report.statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    use super::*;

    fn records(triples: &[(&str, &str, &str)]) -> Vec<PersonRecord> {
        triples
            .iter()
            .map(|(id, mother, father)| PersonRecord::new(*id, mother, father))
            .collect()
    }

    fn nuclear_family() -> Vec<PersonRecord> {
        records(&[("c1", "m", "f"), ("c2", "m", "f")])
    }

    fn three_generations() -> Vec<PersonRecord> {
        records(&[
            ("p1", "gm", "gf"),
            ("s1", "gm", "gf"),
            ("p2", "0", "0"),
            ("c1", "p1", "p2"),
            ("c2", "p1", "p2"),
        ])
    }

    fn cross_marriage() -> Vec<PersonRecord> {
        records(&[
            ("a1", "am", "af"),
            ("a2", "am", "af"),
            ("b1", "bm", "bf"),
            ("b2", "bm", "bf"),
            ("x1", "a1", "b1"),
            ("y1", "b2", "a2"),
        ])
    }

    #[test]
    fn test_nuclear_family_is_drawable() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let analysis = Analyzer::default().analyze(&nuclear_family())?;

        let layout = analysis.verdict().layout().unwrap();
        layout.verify(analysis.instance())?;

        assert_eq!(layout.len(), 6);
        assert_eq!(analysis.generations().depth(), 2);
        assert_eq!(analysis.draw_order().unwrap().len(), 6);

        Ok(())
    }

    #[test]
    fn test_three_generations_are_drawable() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let analysis = Analyzer::default().analyze(&three_generations())?;

        assert!(analysis.verdict().is_drawable());
        analysis
            .verdict()
            .layout()
            .unwrap()
            .verify(analysis.instance())?;

        let kinship = analysis.kinship();
        let generation = |name: &str| analysis.generations().get(kinship.find(name).unwrap());

        assert_eq!(generation("gm"), Some(0));
        assert_eq!(generation("p2"), Some(1));
        assert_eq!(generation("c2"), Some(2));

        Ok(())
    }

    #[test]
    fn test_cross_marriage_is_not_drawable() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        // Sibling pairs from two families marry across. The sibling "a1", her
        // husband "b1" and his sister "b2" can be pairwise joined while
        // avoiding the third, which no interval layout allows.
        let analysis = Analyzer::default().analyze(&cross_marriage())?;

        assert!(matches!(analysis.verdict(), Verdict::NotDrawable));
        assert!(analysis.draw_order().is_none());
        assert_eq!(analysis.individuals().len(), 10);

        Ok(())
    }

    #[test]
    fn test_disconnected_fragments_are_reported() {
        let err = Analyzer::default()
            .analyze(&records(&[("c1", "m", "f"), ("d1", "n", "g")]))
            .unwrap_err();

        assert_eq!(
            err,
            Error::Disconnected(vec![
                String::from("d1"),
                String::from("n"),
                String::from("g")
            ])
        );
        assert_eq!(
            err.to_string(),
            "individuals are not connected to the rest of the family: d1, n, g"
        );
    }

    #[test]
    fn test_child_of_a_single_known_parent_is_connected(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let family = records(&[("m", "gm", "gf"), ("c1", "m", "0")]);
        let analysis = Analyzer::default().analyze(&family)?;

        assert!(analysis.verdict().is_drawable());
        analysis
            .verdict()
            .layout()
            .unwrap()
            .verify(analysis.instance())?;

        let kinship = analysis.kinship();
        assert_eq!(analysis.generations().get(kinship.find("c1").unwrap()), Some(2));
        assert_eq!(kinship.mating_units().len(), 2);

        Ok(())
    }

    #[test]
    fn test_empty_input_is_drawable()-> std::result::Result<(), Box<dyn std::error::Error>> {
        let analysis = Analyzer::default().analyze(&[])?;

        assert!(analysis.verdict().layout().unwrap().is_empty());
        assert!(analysis.individuals().is_empty());

        Ok(())
    }

    #[test]
    fn test_malformed_records() {
        let malformed = records(&[("c1", "m", "f"), ("c1", "m", "g")]);

        let err = Analyzer::default().analyze(&malformed).unwrap_err();
        assert_eq!(
            err.to_string(),
            "kinship error: person was already given different parents: record: c1\tm\tg"
        );

        let analysis = Analyzer::default()
            .policy(MalformedPolicy::Skip)
            .analyze(&malformed)
            .unwrap();

        assert!(analysis.verdict().is_drawable());
        assert_eq!(analysis.kinship().skipped().len(), 1);
    }

    #[test]
    fn test_exhausted_budget_is_aborted() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let analysis = Analyzer::default()
            .config(Config::builder().max_steps(Some(0)).build())
            .analyze(&nuclear_family())?;

        assert_eq!(
            analysis.verdict().to_string(),
            "aborted: step limit of 0 reached"
        );

        Ok(())
    }

    #[test]
    fn test_verdict_does_not_depend_on_record_order(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut rng = StdRng::seed_from_u64(0x6e6f);

        for (mut records, drawable) in [(three_generations(), true), (cross_marriage(), false)] {
            for _ in 0..16 {
                records.shuffle(&mut rng);

                let analysis = Analyzer::default().analyze(&records)?;
                assert_eq!(analysis.verdict().is_drawable(), drawable);

                if let Some(layout) = analysis.verdict().layout() {
                    layout.verify(analysis.instance())?;
                }
            }
        }

        Ok(())
    }

    #[test]
    fn test_repeated_records_are_idempotent() -> std::result::Result<(), Box<dyn std::error::Error>>
    {
        let once = three_generations();
        let twice = once.iter().chain(once.iter()).cloned().collect::<Vec<_>>();

        let first = Analyzer::default().analyze(&once)?;
        let second = Analyzer::default().analyze(&twice)?;

        assert_eq!(first.instance(), second.instance());
        assert_eq!(
            first.verdict().layout().unwrap().intervals(),
            second.verdict().layout().unwrap().intervals()
        );

        Ok(())
    }

    #[test]
    fn test_required_and_forbidden_edges_are_disjoint(
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        for records in [nuclear_family(), three_generations(), cross_marriage()] {
            let analysis = Analyzer::default().analyze(&records)?;
            let instance = analysis.instance();

            assert!(instance
                .required()
                .intersection(instance.forbidden())
                .is_empty());
        }

        Ok(())
    }
}
