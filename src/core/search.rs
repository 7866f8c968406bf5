//! Iteration search for iterative recommenders
//!
//! Runs additional training iterations up to `--max-iter`, evaluating every
//! `--find-iter` iterations and stopping early on convergence (`--epsilon`)
//! or when the measure crosses `--cutoff`. Every iteration, fit computation
//! and evaluation is timed into the shared [`TimingStats`].

use crate::{
    config::SearchOptions,
    core::stats::{Series, TimingStats},
    error::{DriverError, Result},
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, instrument};

/// Evaluation results keyed by measure name
pub type Measures = BTreeMap<String, f64>;

/// A recommender trained one iteration at a time
pub trait IterativeModel {
    /// Iterations performed so far
    fn num_iter(&self) -> u32;

    /// Perform one more training iteration
    fn iterate(&mut self);
}

/// Evaluates a model on held-out and training data
pub trait Evaluate<M: ?Sized> {
    /// Measures on the held-out data
    fn evaluate(&mut self, model: &M) -> Result<Measures>;

    /// Measures on the training data
    fn compute_fit(&mut self, model: &M) -> Result<Measures>;
}

/// Direction in which a measure improves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Minimize,
    Maximize,
}

impl Goal {
    /// Error measures are minimized, everything else is maximized
    pub fn for_measure(measure: &str) -> Self {
        match measure.to_ascii_uppercase().as_str() {
            "RMSE" | "MAE" | "NMAE" | "CBD" => Self::Minimize,
            _ => Self::Maximize,
        }
    }

    fn is_better(self, value: f64, best: f64) -> bool {
        match self {
            Self::Minimize => value < best,
            Self::Maximize => value > best,
        }
    }

    /// How far `value` has fallen behind `best`
    fn regression(self, value: f64, best: f64) -> f64 {
        match self {
            Self::Minimize => value - best,
            Self::Maximize => best - value,
        }
    }

    fn crosses(self, value: f64, cutoff: f64) -> bool {
        match self {
            Self::Minimize => value > cutoff,
            Self::Maximize => value < cutoff,
        }
    }
}

/// Why the search ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxIter,
    Converged,
    Cutoff,
}

/// Result of an iteration search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Iteration count of the model when the search ended
    pub iterations: u32,
    pub best_iteration: u32,
    pub best_value: f64,
    pub stop: StopReason,
    /// `(iteration, value)` for every evaluation, including the initial one
    pub history: Vec<(u32, f64)>,
}

/// Configured iteration search
#[derive(Debug, Clone)]
pub struct IterationSearch {
    measure: String,
    goal: Goal,
    max_iter: u32,
    find_iter: u32,
    epsilon: f64,
    cutoff: f64,
    compute_fit: bool,
    stats: Arc<TimingStats>,
}

impl IterationSearch {
    /// Build a search from the iteration controls
    pub fn new(options: &SearchOptions, compute_fit: bool, stats: Arc<TimingStats>) -> Result<Self> {
        let find_iter = u32::try_from(options.find_iter)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| {
                DriverError::search(format!(
                    "--find-iter={} disables the iteration search; N must be at least 1",
                    options.find_iter
                ))
            })?;
        // Non-positive values leave no iterations to run
        let max_iter = u32::try_from(options.max_iter).unwrap_or(0);
        let measure = options.measure.clone().ok_or_else(|| {
            DriverError::search(format!(
                "--find-iter={} requires --measure=NAME",
                options.find_iter
            ))
        })?;

        Ok(Self {
            goal: Goal::for_measure(&measure),
            measure,
            max_iter,
            find_iter,
            epsilon: options.epsilon,
            cutoff: options.cutoff,
            compute_fit,
            stats,
        })
    }

    /// Override the direction inferred from the measure name
    #[must_use]
    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    pub fn goal(&self) -> Goal {
        self.goal
    }

    /// Continue training an already trained `model`
    #[instrument(skip_all, fields(measure = %self.measure))]
    pub fn run<M, E>(&self, model: &mut M, evaluator: &mut E) -> Result<SearchOutcome>
    where
        M: IterativeModel,
        E: Evaluate<M>,
    {
        let start = model.num_iter();
        let initial = self.checkpoint(model, evaluator)?;
        info!("{} after {} iterations: {}", self.measure, start, initial);

        let mut history = vec![(start, initial)];
        let mut best = (start, initial);
        let mut stop = StopReason::MaxIter;

        for iteration in start.saturating_add(1)..=self.max_iter {
            self.stats.time(Series::Training, || model.iterate());
            if iteration % self.find_iter != 0 {
                continue;
            }

            let value = self.checkpoint(model, evaluator)?;
            history.push((iteration, value));
            if self.goal.is_better(value, best.1) {
                best = (iteration, value);
            }
            info!("{} after {} iterations: {}", self.measure, iteration, value);

            if self.epsilon > 0.0 && self.goal.regression(value, best.1) > self.epsilon {
                info!(
                    "Reached convergence (epsilon={}) after {} iterations",
                    self.epsilon, iteration
                );
                stop = StopReason::Converged;
                break;
            }
            if self.cutoff.is_finite() && self.goal.crosses(value, self.cutoff) {
                info!("Reached cutoff {} after {} iterations", self.cutoff, iteration);
                stop = StopReason::Cutoff;
                break;
            }
        }

        Ok(SearchOutcome {
            iterations: model.num_iter(),
            best_iteration: best.0,
            best_value: best.1,
            stop,
            history,
        })
    }

    fn checkpoint<M, E>(&self, model: &M, evaluator: &mut E) -> Result<f64>
    where
        E: Evaluate<M>,
    {
        if self.compute_fit {
            let fit = self.stats.time(Series::Fit, || evaluator.compute_fit(model))?;
            if let Some(value) = fit.get(&self.measure) {
                info!("fit {}: {}", self.measure, value);
            }
        }

        let results = self.stats.time(Series::Eval, || evaluator.evaluate(model))?;
        results.get(&self.measure).copied().ok_or_else(|| {
            let known: Vec<&str> = results.keys().map(String::as_str).collect();
            DriverError::search(format!(
                "measure '{}' is not among the evaluation results ({})",
                self.measure,
                known.join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Model whose error follows a fixed curve indexed by iteration
    struct CurveModel {
        iterations: u32,
    }

    impl IterativeModel for CurveModel {
        fn num_iter(&self) -> u32 {
            self.iterations
        }

        fn iterate(&mut self) {
            self.iterations += 1;
        }
    }

    struct CurveEvaluator {
        curve: Vec<f64>,
        evaluations: usize,
        fits: usize,
    }

    impl CurveEvaluator {
        fn new(curve: &[f64]) -> Self {
            Self {
                curve: curve.to_vec(),
                evaluations: 0,
                fits: 0,
            }
        }
    }

    impl Evaluate<CurveModel> for CurveEvaluator {
        fn evaluate(&mut self, model: &CurveModel) -> Result<Measures> {
            self.evaluations += 1;
            let value = self.curve[model.iterations as usize];
            Ok(Measures::from([("RMSE".to_string(), value)]))
        }

        fn compute_fit(&mut self, _model: &CurveModel) -> Result<Measures> {
            self.fits += 1;
            Ok(Measures::from([("RMSE".to_string(), 0.5)]))
        }
    }

    fn options(max_iter: i32, find_iter: i32) -> SearchOptions {
        SearchOptions {
            max_iter,
            measure: Some("RMSE".to_string()),
            find_iter,
            ..SearchOptions::default()
        }
    }

    #[test]
    fn test_requires_find_iter_and_measure() {
        let stats = Arc::new(TimingStats::new());
        assert!(IterationSearch::new(&SearchOptions::default(), false, Arc::clone(&stats)).is_err());

        let mut no_measure = options(10, 1);
        no_measure.measure = None;
        let err = IterationSearch::new(&no_measure, false, stats).unwrap_err();
        assert!(err.to_string().contains("--measure"));
    }

    #[test]
    fn test_negative_find_iter_disables_search() {
        let stats = Arc::new(TimingStats::new());
        let err = IterationSearch::new(&options(10, -2), false, stats).unwrap_err();
        assert!(err.to_string().contains("--find-iter=-2"));
    }

    #[test]
    fn test_negative_max_iter_runs_no_iterations() {
        let stats = Arc::new(TimingStats::new());
        let search = IterationSearch::new(&options(-1, 1), false, Arc::clone(&stats)).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[1.0]);

        let outcome = search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(outcome.stop, StopReason::MaxIter);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.history, vec![(0, 1.0)]);
        assert!(stats.snapshot(Series::Training).is_empty());
    }

    #[test]
    fn test_goal_for_measure() {
        assert_eq!(Goal::for_measure("RMSE"), Goal::Minimize);
        assert_eq!(Goal::for_measure("mae"), Goal::Minimize);
        assert_eq!(Goal::for_measure("AUC"), Goal::Maximize);
        assert_eq!(Goal::for_measure("prec@5"), Goal::Maximize);
    }

    #[test]
    fn test_runs_to_max_iter() {
        let stats = Arc::new(TimingStats::new());
        let search = IterationSearch::new(&options(6, 2), false, Arc::clone(&stats)).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4]);

        let outcome = search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(outcome.stop, StopReason::MaxIter);
        assert_eq!(outcome.iterations, 6);
        assert_eq!(outcome.best_iteration, 6);
        assert_eq!(outcome.best_value, 0.4);
        assert_eq!(outcome.history, vec![(0, 1.0), (2, 0.8), (4, 0.6), (6, 0.4)]);

        assert_eq!(stats.snapshot(Series::Training).len(), 6);
        assert_eq!(stats.snapshot(Series::Eval).len(), 4);
        assert!(stats.snapshot(Series::Fit).is_empty());
        assert_eq!(evaluator.fits, 0);
    }

    #[test]
    fn test_compute_fit_is_timed() {
        let stats = Arc::new(TimingStats::new());
        let search = IterationSearch::new(&options(2, 1), true, Arc::clone(&stats)).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[1.0, 0.9, 0.8]);

        search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(evaluator.fits, 3);
        assert_eq!(stats.snapshot(Series::Fit).len(), 3);
    }

    #[test]
    fn test_stops_on_convergence() {
        let stats = Arc::new(TimingStats::new());
        let mut opts = options(10, 1);
        opts.epsilon = 0.05;
        let search = IterationSearch::new(&opts, false, stats).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[1.0, 0.8, 0.7, 0.72, 0.9, 0.5]);

        let outcome = search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(outcome.stop, StopReason::Converged);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.best_iteration, 2);
        assert_eq!(outcome.best_value, 0.7);
    }

    #[test]
    fn test_stops_on_cutoff() {
        let stats = Arc::new(TimingStats::new());
        let mut opts = options(10, 1);
        opts.cutoff = 0.95;
        let search = IterationSearch::new(&opts, false, stats).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[0.9, 0.92, 0.97, 0.5]);

        let outcome = search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(outcome.stop, StopReason::Cutoff);
        assert_eq!(outcome.iterations, 2);
    }

    #[test]
    fn test_resumes_from_trained_model() {
        let stats = Arc::new(TimingStats::new());
        let search = IterationSearch::new(&options(5, 1), false, Arc::clone(&stats)).unwrap();
        let mut model = CurveModel { iterations: 3 };
        let mut evaluator = CurveEvaluator::new(&[1.0, 1.0, 1.0, 0.9, 0.8, 0.7]);

        let outcome = search.run(&mut model, &mut evaluator).unwrap();
        assert_eq!(outcome.history.first(), Some(&(3, 0.9)));
        assert_eq!(outcome.iterations, 5);
        assert_eq!(stats.snapshot(Series::Training).len(), 2);
    }

    #[test]
    fn test_unknown_measure() {
        let stats = Arc::new(TimingStats::new());
        let mut opts = options(3, 1);
        opts.measure = Some("AUC".to_string());
        let search = IterationSearch::new(&opts, false, stats).unwrap();
        let mut model = CurveModel { iterations: 0 };
        let mut evaluator = CurveEvaluator::new(&[1.0, 0.9]);

        let err = search.run(&mut model, &mut evaluator).unwrap_err();
        assert!(err.to_string().contains("AUC"));
        assert!(err.to_string().contains("RMSE"));
    }
}
