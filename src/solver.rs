use crate::error::AuctionError;
use crate::graph::SparseBipartiteGraph;
use crate::solution::{AuctionSolution, Orientation, UnsignedInt};
use anyhow;
use anyhow::{ensure, Result};
use num_iter;
use tracing::{debug, trace};

/// Solver for auction problem
/// Which finds an assignment of N people -> M objects, by having people 'bid' for objects
///
/// Unassigned people are kept on a stack and bid one at a time. Every person is processed with
/// the same `eps`, there are no eps-scaling phases. A person whose best object is already priced
/// above the threshold `(num_cols / 2) * (w_max - w_min + eps)` is given up on and stays
/// unassigned, so callers that need a complete matching have to check
/// [`AuctionSolution::num_unassigned`].
#[derive(Debug, Clone)]
pub struct AuctionSolver<I: UnsignedInt> {
    graph: SparseBipartiteGraph<I>,
    prices: Vec<f64>,
    // stack of unassigned people
    ustack: Vec<I>,
}

impl<I: UnsignedInt> AuctionSolver<I> {
    pub fn new(
        row_capacity: usize,
        column_capacity: usize,
        arcs_capacity: usize,
    ) -> (Self, AuctionSolution<I>) {
        (
            Self {
                graph: SparseBipartiteGraph::new(row_capacity, arcs_capacity),
                prices: Vec::with_capacity(column_capacity),
                ustack: Vec::with_capacity(row_capacity),
            },
            AuctionSolution::<I>::new(row_capacity, column_capacity),
        )
    }

    /// Resets the arc storage for a new problem. Must be called before adding values.
    #[inline]
    pub fn init(&mut self, num_rows: I, num_cols: I) {
        self.graph.reset(num_rows, num_cols)
    }

    #[inline]
    pub fn add_value(&mut self, row: I, column: I, value: f64) -> Result<(), anyhow::Error> {
        self.graph.add_value(row, column, value)
    }

    #[inline]
    pub fn extend_from_values(
        &mut self,
        row: I,
        columns: &[I],
        values: &[f64],
    ) -> Result<(), anyhow::Error> {
        self.graph.extend_from_values(row, columns, values)
    }

    #[inline]
    pub fn validate_input(&self) -> Result<(), anyhow::Error> {
        self.graph.validate()
    }

    #[inline]
    pub fn num_rows(&self) -> I {
        self.graph.num_rows()
    }

    #[inline]
    pub fn num_cols(&self) -> I {
        self.graph.num_cols()
    }

    #[inline]
    pub fn num_of_arcs(&self) -> usize {
        self.graph.num_of_arcs()
    }

    pub fn graph(&self) -> &SparseBipartiteGraph<I> {
        &self.graph
    }

    /// Object prices left by the last solve
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    fn init_solve(&mut self, solution: &mut AuctionSolution<I>, maximize: bool, eps: f64) {
        let orientation = Orientation::infer(self.graph.values().first().copied(), maximize);

        self.prices.clear();
        self.prices.resize(self.graph.num_cols().as_(), 0.);

        solution.reset(self.graph.num_rows(), self.graph.num_cols(), eps, orientation);

        // people are popped from the back, so person 0 bids first
        self.ustack.clear();
        self.ustack
            .extend(num_iter::range(I::zero(), self.graph.num_rows()).rev());
    }

    /// Finds an assignment that maximizes (or minimizes) the sum of assigned values.
    ///
    /// `eps` defaults to `1 / num_cols`. The solution is reinitialized before solving. Stored
    /// values are left untouched, the sign transform needed for minimization is recorded in
    /// [`AuctionSolution::orientation`].
    ///
    /// A bid raises the object price to `best_value - second_best_profit + eps`, one `eps`
    /// above the price that makes the second best object equally attractive, so tied people
    /// can't outbid each other forever at unchanged prices.
    pub fn solve(
        &mut self,
        solution: &mut AuctionSolution<I>,
        maximize: bool,
        eps: Option<f64>,
    ) -> Result<(), anyhow::Error> {
        self.validate_input()?;

        let num_cols_f: f64 = self.graph.num_cols().as_();
        let eps = if let Some(eps) = eps {
            ensure!(eps.is_finite() && eps > 0., AuctionError::InvalidEpsilon(eps));
            eps
        } else {
            1.0 / num_cols_f
        };

        self.init_solve(solution, maximize, eps);
        let orientation = solution.orientation;

        let (w_min, w_max) = self.graph.values().iter().map(|v| orientation.apply(*v)).fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), el| {
                (
                    if min < el { min } else { el },
                    if max > el { max } else { el },
                )
            },
        );

        let price_threshold = (num_cols_f / 2.) * (w_max - w_min + eps);
        debug!(
            "eps: {}, orientation: {:?}, price threshold: {}",
            eps, orientation, price_threshold
        );

        while let Some(u_i) = self.ustack.pop() {
            solution.nits += 1;
            let u: usize = u_i.as_();
            trace!("u: {}", u);
            trace!("prices {:?}", self.prices);
            let (columns, values) = self.graph.row(u);
            let mut max_profit = f64::NEG_INFINITY;
            let mut max_edge_value = f64::NEG_INFINITY;
            let mut matched_v_i: I = columns[0];

            let mut second_max_profit = f64::NEG_INFINITY;

            // choice rule
            for (j, value) in columns.iter().zip(values.iter()) {
                let j_usize: usize = j.as_();
                let edge_value = orientation.apply(*value);
                let profit = edge_value - self.prices[j_usize];
                if profit > max_profit {
                    matched_v_i = *j;
                    second_max_profit = max_profit;
                    max_profit = profit;
                    max_edge_value = edge_value;
                } else if profit > second_max_profit {
                    second_max_profit = profit;
                }
            }
            let matched_v: usize = matched_v_i.as_();
            trace!("matched_v: {}, max_profit: {}", matched_v, max_profit);

            if self.prices[matched_v] > price_threshold {
                trace!(
                    "{} gives up, price {} is over the threshold",
                    u,
                    self.prices[matched_v]
                );
                continue;
            }

            // update rule
            let old_price = self.prices[matched_v];
            if second_max_profit.is_finite() {
                self.prices[matched_v] = max_edge_value - second_max_profit + eps;
            } else {
                self.prices[matched_v] += eps;
            }
            debug_assert!(self.prices[matched_v] >= old_price, "prices never drop");

            let moved_out_u_i = solution.object_to_person[matched_v];

            if moved_out_u_i != I::max_value() {
                trace!("{} move out ", moved_out_u_i);
                let moved_out_u: usize = moved_out_u_i.as_();
                debug_assert!(moved_out_u != u);
                debug_assert!(matched_v_i == solution.person_to_object[moved_out_u]);
                // move edge (moved_out_u, matched_v) out of matching
                solution.person_to_object[moved_out_u] = I::max_value();
                solution.num_unassigned += I::one();
                self.ustack.push(moved_out_u_i);
            }
            // move new edge (u, matched_v) to the matching
            solution.person_to_object[u] = matched_v_i;
            solution.object_to_person[matched_v] = u_i;
            solution.num_unassigned -= I::one();
        }
        debug!(
            "nits: {}, num_unassigned: {}, OBJECTIVE: {}",
            solution.nits,
            solution.num_unassigned,
            self.get_objective(solution)
        );
        trace!("person_to_object: {:?}", solution.person_to_object);
        trace!("prices: {:?}", self.prices);

        Ok(())
    }

    /// Returns current objective value of assignments.
    ///
    /// The sum is taken over the stored values, so it has the sign convention of the input
    /// whatever direction was solved for. Duplicate arcs to the assigned object are all
    /// counted, objects without an arc from their person contribute nothing.
    pub fn get_objective(&self, solution: &AuctionSolution<I>) -> f64 {
        // rows of a partially built graph
        let rows_built = self.graph.row_edge_counts().len();
        let mut obj = 0.;
        for (i, j) in solution.assigned_pairs() {
            if i >= rows_built {
                break;
            }
            // due to the way data is stored, need to go do some searching to find the corresponding value
            // to assignment i -> j
            let (columns, values) = self.graph.row(i);
            for (l, value) in columns.iter().zip(values.iter()) {
                if *l == j {
                    obj += *value;
                }
            }
        }
        obj
    }
}
