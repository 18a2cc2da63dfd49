//! Solver for the sparse linear assignment problem based on the auction algorithm.
//!
//! People (rows) and objects (columns) are connected by weighted arcs stored in compressed
//! sparse row format. Arcs have to be added in row order:
//!
//! ```
//! use sparse_auction_assignment::AuctionSolver;
//!
//! let (mut solver, mut solution) = AuctionSolver::<u32>::new(2, 4, 7);
//! solver.init(2, 4);
//! solver.extend_from_values(0, &[0, 1, 2, 3], &[10., 6., 14., 1.]).unwrap();
//! solver.extend_from_values(1, &[0, 1, 2], &[17., 18., 16.]).unwrap();
//!
//! solver.solve(&mut solution, false, None).unwrap();
//! assert_eq!(solution.person_to_object, [3, 2]);
//! assert_eq!(solver.get_objective(&solution), 17.);
//! ```
//!
//! The solver makes a single pass with a fixed `eps` and gives up on people whose best object
//! gets too expensive, so the result may be a partial matching. Check
//! [`AuctionSolution::num_unassigned`].
pub mod error;
pub mod graph;
pub mod solution;
pub mod solver;

pub use crate::error::AuctionError;
pub use crate::graph::SparseBipartiteGraph;
pub use crate::solution::{AuctionSolution, Orientation, UnsignedInt};
pub use crate::solver::AuctionSolver;
