use crate::error::AuctionError;
use crate::solution::UnsignedInt;
use anyhow;
use anyhow::{ensure, Result};

/// Weighted bipartite graph between people (rows) and objects (columns) in
/// compressed sparse row format.
///
/// Rows are appended in order and can't be reopened once the next row has started. Values are
/// stored exactly as given.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseBipartiteGraph<I: UnsignedInt> {
    num_rows: I,
    num_cols: I,
    i_starts_stops: Vec<I>,
    j_counts: Vec<I>,
    column_indices: Vec<I>,
    // memory view of all values
    values: Vec<f64>,
}

impl<I: UnsignedInt> SparseBipartiteGraph<I> {
    pub fn new(row_capacity: usize, arcs_capacity: usize) -> Self {
        let mut graph = Self {
            num_rows: I::zero(),
            num_cols: I::zero(),
            i_starts_stops: Vec::with_capacity(row_capacity + 1),
            j_counts: Vec::with_capacity(row_capacity),
            column_indices: Vec::with_capacity(arcs_capacity),
            values: Vec::with_capacity(arcs_capacity),
        };
        graph.reset(I::zero(), I::zero());
        graph
    }

    /// Drops all arcs and sets the dimensions of the next problem.
    ///
    /// The row cursor is placed on row 0, which has no arcs yet.
    pub fn reset(&mut self, num_rows: I, num_cols: I) {
        self.num_rows = num_rows;
        self.num_cols = num_cols;

        self.i_starts_stops.clear();
        self.i_starts_stops.resize(2, I::zero());
        self.j_counts.clear();
        self.j_counts.push(I::zero());

        self.column_indices.clear();
        self.values.clear();
    }

    #[inline]
    fn current_row(&self) -> usize {
        self.j_counts.len() - 1
    }

    /// Checks the row cursor contract for appending `num_arcs` arcs to `row` and returns the
    /// new end offset of that row.
    fn check_append(&self, row: I, num_arcs: usize) -> Result<I> {
        let current_row = self.current_row();
        let row_usize: usize = row.as_();
        ensure!(
            row < self.num_rows,
            AuctionError::RowOutOfRange {
                row: row_usize,
                num_rows: self.num_rows.as_(),
            }
        );
        ensure!(
            row_usize == current_row || row_usize == current_row + 1,
            AuctionError::OutOfOrderRow {
                current: current_row,
                requested: row_usize,
            }
        );
        if row_usize > current_row {
            // starting the next row
            // ensure that current_row has at least one element
            ensure!(
                self.j_counts[current_row] > I::zero(),
                AuctionError::EmptyRow { row: current_row }
            );
        }

        let length_increment = I::from_usize(num_arcs).ok_or(AuctionError::ArcCountOverflow)?;
        let cumulative_offset = self.i_starts_stops[current_row + 1]
            .checked_add(&length_increment)
            .filter(|offset| *offset < I::max_value())
            .ok_or(AuctionError::ArcCountOverflow)?;
        Ok(cumulative_offset)
    }

    fn commit_append(&mut self, row: I, cumulative_offset: I) {
        let current_row = self.current_row();
        let length_increment = cumulative_offset - self.i_starts_stops[current_row + 1];
        let row_usize: usize = row.as_();
        if row_usize > current_row {
            self.i_starts_stops.push(cumulative_offset);
            self.j_counts.push(length_increment);
        } else {
            self.i_starts_stops[current_row + 1] = cumulative_offset;
            self.j_counts[current_row] += length_increment;
        }
    }

    /// Appends a single arc. `row` has to be the row being built or the next one.
    #[inline]
    pub fn add_value(&mut self, row: I, column: I, value: f64) -> Result<(), anyhow::Error> {
        let cumulative_offset = self.check_append(row, 1)?;
        self.commit_append(row, cumulative_offset);
        self.column_indices.push(column);
        self.values.push(value);
        Ok(())
    }

    /// Appends arcs of one row in bulk. `row` has to be the row being built or the next one.
    #[inline]
    pub fn extend_from_values(
        &mut self,
        row: I,
        columns: &[I],
        values: &[f64],
    ) -> Result<(), anyhow::Error> {
        ensure!(
            columns.len() == values.len(),
            AuctionError::LengthMismatch {
                columns: columns.len(),
                values: values.len(),
            }
        );
        let cumulative_offset = self.check_append(row, columns.len())?;
        self.commit_append(row, cumulative_offset);
        self.column_indices.extend_from_slice(columns);
        self.values.extend_from_slice(values);
        Ok(())
    }

    /// Checks that the graph describes a complete problem that can be solved.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let arcs_count = self.num_of_arcs();
        let invalid_arc_count = AuctionError::InvalidArcCount {
            arcs: arcs_count,
            values: self.values.len(),
        };
        let max_arcs: usize = I::max_value().as_();
        ensure!(arcs_count > 0, invalid_arc_count);
        ensure!(
            arcs_count < max_arcs && arcs_count == self.values.len(),
            invalid_arc_count
        );

        let rows_built = self.j_counts.len();
        let num_rows: usize = self.num_rows.as_();
        ensure!(
            self.num_rows > I::zero()
                && self.num_rows < I::max_value()
                && self.num_cols > I::zero()
                && self.num_cols < I::max_value()
                && rows_built == num_rows
                && self.j_counts[rows_built - 1] > I::zero(),
            AuctionError::InvalidDimension {
                num_rows,
                num_cols: self.num_cols.as_(),
                rows_built,
            }
        );

        if let Some(column) = self
            .column_indices
            .iter()
            .find(|column| **column >= self.num_cols)
        {
            return Err(AuctionError::ColumnOutOfRange {
                column: column.as_(),
                num_cols: self.num_cols.as_(),
            }
            .into());
        }

        // the price threshold only bounds the bidding for finite values
        if let Some(index) = self.values.iter().position(|value| !value.is_finite()) {
            return Err(AuctionError::NonFiniteValue { index }.into());
        }
        Ok(())
    }

    #[inline]
    pub fn num_rows(&self) -> I {
        self.num_rows
    }

    #[inline]
    pub fn num_cols(&self) -> I {
        self.num_cols
    }

    #[inline]
    pub fn num_of_arcs(&self) -> usize {
        self.column_indices.len()
    }

    /// Start offsets of the rows followed by the end offset of the last row
    pub fn row_offsets(&self) -> &[I] {
        &self.i_starts_stops
    }

    pub fn row_edge_counts(&self) -> &[I] {
        &self.j_counts
    }

    pub fn column_indices(&self) -> &[I] {
        &self.column_indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Columns and values of the arcs leaving person `i`.
    #[inline]
    pub fn row(&self, i: usize) -> (&[I], &[f64]) {
        let start: usize = self.i_starts_stops[i].as_();
        let num_objects: usize = self.j_counts[i].as_();
        let stop = start + num_objects;
        (
            &self.column_indices[start..stop],
            &self.values[start..stop],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::SparseBipartiteGraph;
    use crate::error::AuctionError;
    use rand::distributions::{Distribution, Uniform};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use reservoir_sampling::unweighted::core::r as reservoir_sample;

    fn kind(err: anyhow::Error) -> AuctionError {
        *err.downcast_ref::<AuctionError>()
            .expect("error should carry an AuctionError")
    }

    #[test]
    fn test_cumulative_idx_diff() {
        let arr = [0, 0, 0, 1, 1, 1, 1];
        let mut graph = SparseBipartiteGraph::<u16>::new(arr.len(), arr.len());
        graph.reset(2, arr.len() as u16);
        arr.iter()
            .for_each(|i| graph.add_value(*i, 0, 0.).unwrap());
        assert_eq!(graph.row_offsets(), [0, 3, 7]);
        assert_eq!(graph.row_edge_counts(), [3, 4]);
        assert_eq!(graph.num_of_arcs(), 7);
    }

    #[test]
    fn test_extend_keeps_offsets_consistent() {
        let mut graph = SparseBipartiteGraph::<u32>::new(3, 8);
        graph.reset(3, 4);
        graph.extend_from_values(0, &[0, 1, 2, 3], &[10., 6., 14., 1.]).unwrap();
        graph.extend_from_values(1, &[0, 1], &[17., 18.]).unwrap();
        // the row being built can be extended again
        graph.extend_from_values(1, &[2], &[16.]).unwrap();
        graph.extend_from_values(2, &[3], &[5.]).unwrap();

        assert_eq!(graph.row_offsets(), [0, 4, 7, 8]);
        assert_eq!(graph.row_edge_counts(), [4, 3, 1]);
        assert_eq!(graph.column_indices(), [0, 1, 2, 3, 0, 1, 2, 3]);
        assert_eq!(graph.row(1), (&[0, 1, 2][..], &[17., 18., 16.][..]));
        assert_eq!(graph.row(2), (&[3][..], &[5.][..]));
        graph.validate().unwrap();
    }

    #[test]
    fn test_single_arcs_match_batches() {
        const NUM_ROWS: u32 = 20;
        const NUM_COLS: u32 = 50;
        const ARCS_PER_PERSON: usize = 4;
        let mut val_rng = ChaCha8Rng::seed_from_u64(1);
        let mut filter_rng = ChaCha8Rng::seed_from_u64(2);
        let between = Uniform::from(-10.0..10.0);

        let mut by_arc = SparseBipartiteGraph::<u32>::new(0, 0);
        let mut by_row = SparseBipartiteGraph::<u32>::new(0, 0);
        by_arc.reset(NUM_ROWS, NUM_COLS);
        by_row.reset(NUM_ROWS, NUM_COLS);

        for i in 0..NUM_ROWS {
            let mut j_samples = [0; ARCS_PER_PERSON];
            reservoir_sample(0..NUM_COLS, &mut j_samples, &mut filter_rng);
            let j_values: Vec<f64> = j_samples.iter().map(|_| between.sample(&mut val_rng)).collect();
            for (j, v) in j_samples.iter().zip(j_values.iter()) {
                by_arc.add_value(i, *j, *v).unwrap();
            }
            by_row.extend_from_values(i, &j_samples, &j_values).unwrap();
        }

        assert_eq!(by_arc, by_row);
        assert_eq!(by_arc.row_offsets().len(), NUM_ROWS as usize + 1);
        by_arc.validate().unwrap();
    }

    #[test]
    fn test_reset_then_rebuild_reproduces_graph() {
        let build = |graph: &mut SparseBipartiteGraph<u32>| {
            graph.reset(2, 3);
            graph.extend_from_values(0, &[0, 2], &[1., 2.]).unwrap();
            graph.extend_from_values(1, &[1], &[3.]).unwrap();
        };
        let mut graph = SparseBipartiteGraph::new(2, 3);
        build(&mut graph);
        let first = graph.clone();

        graph.reset(4, 4);
        graph.extend_from_values(0, &[3, 3, 3], &[9., 9., 9.]).unwrap();
        build(&mut graph);
        assert_eq!(graph, first);
    }

    #[test]
    fn test_length_mismatch() {
        let mut graph = SparseBipartiteGraph::<u32>::new(1, 2);
        graph.reset(1, 2);
        let err = graph.extend_from_values(0, &[0, 1], &[1.]).unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::LengthMismatch {
                columns: 2,
                values: 1
            }
        );
        assert_eq!(graph.num_of_arcs(), 0);
    }

    #[test]
    fn test_out_of_order_rows() {
        let mut graph = SparseBipartiteGraph::<u32>::new(4, 4);
        graph.reset(4, 4);
        graph.add_value(0, 0, 1.).unwrap();

        // skipping a row
        let err = graph.extend_from_values(2, &[1], &[1.]).unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::OutOfOrderRow {
                current: 0,
                requested: 2
            }
        );

        graph.add_value(1, 1, 1.).unwrap();
        // reopening a finished row
        let err = graph.add_value(0, 2, 1.).unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::OutOfOrderRow {
                current: 1,
                requested: 0
            }
        );
        assert_eq!(graph.row_offsets(), [0, 1, 2]);
        assert_eq!(graph.column_indices(), [0, 1]);
    }

    #[test]
    fn test_empty_row() {
        let mut graph = SparseBipartiteGraph::<u32>::new(2, 2);
        graph.reset(2, 2);
        let err = graph.add_value(1, 0, 1.).unwrap_err();
        assert_eq!(kind(err), AuctionError::EmptyRow { row: 0 });

        // an empty batch doesn't finish the row either
        graph.extend_from_values(0, &[], &[]).unwrap();
        let err = graph.extend_from_values(1, &[0], &[1.]).unwrap_err();
        assert_eq!(kind(err), AuctionError::EmptyRow { row: 0 });
        assert_eq!(graph.num_of_arcs(), 0);
    }

    #[test]
    fn test_row_out_of_range() {
        let mut graph = SparseBipartiteGraph::<u32>::new(1, 1);
        graph.reset(1, 1);
        graph.add_value(0, 0, 1.).unwrap();
        let err = graph.add_value(1, 0, 1.).unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::RowOutOfRange {
                row: 1,
                num_rows: 1
            }
        );
    }

    #[test]
    fn test_arc_count_overflow() {
        let mut graph = SparseBipartiteGraph::<u8>::new(2, 300);
        graph.reset(2, 2);
        let columns = vec![0u8; 200];
        let values = vec![1.0; 200];
        graph.extend_from_values(0, &columns, &values).unwrap();
        let err = graph.extend_from_values(1, &columns, &values).unwrap_err();
        assert_eq!(kind(err), AuctionError::ArcCountOverflow);
        assert_eq!(graph.num_of_arcs(), 200);
    }

    #[test]
    fn test_validate() {
        let mut graph = SparseBipartiteGraph::<u32>::new(2, 2);
        let err = graph.validate().unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::InvalidArcCount { arcs: 0, values: 0 }
        );

        graph.reset(2, 2);
        graph.add_value(0, 1, 1.).unwrap();
        // second row is missing
        let err = graph.validate().unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::InvalidDimension {
                num_rows: 2,
                num_cols: 2,
                rows_built: 1
            }
        );

        graph.add_value(1, 2, 1.).unwrap();
        let err = graph.validate().unwrap_err();
        assert_eq!(
            kind(err),
            AuctionError::ColumnOutOfRange {
                column: 2,
                num_cols: 2
            }
        );

        graph.reset(1, 0);
        graph.add_value(0, 0, 1.).unwrap();
        let err = graph.validate().unwrap_err();
        assert!(matches!(kind(err), AuctionError::InvalidDimension { .. }));
    }

    #[test]
    fn test_validate_rejects_non_finite_values() {
        let mut graph = SparseBipartiteGraph::<u32>::new(2, 3);
        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN].iter() {
            graph.reset(2, 2);
            graph.extend_from_values(0, &[0, 1], &[1., 2.]).unwrap();
            graph.add_value(1, 0, *bad).unwrap();
            let err = graph.validate().unwrap_err();
            assert_eq!(kind(err), AuctionError::NonFiniteValue { index: 2 });
        }
    }
}
