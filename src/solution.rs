use num_integer::Integer;
use num_traits::{AsPrimitive, FromPrimitive, NumAssign, PrimInt, Unsigned};
use std::fmt::{Debug, Display};

pub trait UnsignedInt:
    PrimInt
    + Unsigned
    + Integer
    + Display
    + Debug
    + AsPrimitive<usize>
    + AsPrimitive<f64>
    + FromPrimitive
    + NumAssign
{
}

impl<T> UnsignedInt for T where
    T: PrimInt
        + Unsigned
        + Integer
        + Display
        + Debug
        + AsPrimitive<usize>
        + AsPrimitive<f64>
        + FromPrimitive
        + NumAssign
{
}

/// Sign transform applied to the stored edge values while a solve runs.
///
/// The auction always maximizes profit. Whether the stored values have to be negated is
/// inferred from the sign of the first stored value and the requested direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    AsGiven,
    Negated,
}

impl Orientation {
    /// Values are considered positive when the first one is non-negative (or there is none).
    pub fn infer(first_value: Option<f64>, maximize: bool) -> Orientation {
        let positive_values = first_value.unwrap_or(0.0) >= 0.;
        if maximize ^ positive_values {
            Orientation::Negated
        } else {
            Orientation::AsGiven
        }
    }

    #[inline]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Orientation::AsGiven => value,
            Orientation::Negated => -value,
        }
    }
}

///
/// Solution of the linear assignment problem
///
#[derive(Debug, Clone)]
pub struct AuctionSolution<I>
where
    I: UnsignedInt,
{
    /// index i gives the object, j, owned by person i
    ///
    /// Unassigned people are marked by MAX value of the integer type (u32::MAX for u32)
    pub person_to_object: Vec<I>,
    /// index j gives the person, i, who owns object j
    ///
    /// Unassigned objects are marked by MAX value of the integer type (u32::MAX for u32)
    pub object_to_person: Vec<I>,
    /// number of unassigned people. People whose best object became more expensive than the
    /// price threshold are given up on, so a non-zero value doesn't imply that a perfect
    /// matching doesn't exist.
    pub num_unassigned: I,
    /// price increment used by the run
    pub eps: f64,
    /// number of popped people
    pub nits: u64,
    /// sign transform the run applied to the edge values
    pub orientation: Orientation,
}

impl<I> AuctionSolution<I>
where
    I: UnsignedInt,
{
    pub fn new(row_capacity: usize, column_capacity: usize) -> AuctionSolution<I> {
        AuctionSolution::<I> {
            person_to_object: Vec::with_capacity(row_capacity),
            object_to_person: Vec::with_capacity(column_capacity),
            eps: f64::NAN,
            num_unassigned: I::max_value(),
            nits: 0,
            orientation: Orientation::AsGiven,
        }
    }

    /// Discards previous contents and marks every person and object as unassigned.
    pub(crate) fn reset(&mut self, num_rows: I, num_cols: I, eps: f64, orientation: Orientation) {
        self.person_to_object.clear();
        self.person_to_object.resize(num_rows.as_(), I::max_value());
        self.object_to_person.clear();
        self.object_to_person.resize(num_cols.as_(), I::max_value());
        self.num_unassigned = num_rows;
        self.eps = eps;
        self.nits = 0;
        self.orientation = orientation;
    }

    /// Object owned by `person`, if any.
    #[inline]
    pub fn assignment(&self, person: usize) -> Option<I> {
        self.person_to_object
            .get(person)
            .copied()
            .filter(|j| *j != I::max_value())
    }

    /// Iterates over assigned `(person, object)` pairs in person order.
    pub fn assigned_pairs(&self) -> impl Iterator<Item = (usize, I)> + '_ {
        self.person_to_object
            .iter()
            .enumerate()
            .filter(|(_, j)| **j != I::max_value())
            .map(|(i, j)| (i, *j))
    }

    pub fn num_assigned(&self) -> usize {
        self.assigned_pairs().count()
    }
}
