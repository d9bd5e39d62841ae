//! Execution inputs.
//!
//! A `Relation` is one input of a plan. Reusable relations know their exact
//! length and can be scanned any number of times without copying; stream
//! relations are single-pass and only carry a size estimate.

use super::selector::Selector;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use quarry_core::{Reflect, Tuple};

/// A lazy, single-pass sequence of tuples.
pub type Rows<'a> = Box<dyn Iterator<Item = Tuple> + 'a>;

type Fetch<'a> = Rc<dyn Fn(usize) -> Tuple + 'a>;

enum Source<'a> {
    /// Random access over `len` tuples.
    Shared { len: usize, fetch: Fetch<'a> },
    /// Forward-only iterator.
    Stream {
        rows: Rows<'a>,
        estimate: Option<usize>,
    },
}

/// One input of a query plan, with the filters pushed down onto it.
pub struct Relation<'a> {
    source: Source<'a>,
    filters: Vec<Rc<Selector>>,
}

impl<'a> Relation<'a> {
    fn shared(len: usize, fetch: Fetch<'a>) -> Self {
        Self {
            source: Source::Shared { len, fetch },
            filters: Vec::new(),
        }
    }

    /// A reusable relation over borrowed tuples.
    pub fn from_tuples(tuples: &'a [Tuple]) -> Self {
        Self::shared(
            tuples.len(),
            Rc::new(move |i: usize| tuples.get(i).cloned().unwrap_or_default()),
        )
    }

    /// A reusable relation over borrowed records, flattened on access.
    pub fn from_records<R: Reflect>(records: &'a [R]) -> Self {
        let width = R::schema().len();
        Self::shared(
            records.len(),
            Rc::new(move |i: usize| {
                records
                    .get(i)
                    .map(|r| r.to_tuple(width))
                    .unwrap_or_default()
            }),
        )
    }

    /// A reusable relation owning its tuples.
    pub fn materialized(tuples: Vec<Tuple>) -> Self {
        let tuples = Rc::new(tuples);
        Self::shared(
            tuples.len(),
            Rc::new(move |i: usize| tuples.get(i).cloned().unwrap_or_default()),
        )
    }

    /// A single-pass relation over any tuple iterator.
    pub fn from_stream<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Tuple>,
        I::IntoIter: 'a,
    {
        Self {
            source: Source::Stream {
                rows: Box::new(rows.into_iter()),
                estimate: None,
            },
            filters: Vec::new(),
        }
    }

    /// A single-pass relation over any record iterator.
    pub fn from_record_stream<R, I>(records: I) -> Self
    where
        R: Reflect,
        I: IntoIterator<Item = R>,
        I::IntoIter: 'a,
    {
        let width = R::schema().len();
        Self::from_stream(records.into_iter().map(move |r| r.to_tuple(width)))
    }

    /// Sets the size estimate of a stream relation. Reusable relations keep
    /// their exact length.
    pub fn with_estimate(mut self, estimate: usize) -> Self {
        if let Source::Stream { estimate: e, .. } = &mut self.source {
            *e = Some(estimate);
        }
        self
    }

    /// Adds a filter applied to every tuple the relation yields.
    pub fn filter(mut self, selector: Rc<Selector>) -> Self {
        if !selector.is_trivial() {
            self.filters.push(selector);
        }
        self
    }

    /// Returns true if the relation can be scanned more than once.
    #[inline]
    pub fn is_reusable(&self) -> bool {
        matches!(self.source, Source::Shared { .. })
    }

    /// Returns the exact number of unfiltered tuples of a reusable relation.
    pub fn len(&self) -> Option<usize> {
        match &self.source {
            Source::Shared { len, .. } => Some(*len),
            Source::Stream { .. } => None,
        }
    }

    /// Returns the exact length, the caller's estimate, or the iterator's
    /// upper bound. Unknown sizes count as unbounded.
    pub fn estimated_len(&self) -> usize {
        match &self.source {
            Source::Shared { len, .. } => *len,
            Source::Stream { rows, estimate } => {
                estimate.or(rows.size_hint().1).unwrap_or(usize::MAX)
            }
        }
    }

    /// Scans a reusable relation. Returns `None` for streams.
    pub fn scan(&self) -> Option<Rows<'a>> {
        match &self.source {
            Source::Shared { len, fetch } => {
                let fetch = Rc::clone(fetch);
                let rows = (0..*len).map(move |i| fetch(i));
                Some(apply_filters(Box::new(rows), self.filters.clone()))
            }
            Source::Stream { .. } => None,
        }
    }

    /// Consumes the relation into its filtered tuples.
    pub fn into_rows(self) -> Rows<'a> {
        let rows: Rows<'a> = match self.source {
            Source::Shared { len, fetch } => Box::new((0..len).map(move |i| fetch(i))),
            Source::Stream { rows, .. } => rows,
        };
        apply_filters(rows, self.filters)
    }

    /// Makes the relation reusable with no filters left to run. Streams and
    /// filtered reusable relations are buffered; others are returned as is.
    pub fn materialize(self) -> Self {
        if self.is_reusable() && self.filters.is_empty() {
            return self;
        }
        Self::materialized(self.into_rows().collect())
    }
}

fn apply_filters<'a>(rows: Rows<'a>, filters: Vec<Rc<Selector>>) -> Rows<'a> {
    if filters.is_empty() {
        return rows;
    }
    Box::new(rows.filter(move |t| filters.iter().all(|f| f.eval(t))))
}
