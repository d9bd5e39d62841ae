//! Hash Join implementation.

use crate::executor::relation::{Relation, Rows};
use crate::executor::selector::Selector;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use log::debug;
use quarry_core::{Tuple, Value};

/// One component of a join key, normalized so that equal values of
/// different widths hash alike.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum KeyPart {
    Integer(i64),
    /// Bit pattern of the float, with -0.0 folded into 0.0.
    Float(u64),
    Text(String),
    Boolean(bool),
}

impl KeyPart {
    /// Returns `None` for values that never compare equal (NULL, NaN).
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32(v) => Some(KeyPart::Integer(i64::from(*v))),
            Value::Int64(v) => Some(KeyPart::Integer(*v)),
            Value::Float64(v) if v.is_nan() => None,
            Value::Float64(v) if *v == 0.0 => Some(KeyPart::Float(0.0f64.to_bits())),
            Value::Float64(v) => Some(KeyPart::Float(v.to_bits())),
            Value::String(s) => Some(KeyPart::Text(s.clone())),
            Value::Boolean(b) => Some(KeyPart::Boolean(*b)),
            Value::Null => None,
        }
    }
}

type JoinKey = Vec<KeyPart>;

fn join_key(tuple: &Tuple, indices: &[usize]) -> Option<JoinKey> {
    indices
        .iter()
        .map(|&i| tuple.get(i).and_then(KeyPart::from_value))
        .collect()
}

/// Hash Join executor.
///
/// Implements the classic hash join algorithm:
/// 1. Build phase: Create a hash table from the smaller relation
/// 2. Probe phase: Stream the larger relation and probe the hash table
///
/// Joined tuples are always left fields followed by right fields, whichever
/// side was built.
#[derive(Clone, Debug)]
pub struct HashJoin {
    /// Key field indices of the left relation.
    left_keys: Vec<usize>,
    /// Key field indices of the right relation, pairwise with `left_keys`.
    right_keys: Vec<usize>,
    /// Non-equality part of the join condition, evaluated on joined tuples.
    residual: Option<Rc<Selector>>,
    /// Key equalities as written, for display.
    key_description: Option<String>,
}

impl HashJoin {
    /// Creates a new hash join executor.
    pub fn new(left_keys: Vec<usize>, right_keys: Vec<usize>) -> Self {
        debug_assert_eq!(left_keys.len(), right_keys.len());
        Self {
            left_keys,
            right_keys,
            residual: None,
            key_description: None,
        }
    }

    /// Sets how the key equalities are displayed.
    pub fn with_key_description(mut self, description: impl Into<String>) -> Self {
        self.key_description = Some(description.into());
        self
    }

    /// Sets the condition every matched pair must also satisfy.
    pub fn with_residual(mut self, residual: Rc<Selector>) -> Self {
        self.residual = (!residual.is_trivial()).then_some(residual);
        self
    }

    /// Returns the key field indices of both sides.
    pub fn keys(&self) -> (&[usize], &[usize]) {
        (&self.left_keys, &self.right_keys)
    }

    /// Returns the key equalities as written, if set.
    pub fn key_description(&self) -> Option<&str> {
        self.key_description.as_deref()
    }

    /// Returns the residual condition.
    pub fn residual(&self) -> Option<&Selector> {
        self.residual.as_deref()
    }

    /// Executes the hash join. The build side is read on the first pull.
    pub fn execute<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Rows<'a> {
        let join = self.clone();
        let mut pending = Some((left, right));
        Box::new(core::iter::from_fn(move || pending.take().map(|(l, r)| join.run(l, r))).flatten())
    }

    fn run<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Rows<'a> {
        let build_left = left.estimated_len() <= right.estimated_len();
        let (build, probe, build_keys, probe_keys) = if build_left {
            (left, right, &self.left_keys, self.right_keys.clone())
        } else {
            (right, left, &self.right_keys, self.left_keys.clone())
        };

        // Build phase
        let mut table: HashMap<JoinKey, Vec<Tuple>> = HashMap::with_capacity(build.len().unwrap_or(0));
        for tuple in build.into_rows() {
            if let Some(key) = join_key(&tuple, build_keys) {
                table.entry(key).or_default().push(tuple);
            }
        }
        debug!(
            "hash join built {} keys from the {} input",
            table.len(),
            if build_left { "left" } else { "right" }
        );

        // Probe phase
        let residual = self.residual.clone();
        Box::new(probe.into_rows().flat_map(move |probed| {
            let mut out = Vec::new();
            let bucket = join_key(&probed, &probe_keys).and_then(|key| table.get(&key));
            for built in bucket.into_iter().flatten() {
                let joined = if build_left {
                    Tuple::concat(built, &probed)
                } else {
                    Tuple::concat(&probed, built)
                };
                if residual.as_ref().map_or(true, |r| r.eval(&joined)) {
                    out.push(joined);
                }
            }
            out
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn rows(data: &[(i64, &str)]) -> Vec<Tuple> {
        data.iter()
            .map(|(id, name)| Tuple::new(vec![Value::Int64(*id), Value::String((*name).into())]))
            .collect()
    }

    #[test]
    fn test_hash_join_matches_pairs() {
        let left = rows(&[(1, "a"), (2, "b"), (3, "c")]);
        let right = rows(&[(2, "x"), (3, "y"), (3, "z"), (4, "w")]);
        let join = HashJoin::new(vec![0], vec![0]);
        let mut result: Vec<Tuple> = join
            .execute(Relation::from_tuples(&left), Relation::from_tuples(&right))
            .collect();
        result.sort();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].values()[1], Value::String("b".into()));
        assert_eq!(result[0].values()[3], Value::String("x".into()));
        assert_eq!(result[2].values()[3], Value::String("z".into()));
    }

    #[test]
    fn test_output_order_is_left_then_right_either_way() {
        let small = rows(&[(1, "s")]);
        let large = rows(&[(1, "l1"), (1, "l2"), (2, "l3")]);
        let join = HashJoin::new(vec![0], vec![0]);

        let result: Vec<Tuple> = join
            .execute(Relation::from_tuples(&large), Relation::from_tuples(&small))
            .collect();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|t| t.values()[3] == Value::String("s".into())));

        let result: Vec<Tuple> = join
            .execute(Relation::from_tuples(&small), Relation::from_tuples(&large))
            .collect();
        assert!(result.iter().all(|t| t.values()[1] == Value::String("s".into())));
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(
            KeyPart::from_value(&Value::Int32(7)),
            KeyPart::from_value(&Value::Int64(7))
        );
        assert_eq!(
            KeyPart::from_value(&Value::Float64(-0.0)),
            KeyPart::from_value(&Value::Float64(0.0))
        );
        assert_eq!(KeyPart::from_value(&Value::Float64(f64::NAN)), None);
        assert_eq!(KeyPart::from_value(&Value::Null), None);
    }

    #[test]
    fn test_nan_keys_never_match() {
        let left = vec![Tuple::new(vec![Value::Float64(f64::NAN)])];
        let right = vec![Tuple::new(vec![Value::Float64(f64::NAN)])];
        let join = HashJoin::new(vec![0], vec![0]);
        let result = join.execute(Relation::from_tuples(&left), Relation::from_tuples(&right));
        assert_eq!(result.count(), 0);
    }

    #[test]
    fn test_composite_keys_over_streams() {
        let left = vec![
            Tuple::new(vec![Value::Int64(1), Value::String("a".into())]),
            Tuple::new(vec![Value::Int64(1), Value::String("b".into())]),
        ];
        let right = vec![Tuple::new(vec![Value::String("b".into()), Value::Int32(1)])];
        let join = HashJoin::new(vec![0, 1], vec![1, 0]);
        let result: Vec<Tuple> = join
            .execute(Relation::from_stream(left), Relation::from_stream(right))
            .collect();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 4);
        assert_eq!(result[0].values()[1], Value::String("b".into()));
    }
}
