//! Scalar values and row-level helpers: ordering, byte-width modeling, and
//! the stable key encoding used for hash partitioning and hash-join probes.
//!
//! The key encoding is canonical (type discriminant + little-endian bytes) so
//! that the same key values on both relations hash identically, independent
//! of which side they came from.

use serde::{Deserialize, Serialize};

use crate::schema::DataType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

/// A row is a tuple of column values; arity matches the relation schema.
pub type Row = Vec<Scalar>;

impl Scalar {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(DataType::Boolean),
            Scalar::I32(_) => Some(DataType::Int32),
            Scalar::I64(_) => Some(DataType::Int64),
            Scalar::F32(_) => Some(DataType::Float32),
            Scalar::F64(_) => Some(DataType::Float64),
            Scalar::Str(_) => Some(DataType::Utf8),
            Scalar::Bin(_) => Some(DataType::Binary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Approximate in-memory width in bytes, used by the size estimator.
    pub fn approx_width(&self) -> u64 {
        use Scalar::*;
        match self {
            Null => 1,
            Bool(_) => 1,
            I32(_) | F32(_) => 4,
            I64(_) | F64(_) => 8,
            Str(s) => 4 + s.len() as u64,
            Bin(b) => 4 + b.len() as u64,
        }
    }
}

/// Approximate width of a whole row.
pub fn approx_row_width(row: &[Scalar]) -> u64 {
    row.iter().map(Scalar::approx_width).sum()
}

/// Compare two scalars for sorting.
///
/// Nulls sort first, NaN sorts last within floats. Mixed types order by
/// variant, which only matters for malformed inputs.
pub fn scalar_cmp(a: &Scalar, b: &Scalar) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    use Scalar::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Null, _) => Ordering::Less,
        (_, Null) => Ordering::Greater,
        (Bool(x), Bool(y)) => x.cmp(y),
        (I32(x), I32(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (F32(x), F32(y)) => float_cmp(*x as f64, *y as f64),
        (F64(x), F64(y)) => float_cmp(*x, *y),
        (Str(x), Str(y)) => x.cmp(y),
        (Bin(x), Bin(y)) => x.cmp(y),
        // Cross-numeric comparisons go through f64.
        (I32(x), I64(y)) => (*x as i64).cmp(y),
        (I64(x), I32(y)) => x.cmp(&(*y as i64)),
        (I32(x), F32(y)) => float_cmp(*x as f64, *y as f64),
        (I32(x), F64(y)) => float_cmp(*x as f64, *y),
        (I64(x), F32(y)) => float_cmp(*x as f64, *y as f64),
        (I64(x), F64(y)) => float_cmp(*x as f64, *y),
        (F32(x), I32(y)) => float_cmp(*x as f64, *y as f64),
        (F32(x), I64(y)) => float_cmp(*x as f64, *y as f64),
        (F32(x), F64(y)) => float_cmp(*x as f64, *y),
        (F64(x), I32(y)) => float_cmp(*x, *y as f64),
        (F64(x), I64(y)) => float_cmp(*x, *y as f64),
        (F64(x), F32(y)) => float_cmp(*x, *y as f64),
        _ => scalar_type_order(a).cmp(&scalar_type_order(b)),
    }
}

fn float_cmp(x: f64, y: f64) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    if x.is_nan() && y.is_nan() {
        Ordering::Equal
    } else if x.is_nan() {
        Ordering::Greater
    } else if y.is_nan() {
        Ordering::Less
    } else {
        x.partial_cmp(&y).unwrap_or(Ordering::Equal)
    }
}

/// Compare the key tuples of two rows, each projected through its own
/// column-index list. Order-sensitive; lists must have equal length.
pub fn key_cmp(a: &[Scalar], a_idx: &[usize], b: &[Scalar], b_idx: &[usize]) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    for (&i, &j) in a_idx.iter().zip(b_idx.iter()) {
        match scalar_cmp(&a[i], &b[j]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Numeric order of scalar variants for mixed-type comparisons and hashing.
fn scalar_type_order(s: &Scalar) -> u8 {
    use Scalar::*;
    match s {
        Null => 0,
        Bool(_) => 1,
        I32(_) => 2,
        I64(_) => 3,
        F32(_) => 4,
        F64(_) => 5,
        Str(_) => 6,
        Bin(_) => 7,
    }
}

/// Hash one scalar into a hasher: type discriminant then canonical bytes.
///
/// Numerics share one canonical encoding: any value `scalar_cmp` treats as
/// equal must produce identical bytes, or equal keys would land in
/// different partitions and different hash-index buckets depending on their
/// declared type.
fn hash_scalar(scalar: &Scalar, hasher: &mut blake3::Hasher) {
    use Scalar::*;

    match scalar {
        Null => {
            hasher.update(&[0u8]);
        }
        Bool(b) => {
            hasher.update(&[1u8, *b as u8]);
        }
        I32(i) => hash_integer(*i as i64, hasher),
        I64(i) => hash_integer(*i, hasher),
        F32(f) => hash_float(*f as f64, hasher),
        F64(f) => hash_float(*f, hasher),
        Str(s) => {
            hasher.update(&[4u8]);
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Bin(b) => {
            hasher.update(&[5u8]);
            hasher.update(&(b.len() as u64).to_le_bytes());
            hasher.update(b);
        }
    }
}

fn hash_integer(i: i64, hasher: &mut blake3::Hasher) {
    hasher.update(&[2u8]);
    hasher.update(&i.to_le_bytes());
}

/// Integral floats take the integer encoding, so `F64(1.0)` hashes like
/// `I64(1)`. NaNs all collapse to one canonical bit pattern, matching
/// `float_cmp` treating every NaN as equal.
fn hash_float(f: f64, hasher: &mut blake3::Hasher) {
    if f.is_nan() {
        hasher.update(&[3u8]);
        hasher.update(&f64::NAN.to_bits().to_le_bytes());
        return;
    }
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        hash_integer(f as i64, hasher);
        return;
    }
    hasher.update(&[3u8]);
    hasher.update(&f.to_bits().to_le_bytes());
}

/// Stable 64-bit hash of a row's join-key tuple (order-sensitive).
pub fn hash_key(row: &[Scalar], key_idx: &[usize]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for &i in key_idx {
        hash_scalar(&row[i], &mut hasher);
    }
    let hash = hasher.finalize();
    u64::from_le_bytes(hash.as_bytes()[0..8].try_into().unwrap())
}

/// Canonical byte encoding of a row's join-key tuple, used as a hash-index
/// key. Returns `None` when any key value is Null: null keys match nothing
/// under inner-join semantics, so they are never indexed or probed.
pub fn encode_key(row: &[Scalar], key_idx: &[usize]) -> Option<Vec<u8>> {
    if key_idx.iter().any(|&i| row[i].is_null()) {
        return None;
    }
    let mut hasher = blake3::Hasher::new();
    for &i in key_idx {
        hash_scalar(&row[i], &mut hasher);
    }
    Some(hasher.finalize().as_bytes().to_vec())
}

/// Whether any of the row's key values is Null.
pub fn key_has_null(row: &[Scalar], key_idx: &[usize]) -> bool {
    key_idx.iter().any(|&i| row[i].is_null())
}
