//! Circulant embedding of the M2L Toeplitz structure.
//!
//! The M2L translation matrix for Cartesian Taylor expansions has entries
//! depending only on the componentwise sum of the source and target
//! multi-indices, a mirror image of a Toeplitz matrix. Padding the index
//! space to a full mixed-radix box makes the matrix circulant, so the matvec
//! becomes a cyclic convolution and admits an FFT.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::expansion::cache::MemoCache;
use crate::expansion::multi_index::{add, linear_index, tuples_below, MultiIndex};
use crate::expansion::types::KernelFamily;
use crate::expansion::wrangler::ExpansionTermsWrangler;
use crate::traits::general::TranslationScalar;

#[derive(Clone, PartialEq, Eq, Hash)]
struct CirculantKey {
    family: KernelFamily,
    dim: usize,
    tgt_order: usize,
    src_order: usize,
}

lazy_static! {
    static ref CIRCULANT_SPACES: MemoCache<CirculantKey, CirculantSpace> = MemoCache::new();
}

/// Padded index space admitting circulant structure for one expansion pair.
///
/// `max_mi` is the componentwise sum of the source and target stored maxima;
/// the padded identifiers run over the whole box `[0, max_mi]` in mixed-radix
/// order, so slots of componentwise sums add without carry. Entries that are
/// not needed Toeplitz values occupy slots as algebraic zeros.
pub struct CirculantSpace {
    /// Componentwise bound of the padded space.
    pub max_mi: Vec<usize>,
    /// Every multi-index of the padded box, in mixed-radix order.
    pub identifiers: Vec<MultiIndex>,
    /// Needed Toeplitz entries: the distinct `src_mi + tgt_mi` sums, in
    /// first-encounter order.
    pub needed: Vec<MultiIndex>,
    slots: HashMap<MultiIndex, usize>,
}

impl CirculantSpace {
    /// Memoized padded index space for a target/source wrangler pair.
    pub fn new(tgt: &ExpansionTermsWrangler, src: &ExpansionTermsWrangler) -> Arc<Self> {
        debug_assert_eq!(tgt.family(), src.family());
        debug_assert_eq!(tgt.dim(), src.dim());
        let key = CirculantKey {
            family: tgt.family(),
            dim: tgt.dim(),
            tgt_order: tgt.order(),
            src_order: src.order(),
        };
        let tgt_stored = tgt.stored_identifiers().to_vec();
        let src_stored = src.stored_identifiers().to_vec();
        CIRCULANT_SPACES.get_or_compute(&key, || compute_space(&tgt_stored, &src_stored))
    }

    /// Number of slots in the padded space.
    pub fn size(&self) -> usize {
        self.identifiers.len()
    }

    /// Slot of a padded identifier; `None` for identifiers outside the box.
    pub fn slot(&self, mi: &[usize]) -> Option<usize> {
        self.slots.get(mi).copied()
    }
}

fn compute_space(tgt_stored: &[MultiIndex], src_stored: &[MultiIndex]) -> CirculantSpace {
    let dim = tgt_stored[0].len();
    let mut max_mi = vec![0; dim];
    for k in 0..dim {
        let src_max = src_stored.iter().map(|mi| mi[k]).max().unwrap_or(0);
        let tgt_max = tgt_stored.iter().map(|mi| mi[k]).max().unwrap_or(0);
        max_mi[k] = src_max + tgt_max;
    }

    let identifiers = tuples_below(&max_mi);
    let slots: HashMap<MultiIndex, usize> = identifiers
        .iter()
        .enumerate()
        .map(|(i, mi)| (mi.clone(), i))
        .collect();
    debug_assert!(identifiers
        .iter()
        .enumerate()
        .all(|(i, mi)| linear_index(mi, &max_mi) == i));

    let mut needed = Vec::new();
    let mut seen = HashSet::new();
    for tgt_mi in tgt_stored {
        for src_mi in src_stored {
            let sum = add(src_mi, tgt_mi);
            if seen.insert(sum.clone()) {
                needed.push(sum);
            }
        }
    }
    // Every needed entry must be reachable in the padded space.
    assert!(needed.iter().all(|mi| slots.contains_key(mi)));

    CirculantSpace {
        max_mi,
        identifiers,
        needed,
        slots,
    }
}

/// Matvec of the mirrored upper-triangular Toeplitz matrix specified by its
/// entry vector `v`: `result[i] = sum_{j : i + j < n} x[j] * v[i + j]`.
pub fn matvec_toeplitz_upper_triangular<T: TranslationScalar>(x: &[T], v: &[T]) -> Vec<T> {
    assert_eq!(x.len(), v.len());
    let n = x.len();
    let mut result = vec![T::zero(); n];
    for (j, xj) in x.iter().enumerate() {
        if xj.is_zero() {
            continue;
        }
        for i in 0..n - j {
            result[i] += xj.clone() * v[i + j].clone();
        }
    }
    result
}
