//! Enumeration and compression of expansion coefficient identifiers.
use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::expansion::cache::MemoCache;
use crate::expansion::multi_index::{graded_identifiers, MultiIndex};
use crate::expansion::types::{Expansion, KernelFamily};
use crate::traits::general::TranslationScalar;
use crate::traits::types::TranslationError;

#[derive(Clone, PartialEq, Eq, Hash)]
struct WranglerKey {
    family: KernelFamily,
    dim: usize,
    order: usize,
    bound: Option<Vec<usize>>,
}

/// Memoized index sets for one `(family, dim, order, bound)` combination.
pub(crate) struct IndexData {
    full: Vec<MultiIndex>,
    full_index: HashMap<MultiIndex, usize>,
    stored: Vec<MultiIndex>,
    hyperplane_groups: Vec<(usize, Vec<MultiIndex>)>,
}

lazy_static! {
    static ref INDEX_SETS: MemoCache<WranglerKey, IndexData> = MemoCache::new();
}

/// Bookkeeping for the coefficient identifiers of a Cartesian Taylor
/// expansion: the full identifier set, the kernel-family-dependent stored
/// (compressed) subset, the projection/reconstruction between the two, and
/// the axis-wise hyperplane decomposition consumed by the M2M translator.
///
/// Index sets are memoized process-wide per `(family, dim, order, bound)`;
/// wranglers are cheap handles onto that shared data.
pub struct ExpansionTermsWrangler {
    family: KernelFamily,
    dim: usize,
    order: usize,
    bound: Option<Vec<usize>>,
    data: Arc<IndexData>,
}

impl ExpansionTermsWrangler {
    /// Wrangler for the identifiers of `expansion`. Cylindrical families
    /// index coefficients by integers and are rejected here; see
    /// [`Expansion::cylindrical_identifiers`].
    pub fn new(expansion: &Expansion) -> Result<Self, TranslationError> {
        if expansion.family.is_cylindrical() {
            return Err(TranslationError::InvalidExpansion(format!(
                "{:?} expansions are indexed by integers, not multi-indices",
                expansion.family
            )));
        }
        Ok(Self::build(expansion.family, expansion.dim, expansion.order, None))
    }

    /// Wrangler for the same family and dimension with a different order
    /// bound, optionally restricted componentwise by `bound`. Used by M2L
    /// precomputation for the combined `src_order + tgt_order` space.
    pub fn with_order(&self, order: usize, bound: Option<&[usize]>) -> Self {
        Self::build(self.family, self.dim, order, bound.map(<[usize]>::to_vec))
    }

    fn build(family: KernelFamily, dim: usize, order: usize, bound: Option<Vec<usize>>) -> Self {
        let key = WranglerKey {
            family,
            dim,
            order,
            bound: bound.clone(),
        };
        let data = INDEX_SETS.get_or_compute(&key, || compute_index_data(&key));
        Self {
            family,
            dim,
            order,
            bound,
            data,
        }
    }

    /// Kernel family of this wrangler.
    pub fn family(&self) -> KernelFamily {
        self.family
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Expansion order bound.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Every multi-index of degree at most the order (and dominated by the
    /// componentwise bound, if any), in graded order.
    pub fn full_identifiers(&self) -> &[MultiIndex] {
        &self.data.full
    }

    /// The stored (compressed) subset of [`Self::full_identifiers`], in the
    /// same relative order.
    pub fn stored_identifiers(&self) -> &[MultiIndex] {
        &self.data.stored
    }

    /// Position of `mi` within [`Self::full_identifiers`].
    pub fn full_position(&self, mi: &[usize]) -> Option<usize> {
        self.data.full_index.get(mi).copied()
    }

    /// Partition of the full identifier set into per-axis groups, each a
    /// union of hyperplanes perpendicular to its axis.
    ///
    /// A multi-index joins the group of its first axis with a nonzero
    /// component (the zero multi-index joins axis 0), so every identifier
    /// lands in exactly one group and at most `dim` groups appear. Group and
    /// member ordering is deterministic and matches the two-pass scan of the
    /// M2M translator.
    pub fn hyperplane_groups(&self) -> &[(usize, Vec<MultiIndex>)] {
        &self.data.hyperplane_groups
    }

    /// Project a full coefficient vector onto the stored subset, folding the
    /// coefficients of redundant derivatives onto stored ones through the
    /// kernel family's governing relation applied in reverse.
    pub fn project_to_stored<T: TranslationScalar>(&self, full_vals: &[T], _rscale: T) -> Vec<T> {
        assert_eq!(full_vals.len(), self.data.full.len());
        if self.family == KernelFamily::Taylor {
            return full_vals.to_vec();
        }

        // The Laplace relation is degree homogeneous, so rscale factors
        // cancel between source and destination identifiers.
        let last = self.dim - 1;
        let mut work = full_vals.to_vec();
        let mut positions: Vec<usize> = (0..work.len()).collect();
        positions.sort_by_key(|&i| std::cmp::Reverse(self.data.full[i][last]));

        for i in positions {
            let mi = &self.data.full[i];
            if self.is_stored(mi) {
                continue;
            }
            let coeff = std::mem::replace(&mut work[i], T::zero());
            if coeff.is_zero() {
                continue;
            }
            // D[mi] = -sum_{k < last} D[mi - 2 e_last + 2 e_k], so the
            // coefficient of D[mi] contributes negated to each term.
            for k in 0..last {
                let mut dest = mi.clone();
                dest[last] -= 2;
                dest[k] += 2;
                let j = self.data.full_index[&dest];
                work[j] = work[j].clone() - coeff.clone();
            }
        }

        self.data
            .stored
            .iter()
            .map(|mi| work[self.data.full_index[mi]].clone())
            .collect()
    }

    /// Reconstruct the full coefficient vector from stored values by
    /// applying the kernel family's governing recurrence.
    pub fn expand_to_full<T: TranslationScalar>(&self, stored_vals: &[T], _rscale: T) -> Vec<T> {
        assert_eq!(stored_vals.len(), self.data.stored.len());
        let mut full = vec![T::zero(); self.data.full.len()];
        for (mi, value) in self.data.stored.iter().zip(stored_vals) {
            full[self.data.full_index[mi]] = value.clone();
        }
        if self.family == KernelFamily::Taylor {
            return full;
        }

        let last = self.dim - 1;
        let mut positions: Vec<usize> = (0..full.len()).collect();
        positions.sort_by_key(|&i| self.data.full[i][last]);

        for i in positions {
            let mi = &self.data.full[i];
            if self.is_stored(mi) {
                continue;
            }
            // Recurrence sources have last component reduced by two, hence
            // are already final at this point of the scan.
            let mut acc = T::zero();
            for k in 0..last {
                let mut src = mi.clone();
                src[last] -= 2;
                src[k] += 2;
                acc += full[self.data.full_index[&src]].clone();
            }
            full[i] = T::zero() - acc;
        }
        full
    }

    fn is_stored(&self, mi: &[usize]) -> bool {
        is_stored(self.family, mi, self.bound.as_deref())
    }
}

/// Compression rule of a kernel family.
///
/// For componentwise-bounded wranglers a redundant identifier stays stored
/// whenever its recurrence would reach outside the bounding box.
fn is_stored(family: KernelFamily, mi: &[usize], bound: Option<&[usize]>) -> bool {
    match family {
        KernelFamily::Taylor => true,
        KernelFamily::LaplaceConforming => {
            let last = mi.len() - 1;
            if mi[last] <= 1 {
                return true;
            }
            match bound {
                Some(bound) => (0..last).any(|k| mi[k] + 2 > bound[k]),
                None => false,
            }
        }
        KernelFamily::Helmholtz2d | KernelFamily::Yukawa2d => {
            unreachable!("cylindrical families have no multi-index wrangler")
        }
    }
}

fn compute_index_data(key: &WranglerKey) -> IndexData {
    let full = graded_identifiers(key.dim, key.order, key.bound.as_deref());
    let full_index: HashMap<MultiIndex, usize> = full
        .iter()
        .enumerate()
        .map(|(i, mi)| (mi.clone(), i))
        .collect();
    let stored: Vec<MultiIndex> = full
        .iter()
        .filter(|mi| is_stored(key.family, mi, key.bound.as_deref()))
        .cloned()
        .collect();

    let mut hyperplane_groups: Vec<(usize, Vec<MultiIndex>)> = Vec::new();
    for axis in 0..key.dim {
        let members: Vec<MultiIndex> = full
            .iter()
            .filter(|mi| mi.iter().position(|&c| c > 0).unwrap_or(0) == axis)
            .cloned()
            .collect();
        if !members.is_empty() {
            hyperplane_groups.push((axis, members));
        }
    }

    IndexData {
        full,
        full_index,
        stored,
        hyperplane_groups,
    }
}
