//! Multi-index utilities
//!
//! A multi-index is an ordered tuple of `d` non-negative integers, partially
//! ordered componentwise, with degree equal to the sum of its components.

use itertools::Itertools;

/// A multi-index identifying a Cartesian Taylor coefficient.
pub type MultiIndex = Vec<usize>;

/// Degree of a multi-index.
pub fn degree(mi: &[usize]) -> usize {
    mi.iter().sum()
}

/// Componentwise sum of two multi-indices.
pub fn add(a: &[usize], b: &[usize]) -> MultiIndex {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Componentwise partial order, `a <= b` in every component.
pub fn dominated_by(a: &[usize], b: &[usize]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y)
}

/// Factorial as a `u64`; expansion orders in practice keep this well within
/// range.
pub fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// Product of componentwise factorials of a multi-index.
pub fn mi_factorial(mi: &[usize]) -> u64 {
    mi.iter().map(|&c| factorial(c)).product()
}

/// All multi-indices of dimension `dim` with degree at most `order`, in
/// graded order: degree-major, lexicographic within a degree. When `bound`
/// is given, only multi-indices dominated by it componentwise are kept.
pub fn graded_identifiers(dim: usize, order: usize, bound: Option<&[usize]>) -> Vec<MultiIndex> {
    let mut result = Vec::new();
    for deg in 0..=order {
        fixed_degree(dim, deg, &mut vec![0; dim], 0, &mut result);
    }
    if let Some(bound) = bound {
        result.retain(|mi| dominated_by(mi, bound));
    }
    result
}

fn fixed_degree(
    dim: usize,
    remaining: usize,
    prefix: &mut Vec<usize>,
    axis: usize,
    out: &mut Vec<MultiIndex>,
) {
    if axis == dim - 1 {
        prefix[axis] = remaining;
        out.push(prefix.clone());
        return;
    }
    for c in (0..=remaining).rev() {
        prefix[axis] = c;
        fixed_degree(dim, remaining - c, prefix, axis + 1, out);
    }
}

/// All multi-indices dominated componentwise by `bound`, enumerated in
/// mixed-radix counting order with the last axis varying fastest. The
/// position of a multi-index in this enumeration equals its mixed-radix
/// linear index, so positions of componentwise sums add without carry as
/// long as no component overflows `bound`.
pub fn tuples_below(bound: &[usize]) -> Vec<MultiIndex> {
    bound
        .iter()
        .map(|&b| 0..=b)
        .multi_cartesian_product()
        .collect()
}

/// Mixed-radix linear index of `mi` in the space bounded by `bound`, matching
/// the enumeration order of [`tuples_below`].
pub fn linear_index(mi: &[usize], bound: &[usize]) -> usize {
    debug_assert!(dominated_by(mi, bound));
    let mut index = 0;
    for (c, b) in mi.iter().zip(bound) {
        index = index * (b + 1) + c;
    }
    index
}

#[cfg(test)]
mod test {
    use super::{
        add, degree, dominated_by, factorial, graded_identifiers, linear_index, mi_factorial,
        tuples_below,
    };

    #[test]
    fn test_graded_order() {
        let mis = graded_identifiers(2, 2, None);
        assert_eq!(
            mis,
            vec![
                vec![0, 0],
                vec![1, 0],
                vec![0, 1],
                vec![2, 0],
                vec![1, 1],
                vec![0, 2]
            ]
        );

        // Degrees never decrease along the enumeration.
        let mis = graded_identifiers(3, 4, None);
        for pair in mis.windows(2) {
            assert!(degree(&pair[0]) <= degree(&pair[1]));
        }
    }

    #[test]
    fn test_graded_bound() {
        let mis = graded_identifiers(2, 4, Some(&[4, 1]));
        assert!(mis.iter().all(|mi| mi[1] <= 1 && degree(mi) <= 4));
        assert!(mis.contains(&vec![3, 1]));
        assert!(!mis.contains(&vec![0, 2]));
    }

    #[test]
    fn test_tuples_below_matches_linear_index() {
        let bound = [2, 3, 1];
        let mis = tuples_below(&bound);
        assert_eq!(mis.len(), 3 * 4 * 2);
        for (i, mi) in mis.iter().enumerate() {
            assert_eq!(linear_index(mi, &bound), i);
        }
    }

    #[test]
    fn test_linear_index_additive() {
        // Positions of componentwise sums add without carry.
        let bound = [3, 4];
        let a = vec![1, 2];
        let b = vec![2, 1];
        assert_eq!(
            linear_index(&add(&a, &b), &bound),
            linear_index(&a, &bound) + linear_index(&b, &bound)
        );
    }

    #[test]
    fn test_factorials() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(mi_factorial(&[2, 3]), 12);
        assert!(dominated_by(&[1, 2], &[1, 3]));
        assert!(!dominated_by(&[2, 0], &[1, 3]));
    }
}
