//! Data structures describing expansions.
use crate::traits::types::TranslationError;

/// Kernel family tag attached to an expansion.
///
/// The tag selects the coefficient compression rule and, for cylindrical
/// families, the integer (rather than multi-index) coefficient identifiers.
/// The closed-form kernel evaluations themselves are supplied by external
/// collaborators, see [`crate::traits::kernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelFamily {
    /// Cartesian Taylor expansion with no compression; every multi-index of
    /// degree at most the expansion order is stored.
    Taylor,

    /// PDE-conforming Cartesian Taylor expansion for kernels satisfying the
    /// Laplace equation. Derivatives that are redundant under the PDE, i.e.
    /// those with last-axis component of two or more, are dropped from
    /// storage and reconstructed through the Laplace recurrence.
    LaplaceConforming,

    /// 2D Fourier-Bessel expansion for Helmholtz-type kernels; coefficients
    /// are indexed by integers in `[-order, order]`.
    Helmholtz2d,

    /// 2D Fourier-Bessel expansion for Yukawa-type kernels.
    Yukawa2d,
}

impl KernelFamily {
    /// Whether coefficients are indexed by a single integer rather than a
    /// multi-index.
    pub fn is_cylindrical(&self) -> bool {
        matches!(self, KernelFamily::Helmholtz2d | KernelFamily::Yukawa2d)
    }
}

/// Role of an expansion in a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Represents the field generated by sources inside a region, valid far
    /// from it.
    Multipole,

    /// Represents an incident field near a region's center.
    Local,
}

/// Immutable descriptor of an expansion.
///
/// Identifies which compression rule and which closed-form kernel apply; all
/// index-set and translation machinery is keyed off this descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expansion {
    /// Spatial dimension.
    pub dim: usize,

    /// Expansion order.
    pub order: usize,

    /// Kernel family tag.
    pub family: KernelFamily,

    /// Role of this expansion in a translation.
    pub role: Role,

    /// Whether per-expansion rscale conditioning factors are applied. When
    /// unset, all rscales passed to translation operators are treated as one.
    pub use_rscale: bool,
}

impl Expansion {
    /// Create a descriptor, validating the kernel-family/dimension
    /// combination.
    pub fn new(
        family: KernelFamily,
        dim: usize,
        order: usize,
        role: Role,
        use_rscale: bool,
    ) -> Result<Self, TranslationError> {
        if dim == 0 {
            return Err(TranslationError::InvalidExpansion(
                "expansion dimension must be at least 1".to_string(),
            ));
        }
        if family.is_cylindrical() && dim != 2 {
            return Err(TranslationError::InvalidExpansion(format!(
                "{:?} expansions are only defined in dimension 2, got {}",
                family, dim
            )));
        }
        if family == KernelFamily::LaplaceConforming && dim < 2 {
            return Err(TranslationError::InvalidExpansion(
                "LaplaceConforming expansions require dimension of at least 2".to_string(),
            ));
        }
        Ok(Self {
            dim,
            order,
            family,
            role,
            use_rscale,
        })
    }

    /// Convenience constructor for a multipole expansion with rscale enabled.
    pub fn multipole(
        family: KernelFamily,
        dim: usize,
        order: usize,
    ) -> Result<Self, TranslationError> {
        Self::new(family, dim, order, Role::Multipole, true)
    }

    /// Convenience constructor for a local expansion with rscale enabled.
    pub fn local(
        family: KernelFamily,
        dim: usize,
        order: usize,
    ) -> Result<Self, TranslationError> {
        Self::new(family, dim, order, Role::Local, true)
    }

    /// Coefficient identifiers of a cylindrical expansion, `-order..=order`.
    pub fn cylindrical_identifiers(&self) -> impl Iterator<Item = i64> {
        let p = self.order as i64;
        -p..=p
    }

    /// Storage slot of a cylindrical coefficient identifier.
    pub fn storage_index(&self, k: i64) -> usize {
        debug_assert!(k.unsigned_abs() as usize <= self.order);
        (self.order as i64 + k) as usize
    }
}
