//! The single multiply-then-divide primitive that every money-bearing
//! computation funnels through.
//!
//! The product is computed in 256 bits, so it can never overflow; only the
//! final quotient is narrowed back to 128 bits, and that narrowing fails
//! rather than wraps.

use {
    crate::{IsZero, MathError, MathResult, Uint128},
    bnum::types::U256,
};

/// Direction in which a non-exact quotient is rounded.
///
/// There is no default. Every call site must say which party the rounding
/// error goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Round toward zero.
    Floor,
    /// Round away from zero.
    Ceil,
}

/// Compute `a * b / denominator`, rounded in the given direction.
pub fn mul_div(
    a: Uint128,
    b: Uint128,
    denominator: Uint128,
    rounding: Rounding,
) -> MathResult<Uint128> {
    if denominator.is_zero() {
        return Err(MathError::division_by_zero(a));
    }

    let product = U256::from(a.into_inner()) * U256::from(b.into_inner());
    let denominator = U256::from(denominator.into_inner());

    let mut quotient = product / denominator;

    // `quotient <= product < U256::MAX`, so adding one can't overflow.
    if rounding == Rounding::Ceil && !(product % denominator).is_zero() {
        quotient += U256::ONE;
    }

    u128::try_from(quotient)
        .map(Uint128::new)
        .map_err(|_| MathError::overflow_conversion::<_, Uint128>(quotient))
}

/// Describes operations where a number is multiplied by a numerator then
/// immediately divided by a denominator.
/// This is different from applying a multiplication and a division sequentially,
/// because the multiplication part can overflow.
pub trait MultiplyRatio: Sized {
    fn checked_multiply_ratio_floor<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>;

    fn checked_multiply_ratio_ceil<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>;
}

impl MultiplyRatio for Uint128 {
    fn checked_multiply_ratio_floor<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>,
    {
        mul_div(self, numerator.into(), denominator.into(), Rounding::Floor)
    }

    fn checked_multiply_ratio_ceil<A, B>(self, numerator: A, denominator: B) -> MathResult<Self>
    where
        A: Into<Self>,
        B: Into<Self>,
    {
        mul_div(self, numerator.into(), denominator.into(), Rounding::Ceil)
    }
}

// ----------------------------------- tests -----------------------------------
