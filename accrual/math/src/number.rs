use crate::{MathError, MathResult, MultiplyRatio, NumberConst, Rounding, Udec128, Uint128};

/// Describes basic operations that all math types must implement.
pub trait Number: Sized + Copy {
    fn checked_add(self, other: Self) -> MathResult<Self>;

    fn checked_sub(self, other: Self) -> MathResult<Self>;

    fn checked_mul(self, other: Self) -> MathResult<Self>;

    fn checked_div(self, other: Self) -> MathResult<Self>;

    fn checked_pow(self, exp: u64) -> MathResult<Self>;

    #[inline]
    fn checked_add_assign(&mut self, other: Self) -> MathResult<()> {
        *self = self.checked_add(other)?;
        Ok(())
    }

    #[inline]
    fn checked_sub_assign(&mut self, other: Self) -> MathResult<()> {
        *self = self.checked_sub(other)?;
        Ok(())
    }
}

// ------------------------------------ int ------------------------------------

impl Number for Uint128 {
    fn checked_add(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_add(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_add(self, other))
    }

    fn checked_sub(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_sub(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_sub(self, other))
    }

    fn checked_mul(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_mul(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_mul(self, other))
    }

    fn checked_div(self, other: Self) -> MathResult<Self> {
        self.into_inner()
            .checked_div(other.into_inner())
            .map(Self::new)
            .ok_or_else(|| MathError::division_by_zero(self))
    }

    fn checked_pow(self, exp: u64) -> MathResult<Self> {
        let exp32 = u32::try_from(exp).map_err(|_| MathError::overflow_pow(self, exp))?;
        self.into_inner()
            .checked_pow(exp32)
            .map(Self::new)
            .ok_or_else(|| MathError::overflow_pow(self, exp))
    }
}

// ------------------------------------ dec ------------------------------------

impl Number for Udec128 {
    fn checked_add(self, other: Self) -> MathResult<Self> {
        self.numerator()
            .checked_add(other.numerator())
            .map(Self::raw)
            .map_err(|_| MathError::overflow_add(self, other))
    }

    fn checked_sub(self, other: Self) -> MathResult<Self> {
        self.numerator()
            .checked_sub(other.numerator())
            .map(Self::raw)
            .map_err(|_| MathError::overflow_sub(self, other))
    }

    /// Multiply two decimals, rounding the result _down_ to the nearest tick.
    fn checked_mul(self, other: Self) -> MathResult<Self> {
        self.checked_mul_rounded(other, Rounding::Floor)
    }

    /// Divide two decimals, rounding the result _down_ to the nearest tick.
    fn checked_div(self, other: Self) -> MathResult<Self> {
        self.numerator()
            .checked_multiply_ratio_floor(Self::ONE.numerator(), other.numerator())
            .map(Self::raw)
    }

    /// Raise to an integer power by repeated squaring. Each multiplication
    /// rounds down, so the result never exceeds the exact power.
    fn checked_pow(self, mut exp: u64) -> MathResult<Self> {
        let mut base = self;
        let mut result = Self::ONE;

        while exp > 0 {
            if exp & 1 == 1 {
                result = result
                    .checked_mul(base)
                    .map_err(|_| MathError::overflow_pow(self, exp))?;
            }

            exp >>= 1;

            if exp > 0 {
                base = base
                    .checked_mul(base)
                    .map_err(|_| MathError::overflow_pow(self, exp))?;
            }
        }

        Ok(result)
    }
}

// ----------------------------------- tests -----------------------------------
