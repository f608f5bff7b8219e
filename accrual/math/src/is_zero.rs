use {
    crate::{NumberConst, Udec128, Uint128},
    bnum::types::U256,
};

/// Describes a number that can be compared to zero.
pub trait IsZero {
    /// Return true if the number is zero; false otherwise.
    fn is_zero(&self) -> bool;

    /// Return true if the number is not zero; false otherwise.
    #[inline]
    fn is_non_zero(&self) -> bool {
        !self.is_zero()
    }
}

impl IsZero for Uint128 {
    fn is_zero(&self) -> bool {
        self.into_inner() == 0
    }
}

impl IsZero for Udec128 {
    fn is_zero(&self) -> bool {
        self.numerator().is_zero()
    }
}

macro_rules! impl_is_zero {
    ($t:ty) => {
        impl IsZero for $t {
            fn is_zero(&self) -> bool {
                *self == Self::ZERO
            }
        }
    };
    ($($t:ty),+ $(,)?) => {
        $(
            impl_is_zero!($t);
        )+
    };
}

impl_is_zero! { u64, u128, U256 }

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use crate::{IsZero, NumberConst, Udec128, Uint128};

    #[test]
    fn is_zero_works() {
        assert!(Uint128::ZERO.is_zero());
        assert!(Uint128::ONE.is_non_zero());
        assert!(Udec128::ZERO.is_zero());
        // The smallest tick is non-zero even though it rounds to 0.
        assert!(Udec128::raw(Uint128::ONE).is_non_zero());
    }
}
