use {
    crate::{Udec128, Uint128},
    bnum::types::U256,
};

/// Describes a number's associated constants: minimum and maximum; zero and
/// one.
pub trait NumberConst {
    const MIN: Self;
    const MAX: Self;
    const ONE: Self;
    const ZERO: Self;
}

macro_rules! impl_number_const {
    ($t:ty, $min:expr, $max:expr, $zero:expr, $one:expr) => {
        impl NumberConst for $t {
            const MAX: Self = $max;
            const MIN: Self = $min;
            const ONE: Self = $one;
            const ZERO: Self = $zero;
        }

        /// A compile-time check to ensure that the constants are of the correct types.
        const _: () = {
            const fn _check_type(_: $t) {}
            _check_type($min);
            _check_type($max);
            _check_type($zero);
            _check_type($one);
        };
    };
}

impl_number_const!(u64, 0, u64::MAX, 0, 1);
impl_number_const!(u128, 0, u128::MAX, 0, 1);
impl_number_const!(U256, U256::MIN, U256::MAX, U256::ZERO, U256::ONE);

impl NumberConst for Uint128 {
    const MAX: Self = Self::new(u128::MAX);
    const MIN: Self = Self::new(u128::MIN);
    const ONE: Self = Self::new(1);
    const ZERO: Self = Self::new(0);
}

impl NumberConst for Udec128 {
    const MAX: Self = Self::raw(Uint128::MAX);
    const MIN: Self = Self::raw(Uint128::MIN);
    // Note: `ONE` is the decimal 1.0, not the smallest representable tick.
    const ONE: Self = Self::raw(Uint128::new(Udec128::PRECISION));
    const ZERO: Self = Self::raw(Uint128::ZERO);
}
