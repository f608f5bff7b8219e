mod error;
mod is_zero;
mod mul_div;
mod number;
mod number_const;
mod udec;
mod uint;

pub use {
    error::*, is_zero::*, mul_div::*, number::*, number_const::*, udec::*, uint::*,
};
