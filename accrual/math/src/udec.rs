use {
    crate::{MathError, MathResult, Rounding, Uint128, mul_div},
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{de, ser},
    std::{
        fmt::{self, Display, Write},
        str::FromStr,
    },
};

/// An unsigned fixed-point decimal number with 18 decimal places.
///
/// Used for borrow indices and interest rates. The inner value is the decimal
/// multiplied by [`Udec128::PRECISION`], so `1.15` is stored as
/// `1_150_000_000_000_000_000`.
#[derive(
    BorshSerialize, BorshDeserialize, Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Udec128(Uint128);

impl Udec128 {
    /// Number of decimal digits to be interpreted as decimal places.
    pub const DECIMAL_PLACES: u32 = 18;
    /// Ratio between the inner integer value and the decimal value it
    /// represents.
    pub const PRECISION: u128 = 10u128.pow(Self::DECIMAL_PLACES);

    /// Create a new [`Udec128`] _adding_ decimal places, i.e. `new(1)` is 1.0.
    pub const fn new(value: u128) -> Self {
        Self(Uint128::new(value * Self::PRECISION))
    }

    /// Create a new [`Udec128`] _without_ adding decimal places.
    pub const fn raw(value: Uint128) -> Self {
        Self(value)
    }

    pub const fn new_percent(value: u128) -> Self {
        Self(Uint128::new(value * 10u128.pow(Self::DECIMAL_PLACES - 2)))
    }

    pub const fn new_bps(value: u128) -> Self {
        Self(Uint128::new(value * 10u128.pow(Self::DECIMAL_PLACES - 4)))
    }

    pub const fn numerator(self) -> Uint128 {
        self.0
    }

    /// Multiply two decimals with an explicit rounding direction.
    pub fn checked_mul_rounded(self, other: Self, rounding: Rounding) -> MathResult<Self> {
        mul_div(self.0, other.0, Uint128::new(Self::PRECISION), rounding)
            .map(Self)
            .map_err(|err| {
                if err.is_overflow() {
                    MathError::overflow_mul(self, other)
                } else {
                    err
                }
            })
    }
}

impl Display for Udec128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let inner = self.0.into_inner();
        let whole = inner / Self::PRECISION;
        let fractional = inner % Self::PRECISION;

        if fractional == 0 {
            write!(f, "{whole}")
        } else {
            let fractional = format!("{fractional:0>18}");
            f.write_str(&whole.to_string())?;
            f.write_char('.')?;
            f.write_str(fractional.trim_end_matches('0'))
        }
    }
}

impl FromStr for Udec128 {
    type Err = MathError;

    /// Parse a decimal string such as `"1.15"`. At most 18 decimal places are
    /// accepted; anything more precise is rejected rather than rounded.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split('.');

        let whole_part = parts.next().unwrap_or_default();
        let whole = whole_part
            .parse::<u128>()
            .map_err(|err| MathError::parse_number::<Self, _, _>(input, err))?;

        let mut inner = whole
            .checked_mul(Self::PRECISION)
            .ok_or_else(|| MathError::parse_number::<Self, _, _>(input, "value too big"))?;

        if let Some(fractional_part) = parts.next() {
            let exp = Self::DECIMAL_PLACES
                .checked_sub(fractional_part.len() as u32)
                .ok_or_else(|| {
                    MathError::parse_number::<Self, _, _>(
                        input,
                        format!("cannot parse more than {} decimal places", Self::DECIMAL_PLACES),
                    )
                })?;

            if fractional_part.is_empty() || !fractional_part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(MathError::parse_number::<Self, _, _>(
                    input,
                    "invalid fractional part",
                ));
            }

            let fractional = fractional_part
                .parse::<u128>()
                .map_err(|err| MathError::parse_number::<Self, _, _>(input, err))?;

            // `fractional < 10^len` and `len <= 18`, so this can't overflow.
            inner = inner
                .checked_add(fractional * 10u128.pow(exp))
                .ok_or_else(|| MathError::parse_number::<Self, _, _>(input, "value too big"))?;
        }

        if parts.next().is_some() {
            return Err(MathError::parse_number::<Self, _, _>(
                input,
                "unexpected number of dots",
            ));
        }

        Ok(Self(Uint128::new(inner)))
    }
}

impl ser::Serialize for Udec128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Udec128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_str(UdecVisitor)
    }
}

struct UdecVisitor;

impl de::Visitor<'_> for UdecVisitor {
    type Value = Udec128;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string-encoded decimal")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Udec128::from_str(v).map_err(E::custom)
    }
}

// ----------------------------------- tests -----------------------------------
