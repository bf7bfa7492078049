// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Best-effort value conversion between the two ends of a binding.
//!
//! [`CoerceFrom`] is implemented for:
//!
//! - every type from itself,
//! - lossless numeric widening (`i32` to `i64`, `u8` to `f64`, ...),
//! - checked numeric narrowing (`i64` to `i32`, `f64` to `u16`, ...),
//! - numbers, `bool` and `char` to `String`,
//! - `String` to numbers and `bool`, by parsing.
//!
//! Anything that does not convert is a [`BindingError::Conversion`].

use alloc::string::{String, ToString};

use crate::error::BindingError;

/// Conversion used when a bound value crosses to the other side.
///
/// ```rust
/// use understory_binding::{BindingError, CoerceFrom};
///
/// assert_eq!(String::coerce_from(42_i32), Ok("42".to_string()));
/// assert_eq!(f64::coerce_from(3_u8), Ok(3.0));
/// assert_eq!(i32::coerce_from(" 12 ".to_string()), Ok(12));
/// assert!(matches!(
///     u8::coerce_from(300_i32),
///     Err(BindingError::Conversion { .. })
/// ));
/// ```
pub trait CoerceFrom<V>: Sized {
    /// Converts `value`.
    ///
    /// # Errors
    ///
    /// [`BindingError::Conversion`] if the value has no representation in
    /// `Self`.
    fn coerce_from(value: V) -> Result<Self, BindingError>;
}

impl<T> CoerceFrom<T> for T {
    #[inline]
    fn coerce_from(value: T) -> Result<Self, BindingError> {
        Ok(value)
    }
}

macro_rules! widen {
    ($from:ty => $($to:ty),+) => {$(
        impl CoerceFrom<$from> for $to {
            #[inline]
            fn coerce_from(value: $from) -> Result<Self, BindingError> {
                Ok(<$to>::from(value))
            }
        }
    )+};
}

widen!(i8 => i16, i32, i64, f32, f64);
widen!(i16 => i32, i64, f32, f64);
widen!(i32 => i64, f64);
widen!(u8 => u16, u32, u64, i16, i32, i64, f32, f64);
widen!(u16 => u32, u64, i32, i64, f32, f64);
widen!(u32 => u64, i64, f64);
widen!(f32 => f64);

macro_rules! narrow {
    ($from:ty => $($to:ty),+) => {$(
        impl CoerceFrom<$from> for $to {
            #[inline]
            fn coerce_from(value: $from) -> Result<Self, BindingError> {
                <$to>::try_from(value).map_err(|_| BindingError::conversion::<$from, $to>())
            }
        }
    )+};
}

narrow!(i16 => i8, u8, u16, u32, u64, usize);
narrow!(i32 => i8, i16, u8, u16, u32, u64, usize);
narrow!(i64 => i8, i16, i32, u8, u16, u32, u64, usize);
narrow!(u16 => i8, i16, u8);
narrow!(u32 => i8, i16, i32, u8, u16, usize);
narrow!(u64 => i8, i16, i32, i64, u8, u16, u32, usize);
narrow!(usize => i32, i64, u32, u64);

macro_rules! float_to_int {
    ($from:ty => $($to:ty),+) => {$(
        impl CoerceFrom<$from> for $to {
            fn coerce_from(value: $from) -> Result<Self, BindingError> {
                // Round half away from zero; the cast truncates.
                let value = f64::from(value);
                let shifted = if value < 0.0 { value - 0.5 } else { value + 0.5 };
                if shifted > f64::from(<$to>::MIN) - 1.0 && shifted < f64::from(<$to>::MAX) + 1.0 {
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "range checked above"
                    )]
                    let value = shifted as $to;
                    Ok(value)
                } else {
                    Err(BindingError::conversion::<$from, $to>())
                }
            }
        }
    )+};
}

float_to_int!(f64 => i8, i16, i32, u8, u16, u32);
float_to_int!(f32 => i8, i16, i32, u8, u16, u32);

macro_rules! display {
    ($($from:ty),+) => {$(
        impl CoerceFrom<$from> for String {
            #[inline]
            fn coerce_from(value: $from) -> Result<Self, BindingError> {
                Ok(value.to_string())
            }
        }
    )+};
}

display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, bool, char);

macro_rules! parse {
    ($($to:ty),+) => {$(
        impl CoerceFrom<String> for $to {
            fn coerce_from(value: String) -> Result<Self, BindingError> {
                value
                    .trim()
                    .parse::<$to>()
                    .map_err(|_| BindingError::conversion::<String, $to>())
            }
        }
    )+};
}

parse!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, bool);

impl CoerceFrom<&'static str> for String {
    #[inline]
    fn coerce_from(value: &'static str) -> Result<Self, BindingError> {
        Ok(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_through() {
        assert_eq!(u8::coerce_from(7_u8), Ok(7));
        assert_eq!(
            String::coerce_from(String::from("x")),
            Ok(String::from("x"))
        );
    }

    #[test]
    fn narrowing_checks_range() {
        assert_eq!(i8::coerce_from(-128_i64), Ok(-128));
        assert_eq!(
            u32::coerce_from(-1_i32),
            Err(BindingError::Conversion {
                from: "i32",
                to: "u32"
            })
        );
    }

    #[test]
    fn floats_round_into_integers() {
        assert_eq!(i32::coerce_from(2.5_f64), Ok(3));
        assert_eq!(u8::coerce_from(254.6_f32), Ok(255));
        assert!(u8::coerce_from(-0.6_f64).is_err());
        assert!(i32::coerce_from(f64::NAN).is_err());
        assert!(i16::coerce_from(f64::INFINITY).is_err());
    }

    #[test]
    fn strings_parse_after_trimming() {
        assert_eq!(bool::coerce_from(String::from("true ")), Ok(true));
        assert_eq!(f64::coerce_from(String::from("1.25")), Ok(1.25));
        assert!(i32::coerce_from(String::from("twelve")).is_err());
    }

    #[test]
    fn display_formats() {
        assert_eq!(String::coerce_from(1.5_f64), Ok(String::from("1.5")));
        assert_eq!(String::coerce_from(false), Ok(String::from("false")));
        assert_eq!(String::coerce_from('z'), Ok(String::from("z")));
        assert_eq!(String::coerce_from("lit"), Ok(String::from("lit")));
    }
}
