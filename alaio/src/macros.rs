//! Utility macros used across the crate.

/// Implement `From<$source> for $target` using the given `Snafu` context
/// selector. This keeps the `?` operator usable where a plain source error
/// needs to be wrapped into one of our error enums.
#[macro_export]
macro_rules! impl_auto_error_conversion {
    ($source:ty, $target:ty, $selector:ident) => {
        impl ::core::convert::From<$source> for $target {
            fn from(err: $source) -> Self {
                use ::snafu::IntoError;
                $selector.into_error(err)
            }
        }
    };
}
