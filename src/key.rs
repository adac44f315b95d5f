//! Key coercion.
//!
//! Keys are always strings. Integers are accepted anywhere a key is and are
//! rendered in decimal first, so `put(7, v)` and `put("7", v)` address the
//! same entry.

use std::borrow::Cow;

/// Anything usable as a key.
pub trait ArrayKey {
    /// The string form of this key.
    fn to_key(&self) -> Cow<'_, str>;
}

impl ArrayKey for str {
    #[inline]
    fn to_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ArrayKey for String {
    #[inline]
    fn to_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl ArrayKey for Cow<'_, str> {
    #[inline]
    fn to_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_ref())
    }
}

impl<T: ?Sized + ArrayKey> ArrayKey for &T {
    #[inline]
    fn to_key(&self) -> Cow<'_, str> {
        (**self).to_key()
    }
}

/// A stored value that `array_flip` may promote to a key. Returns `None` when
/// the value has no key form.
pub trait FlipKey {
    fn flip_key(&self) -> Option<Cow<'_, str>>;
}

impl FlipKey for str {
    fn flip_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self))
    }
}

impl FlipKey for String {
    fn flip_key(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(self.as_str()))
    }
}

impl<T: ?Sized + FlipKey> FlipKey for &T {
    fn flip_key(&self) -> Option<Cow<'_, str>> {
        (**self).flip_key()
    }
}

macro_rules! integer_keys {
    ($($t:ty),* $(,)?) => {$(
        impl ArrayKey for $t {
            #[inline]
            fn to_key(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }
        }

        impl FlipKey for $t {
            fn flip_key(&self) -> Option<Cow<'_, str>> {
                Some(Cow::Owned(self.to_string()))
            }
        }
    )*};
}

integer_keys!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! never_keys {
    ($($t:ty),* $(,)?) => {$(
        impl FlipKey for $t {
            fn flip_key(&self) -> Option<Cow<'_, str>> {
                None
            }
        }
    )*};
}

never_keys!(bool, f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_render_in_decimal() {
        assert_eq!(42i32.to_key(), "42");
        assert_eq!((-7i64).to_key(), "-7");
        assert_eq!(0usize.to_key(), "0");
        assert_eq!((&&3u8).to_key(), "3");
    }

    #[test]
    fn strings_are_borrowed() {
        let s = String::from("abc");
        assert!(matches!(s.to_key(), Cow::Borrowed("abc")));
        assert!(matches!("x".to_key(), Cow::Borrowed("x")));
    }

    #[test]
    fn flip_keys() {
        assert_eq!("v".flip_key().as_deref(), Some("v"));
        assert_eq!(12u32.flip_key().as_deref(), Some("12"));
        assert_eq!(1.5f64.flip_key(), None);
        assert_eq!(true.flip_key(), None);
    }
}
