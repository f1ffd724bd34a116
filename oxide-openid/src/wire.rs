//! Registered protocol names of closed enumerations.
//!
//! Each enum provides `as_str` and `from_name` as exhaustive matches. The [`wire_names!`] macro
//! derives `Display`, `FromStr` and the serde impls from that pair.
use std::error;
use std::fmt;

/// A name that is not registered for the expected enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown name `{}`", self.0)
    }
}

impl error::Error for UnknownName {}

macro_rules! wire_names {
    ($($ty:ty),* $(,)?) => {$(
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::wire::UnknownName;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                <$ty>::from_name(name).ok_or_else(|| $crate::wire::UnknownName(name.to_string()))
            }
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                <$ty>::from_name(&name).ok_or_else(|| {
                    <D::Error as ::serde::de::Error>::custom($crate::wire::UnknownName(name))
                })
            }
        }
    )*};
}
