/// Enumerations stored and exchanged as their upper-case wire names.
macro_rules! string_enum {
    ($(#[$meta:meta])* pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
            ::schemars::JsonSchema,
        )]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err($crate::models::UnknownVariant(s.to_string())),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$name> for ::mongodb::bson::Bson {
            fn from(value: $name) -> Self {
                ::mongodb::bson::Bson::String(value.as_str().to_string())
            }
        }
    };
}

pub mod audit;
pub mod booking;
pub mod category;
pub mod event;
pub mod location;
pub mod package;
pub mod user;
pub mod vendor;

pub use audit::*;
pub use booking::*;
pub use category::*;
pub use event::*;
pub use location::*;
pub use package::*;
pub use user::*;
pub use vendor::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value {0:?}")]
pub struct UnknownVariant(pub String);

/// Hex form of an optional document id; unsaved documents render as an empty string.
pub(crate) fn hex(id: Option<mongodb::bson::oid::ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}
