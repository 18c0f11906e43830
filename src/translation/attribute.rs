/*!
 * Translated attribute identifiers.
 *
 * Each translatable entity type names its translated columns with an enum that
 * implements `TranslatedAttribute`. The `translated_attributes!` macro writes
 * the enum and the impl in one step.
 */

use std::fmt::Debug;
use std::hash::Hash;

/// Compile-time identifier of a translated column
pub trait TranslatedAttribute: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Column name in the translation table
    fn name(self) -> &'static str;

    /// Every attribute of the enum, in declaration order
    fn all() -> &'static [Self];

    /// Stored as JSON text and read through the serialized accessors
    fn is_serialized(self) -> bool {
        false
    }

    /// Look an attribute up by its column name
    fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|a| a.name() == name)
    }
}

/// Declare a translated attribute enum.
///
/// ```
/// translatable::translated_attributes! {
///     pub enum PostField {
///         Title => "title",
///         Body => "body",
///         Tags => "tags" as serialized,
///     }
/// }
/// ```
#[macro_export]
macro_rules! translated_attributes {
    (@kind) => { false };
    (@kind serialized) => { true };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident => $column:literal $(as $kind:ident)? ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $variant ),+
        }

        impl $crate::translation::TranslatedAttribute for $name {
            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $column ),+
                }
            }

            fn all() -> &'static [Self] {
                &[ $( Self::$variant ),+ ]
            }

            fn is_serialized(self) -> bool {
                match self {
                    $( Self::$variant => $crate::translated_attributes!(@kind $($kind)?) ),+
                }
            }
        }
    };
}
