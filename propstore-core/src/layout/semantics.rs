use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use super::DataType;

/// Semantic type id reserved for user-defined properties, which are identified by their name instead
pub const USER_PROPERTY_TYPE_ID: i32 = 0;
/// Semantic type id of the generic selection property that every container kind provides
pub const GENERIC_SELECTION_TYPE_ID: i32 = 1;
/// Semantic type id of the generic color property
pub const GENERIC_COLOR_TYPE_ID: i32 = 2;
/// Semantic type id of the generic type property
pub const GENERIC_TYPE_TYPE_ID: i32 = 3;
/// Semantic type id of the generic identifier property
pub const GENERIC_IDENTIFIER_TYPE_ID: i32 = 4;
/// Semantic type id of the generic transparency property
pub const GENERIC_TRANSPARENCY_TYPE_ID: i32 = 5;
/// Semantic type ids of properties specific to one container kind start at this value
pub const FIRST_SPECIFIC_TYPE_ID: i32 = 1000;

/// A well-known semantic role of a property within one kind of container. Every container kind defines its own
/// enum of standard properties, which maps to the integer type id that is stored with each `PropertyStorage`.
///
/// Each standard property carries the layout that newly created storages for it receive: a name, a data type and
/// a list of component names (empty for scalar properties)
pub trait StandardProperty: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// The integer type id that storages of this property are tagged with. Never `USER_PROPERTY_TYPE_ID`
    fn type_id(self) -> i32;
    /// Returns the standard property with the given type id, if there is one
    fn from_type_id(type_id: i32) -> Option<Self>;
    /// The name that storages of this property receive
    fn name(self) -> &'static str;
    /// The data type of this property
    fn data_type(self) -> DataType;
    /// The names of the vector components of this property, empty for scalar properties
    fn component_names(self) -> &'static [&'static str];
    /// All standard properties of this kind
    fn all() -> &'static [Self];

    /// The number of vector components of this property
    fn component_count(self) -> usize {
        self.component_names().len().max(1)
    }

    /// Looks up a standard property by its name
    fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|property| property.name() == name)
    }
}

/// A kind of container, e.g. particles or bonds. Each kind has its own set of standard properties
pub trait ContainerKind: Clone + Debug + Default + Send + Sync + 'static {
    /// The standard properties of this container kind
    type Standard: StandardProperty;
    /// Human-readable name of this container kind, used as the default container title
    const DISPLAY_NAME: &'static str;
    /// Human-readable plural noun for the elements of this container kind, e.g. "particles"
    const ELEMENT_DESCRIPTION: &'static str;
}

/// Key that identifies a property within a container: either by its standard semantic role, or by its name for
/// user-defined properties
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey<S: StandardProperty> {
    Standard(S),
    UserDefined(String),
}

impl<S: StandardProperty> PropertyKey<S> {
    /// Determines the key for a storage with the given type id and name. Type ids without a matching standard
    /// property are treated like user-defined properties
    pub fn from_type_id_and_name(type_id: i32, name: &str) -> Self {
        if type_id == USER_PROPERTY_TYPE_ID {
            return PropertyKey::UserDefined(name.to_owned());
        }
        S::from_type_id(type_id)
            .map(PropertyKey::Standard)
            .unwrap_or_else(|| PropertyKey::UserDefined(name.to_owned()))
    }

    /// The integer type id of this key
    pub fn type_id(&self) -> i32 {
        match self {
            PropertyKey::Standard(property) => property.type_id(),
            PropertyKey::UserDefined(_) => USER_PROPERTY_TYPE_ID,
        }
    }

    /// Does this key identify a storage with the given type id and name?
    pub fn matches(&self, type_id: i32, name: &str) -> bool {
        match self {
            PropertyKey::Standard(property) => property.type_id() == type_id,
            PropertyKey::UserDefined(key_name) => {
                type_id == USER_PROPERTY_TYPE_ID && key_name == name
            }
        }
    }
}

impl<S: StandardProperty> From<S> for PropertyKey<S> {
    fn from(property: S) -> Self {
        PropertyKey::Standard(property)
    }
}

impl<S: StandardProperty> Display for PropertyKey<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Standard(property) => write!(f, "{}", property.name()),
            PropertyKey::UserDefined(name) => write!(f, "{}", name),
        }
    }
}

/// Defines an enum of standard properties together with its `StandardProperty` implementation
macro_rules! standard_properties {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $type_id:expr => ($display:literal, $data_type:ident, [$($component:literal),*]),
            )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
        }

        impl $crate::layout::StandardProperty for $name {
            fn type_id(self) -> i32 {
                match self {
                    $($name::$variant => $type_id,)*
                }
            }

            fn from_type_id(type_id: i32) -> Option<Self> {
                Self::all()
                    .iter()
                    .copied()
                    .find(|property| property.type_id() == type_id)
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $display,)*
                }
            }

            fn data_type(self) -> $crate::layout::DataType {
                match self {
                    $($name::$variant => $crate::layout::DataType::$data_type,)*
                }
            }

            fn component_names(self) -> &'static [&'static str] {
                match self {
                    $($name::$variant => &[$($component),*],)*
                }
            }

            fn all() -> &'static [Self] {
                &[$($name::$variant),*]
            }
        }
    };
}

pub(crate) use standard_properties;
