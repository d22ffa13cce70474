mod data_type;
pub use self::data_type::*;

mod element;
pub use self::element::*;

mod semantics;
pub use self::semantics::{
    ContainerKind, PropertyKey, StandardProperty, FIRST_SPECIFIC_TYPE_ID, GENERIC_COLOR_TYPE_ID,
    GENERIC_IDENTIFIER_TYPE_ID, GENERIC_SELECTION_TYPE_ID, GENERIC_TRANSPARENCY_TYPE_ID,
    GENERIC_TYPE_TYPE_ID, USER_PROPERTY_TYPE_ID,
};

mod kinds;
pub use self::kinds::*;
