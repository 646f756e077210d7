//! Type representation shared by the parser and the checker

mod type_system;

pub use type_system::{
    IntType, IntWidth, Modifier, Signedness, Type, TypeArena, TypeId, TypeKind, TypedSymbol,
};
