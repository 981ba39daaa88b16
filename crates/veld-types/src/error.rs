//! Type system errors

use thiserror::Error;

/// Errors raised while resolving type annotations and instantiating
/// generics. The checker converts these into diagnostics at the annotation's
/// source position.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// Reference to a type name with no declaration in scope
    #[error("Cannot find type '{name}'")]
    UndefinedType {
        /// Type name that was not found
        name: String,
    },

    /// A value name used in type position
    #[error("'{name}' refers to a value, but is being used as a type")]
    NotAType {
        /// The offending name
        name: String,
    },

    /// Wrong number of type arguments for a generic declaration
    #[error("Expected {expected} type argument{}, got {actual}", if *expected == 1 { "" } else { "s" })]
    TypeArgCountMismatch {
        /// Declared type parameter count
        expected: usize,
        /// Supplied type argument count
        actual: usize,
    },

    /// Type arguments applied to a non-generic type
    #[error("Type '{name}' is not generic")]
    NotGeneric {
        /// The non-generic type's name
        name: String,
    },

    /// Generic declaration used without type arguments
    #[error("Generic type '{name}' requires type arguments")]
    MissingTypeArgs {
        /// The generic type's name
        name: String,
    },

    /// A cycle of aliases with no type constructor to anchor it
    #[error("Type alias '{name}' is circular")]
    CircularAlias {
        /// Name of an alias on the cycle
        name: String,
    },

    /// Annotation nesting deeper than the resolver supports
    #[error("Type annotation is too deeply nested")]
    TooDeep,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = TypeError::UndefinedType { name: "Foo".to_string() };
        assert_eq!(e.to_string(), "Cannot find type 'Foo'");

        let e = TypeError::TypeArgCountMismatch { expected: 1, actual: 3 };
        assert_eq!(e.to_string(), "Expected 1 type argument, got 3");

        let e = TypeError::TypeArgCountMismatch { expected: 2, actual: 1 };
        assert_eq!(e.to_string(), "Expected 2 type arguments, got 1");
    }
}
