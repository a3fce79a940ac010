use crate::ast::TypeName;

/// Scalar types a declaration may name directly.
pub static ELEMENTARY: phf::Set<&'static str> = phf::phf_set! {
    "uint256",
    "uint128",
    "uint64",
    "uint32",
    "uint8",
    "int256",
    "address",
    "bool",
    "string",
    "bytes",
    "bytes32",
};

pub mod well_known {
    /// Name of the state variable which grants the owner capability.
    pub const OWNER: &str = "owner";
    pub const ADDRESS: &str = "address";
    /// Contextual keyword introducing a mapping type.
    pub const MAPPING: &str = "mapping";
}

pub fn is_elementary(name: &str) -> bool {
    ELEMENTARY.contains(name)
}

impl TypeName {
    /// Whether this type is accepted in a declaration: a known scalar, an
    /// array of a known scalar, or any mapping.
    ///
    /// Mappings are only checked for shape, which the parser already
    /// guarantees, so their key and value types are never inspected.
    pub fn is_supported(&self) -> bool {
        match self {
            TypeName::Elementary(name) => is_elementary(name),
            TypeName::Array(element) => {
                matches!(&**element, TypeName::Elementary(name) if is_elementary(name))
            }
            TypeName::Mapping { .. } => true,
        }
    }

    pub fn is_elementary(&self, name: &str) -> bool {
        matches!(self, TypeName::Elementary(n) if &**n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elementary(name: &str) -> TypeName {
        TypeName::Elementary(name.into())
    }

    #[test]
    fn is_supported() {
        assert!(elementary("uint256").is_supported());
        assert!(elementary("address").is_supported());
        assert!(!elementary("uint7").is_supported());
        assert!(!elementary("Point").is_supported());

        assert!(TypeName::Array(Box::new(elementary("bool"))).is_supported());
        assert!(!TypeName::Array(Box::new(elementary("Point"))).is_supported());
        let nested = TypeName::Array(Box::new(TypeName::Array(Box::new(elementary("bool")))));
        assert!(!nested.is_supported());

        // Mappings are only validated for shape.
        let mapping = TypeName::Mapping {
            key: "whatever".into(),
            value: Box::new(elementary("Unknown")),
        };
        assert!(mapping.is_supported());
    }

    #[test]
    fn display() {
        let mapping = TypeName::Mapping {
            key: "address".into(),
            value: Box::new(TypeName::Mapping {
                key: "uint256".into(),
                value: Box::new(TypeName::Array(Box::new(elementary("bool")))),
            }),
        };
        assert_eq!(
            mapping.to_string(),
            "mapping(address -> mapping(uint256 -> bool[]))"
        );
    }
}
