//! # Type Schema
//!
//! Types declare, per attribute name, the value type reference, the
//! minimum/maximum occurrence bound, and whether the attribute is a choice
//! pseudo-attribute (a grouping whose children are mutually alternative
//! attributes).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Declaration of one attribute within a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Value type reference: the name of another type for nested-entity
    /// values, or a plain value-type name (e.g. `"string"`) for text.
    pub value_type: String,

    /// Minimum number of values once the attribute is present.
    pub min: usize,

    /// Maximum number of values; `None` means unbounded.
    pub max: Option<usize>,

    /// Whether this is a choice pseudo-attribute.
    #[serde(default)]
    pub choice: bool,
}

impl AttributeDecl {
    pub fn simple(min: usize, max: Option<usize>) -> Self {
        Self {
            value_type: "string".to_string(),
            min,
            max,
            choice: false,
        }
    }

    pub fn complex(value_type: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        Self {
            value_type: value_type.into(),
            min,
            max,
            choice: false,
        }
    }

    pub fn choice(value_type: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        Self {
            value_type: value_type.into(),
            min,
            max,
            choice: true,
        }
    }

    /// Declared as holding at most one value.
    pub fn is_single_valued(&self) -> bool {
        self.max == Some(1)
    }
}

/// A content type: ordered attribute declarations keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub id: String,
    pub attributes: Vec<(String, AttributeDecl)>,
}

impl TypeDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, decl: AttributeDecl) -> Self {
        self.attributes.push((name.into(), decl));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDecl> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }
}

/// The type map loaded with a content definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    types: HashMap<String, TypeDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: TypeDef) {
        self.types.insert(def.id.clone(), def);
    }

    pub fn with_type(mut self, def: TypeDef) -> Self {
        self.insert(def);
        self
    }

    pub fn type_def(&self, id: &str) -> Option<&TypeDef> {
        self.types.get(id)
    }

    /// Declaration of `attribute` on type `type_name`.
    pub fn attribute(&self, type_name: &str, attribute: &str) -> Option<&AttributeDecl> {
        self.type_def(type_name)?.attribute(attribute)
    }

    /// A value type with no registered type definition holds simple text;
    /// a registered type means nested entities.
    pub fn is_simple(&self, value_type: &str) -> bool {
        !self.types.contains_key(value_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_preserves_declaration() {
        let schema = Schema::new().with_type(
            TypeDef::new("article")
                .with_attribute("title", AttributeDecl::simple(1, Some(1)))
                .with_attribute("items", AttributeDecl::complex("item", 0, None)),
        );

        let title = schema.attribute("article", "title").unwrap();
        assert_eq!(title.min, 1);
        assert!(title.is_single_valued());

        let items = schema.attribute("article", "items").unwrap();
        assert_eq!(items.max, None);
        assert!(!items.is_single_valued());
    }

    #[test]
    fn test_simple_vs_complex_classification() {
        let schema = Schema::new().with_type(TypeDef::new("item"));
        assert!(schema.is_simple("string"));
        assert!(!schema.is_simple("item"));
    }

    #[test]
    fn test_unknown_attribute_is_none() {
        let schema = Schema::new().with_type(TypeDef::new("article"));
        assert!(schema.attribute("article", "missing").is_none());
        assert!(schema.attribute("missing", "title").is_none());
    }
}
