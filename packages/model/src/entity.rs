//! # Entity Graph
//!
//! An [`Entity`] is an instance of a schema type: an opaque id, a type name,
//! and an ordered mapping from attribute name to one or more values. A value
//! is either simple text or a nested entity, so entities form a tree.
//!
//! The data layer never enforces occurrence bounds; that is editing policy.
//! It does maintain one structural invariant: an attribute present on an
//! entity always holds at least one value. Removing the last value removes
//! the attribute.

use crate::{AttributePath, ModelError, PathSegment};
use serde::{Deserialize, Serialize};

/// A single attribute value: simple text or a nested entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Text(String),
    Entity(Entity),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(t) => Some(t),
            Value::Entity(_) => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Value::Entity(e) => Some(e),
            Value::Text(_) => None,
        }
    }

    /// A text value holding the empty string.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(t) if t.is_empty())
    }
}

/// One attribute instance: a name and its ordered values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<Value>,
}

/// An instance of a schema type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub type_name: String,
    attributes: Vec<Attribute>,
}

impl Entity {
    pub fn new(id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style initial value, appended to the named attribute.
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        match self.attribute_mut(&name) {
            Some(attr) => attr.values.push(value),
            None => self.attributes.push(Attribute {
                name,
                values: vec![value],
            }),
        }
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.values.as_slice())
    }

    /// Number of values held by `name`; 0 when the attribute is absent.
    pub fn value_count(&self, name: &str) -> usize {
        self.values(name).map_or(0, |v| v.len())
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Overwrite the text value at `index`. Creates the attribute when it is
    /// absent and `index` is 0 (editing an empty placeholder slot).
    pub fn set_text(
        &mut self,
        name: &str,
        index: usize,
        text: impl Into<String>,
    ) -> Result<(), ModelError> {
        let text = text.into();
        match self.attribute_mut(name) {
            Some(attr) => {
                let slot = attr.values.get_mut(index).ok_or_else(|| {
                    ModelError::IndexOutOfRange {
                        attribute: name.to_string(),
                        index,
                    }
                })?;
                match slot {
                    Value::Text(t) => {
                        *t = text;
                        Ok(())
                    }
                    Value::Entity(_) => Err(ModelError::NotText(name.to_string())),
                }
            }
            None if index == 0 => {
                self.attributes.push(Attribute {
                    name: name.to_string(),
                    values: vec![Value::Text(text)],
                });
                Ok(())
            }
            None => Err(ModelError::UnknownAttribute(name.to_string())),
        }
    }

    /// Insert a value at `index`. Creates the attribute when absent and
    /// `index` is 0. Errors when `index` is past the end.
    pub fn insert_value(&mut self, name: &str, index: usize, value: Value) -> Result<(), ModelError> {
        match self.attribute_mut(name) {
            Some(attr) => {
                if index > attr.values.len() {
                    return Err(ModelError::IndexOutOfRange {
                        attribute: name.to_string(),
                        index,
                    });
                }
                attr.values.insert(index, value);
                Ok(())
            }
            None if index == 0 => {
                self.attributes.push(Attribute {
                    name: name.to_string(),
                    values: vec![value],
                });
                Ok(())
            }
            None => Err(ModelError::UnknownAttribute(name.to_string())),
        }
    }

    /// Remove and return the value at `index`. The attribute itself is
    /// dropped when its last value goes away.
    pub fn remove_value(&mut self, name: &str, index: usize) -> Result<Value, ModelError> {
        let attr = self
            .attribute_mut(name)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        if index >= attr.values.len() {
            return Err(ModelError::IndexOutOfRange {
                attribute: name.to_string(),
                index,
            });
        }
        let value = attr.values.remove(index);
        if attr.values.is_empty() {
            self.attributes.retain(|a| a.name != name);
        }
        Ok(value)
    }

    /// Relocate the value at `from` to `to` (remove, then reinsert).
    pub fn move_value(&mut self, name: &str, from: usize, to: usize) -> Result<(), ModelError> {
        let attr = self
            .attribute_mut(name)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        if from >= attr.values.len() || to >= attr.values.len() {
            return Err(ModelError::IndexOutOfRange {
                attribute: name.to_string(),
                index: from.max(to),
            });
        }
        let value = attr.values.remove(from);
        attr.values.insert(to, value);
        Ok(())
    }

    /// Remove the attribute entirely, values and all.
    pub fn remove_attribute(&mut self, name: &str) -> Result<Attribute, ModelError> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.name == name)
            .ok_or_else(|| ModelError::UnknownAttribute(name.to_string()))?;
        Ok(self.attributes.remove(pos))
    }

    /// Resolve a full path to the value it addresses.
    pub fn value_at(&self, path: &AttributePath) -> Option<&Value> {
        let (last, prefix) = path.segments().split_last()?;
        let parent = self.entity_at(prefix)?;
        parent.values(&last.name)?.get(last.index)
    }

    /// Descend through nested-entity segments to the entity holding the
    /// attribute a path's final segment names.
    pub fn entity_at(&self, segments: &[PathSegment]) -> Option<&Entity> {
        let mut current = self;
        for seg in segments {
            current = current.values(&seg.name)?.get(seg.index)?.as_entity()?;
        }
        Some(current)
    }

    /// Mutable variant of [`Entity::entity_at`], erroring on any segment that
    /// does not resolve to a nested entity.
    pub fn entity_at_mut(&mut self, segments: &[PathSegment]) -> Result<&mut Entity, ModelError> {
        let mut current = self;
        for seg in segments {
            let attr = current
                .attribute_mut(&seg.name)
                .ok_or_else(|| ModelError::UnknownAttribute(seg.name.clone()))?;
            let value = attr.values.get_mut(seg.index).ok_or_else(|| {
                ModelError::IndexOutOfRange {
                    attribute: seg.name.clone(),
                    index: seg.index,
                }
            })?;
            current = match value {
                Value::Entity(e) => e,
                Value::Text(_) => return Err(ModelError::NotAnEntity(seg.name.clone())),
            };
        }
        Ok(current)
    }

    /// Serialize the whole entity for snapshotting. The ordered internal
    /// representation makes the output deterministic, so equal snapshots
    /// imply equal entities.
    pub fn to_snapshot(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(snapshot)?)
    }
}
