//! Passive descriptions of a module's public surface.
//!
//! Descriptors are pure projections of what a module registered. They carry
//! no behaviour and serialise with PascalCase keys so controllers can read the
//! `info` response directly.

use serde::{Deserialize, Serialize};

use crate::types::TypeName;

/// One positional parameter of a method, constructor, or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterDescriptor {
    name: String,
    #[serde(rename = "Type")]
    type_name: TypeName,
}

impl ParameterDescriptor {
    /// Creates a parameter descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: TypeName) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter type.
    #[must_use]
    pub const fn type_name(&self) -> TypeName {
        self.type_name
    }
}

/// Builds parameter descriptors from `(name, type)` pairs.
#[must_use]
pub fn parameters(pairs: &[(&str, TypeName)]) -> Vec<ParameterDescriptor> {
    pairs
        .iter()
        .map(|(name, type_name)| ParameterDescriptor::new(*name, *type_name))
        .collect()
}

/// A public method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodDescriptor {
    name: String,
    return_type: TypeName,
    parameters: Vec<ParameterDescriptor>,
    is_static: bool,
}

impl MethodDescriptor {
    /// Creates a method descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        return_type: TypeName,
        parameters: Vec<ParameterDescriptor>,
        is_static: bool,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters,
            is_static,
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared return type.
    #[must_use]
    pub const fn return_type(&self) -> TypeName {
        self.return_type
    }

    /// Ordered parameter signatures.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// Number of declared parameters.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the method runs without an instance.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }
}

/// A public event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EventDescriptor {
    name: String,
    event_handler_type: String,
    parameters: Vec<ParameterDescriptor>,
}

impl EventDescriptor {
    /// Creates an event descriptor; the handler signature is derived from
    /// the parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, parameters: Vec<ParameterDescriptor>) -> Self {
        let event_handler_type = handler_signature(&parameters);
        Self {
            name: name.into(),
            event_handler_type,
            parameters,
        }
    }

    /// Event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler signature, e.g. `Fn(i64 result)`.
    #[must_use]
    pub fn event_handler_type(&self) -> &str {
        &self.event_handler_type
    }

    /// Ordered handler parameters.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }
}

fn handler_signature(parameters: &[ParameterDescriptor]) -> String {
    let rendered: Vec<String> = parameters
        .iter()
        .map(|parameter| format!("{} {}", parameter.type_name(), parameter.name()))
        .collect();
    format!("Fn({})", rendered.join(", "))
}

/// A public field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDescriptor {
    name: String,
    field_type: TypeName,
    is_static: bool,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: TypeName, is_static: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_static,
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field type.
    #[must_use]
    pub const fn field_type(&self) -> TypeName {
        self.field_type
    }

    /// Whether the field belongs to the type rather than an instance.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.is_static
    }
}

/// A type exported by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeDescriptor {
    name: String,
    methods: Vec<MethodDescriptor>,
    fields: Vec<FieldDescriptor>,
    events: Vec<EventDescriptor>,
}

impl TypeDescriptor {
    /// Creates a type descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        methods: Vec<MethodDescriptor>,
        fields: Vec<FieldDescriptor>,
        events: Vec<EventDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            fields,
            events,
        }
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Events in declaration order.
    #[must_use]
    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }
}

/// A whole module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleDescriptor {
    full_name: String,
    types: Vec<TypeDescriptor>,
}

impl ModuleDescriptor {
    /// Creates a module descriptor.
    #[must_use]
    pub fn new(full_name: impl Into<String>, types: Vec<TypeDescriptor>) -> Self {
        Self {
            full_name: full_name.into(),
            types,
        }
    }

    /// Module identity, e.g. `plugfy-sample, Version=0.1.0`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Types in registration order.
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }
}

#[cfg(test)]
mod tests;
