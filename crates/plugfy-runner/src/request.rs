//! Structured method-call requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RunnerError;

/// Request keys in their canonical spelling.
const REQUEST_KEYS: [&str; 5] = [
    "Assembly",
    "Class",
    "Method",
    "ConstructorParameters",
    "Parameters",
];

/// A request to invoke one method on a fresh instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodCallRequest {
    #[serde(rename = "Assembly")]
    module: String,
    class: String,
    method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constructor_parameters: Option<Vec<Value>>,
    #[serde(default)]
    parameters: Vec<Value>,
}

impl MethodCallRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        module: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
            method: method.into(),
            constructor_parameters: None,
            parameters: Vec::new(),
        }
    }

    /// Sets the constructor arguments.
    #[must_use]
    pub fn with_constructor_parameters(mut self, arguments: Vec<Value>) -> Self {
        self.constructor_parameters = Some(arguments);
        self
    }

    /// Sets the method arguments.
    #[must_use]
    pub fn with_parameters(mut self, arguments: Vec<Value>) -> Self {
        self.parameters = arguments;
        self
    }

    /// Re-materialises a request from command parameters.
    ///
    /// Keys are matched case-insensitively; a null argument list is the empty
    /// list.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidCommand`] when a required key is missing
    /// or a value has the wrong shape.
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Self, RunnerError> {
        let mut canonical = Map::new();
        for key in REQUEST_KEYS {
            let value = parameters
                .get(key)
                .or_else(|| {
                    parameters
                        .iter()
                        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                        .map(|(_, value)| value)
                })
                .filter(|value| !value.is_null());
            if let Some(found) = value {
                canonical.insert(key.to_owned(), found.clone());
            }
        }
        serde_json::from_value(Value::Object(canonical))
            .map_err(|error| RunnerError::invalid_command(format!("invalid run request: {error}")))
    }

    /// Module file name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Class name.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Constructor arguments, when supplied.
    #[must_use]
    pub fn constructor_parameters(&self) -> Option<&[Value]> {
        self.constructor_parameters.as_deref()
    }

    /// Method arguments.
    #[must_use]
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Serialised form, as echoed in the `execute` event.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("Assembly".into(), Value::String(self.module.clone()));
        object.insert("Class".into(), Value::String(self.class.clone()));
        object.insert("Method".into(), Value::String(self.method.clone()));
        if let Some(arguments) = &self.constructor_parameters {
            object.insert(
                "ConstructorParameters".into(),
                Value::Array(arguments.clone()),
            );
        }
        object.insert("Parameters".into(), Value::Array(self.parameters.clone()));
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    #[case(json!({"Assembly": "m.so", "Class": "A.B", "Method": "C", "Parameters": [1, 2]}))]
    #[case(json!({"assembly": "m.so", "CLASS": "A.B", "method": "C", "parameters": [1, 2]}))]
    fn keys_match_case_insensitively(#[case] input: Value) {
        let request = MethodCallRequest::from_parameters(&object(input)).expect("request");
        assert_eq!(request.module(), "m.so");
        assert_eq!(request.class(), "A.B");
        assert_eq!(request.method(), "C");
        assert_eq!(request.parameters(), [json!(1), json!(2)]);
        assert_eq!(request.constructor_parameters(), None);
    }

    #[test]
    fn missing_arguments_default_to_empty() {
        let input = json!({"Assembly": "m.so", "Class": "A", "Method": "B", "Parameters": null});
        let request = MethodCallRequest::from_parameters(&object(input)).expect("request");
        assert!(request.parameters().is_empty());
    }

    #[test]
    fn constructor_arguments_are_kept() {
        let input = json!({
            "Assembly": "m.so", "Class": "A", "Method": "B",
            "constructorParameters": ["seed"]
        });
        let request = MethodCallRequest::from_parameters(&object(input)).expect("request");
        assert_eq!(request.constructor_parameters(), Some(&[json!("seed")][..]));
    }

    #[test]
    fn missing_method_is_invalid() {
        let input = json!({"Assembly": "m.so", "Class": "A"});
        let err = MethodCallRequest::from_parameters(&object(input)).expect_err("invalid");
        assert_eq!(err.kind(), "InvalidCommandError");
        assert!(err.to_string().contains("Method"));
    }

    #[test]
    fn serialised_form_uses_request_keys() {
        let request = MethodCallRequest::new("m.so", "A.B", "C")
            .with_constructor_parameters(vec![json!(1)])
            .with_parameters(vec![json!("x")]);
        let expected = json!({
            "Assembly": "m.so",
            "Class": "A.B",
            "Method": "C",
            "ConstructorParameters": [1],
            "Parameters": ["x"]
        });
        assert_eq!(request.to_value(), expected);
        assert_eq!(serde_json::to_value(&request).expect("serialise"), expected);
    }
}
