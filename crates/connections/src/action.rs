//! Action schemas.
//!
//! An [`Action`] is a named operation with an ordered parameter list. The
//! schema is used only to validate argument bags before dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use autoloop_core::types::Args;

/// Runtime type a parameter value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    /// Any JSON number, integers included.
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl ParamType {
    /// Whether `value` is compatible with this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

/// One declared parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParameter {
    pub name: String,
    pub required: bool,
    pub param_type: ParamType,
    pub description: String,
}

impl ActionParameter {
    /// A parameter that must be present.
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            param_type,
            description: description.into(),
        }
    }

    /// A parameter that may be omitted.
    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            param_type,
            description: description.into(),
        }
    }
}

/// Named, schema-validated operation exposed by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub parameters: Vec<ActionParameter>,
    pub description: String,
}

impl Action {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            description: description.into(),
        }
    }

    /// Append a parameter.
    pub fn param(mut self, parameter: ActionParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Check `args` against the declared parameters.
    ///
    /// Every violation is collected; an empty list means the bag is valid.
    /// A `null` value counts as absent. Undeclared keys are ignored.
    pub fn validate(&self, args: &Args) -> Vec<String> {
        let mut errors = Vec::new();
        for parameter in &self.parameters {
            match args.get(&parameter.name).filter(|v| !v.is_null()) {
                None if parameter.required => {
                    errors.push(format!("missing required parameter '{}'", parameter.name));
                }
                None => {}
                Some(value) if !parameter.param_type.accepts(value) => {
                    errors.push(format!(
                        "parameter '{}' must be {}",
                        parameter.name,
                        parameter.param_type.label()
                    ));
                }
                Some(_) => {}
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generate_text() -> Action {
        Action::new("generate-text", "Generate text")
            .param(ActionParameter::required("prompt", ParamType::String, "Input prompt"))
            .param(ActionParameter::optional("temperature", ParamType::Number, "Sampling temperature"))
            .param(ActionParameter::optional("max_tokens", ParamType::Integer, "Token limit"))
    }

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_args() {
        let errors = generate_text().validate(&args(json!({"prompt": "hi", "temperature": 1})));
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_missing_required() {
        let errors = generate_text().validate(&Args::new());
        assert_eq!(errors, vec!["missing required parameter 'prompt'".to_string()]);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let errors = generate_text().validate(&args(json!({"prompt": null})));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_collects_all_violations() {
        let errors = generate_text().validate(&args(json!({"temperature": "hot", "max_tokens": 1.5})));
        assert_eq!(
            errors,
            vec![
                "missing required parameter 'prompt'".to_string(),
                "parameter 'temperature' must be number".to_string(),
                "parameter 'max_tokens' must be integer".to_string(),
            ]
        );
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::Number.accepts(&json!(3)));
        assert!(!ParamType::Integer.accepts(&json!(3.5)));
        assert!(ParamType::Object.accepts(&json!({})));
        assert!(ParamType::Any.accepts(&json!([1])));
        assert!(!ParamType::Array.accepts(&json!("a")));
    }
}
