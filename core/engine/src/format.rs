//! FILENAME: core/engine/src/format.rs
//! PURPOSE: Renders raw values, lookup objects and picklist codes into display labels.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value::{canonical_json, key_string, number_text, Record, ID_FIELD};

/// Default separator for lookups without a format pattern.
pub const DEFAULT_LOOKUP_SEPARATOR: &str = " - ";

/// Display field assumed when a lookup declares no fields.
pub const DEFAULT_DISPLAY_FIELD: &str = "name";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"));

// ============================================================================
// FORMAT CONTEXT
// ============================================================================

/// Localized tokens used while rendering labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatContext {
    /// Label of missing, null and empty values.
    pub blank_text: String,
    /// Rendering of `true` inside lookup labels.
    pub yes_text: String,
    /// Rendering of `false` inside lookup labels.
    pub no_text: String,
}

impl Default for FormatContext {
    fn default() -> Self {
        FormatContext::for_lang("en")
    }
}

impl FormatContext {
    pub fn for_lang(lang: &str) -> Self {
        match lang {
            "pt_BR" | "pt-BR" => FormatContext {
                blank_text: "(vazio)".to_string(),
                yes_text: "Sim".to_string(),
                no_text: "Não".to_string(),
            },
            _ => FormatContext {
                blank_text: "(blank)".to_string(),
                yes_text: "Yes".to_string(),
                no_text: "No".to_string(),
            },
        }
    }

    /// Overrides the blank token when the request supplies one.
    pub fn with_blank_text(mut self, blank_text: Option<&str>) -> Self {
        if let Some(text) = blank_text {
            self.blank_text = text.to_string();
        }
        self
    }
}

// ============================================================================
// LOOKUP AND PICKLIST DESCRIPTORS
// ============================================================================

/// How a lookup (foreign-key-like object) is turned into a label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupDisplay {
    /// Target document name; informational.
    pub document: Option<String>,
    /// Field used when no simple fields are declared.
    pub display_field: Option<String>,
    /// Pattern with `{field}` placeholders, e.g. `"{code} - {name}"`.
    pub format_pattern: Option<String>,
    /// Ordered sub-fields used by the label.
    pub simple_fields: Vec<String>,
    /// Sub-fields that are themselves lookups; informational.
    pub nested_fields: Vec<String>,
    /// Joiner used without a pattern.
    pub separator: Option<String>,
}

impl LookupDisplay {
    /// Sub-fields contributing to the label, in declaration order.
    pub fn fields(&self) -> Vec<&str> {
        if !self.simple_fields.is_empty() {
            return self.simple_fields.iter().map(String::as_str).collect();
        }
        vec![self.display_field.as_deref().unwrap_or(DEFAULT_DISPLAY_FIELD)]
    }

    fn pattern(&self) -> Option<&str> {
        self.format_pattern.as_deref().filter(|p| !p.is_empty())
    }
}

/// One entry of an explicit value-to-label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicklistOption {
    pub key: Value,
    pub label: String,
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Plain text of a present, non-null value. Empty strings count as missing.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(canonical_json(value)),
    }
}

/// Label of a scalar dimension value; missing values render as the blank token.
pub fn format_scalar(value: Option<&Value>, ctx: &FormatContext) -> String {
    value
        .and_then(scalar_text)
        .unwrap_or_else(|| ctx.blank_text.clone())
}

fn lookup_part(value: Option<&Value>, ctx: &FormatContext) -> Option<String> {
    match value? {
        Value::Bool(true) => Some(ctx.yes_text.clone()),
        Value::Bool(false) => Some(ctx.no_text.clone()),
        other => scalar_text(other),
    }
}

/// Label of a lookup object.
///
/// With a pattern, each `{field}` placeholder is replaced by its sub-field
/// (empty when missing). Without one, present sub-fields are joined with the
/// separator. If no declared sub-field resolves, falls back to `_id`, then blank.
pub fn format_lookup(object: &Record, lookup: &LookupDisplay, ctx: &FormatContext) -> String {
    let fields = lookup.fields();
    let any_present = fields
        .iter()
        .any(|f| lookup_part(object.get(*f), ctx).is_some());
    if !any_present {
        return format_scalar(object.get(ID_FIELD), ctx);
    }

    match lookup.pattern() {
        Some(pattern) => PLACEHOLDER
            .replace_all(pattern, |caps: &Captures| {
                lookup_part(object.get(caps[1].trim()), ctx).unwrap_or_default()
            })
            .into_owned(),
        None => {
            let separator = lookup.separator.as_deref().unwrap_or(DEFAULT_LOOKUP_SEPARATOR);
            fields
                .iter()
                .filter_map(|f| lookup_part(object.get(*f), ctx))
                .collect::<Vec<_>>()
                .join(separator)
        }
    }
}

/// Maps a raw value through a picklist. `None` when the table has no match.
pub fn apply_picklist(value: Option<&Value>, options: &[PicklistOption]) -> Option<String> {
    let key = key_string(value?)?;
    options
        .iter()
        .find(|option| key_string(&option.key).as_deref() == Some(key.as_str()))
        .map(|option| option.label.clone())
}
