use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use jsonschema::Validator;
use rpcprims_protocol::{Exception, MethodPath};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validators::ParameterValidators;

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Keywords whose value is a map of subschemas.
const MAP_KEYWORDS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Keywords whose value is a single subschema.
const SINGLE_KEYWORDS: [&str; 11] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
];

/// Keywords whose value is a list of subschemas.
const LIST_KEYWORDS: [&str; 4] = ["prefixItems", "allOf", "anyOf", "oneOf"];

/// Keywords that only make sense on an object schema.
const OBJECT_KEYWORDS: [&str; 8] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

/// Method-keyed registry of compiled JSON Schema validators.
///
/// Each schema describes the whole argument list of one method, so it is
/// usually an array schema with `prefixItems`.
pub struct SchemaRegistry {
    validators: HashMap<MethodPath, Arc<Validator>>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: HashMap::new(),
            config,
        }
    }

    /// Register a schema for a method from a JSON string.
    pub fn register(&mut self, method: MethodPath, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(method, &schema)
    }

    /// Register a schema for a method from a JSON value.
    pub fn register_value(&mut self, method: MethodPath, schema: &Value) -> Result<()> {
        let mut schema = schema.clone();
        if self.config.strict_mode {
            forbid_undeclared_properties(&mut schema);
        }

        let compiled =
            jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed {
                method: method.clone(),
                message: err.to_string(),
            })?;

        self.validators.insert(method, Arc::new(compiled));
        Ok(())
    }

    /// Load `<dotted.method.path>.schema.json` files from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    ///
    /// Symlinked schema files are refused. Other files are skipped.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let Some(stem) = file_name.strip_suffix(SCHEMA_SUFFIX) else {
                continue;
            };

            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();
            if file_type.is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            let method = method_from_stem(stem).ok_or_else(|| {
                SchemaError::LoadFailed(format!("unrecognized schema filename: {file_name}"))
            })?;

            loaded = loaded.saturating_add(1);
            if loaded > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {loaded}",
                    registry.config.max_schemas_from_directory
                )));
            }

            let content = read_bounded(
                &entry_path,
                &path_metadata,
                registry.config.max_schema_file_size,
            )?;
            debug!(method = %method, file = %file_name, "loaded parameter schema");
            registry.register(method, &content)?;
        }

        Ok(registry)
    }

    /// Load from embedded `(dotted path, schema)` pairs.
    pub fn from_embedded(schemas: &[(&str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (method, schema) in schemas {
            let method = method_from_stem(method).ok_or_else(|| {
                SchemaError::LoadFailed(format!("invalid method path: '{method}'"))
            })?;
            registry.register(method, schema)?;
        }
        Ok(registry)
    }

    /// Validate an argument list against the method's schema.
    pub fn validate(&self, method: &MethodPath, params: &[Value]) -> Result<()> {
        match self.validators.get(method) {
            Some(validator) => validate_params(method, params, validator),
            None if self.config.fail_on_missing_schema => {
                Err(SchemaError::NoSchema(method.clone()))
            }
            None => Ok(()),
        }
    }

    /// Check if a method has a registered schema.
    pub fn has_schema(&self, method: &MethodPath) -> bool {
        self.validators.contains_key(method)
    }

    /// Methods that have registered schemas, in dotted-name order.
    pub fn methods(&self) -> Vec<MethodPath> {
        let mut methods: Vec<MethodPath> = self.validators.keys().cloned().collect();
        methods.sort_by_cached_key(|method| method.to_string());
        methods
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Turn every schema into a parameter validator.
    ///
    /// With `fail_on_missing_schema` the result also rejects calls to
    /// methods that have no schema.
    pub fn into_validators(self) -> ParameterValidators {
        let mut validators = ParameterValidators::new();
        for (method, validator) in self.validators {
            let key = method.clone();
            validators.insert(key, move |params: &[Value]| {
                validate_params(&method, params, &validator).map_err(Exception::from)
            });
        }

        if self.config.fail_on_missing_schema {
            validators = validators
                .with_fallback(|_: &[Value]| Err(Exception::from(SchemaError::Unregistered)));
        }
        validators
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_params(method: &MethodPath, params: &[Value], validator: &Validator) -> Result<()> {
    let instance = Value::Array(params.to_vec());

    let mut errors = validator.iter_errors(&instance);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(3) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::ValidationFailed {
            method: method.clone(),
            message,
        });
    }

    Ok(())
}

fn method_from_stem(stem: &str) -> Option<MethodPath> {
    if stem.split('.').any(str::is_empty) {
        return None;
    }
    stem.parse().ok()
}

fn read_bounded(
    path: &Path,
    path_metadata: &std::fs::Metadata,
    max_bytes: usize,
) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;
    let opened_metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

    #[cfg(unix)]
    {
        if !same_file_identity(path_metadata, &opened_metadata) {
            return Err(SchemaError::LoadFailed(format!(
                "schema file changed during load: {}",
                path.display()
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = path_metadata;

    if opened_metadata.len() > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({} bytes): {}",
            opened_metadata.len(),
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large while reading: {}",
            path.display()
        )));
    }

    Ok(content)
}

#[cfg(unix)]
fn same_file_identity(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

/// Close every object schema that leaves `additionalProperties` open.
fn forbid_undeclared_properties(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if describes_object(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }

            for keyword in MAP_KEYWORDS {
                if let Some(Value::Object(children)) = map.get_mut(keyword) {
                    children.values_mut().for_each(forbid_undeclared_properties);
                }
            }
            for keyword in SINGLE_KEYWORDS {
                if let Some(child) = map.get_mut(keyword) {
                    forbid_undeclared_properties(child);
                }
            }
            for keyword in LIST_KEYWORDS {
                if let Some(Value::Array(children)) = map.get_mut(keyword) {
                    children.iter_mut().for_each(forbid_undeclared_properties);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(forbid_undeclared_properties),
        _ => {}
    }
}

fn describes_object(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| *kind == "object"),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}
