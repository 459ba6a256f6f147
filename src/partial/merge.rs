//! Deep merge over configuration values.
//!
//! Implements key-by-key merging where the overlay value overrides the base
//! value. Sequences are replaced entirely, not concatenated.

use serde_yaml::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Mappings are merged recursively: overlay keys override base keys
/// - Scalars, sequences, and mismatched shapes are replaced entirely,
///   including an overlay null, which is a present value, not "unset"
/// - Non-string mapping keys participate like any other key
///
/// # Example
/// ```
/// use laminate::partial::deep_merge;
///
/// let base = serde_yaml::from_str("{server: {port: 8080, host: localhost}, features: [a, b]}").unwrap();
/// let overlay = serde_yaml::from_str("{server: {port: 9000}, features: [c]}").unwrap();
/// let result = deep_merge(base, overlay);
/// // Result: { server: { port: 9000, host: localhost }, features: [c] }
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both are mappings: merge recursively
        (Value::Mapping(mut base_map), Value::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_value = std::mem::replace(slot, Value::Null);
                        *slot = deep_merge(base_value, overlay_value);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            Value::Mapping(base_map)
        }
        // Any other case: overlay replaces base entirely
        (_, overlay) => overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
///
/// Equivalent to folding `deep_merge` over the list.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
