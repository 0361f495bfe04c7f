//! Structural checks of JSON input against record field types
//!
//! A record's JSON object is walked field by field before it is decoded, so
//! every wrong type, unknown enumeration member and malformed collection
//! member is reported at its own dotted path instead of stopping at the
//! first one the decoder meets.

use crate::discriminator::{resolve_discriminator, Discriminated};
use crate::record::{json_kind, MxlimsRecord};
use crate::validation::Validator;
use crate::values::{
    Component, Macromolecule, QualityFactor, ReflectionStatistics, Scan, Tensor, UnitCell,
};
use crate::{
    EntityId, JobStatus, MxlimsRef, MxlimsType, PdbxSignalType, QualityFactorType,
    ReflectionBinningMode, Timestamp,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A field type whose JSON form can be checked without decoding it.
pub trait Shape {
    /// Record every structural violation of `value`, found at `field`.
    fn check_shape(v: &mut Validator, field: &str, value: &Value);
}

// =============================================================================
// LEAVES
// =============================================================================

fn check_leaf<T: DeserializeOwned>(v: &mut Validator, field: &str, value: &Value, expected: &str) {
    if <T as Deserialize>::deserialize(value).is_err() {
        v.wrong_type(field, format!("expected {}, found {}", expected, json_kind(value)));
    }
}

macro_rules! leaf_shape {
    ($($ty:ty => $expected:literal),+ $(,)?) => {
        $(impl Shape for $ty {
            fn check_shape(v: &mut Validator, field: &str, value: &Value) {
                check_leaf::<$ty>(v, field, value, $expected);
            }
        })+
    };
}

leaf_shape! {
    bool => "a boolean",
    f64 => "a number",
    i32 => "a 32-bit integer",
    u32 => "a non-negative 32-bit integer",
    u64 => "a non-negative integer",
    String => "a string",
    EntityId => "a UUID string",
    Timestamp => "an RFC 3339 timestamp",
}

impl Shape for Value {
    fn check_shape(_: &mut Validator, _: &str, _: &Value) {}
}

/// Check a string-valued enumeration.
pub(crate) fn check_member<T: DeserializeOwned>(v: &mut Validator, field: &str, value: &Value) {
    match value {
        Value::String(name) => {
            if <T as Deserialize>::deserialize(value).is_err() {
                v.invalid_member(field, format!("`{}` is not a known member", name));
            }
        }
        other => v.wrong_type(field, format!("expected a string, found {}", json_kind(other))),
    }
}

macro_rules! enum_shape {
    ($($ty:ty),+ $(,)?) => {
        $(impl Shape for $ty {
            fn check_shape(v: &mut Validator, field: &str, value: &Value) {
                check_member::<$ty>(v, field, value);
            }
        })+
    };
}

enum_shape!(
    MxlimsType,
    JobStatus,
    QualityFactorType,
    PdbxSignalType,
    ReflectionBinningMode,
);

// =============================================================================
// CONTAINERS
// =============================================================================

impl<T: Shape> Shape for Option<T> {
    fn check_shape(v: &mut Validator, field: &str, value: &Value) {
        if !value.is_null() {
            T::check_shape(v, field, value);
        }
    }
}

impl<T: Shape> Shape for Vec<T> {
    fn check_shape(v: &mut Validator, field: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    T::check_shape(v, &format!("{}[{}]", field, index), item);
                }
            }
            other => v.wrong_type(field, format!("expected an array, found {}", json_kind(other))),
        }
    }
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    fn check_shape(v: &mut Validator, field: &str, value: &Value) {
        match value {
            Value::Array(items) if items.len() == N => {
                for (index, item) in items.iter().enumerate() {
                    T::check_shape(v, &format!("{}[{}]", field, index), item);
                }
            }
            Value::Array(items) => {
                v.wrong_type(field, format!("expected {} items, found {}", N, items.len()))
            }
            other => v.wrong_type(field, format!("expected an array, found {}", json_kind(other))),
        }
    }
}

impl<T: Shape> Shape for BTreeMap<String, T> {
    fn check_shape(v: &mut Validator, field: &str, value: &Value) {
        match value {
            Value::Object(map) => {
                for (key, item) in map {
                    T::check_shape(v, &format!("{}.{}", field, key), item);
                }
            }
            other => v.wrong_type(field, format!("expected an object, found {}", json_kind(other))),
        }
    }
}

// =============================================================================
// RECORDS AND REFERENCES
// =============================================================================

impl Shape for MxlimsRef {
    fn check_shape(v: &mut Validator, field: &str, value: &Value) {
        let Some(object) = value.as_object() else {
            v.wrong_type(field, format!("expected a JSON object, found {}", json_kind(value)));
            return;
        };
        v.nested(field, None, |v| {
            for name in ["target_type", "uuid"] {
                if !object.contains_key(name) {
                    v.missing(name);
                }
            }
            v.field::<MxlimsType>(object, "target_type");
            v.field::<EntityId>(object, "uuid");
        });
    }
}

/// Check an embedded record of type `R`.
pub(crate) fn check_record<R: MxlimsRecord>(v: &mut Validator, field: &str, value: &Value) {
    match value.as_object() {
        Some(object) => v.nested(field, None, |v| R::check_object(v, object)),
        None => v.wrong_type(field, format!("expected a JSON object, found {}", json_kind(value))),
    }
}

macro_rules! record_shape {
    ($($ty:ty),+ $(,)?) => {
        $(impl Shape for $ty {
            fn check_shape(v: &mut Validator, field: &str, value: &Value) {
                check_record::<$ty>(v, field, value);
            }
        })+
    };
}

record_shape!(UnitCell, Tensor, QualityFactor, ReflectionStatistics, Scan, Macromolecule, Component);

/// Check a collection member: resolve its tag, then check the member it names.
pub(crate) fn check_union_member<F>(
    v: &mut Validator,
    field: &str,
    value: &Value,
    allowed: &[MxlimsType],
    check_embedded: F,
) where
    F: FnOnce(&mut Validator, MxlimsType, &serde_json::Map<String, Value>),
{
    match resolve_discriminator(value, allowed) {
        Err(err) => v.discriminator(field, &err),
        Ok(Discriminated::Reference(_)) => MxlimsRef::check_shape(v, field, value),
        Ok(Discriminated::Embedded(kind)) => {
            if let Some(object) = value.as_object() {
                v.nested(field, None, |v| check_embedded(v, kind, object));
            }
        }
    }
}
