//! Discriminated union dispatch
//!
//! Collection fields hold either an embedded record, tagged by its
//! `mxlims_type`, or a reference, tagged by its `target_type`. Dispatch reads
//! the tag first and fails closed on anything outside the union's member set.

use crate::error::DiscriminatorError;
use crate::MxlimsType;
use serde_json::Value;
use std::str::FromStr;

/// Outcome of reading a union member's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminated {
    /// An embedded record of the given type.
    Embedded(MxlimsType),
    /// A reference to a record of the given type.
    Reference(MxlimsType),
}

/// Decide which member of a union `value` encodes.
///
/// `mxlims_type` takes precedence over `target_type`. Both must name a member
/// of `allowed`.
pub fn resolve_discriminator(
    value: &Value,
    allowed: &[MxlimsType],
) -> Result<Discriminated, DiscriminatorError> {
    let object = value.as_object().ok_or_else(|| DiscriminatorError::NotAnObject {
        found: crate::record::json_kind(value).to_string(),
    })?;

    if let Some(tag) = object.get("mxlims_type") {
        return match tag.as_str().and_then(|s| MxlimsType::from_str(s).ok()) {
            Some(kind) if allowed.contains(&kind) => Ok(Discriminated::Embedded(kind)),
            _ => Err(unknown(tag, allowed)),
        };
    }

    if let Some(tag) = object.get("target_type") {
        let kind = tag
            .as_str()
            .and_then(|s| MxlimsType::from_str(s).ok())
            .ok_or_else(|| unknown(tag, allowed))?;
        if !allowed.contains(&kind) {
            tracing::debug!(target_type = %kind, "reference target outside union");
            return Err(DiscriminatorError::DisallowedTarget {
                target: kind,
                expected: allowed.to_vec(),
            });
        }
        return Ok(Discriminated::Reference(kind));
    }

    Err(DiscriminatorError::Missing {
        expected: allowed.to_vec(),
    })
}

fn unknown(tag: &Value, allowed: &[MxlimsType]) -> DiscriminatorError {
    let tag = match tag {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    tracing::debug!(tag = %tag, "unknown discriminator");
    DiscriminatorError::Unknown {
        tag,
        expected: allowed.to_vec(),
    }
}

/// Declare the single-valued `mxlims_type` tag of a concrete entity.
macro_rules! mxlims_tag {
    ($(#[$meta:meta])* $name:ident => $variant:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
        pub enum $name {
            #[default]
            $variant,
        }

        impl $crate::shape::Shape for $name {
            fn check_shape(
                v: &mut $crate::validation::Validator,
                field: &str,
                value: &serde_json::Value,
            ) {
                $crate::shape::check_member::<Self>(v, field, value);
            }
        }
    };
}

/// Declare a collection union over embedded entity types plus `Reference`.
///
/// Each variant is named after, and holds, the entity type of the same name.
macro_rules! mxlims_union {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $name {
            $($variant($variant),)+
            Reference($crate::MxlimsRef),
        }

        impl $crate::record::CollectionItem for $name {
            const ALLOWED: &'static [$crate::MxlimsType] = &[$($crate::MxlimsType::$variant),+];

            fn uuid(&self) -> $crate::EntityId {
                match self {
                    $($name::$variant(inner) => $crate::record::MxlimsObject::uuid(inner),)+
                    $name::Reference(reference) => reference.uuid,
                }
            }

            fn target_type(&self) -> $crate::MxlimsType {
                match self {
                    $($name::$variant(_) => $crate::MxlimsType::$variant,)+
                    $name::Reference(reference) => reference.target_type,
                }
            }

            fn as_reference(&self) -> Option<&$crate::MxlimsRef> {
                match self {
                    $name::Reference(reference) => Some(reference),
                    _ => None,
                }
            }

            fn check(&self, v: &mut $crate::validation::Validator) {
                match self {
                    $($name::$variant(inner) => $crate::record::MxlimsRecord::check(inner, v),)+
                    $name::Reference(reference) => {
                        v.check_target("", Some(reference), Self::ALLOWED)
                    }
                }
            }

            fn embedded_source(&self) -> Option<&$crate::MxlimsRef> {
                match self {
                    $($name::$variant(inner) => $crate::record::MxlimsObject::produced_by(inner),)+
                    $name::Reference(_) => None,
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $($name::$variant(inner) => serde::Serialize::serialize(inner, serializer),)+
                    $name::Reference(reference) => serde::Serialize::serialize(reference, serializer),
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                use serde::de::Error as _;
                use $crate::discriminator::Discriminated;
                use $crate::record::CollectionItem as _;

                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                match $crate::discriminator::resolve_discriminator(&value, Self::ALLOWED)
                    .map_err(D::Error::custom)?
                {
                    $(Discriminated::Embedded($crate::MxlimsType::$variant) => {
                        serde_json::from_value(value)
                            .map($name::$variant)
                            .map_err(D::Error::custom)
                    })+
                    Discriminated::Embedded(other) => Err(D::Error::custom(
                        $crate::error::DiscriminatorError::Unknown {
                            tag: other.to_string(),
                            expected: Self::ALLOWED.to_vec(),
                        },
                    )),
                    Discriminated::Reference(_) => serde_json::from_value(value)
                        .map($name::Reference)
                        .map_err(D::Error::custom),
                }
            }
        }

        impl $crate::shape::Shape for $name {
            fn check_shape(
                v: &mut $crate::validation::Validator,
                field: &str,
                value: &serde_json::Value,
            ) {
                use $crate::record::CollectionItem as _;

                $crate::shape::check_union_member(v, field, value, Self::ALLOWED, |v, kind, object| {
                    match kind {
                        $($crate::MxlimsType::$variant => {
                            <$variant as $crate::record::MxlimsRecord>::check_object(v, object)
                        })+
                        other => v.discriminator(
                            "",
                            &$crate::error::DiscriminatorError::Unknown {
                                tag: other.to_string(),
                                expected: Self::ALLOWED.to_vec(),
                            },
                        ),
                    }
                });
            }
        }

        $(impl From<$variant> for $name {
            fn from(inner: $variant) -> Self {
                $name::$variant(inner)
            }
        })+

        impl From<$crate::MxlimsRef> for $name {
            fn from(reference: $crate::MxlimsRef) -> Self {
                $name::Reference(reference)
            }
        }

        #[cfg(feature = "json-schema")]
        impl utoipa::ToSchema for $name {
            fn name() -> std::borrow::Cow<'static, str> {
                std::borrow::Cow::Borrowed(stringify!($name))
            }
        }

        #[cfg(feature = "json-schema")]
        impl utoipa::PartialSchema for $name {
            fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
                let one_of = utoipa::openapi::schema::OneOfBuilder::new()
                    $(.item(utoipa::openapi::Ref::from_schema_name(stringify!($variant))))+
                    .item(utoipa::openapi::Ref::from_schema_name("MxlimsRef"))
                    .description(Some(concat!(
                        "Embedded ",
                        $(stringify!($variant), " / ",)+
                        "or reference, discriminated by mxlims_type or target_type"
                    )))
                    .build();
                utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::OneOf(one_of))
            }
        }
    };
}

pub(crate) use mxlims_tag;
pub(crate) use mxlims_union;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DATASETS: &[MxlimsType] = &[
        MxlimsType::Dataset,
        MxlimsType::CollectionSweep,
        MxlimsType::ReflectionSet,
    ];

    #[test]
    fn test_embedded_member() {
        let value = json!({"mxlims_type": "CollectionSweep", "scan_axis": "Omega"});
        assert_eq!(
            resolve_discriminator(&value, DATASETS).unwrap(),
            Discriminated::Embedded(MxlimsType::CollectionSweep)
        );
    }

    #[test]
    fn test_reference_member() {
        let value = json!({"target_type": "ReflectionSet", "uuid": "x"});
        assert_eq!(
            resolve_discriminator(&value, DATASETS).unwrap(),
            Discriminated::Reference(MxlimsType::ReflectionSet)
        );
    }

    #[test]
    fn test_mxlims_type_takes_precedence() {
        let value = json!({"mxlims_type": "Dataset", "target_type": "Crystal"});
        assert_eq!(
            resolve_discriminator(&value, DATASETS).unwrap(),
            Discriminated::Embedded(MxlimsType::Dataset)
        );
    }

    #[test]
    fn test_unknown_tag_fails_closed() {
        let err = resolve_discriminator(&json!({"mxlims_type": "Crystal"}), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::Unknown { ref tag, .. } if tag == "Crystal"));

        // a known type outside the union is not embeddable here
        let err = resolve_discriminator(&json!({"mxlims_type": "MXSample"}), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::Unknown { .. }));

        let err = resolve_discriminator(&json!({"mxlims_type": 7}), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::Unknown { ref tag, .. } if tag == "7"));
    }

    #[test]
    fn test_reference_target_checks() {
        let err = resolve_discriminator(&json!({"target_type": "Crystal"}), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::Unknown { .. }));

        let err = resolve_discriminator(&json!({"target_type": "MXSample"}), DATASETS).unwrap_err();
        assert!(matches!(
            err,
            DiscriminatorError::DisallowedTarget {
                target: MxlimsType::MXSample,
                ..
            }
        ));
        assert!(err.to_string().starts_with("disallowed reference target"));
    }

    #[test]
    fn test_missing_and_non_object() {
        let err = resolve_discriminator(&json!({"uuid": "x"}), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::Missing { .. }));
        assert!(err.to_string().starts_with("missing discriminator"));

        let err = resolve_discriminator(&json!("CollectionSweep"), DATASETS).unwrap_err();
        assert!(matches!(err, DiscriminatorError::NotAnObject { .. }));
        assert!(err.to_string().starts_with("expected a JSON object"));
    }
}
