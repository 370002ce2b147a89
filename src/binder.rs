//! Record binding
//!
//! Turns one input mapping into one [`BoundRecord`]:
//! 1. look up the record's declared fields;
//! 2. for each input entry, in input order, normalize the key, reject or
//!    skip unknown keys, and coerce the value against the field type;
//! 3. fill absent fields from their defaults, failing on required ones.
//!
//! The first problem aborts the bind. Strictness only decides what happens
//! to unknown keys.

use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::coerce::{coerce_at, conform, describe, Frame};
use crate::error::{BindError, PathSegment};
use crate::introspect::fields_of;
use crate::normalize::normalize;
use crate::options::BindOptions;
use crate::types::{FieldDefault, FieldDescriptor, RecordShape};
use crate::value::{BoundRecord, BoundValue};

/// Bind an input mapping to a record shape
#[instrument(level = "debug", skip_all, fields(record = %shape.name(), strict = options.strict))]
pub fn bind_record(
    shape: &RecordShape,
    input: &Value,
    options: &BindOptions,
) -> Result<BoundRecord, BindError> {
    let record = bind_at(shape, input, Frame::root(options))?;
    debug!(fields = record.len(), "record bound");
    Ok(record)
}

pub(crate) fn bind_at(
    shape: &RecordShape,
    input: &Value,
    frame: Frame<'_>,
) -> Result<BoundRecord, BindError> {
    let fields = fields_of(shape)?;

    let Value::Object(entries) = input else {
        return Err(BindError::coercion(
            format!("mapping for record {}", shape.name()),
            describe(input),
        ));
    };

    let mut bound: Vec<Option<BoundValue>> = (0..fields.len()).map(|_| None).collect();

    for (raw_key, raw_value) in entries {
        let key = normalize(raw_key);

        let Some((idx, field)) = fields.lookup(&key) else {
            if frame.options.strict {
                return Err(BindError::UnknownField {
                    record: shape.name().to_string(),
                    key: key.into_owned(),
                    path: String::new(),
                });
            }
            debug!(record = shape.name(), key = %key, "skipping unknown field");
            continue;
        };

        trace!(record = shape.name(), field = field.name(), ty = %field.ty(), "binding field");
        let value = coerce_at(field.ty(), raw_value, frame)
            .map_err(|e| e.nest(PathSegment::Field(field.name())))?;
        bound[idx] = Some(value);
    }

    let mut out = Vec::with_capacity(fields.len());
    for (field, value) in fields.iter().zip(bound) {
        let value = match value {
            Some(value) => value,
            None => fill_default(shape, field, frame)?,
        };
        out.push((field.name().to_string(), value));
    }

    Ok(BoundRecord::new(shape.name(), out))
}

fn fill_default(
    shape: &RecordShape,
    field: &FieldDescriptor,
    frame: Frame<'_>,
) -> Result<BoundValue, BindError> {
    let Some(default) = field.default() else {
        return Err(BindError::MissingRequiredField {
            record: shape.name().to_string(),
            field: field.name().to_string(),
            path: String::new(),
        });
    };

    let value = match default {
        FieldDefault::Raw(raw) => coerce_at(field.ty(), raw, frame),
        FieldDefault::Value(value) => conform(field.ty(), value).map(|_| value.clone()),
        FieldDefault::Factory(make) => {
            let value = make();
            conform(field.ty(), &value).map(|_| value)
        }
    };
    value.map_err(|e| e.nest(PathSegment::Field(field.name())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenericFamily, TypeExpr};
    use serde_json::json;
    use std::sync::Arc;

    fn s3_config() -> Arc<RecordShape> {
        RecordShape::builder("S3Config")
            .field("default_bucket", TypeExpr::str())
            .field("default_region", TypeExpr::str())
            .field("max_item_size", TypeExpr::int())
            .shared()
    }

    fn sms_config() -> Arc<RecordShape> {
        RecordShape::builder("SMSServiceConfig")
            .field("host", TypeExpr::str())
            .field("port", TypeExpr::int())
            .field("username", TypeExpr::str())
            .field("password", TypeExpr::str())
            .shared()
    }

    fn service() -> RecordShape {
        RecordShape::builder("Service")
            .field("api_key", TypeExpr::str())
            .field("timeout_ms", TypeExpr::int())
            .field("s3_settings", TypeExpr::record(s3_config()))
            .field("sms_providers", TypeExpr::list_of(TypeExpr::record(sms_config())))
            .field("backup_db_hostname", TypeExpr::optional(TypeExpr::str()))
            .field_with_default(
                "no_reply_email",
                TypeExpr::str(),
                FieldDefault::Value(BoundValue::Str("no-reply@python.org".into())),
            )
            .build()
    }

    fn service_input() -> Value {
        json!({
            "api-key": "abcd",
            "timeout ms": 3875,
            "s3_settings": {
                "default_bucket": "company-bucket",
                "default_region": "us-east-1",
                "max_item_size": "2048"
            },
            "sms_providers": [
                {"host": "api.twilio.com", "port": 443, "username": "twilio", "password": "password"}
            ],
            "backup_db_hostname": null
        })
    }

    #[test]
    fn binds_nested_record() {
        let record = bind_record(&service(), &service_input(), &BindOptions::default()).unwrap();
        assert_eq!(record.name(), "Service");
        assert_eq!(record.get("api_key"), Some(&BoundValue::Str("abcd".into())));
        assert_eq!(record.get("timeout_ms"), Some(&BoundValue::Int(3875)));
        assert_eq!(record.get("backup_db_hostname"), Some(&BoundValue::None));
        assert_eq!(
            record.get("no_reply_email"),
            Some(&BoundValue::Str("no-reply@python.org".into()))
        );

        let Some(BoundValue::Record(s3)) = record.get("s3_settings") else {
            panic!("expected nested record");
        };
        assert_eq!(s3.get("max_item_size"), Some(&BoundValue::Int(2048)));

        let Some(BoundValue::List(providers)) = record.get("sms_providers") else {
            panic!("expected list");
        };
        assert_eq!(providers.len(), 1);
    }

    #[test]
    fn fields_in_declaration_order() {
        let input = json!({
            "backup_db_hostname": "h",
            "sms_providers": [],
            "s3_settings": {"default_bucket": "b", "default_region": "r", "max_item_size": 1},
            "timeout_ms": 1,
            "api_key": "k"
        });
        let record = bind_record(&service(), &input, &BindOptions::default()).unwrap();
        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["api_key", "timeout_ms", "s3_settings", "sms_providers", "backup_db_hostname", "no_reply_email"]
        );
    }

    #[test]
    fn unknown_key_strict_and_lenient() {
        let shape = s3_config();
        let input = json!({
            "default_bucket": "b",
            "default_region": "r",
            "max_item_size": 1,
            "extra-key": true
        });

        let err = bind_record(&shape, &input, &BindOptions::strict()).unwrap_err();
        match err {
            BindError::UnknownField { record, key, .. } => {
                assert_eq!(record, "S3Config");
                assert_eq!(key, "extra_key");
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }

        let record = bind_record(&shape, &input, &BindOptions::lenient()).unwrap();
        assert_eq!(record.len(), 3);
        assert!(record.get("extra_key").is_none());
    }

    #[test]
    fn missing_required_field() {
        let err = bind_record(&s3_config(), &json!({"default_bucket": "b"}), &BindOptions::default())
            .unwrap_err();
        match err {
            BindError::MissingRequiredField { record, field, .. } => {
                assert_eq!(record, "S3Config");
                assert_eq!(field, "default_region");
            }
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
    }

    #[test]
    fn lenient_does_not_hide_other_errors() {
        let input = json!({"default_bucket": "b", "default_region": "r", "max_item_size": "big"});
        let err = bind_record(&s3_config(), &input, &BindOptions::lenient()).unwrap_err();
        assert!(matches!(err, BindError::Coercion { .. }));
        assert_eq!(err.path(), Some("max_item_size"));
    }

    #[test]
    fn nested_error_path() {
        let mut input = service_input();
        input["sms_providers"][0]["port"] = json!("https");
        let err = bind_record(&service(), &input, &BindOptions::default()).unwrap_err();
        assert_eq!(err.path(), Some("sms_providers[0].port"));
    }

    #[test]
    fn nested_unknown_field_is_located() {
        let mut input = service_input();
        input["s3_settings"]["bucket"] = json!("x");
        let err = bind_record(&service(), &input, &BindOptions::default()).unwrap_err();
        assert!(matches!(err, BindError::UnknownField { .. }));
        assert_eq!(err.path(), Some("s3_settings"));
    }

    #[test]
    fn unspecialized_generic_fails_in_both_modes() {
        let shape = RecordShape::builder("Unspecialized")
            .field("support_emails", TypeExpr::bare(GenericFamily::List))
            .build();
        for options in [BindOptions::strict(), BindOptions::lenient()] {
            let err = bind_record(&shape, &json!({"support_emails": [1, 2]}), &options).unwrap_err();
            assert!(matches!(err, BindError::UnspecializedGeneric { .. }));
            assert_eq!(err.path(), Some("support_emails"));
        }
    }

    #[test]
    fn unspecialized_generic_only_fails_when_bound() {
        let shape = RecordShape::builder("Lazy")
            .field("name", TypeExpr::str())
            .field_with_default(
                "tags",
                TypeExpr::bare(GenericFamily::List),
                FieldDefault::Value(BoundValue::List(Vec::new())),
            )
            .build();
        let record = bind_record(&shape, &json!({"name": "x"}), &BindOptions::default()).unwrap();
        assert_eq!(record.get("tags"), Some(&BoundValue::List(Vec::new())));
    }

    #[test]
    fn later_duplicate_key_wins() {
        let input = json!({"default_bucket": "a", "default-bucket": "b", "default_region": "r", "max_item_size": 1});
        let record = bind_record(&s3_config(), &input, &BindOptions::default()).unwrap();
        assert_eq!(record.get("default_bucket"), Some(&BoundValue::Str("b".into())));
    }

    #[test]
    fn raw_default_is_coerced() {
        let shape = RecordShape::builder("Retry")
            .field_with_default("attempts", TypeExpr::int(), FieldDefault::Raw(json!("3")))
            .field_with_default(
                "backoff",
                TypeExpr::float(),
                FieldDefault::factory(|| BoundValue::Float(0.5)),
            )
            .build();
        let record = bind_record(&shape, &json!({}), &BindOptions::default()).unwrap();
        assert_eq!(record.get("attempts"), Some(&BoundValue::Int(3)));
        assert_eq!(record.get("backoff"), Some(&BoundValue::Float(0.5)));
    }

    #[test]
    fn defaults_must_fit_their_field() {
        let shape = RecordShape::builder("Smtp")
            .field_with_default(
                "port",
                TypeExpr::int(),
                FieldDefault::Value(BoundValue::Str("smtp".into())),
            )
            .build();
        let err = bind_record(&shape, &json!({}), &BindOptions::default()).unwrap_err();
        assert!(matches!(err, BindError::ShapeMismatch { .. }), "{err}");
        assert_eq!(err.path(), Some("port"));

        // Input still wins over a bad default
        let record = bind_record(&shape, &json!({"port": "25"}), &BindOptions::default()).unwrap();
        assert_eq!(record.get("port"), Some(&BoundValue::Int(25)));

        let shape = RecordShape::builder("Pool")
            .field_with_default(
                "sizes",
                TypeExpr::list_of(TypeExpr::int()),
                FieldDefault::factory(|| BoundValue::List(vec![BoundValue::Float(0.5)])),
            )
            .build();
        let err = bind_record(&shape, &json!({}), &BindOptions::default()).unwrap_err();
        assert!(matches!(err, BindError::ShapeMismatch { .. }));
        assert_eq!(err.path(), Some("sizes[0]"));
    }

    #[test]
    fn non_mapping_input() {
        let err = bind_record(&s3_config(), &json!([1, 2]), &BindOptions::default()).unwrap_err();
        assert!(matches!(err, BindError::Coercion { .. }));
        assert!(err.to_string().contains("mapping for record S3Config"));
    }

    #[test]
    fn depth_counts_nested_records() {
        let record_depth_one = BindOptions::default().with_max_depth(1);
        let err = bind_record(&service(), &service_input(), &record_depth_one).unwrap_err();
        assert!(matches!(err, BindError::DepthLimitExceeded { .. }));
        // sms_providers: list (depth 1) of records (depth 2)
        assert_eq!(err.path(), Some("sms_providers[0]"));

        let enough = BindOptions::default().with_max_depth(2);
        assert!(bind_record(&service(), &service_input(), &enough).is_ok());
    }

    #[test]
    fn input_is_not_mutated() {
        let input = service_input();
        let before = input.clone();
        bind_record(&service(), &input, &BindOptions::default()).unwrap();
        assert_eq!(input, before);
    }
}
