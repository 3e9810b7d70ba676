//! Conversion between packs and `serde_json` values.
//!
//! Intended for host-side tooling. Nesting is bounded by the encoder and
//! decoder stack depth, so conversion fails with
//! [`PackError::DepthExceeded`] rather than recursing without limit.

use serde_json::{Map, Number, Value};

use crate::decoder::PackDecoder;
use crate::encoder::PackEncoder;
use crate::error::{PackError, Result};
use crate::format::ElementType;

/// Append `value` as a single element.
///
/// JSON integers become Integer elements and fail with
/// [`PackError::IntegerOutOfRange`] outside the 32-bit range. Other numbers
/// become Reals at the encoder's configured precision. Object entries are
/// written as alternating String keys and values.
pub fn encode_value<const N: usize>(
    value: &Value,
    encoder: &mut PackEncoder<'_, N>,
) -> Result<()> {
    match value {
        Value::Null => encoder.put_none(),
        Value::Bool(flag) => encoder.put_boolean(*flag),
        Value::Number(number) => {
            let integer = number
                .as_i64()
                .map(i128::from)
                .or_else(|| number.as_u64().map(i128::from));
            match integer {
                Some(value) => {
                    let integer = i32::try_from(value)
                        .map_err(|_| PackError::IntegerOutOfRange { value })?;
                    encoder.put_integer(integer)
                }
                None => encoder.put_real(number.as_f64().unwrap_or_default()),
            }
        }
        Value::String(text) => encoder.put_string(text),
        Value::Array(items) => {
            encoder.open_list()?;
            for item in items {
                encode_value(item, encoder)?;
            }
            encoder.close()
        }
        Value::Object(entries) => {
            encoder.open_map()?;
            for (key, item) in entries {
                encoder.put_string(key)?;
                encode_value(item, encoder)?;
            }
            encoder.close()
        }
    }
}

/// Convert the decoder's current element, descending into containers.
///
/// Bytes become arrays of numbers. Non-string map keys are rendered as their
/// JSON text. A map with an odd number of elements maps its last key to
/// `null`. The decoder is left positioned on the converted element.
pub fn decode_value<const N: usize>(decoder: &mut PackDecoder<'_, N>) -> Result<Value> {
    let Some(element_type) = decoder.element_type() else {
        return Ok(Value::Null);
    };

    let value = match element_type {
        ElementType::None => Value::Null,
        ElementType::Boolean => Value::Bool(decoder.get_boolean()),
        ElementType::Integer => Value::from(decoder.get_integer()),
        ElementType::Real => Number::from_f64(decoder.get_real())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ElementType::String => {
            Value::String(String::from_utf8_lossy(decoder.content()).into_owned())
        }
        ElementType::Bytes => {
            Value::Array(decoder.content().iter().map(|b| Value::from(*b)).collect())
        }
        ElementType::List => {
            let mut items = Vec::new();
            if decoder.content_len() > 0 {
                decoder.enter()?;
                while decoder.advance() {
                    items.push(decode_value(decoder)?);
                }
                decoder.exit()?;
            }
            Value::Array(items)
        }
        ElementType::Map => {
            let mut entries = Map::new();
            if decoder.content_len() > 0 {
                decoder.enter()?;
                while decoder.advance() {
                    let key = match decode_value(decoder)? {
                        Value::String(key) => key,
                        other => other.to_string(),
                    };
                    let item = if decoder.advance() {
                        decode_value(decoder)?
                    } else {
                        Value::Null
                    };
                    entries.insert(key, item);
                }
                decoder.exit()?;
            }
            Value::Object(entries)
        }
    };
    Ok(value)
}

/// Convert every remaining top-level element of the decoder.
pub fn decode_all<const N: usize>(decoder: &mut PackDecoder<'_, N>) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    while decoder.advance() {
        values.push(decode_value(decoder)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::format::PackConfig;

    fn roundtrip(value: &Value) -> Value {
        let mut buf = [0u8; 256];
        let mut encoder = PackEncoder::new(&mut buf);
        encode_value(value, &mut encoder).unwrap();
        let len = encoder.offset();

        let mut decoder = PackDecoder::new(&buf[..len]);
        let values = decode_all(&mut decoder).unwrap();
        assert_eq!(values.len(), 1);
        values.into_iter().next().unwrap()
    }

    #[test]
    fn scalars_roundtrip() {
        for value in [
            json!(null),
            json!(true),
            json!(false),
            json!(-5),
            json!(40000),
            json!(0.5),
            json!("Hello world!"),
        ] {
            assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn nested_document_roundtrip() {
        let value = json!({
            "text": "Hello world!",
            "status": true,
            "count": 123,
            "items": [1, "two", {"three": 3.0}],
        });
        let decoded = roundtrip(&value);
        assert_eq!(decoded["text"], "Hello world!");
        assert_eq!(decoded["status"], true);
        assert_eq!(decoded["count"], 123);
        assert_eq!(decoded["items"][1], "two");
        assert_eq!(decoded["items"][2]["three"], 3.0);
    }

    #[test]
    fn integers_beyond_32_bits_are_rejected() {
        let mut buf = [0u8; 16];
        for (value, expected) in [
            (json!(2_147_483_649i64), 2_147_483_649i128),
            (json!(-2_147_483_649i64), -2_147_483_649),
            (json!(u64::MAX), u64::MAX as i128),
        ] {
            let mut encoder = PackEncoder::new(&mut buf);
            assert_eq!(
                encode_value(&value, &mut encoder),
                Err(PackError::IntegerOutOfRange { value: expected })
            );
            assert_eq!(encoder.offset(), 0);
        }

        assert_eq!(roundtrip(&json!(i32::MIN)), json!(i32::MIN));
        assert_eq!(roundtrip(&json!(5e9)), json!(5e9f32 as f64));
    }

    #[test]
    fn wide_reals_keep_double_precision() {
        let config = PackConfig::default().with_wide_reals(true);
        let mut buf = [0u8; 32];
        let mut encoder = PackEncoder::with_config(&mut buf, config);
        encode_value(&json!(0.1), &mut encoder).unwrap();
        let len = encoder.offset();

        let mut decoder = PackDecoder::with_config(&buf[..len], config);
        assert_eq!(decode_all(&mut decoder).unwrap(), vec![json!(0.1)]);
    }

    #[test]
    fn bytes_and_odd_maps() {
        // {1: <bytes 01 02>, "hi"}
        let bytes = [0xE8, 0x41, 0x01, 0xA2, 0x01, 0x02, 0x82, b'h', b'i'];
        let mut decoder = PackDecoder::new(&bytes);
        let values = decode_all(&mut decoder).unwrap();
        assert_eq!(values, vec![json!({"1": [1, 2], "hi": null})]);
    }

    #[test]
    fn too_deep_documents_fail() {
        let value = json!([[[[[[1]]]]]]);
        let mut buf = [0u8; 64];
        let mut encoder = PackEncoder::new(&mut buf);
        assert_eq!(
            encode_value(&value, &mut encoder),
            Err(PackError::DepthExceeded { max: 5 })
        );
    }
}
