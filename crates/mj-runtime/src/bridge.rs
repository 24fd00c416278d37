use rhai::{Array, Dynamic, EvalAltResult, ImmutableString, Map};
use serde_json::Value;

use mj_core::{MathJaxError, MathJaxResult};

pub(crate) fn strings_to_dynamic(values: &[String]) -> Dynamic {
    let array = values
        .iter()
        .map(|value| Dynamic::from(value.clone()))
        .collect::<Array>();
    Dynamic::from_array(array)
}

pub(crate) fn json_to_dynamic(value: &Value) -> Result<Dynamic, Box<EvalAltResult>> {
    rhai::serde::to_dynamic(value)
}

/// Decodes a conversion function's return value into one string per input item.
pub(crate) fn dynamic_to_outputs(value: Dynamic, expected_len: usize) -> MathJaxResult<Vec<String>> {
    if value.is_unit() {
        return Err(MathJaxError::ConversionUnknownError);
    }

    if value.is::<Map>() {
        let map = value.cast::<Map>();
        return match map.get("error") {
            Some(error) if error.is::<ImmutableString>() => Err(MathJaxError::ConversionFailed(
                error.clone().cast::<ImmutableString>().to_string(),
            )),
            _ => Err(MathJaxError::ConversionInvalidFormat(
                "expected an array of strings, got a map".to_string(),
            )),
        };
    }

    if !value.is::<Array>() {
        return Err(MathJaxError::ConversionInvalidFormat(format!(
            "expected an array of strings, got {}",
            value.type_name()
        )));
    }

    let array = value.cast::<Array>();
    if array.len() != expected_len {
        return Err(MathJaxError::ConversionInvalidFormat(format!(
            "expected {} outputs, got {}",
            expected_len,
            array.len()
        )));
    }

    let mut out = Vec::with_capacity(array.len());
    for (index, item) in array.into_iter().enumerate() {
        if !item.is::<ImmutableString>() {
            return Err(MathJaxError::ConversionInvalidFormat(format!(
                "output {} is {}, not a string",
                index,
                item.type_name()
            )));
        }
        out.push(item.cast::<ImmutableString>().to_string());
    }
    Ok(out)
}

/// Message carried by an engine fault, unwrapped from nested function-call frames.
pub(crate) fn fault_message(error: &EvalAltResult) -> String {
    match error {
        EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => fault_message(inner),
        other => other.to_string(),
    }
}
