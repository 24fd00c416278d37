use serde_json::Value;
use tracing::debug;

use mj_core::{CallResponse, FunctionDescriptor, MathJaxError, MathJaxResult};

use crate::dispatch::FunctionDispatcher;

/// Applies the descriptor's output parser to every raw output.
///
/// Never fails as a whole: an item that does not parse keeps its raw value
/// and carries the parser's error, so its siblings still come back validated.
pub fn validate_batch(descriptor: &FunctionDescriptor, raw_outputs: Vec<String>) -> Vec<CallResponse> {
    raw_outputs
        .into_iter()
        .enumerate()
        .map(|(index, raw)| match descriptor.parse_output(&raw) {
            Ok(value) => CallResponse::ok(value),
            Err(error) => {
                debug!(
                    function = descriptor.name,
                    index,
                    code = error.code(),
                    "output rejected"
                );
                CallResponse::failed(raw, error)
            }
        })
        .collect()
}

pub fn call_batch(
    dispatcher: &mut FunctionDispatcher,
    descriptor: &FunctionDescriptor,
    inputs: &[String],
    extra_arguments: &[Value],
) -> MathJaxResult<Vec<CallResponse>> {
    let raw_outputs = dispatcher.invoke(descriptor, inputs, extra_arguments)?;
    Ok(validate_batch(descriptor, raw_outputs))
}

pub fn validate_one(
    dispatcher: &mut FunctionDispatcher,
    descriptor: &FunctionDescriptor,
    input: &str,
    extra_arguments: &[Value],
) -> MathJaxResult<String> {
    call_batch(dispatcher, descriptor, &[input.to_string()], extra_arguments)?
        .into_iter()
        .next()
        .ok_or(MathJaxError::MissingResponse)?
        .into_result()
}
