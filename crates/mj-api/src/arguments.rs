use serde::Serialize;
use serde_json::Value;

use mj_core::{
    ChtmlOutputProcessorOptions, ConversionOptions, DocumentOptions, MathJaxError, MathJaxResult,
    SvgOutputProcessorOptions,
};

fn marshal<T: Serialize>(value: &T) -> MathJaxResult<Value> {
    serde_json::to_value(value).map_err(|error| {
        MathJaxError::ScriptException(format!("options could not be marshalled: {}", error))
    })
}

/// Arguments shared by the rendering conversions (CommonHTML and SVG).
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArguments<O> {
    /// Append the output stylesheet after the typeset math (only when `styles` is set).
    pub css: bool,
    pub assistive_mml: bool,
    /// Wrap SVG output in its `<mjx-container>`; CommonHTML output always has one.
    pub container: bool,
    pub styles: bool,
    pub conversion: ConversionOptions,
    pub document: DocumentOptions,
    pub output: O,
}

pub type ChtmlArguments = RenderArguments<ChtmlOutputProcessorOptions>;
pub type SvgArguments = RenderArguments<SvgOutputProcessorOptions>;

impl<O: Default> Default for RenderArguments<O> {
    fn default() -> Self {
        Self {
            css: false,
            assistive_mml: false,
            container: false,
            styles: true,
            conversion: ConversionOptions::default(),
            document: DocumentOptions::default(),
            output: O::default(),
        }
    }
}

impl<O: Serialize> RenderArguments<O> {
    /// Positional arguments following the input batch.
    pub fn extra_arguments<I: Serialize>(&self, input_options: &I) -> MathJaxResult<Vec<Value>> {
        Ok(vec![
            Value::Bool(self.css),
            Value::Bool(self.assistive_mml),
            Value::Bool(self.container),
            Value::Bool(self.styles),
            marshal(&self.conversion)?,
            marshal(&self.document)?,
            marshal(input_options)?,
            marshal(&self.output)?,
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MmlArguments {
    pub conversion: ConversionOptions,
    pub document: DocumentOptions,
}

impl MmlArguments {
    pub fn extra_arguments<I: Serialize>(&self, input_options: &I) -> MathJaxResult<Vec<Value>> {
        Ok(vec![
            marshal(&self.conversion)?,
            marshal(&self.document)?,
            marshal(input_options)?,
        ])
    }
}
