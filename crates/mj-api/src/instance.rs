use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use mj_core::{
    capability_types, AsciiMathInputProcessorOptions, CallResponse, FunctionDescriptor,
    MathJaxResult, Metadata, MmlInputProcessorOptions, OutputFormat, TexInputProcessorOptions,
    VersionGate,
};
use mj_runtime::{
    call_batch, validate_one, BundleLocator, BundleRegistry, EngineHandle, EngineLimits,
    FunctionDispatcher,
};

use crate::arguments::{ChtmlArguments, MmlArguments, RenderArguments, SvgArguments};
use crate::functions::{AM2CHTML, AM2MML, MML2CHTML, MML2SVG, TEX2CHTML, TEX2MML, TEX2SVG};

#[derive(Clone)]
pub struct MathJaxOptions {
    pub lockfile_path: PathBuf,
    /// Overrides the library version the bridge was built against.
    pub expected_version: Option<String>,
    /// Formats loaded during construction; anything else loads on first use.
    pub preferred_formats: Vec<OutputFormat>,
    pub bundle_locator: Arc<dyn BundleLocator>,
    pub limits: EngineLimits,
}

impl MathJaxOptions {
    pub fn new(lockfile_path: impl Into<PathBuf>, bundle_locator: Arc<dyn BundleLocator>) -> Self {
        Self {
            lockfile_path: lockfile_path.into(),
            expected_version: None,
            preferred_formats: Vec::new(),
            bundle_locator,
            limits: EngineLimits::default(),
        }
    }
}

/// One engine with the typesetting library loaded into it.
///
/// Not `Send`: the engine stays on the thread that built it. Use
/// `MathJaxWorker` to share an instance across tasks.
pub struct MathJax {
    metadata: Metadata,
    dispatcher: FunctionDispatcher,
}

impl MathJax {
    /// Checks the pinned library version, then creates and prepares the engine.
    pub fn new(options: MathJaxOptions) -> MathJaxResult<Self> {
        let mut gate = VersionGate::new(&options.lockfile_path);
        if let Some(expected) = &options.expected_version {
            gate = gate.with_expected_version(expected.clone());
        }
        let metadata = gate.check()?;

        let mut engine = EngineHandle::create(&options.limits)?;
        engine.register_capability_types(&capability_types())?;

        let mut dispatcher =
            FunctionDispatcher::new(engine, BundleRegistry::new(options.bundle_locator));
        for format in &options.preferred_formats {
            dispatcher.ensure_loaded(*format)?;
        }

        info!(
            version = %metadata.version,
            preloaded = options.preferred_formats.len(),
            "mathjax instance ready"
        );
        Ok(Self {
            metadata,
            dispatcher,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn loaded_formats(&self) -> Vec<OutputFormat> {
        self.dispatcher.bundles().loaded().collect()
    }

    pub fn ensure_loaded(&mut self, format: OutputFormat) -> MathJaxResult<()> {
        self.dispatcher.ensure_loaded(format)
    }

    /// Runs any catalog function on one input with pre-marshalled extra arguments.
    pub fn convert(
        &mut self,
        descriptor: &FunctionDescriptor,
        input: &str,
        extra_arguments: &[Value],
    ) -> MathJaxResult<String> {
        validate_one(&mut self.dispatcher, descriptor, input, extra_arguments)
    }

    pub fn convert_batch(
        &mut self,
        descriptor: &FunctionDescriptor,
        inputs: &[String],
        extra_arguments: &[Value],
    ) -> MathJaxResult<Vec<CallResponse>> {
        call_batch(&mut self.dispatcher, descriptor, inputs, extra_arguments)
    }

    pub fn tex2chtml(
        &mut self,
        input: &str,
        arguments: &ChtmlArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        self.render(&TEX2CHTML, input, arguments, input_options)
    }

    pub fn tex2chtml_batch(
        &mut self,
        inputs: &[String],
        arguments: &ChtmlArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.render_batch(&TEX2CHTML, inputs, arguments, input_options)
    }

    pub fn mml2chtml(
        &mut self,
        input: &str,
        arguments: &ChtmlArguments,
        input_options: &MmlInputProcessorOptions,
    ) -> MathJaxResult<String> {
        self.render(&MML2CHTML, input, arguments, input_options)
    }

    pub fn mml2chtml_batch(
        &mut self,
        inputs: &[String],
        arguments: &ChtmlArguments,
        input_options: &MmlInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.render_batch(&MML2CHTML, inputs, arguments, input_options)
    }

    pub fn am2chtml(
        &mut self,
        input: &str,
        arguments: &ChtmlArguments,
        input_options: &AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<String> {
        self.render(&AM2CHTML, input, arguments, input_options)
    }

    pub fn am2chtml_batch(
        &mut self,
        inputs: &[String],
        arguments: &ChtmlArguments,
        input_options: &AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.render_batch(&AM2CHTML, inputs, arguments, input_options)
    }

    pub fn tex2svg(
        &mut self,
        input: &str,
        arguments: &SvgArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        self.render(&TEX2SVG, input, arguments, input_options)
    }

    pub fn tex2svg_batch(
        &mut self,
        inputs: &[String],
        arguments: &SvgArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.render_batch(&TEX2SVG, inputs, arguments, input_options)
    }

    pub fn mml2svg(
        &mut self,
        input: &str,
        arguments: &SvgArguments,
        input_options: &MmlInputProcessorOptions,
    ) -> MathJaxResult<String> {
        self.render(&MML2SVG, input, arguments, input_options)
    }

    pub fn mml2svg_batch(
        &mut self,
        inputs: &[String],
        arguments: &SvgArguments,
        input_options: &MmlInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.render_batch(&MML2SVG, inputs, arguments, input_options)
    }

    pub fn tex2mml(
        &mut self,
        input: &str,
        arguments: &MmlArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert(&TEX2MML, input, &extra)
    }

    pub fn tex2mml_batch(
        &mut self,
        inputs: &[String],
        arguments: &MmlArguments,
        input_options: &TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert_batch(&TEX2MML, inputs, &extra)
    }

    pub fn am2mml(
        &mut self,
        input: &str,
        arguments: &MmlArguments,
        input_options: &AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert(&AM2MML, input, &extra)
    }

    pub fn am2mml_batch(
        &mut self,
        inputs: &[String],
        arguments: &MmlArguments,
        input_options: &AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert_batch(&AM2MML, inputs, &extra)
    }

    fn render<O: Serialize, I: Serialize>(
        &mut self,
        descriptor: &FunctionDescriptor,
        input: &str,
        arguments: &RenderArguments<O>,
        input_options: &I,
    ) -> MathJaxResult<String> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert(descriptor, input, &extra)
    }

    fn render_batch<O: Serialize, I: Serialize>(
        &mut self,
        descriptor: &FunctionDescriptor,
        inputs: &[String],
        arguments: &RenderArguments<O>,
        input_options: &I,
    ) -> MathJaxResult<Vec<CallResponse>> {
        let extra = arguments.extra_arguments(input_options)?;
        self.convert_batch(descriptor, inputs, &extra)
    }
}
