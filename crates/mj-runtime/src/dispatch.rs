use rhai::{FnPtr, Map};
use serde_json::Value;
use tracing::debug;

use mj_core::{FunctionDescriptor, MathJaxError, MathJaxResult, OutputFormat};

use crate::bridge::{dynamic_to_outputs, json_to_dynamic, strings_to_dynamic};
use crate::bundles::BundleRegistry;
use crate::engine::EngineHandle;

/// Resolves descriptors to engine functions (module → class → function) and calls them.
pub struct FunctionDispatcher {
    engine: EngineHandle,
    bundles: BundleRegistry,
}

impl FunctionDispatcher {
    pub fn new(engine: EngineHandle, bundles: BundleRegistry) -> Self {
        Self { engine, bundles }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EngineHandle {
        &mut self.engine
    }

    pub fn bundles(&self) -> &BundleRegistry {
        &self.bundles
    }

    pub fn ensure_loaded(&mut self, format: OutputFormat) -> MathJaxResult<()> {
        self.bundles.ensure_loaded(format, &mut self.engine)
    }

    /// Calls the descriptor's function once with the whole batch.
    ///
    /// The function receives `inputs` as its first argument followed by
    /// `extra_arguments`, and must return one string per input. It runs against
    /// the functions of its own format's bundle only. An empty batch is still
    /// resolved but never called.
    pub fn invoke(
        &mut self,
        descriptor: &FunctionDescriptor,
        inputs: &[String],
        extra_arguments: &[Value],
    ) -> MathJaxResult<Vec<String>> {
        self.ensure_loaded(descriptor.owning_format)?;
        let function = self.resolve(descriptor)?;
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let library = self
            .bundles
            .library(descriptor.owning_format)
            .ok_or_else(|| MathJaxError::MissingBundleResource {
                locator: descriptor.owning_format.bundle_file_name(),
            })?;

        let mut args = Vec::with_capacity(extra_arguments.len() + 1);
        args.push(strings_to_dynamic(inputs));
        for argument in extra_arguments {
            let value = json_to_dynamic(argument)
                .map_err(|error| MathJaxError::ScriptException(error.to_string()))?;
            args.push(value);
        }

        debug!(
            function = %descriptor.qualified_name(),
            items = inputs.len(),
            "dispatching conversion"
        );
        let returned = self.engine.call_function(&function, library, args)?;
        dynamic_to_outputs(returned, inputs.len())
    }

    fn resolve(&self, descriptor: &FunctionDescriptor) -> MathJaxResult<FnPtr> {
        let module = self
            .engine
            .global(descriptor.module_name)
            .ok_or_else(|| MathJaxError::MissingModule(descriptor.module_name.to_string()))?;

        let class = module
            .try_cast::<Map>()
            .and_then(|module| module.get(descriptor.class_name).cloned())
            .and_then(|class| class.try_cast::<Map>())
            .ok_or_else(|| MathJaxError::MissingClass(descriptor.class_name.to_string()))?;

        class
            .get(descriptor.name)
            .cloned()
            .and_then(|function| function.try_cast::<FnPtr>())
            .ok_or_else(|| MathJaxError::MissingFunction(descriptor.name.to_string()))
    }
}

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    use std::sync::Arc;

    use mj_core::passthrough;

    use crate::bundles::StaticBundleLocator;
    use crate::engine::EngineLimits;

    const SVG_BUNDLE: &str = r#"
fn tex2svg(inputs, options) {
    let out = [];
    for input in inputs {
        out.push(`<svg data-em="${options.em}">${input}</svg>`);
    }
    out
}

fn silent(inputs) { }

fn numbers(inputs) { [1, 2] }

fn short(inputs) { ["only one"] }

fn refuse(inputs) { #{ error: "batch refused" } }

fn explode(inputs) { throw "engine fault" }

const SVG = #{
    TeXConverter: #{
        tex2svg: Fn("tex2svg"),
        silent: Fn("silent"),
        numbers: Fn("numbers"),
        short: Fn("short"),
        refuse: Fn("refuse"),
        explode: Fn("explode"),
        notAFunction: 42,
    },
    Scalar: 1,
};
"#;

    fn descriptor(module: &'static str, class: &'static str, name: &'static str) -> FunctionDescriptor {
        FunctionDescriptor {
            name,
            module_name: module,
            class_name: class,
            owning_format: OutputFormat::Svg,
            output_parser: passthrough,
        }
    }

    fn dispatcher() -> FunctionDispatcher {
        let locator =
            StaticBundleLocator::new().with_bundle(OutputFormat::Svg, "svg.bundle.rhai", SVG_BUNDLE);
        let engine = EngineHandle::create(&EngineLimits::default()).expect("engine");
        FunctionDispatcher::new(engine, BundleRegistry::new(Arc::new(locator)))
    }

    fn inputs(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn invoke_returns_aligned_batch_and_loads_lazily() {
        let mut dispatcher = dispatcher();
        assert!(!dispatcher.bundles().is_loaded(OutputFormat::Svg));

        let outputs = dispatcher
            .invoke(
                &descriptor("SVG", "TeXConverter", "tex2svg"),
                &inputs(&["a", "b", "c"]),
                &[serde_json::json!({"em": 16})],
            )
            .expect("invoke should succeed");

        assert!(dispatcher.bundles().is_loaded(OutputFormat::Svg));
        assert_eq!(
            outputs,
            vec![
                "<svg data-em=\"16\">a</svg>".to_string(),
                "<svg data-em=\"16\">b</svg>".to_string(),
                "<svg data-em=\"16\">c</svg>".to_string(),
            ]
        );
    }

    #[test]
    fn invoke_with_empty_batch_skips_the_call() {
        let mut dispatcher = dispatcher();
        let outputs = dispatcher
            .invoke(&descriptor("SVG", "TeXConverter", "explode"), &[], &[])
            .expect("empty batch should succeed");
        assert!(outputs.is_empty());
        assert!(dispatcher.bundles().is_loaded(OutputFormat::Svg));
    }

    #[test]
    fn empty_batch_still_reports_unresolved_function() {
        let mut dispatcher = dispatcher();
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "mml2svg"), &[], &[]),
            Err(MathJaxError::MissingFunction("mml2svg".to_string()))
        );
        assert_eq!(
            dispatcher.invoke(&descriptor("CHTML", "TeXConverter", "tex2chtml"), &[], &[]),
            Err(MathJaxError::MissingModule("CHTML".to_string()))
        );
    }

    #[test]
    fn same_named_helpers_stay_with_their_own_bundle() {
        let locator = StaticBundleLocator::new()
            .with_bundle(
                OutputFormat::Svg,
                "svg.bundle.rhai",
                r#"
fn wrap(x) { `<svg>${x}</svg>` }
fn tex2svg(inputs) {
    let out = [];
    for input in inputs { out.push(wrap(input)); }
    out
}
const SVG = #{ TeXConverter: #{ tex2svg: Fn("tex2svg") } };
"#,
            )
            .with_bundle(
                OutputFormat::Mml,
                "mml.bundle.rhai",
                r#"
fn wrap(x) { `<math>${x}</math>` }
fn tex2mml(inputs) {
    let out = [];
    for input in inputs { out.push(wrap(input)); }
    out
}
const MML = #{ TeXConverter: #{ tex2mml: Fn("tex2mml") } };
"#,
            );
        let engine = EngineHandle::create(&EngineLimits::default()).expect("engine");
        let mut dispatcher = FunctionDispatcher::new(engine, BundleRegistry::new(Arc::new(locator)));
        let tex2svg = descriptor("SVG", "TeXConverter", "tex2svg");
        let tex2mml = FunctionDescriptor {
            owning_format: OutputFormat::Mml,
            ..descriptor("MML", "TeXConverter", "tex2mml")
        };
        let batch = inputs(&["x"]);

        assert_eq!(
            dispatcher.invoke(&tex2svg, &batch, &[]),
            Ok(vec!["<svg>x</svg>".to_string()])
        );
        assert_eq!(
            dispatcher.invoke(&tex2mml, &batch, &[]),
            Ok(vec!["<math>x</math>".to_string()])
        );
        assert_eq!(
            dispatcher.invoke(&tex2svg, &batch, &[]),
            Ok(vec!["<svg>x</svg>".to_string()])
        );
    }

    #[test]
    fn resolution_failures_name_the_missing_stage() {
        let mut dispatcher = dispatcher();
        let batch = inputs(&["x"]);
        assert_eq!(
            dispatcher.invoke(&descriptor("CHTML", "TeXConverter", "tex2svg"), &batch, &[]),
            Err(MathJaxError::MissingModule("CHTML".to_string()))
        );
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "MMLConverter", "tex2svg"), &batch, &[]),
            Err(MathJaxError::MissingClass("MMLConverter".to_string()))
        );
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "Scalar", "tex2svg"), &batch, &[]),
            Err(MathJaxError::MissingClass("Scalar".to_string()))
        );
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "mml2svg"), &batch, &[]),
            Err(MathJaxError::MissingFunction("mml2svg".to_string()))
        );
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "notAFunction"), &batch, &[]),
            Err(MathJaxError::MissingFunction("notAFunction".to_string()))
        );
    }

    #[test]
    fn return_shape_errors_are_classified() {
        let mut dispatcher = dispatcher();
        let batch = inputs(&["x", "y"]);
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "silent"), &batch, &[]),
            Err(MathJaxError::ConversionUnknownError)
        );
        assert!(matches!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "numbers"), &batch, &[]),
            Err(MathJaxError::ConversionInvalidFormat(_))
        ));
        assert!(matches!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "short"), &batch, &[]),
            Err(MathJaxError::ConversionInvalidFormat(_))
        ));
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "refuse"), &batch, &[]),
            Err(MathJaxError::ConversionFailed("batch refused".to_string()))
        );
    }

    #[test]
    fn thrown_exception_does_not_leak_into_next_call() {
        let mut dispatcher = dispatcher();
        let batch = inputs(&["x"]);
        assert_eq!(
            dispatcher.invoke(&descriptor("SVG", "TeXConverter", "explode"), &batch, &[]),
            Err(MathJaxError::ScriptException("engine fault".to_string()))
        );
        let outputs = dispatcher
            .invoke(
                &descriptor("SVG", "TeXConverter", "tex2svg"),
                &batch,
                &[serde_json::json!({"em": 8})],
            )
            .expect("next call should be unaffected");
        assert_eq!(outputs, vec!["<svg data-em=\"8\">x</svg>".to_string()]);
    }

    #[test]
    fn missing_module_leaves_engine_usable() {
        let mut dispatcher = dispatcher();
        let batch = inputs(&["x"]);
        assert!(dispatcher
            .invoke(&descriptor("Nope", "TeXConverter", "tex2svg"), &batch, &[])
            .is_err());
        dispatcher
            .engine_mut()
            .evaluate("let still_alive = true;", "liveness")
            .expect("engine should still evaluate");
        assert!(dispatcher.engine().has_global("still_alive"));
    }
}
