use std::collections::BTreeSet;

use rhai::{Dynamic, Engine, EvalAltResult, FnPtr, Map, Scope, AST};
use tracing::{debug, warn};

use mj_core::{CapabilityType, MathJaxError, MathJaxResult};

use crate::bridge::{fault_message, json_to_dynamic};

pub const HOST_VERSION_CONSTANT: &str = "MATHJAX_HOST_VERSION";

/// Resource limits applied to the embedded engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_operations: 50_000_000,
            max_call_levels: 128,
            max_expr_depth: 256,
            max_function_expr_depth: 128,
            max_string_size: 16 * 1024 * 1024,
            max_array_size: 1_000_000,
            max_map_size: 100_000,
        }
    }
}

impl EngineLimits {
    fn validate(&self) -> MathJaxResult<()> {
        if self.max_operations == 0 {
            return Err(MathJaxError::EngineCreationFailed(
                "max_operations must be positive".to_string(),
            ));
        }
        if self.max_call_levels == 0 {
            return Err(MathJaxError::EngineCreationFailed(
                "max_call_levels must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owns the script engine together with its global namespace.
///
/// The namespace is the persistent scope holding the top-level constants and
/// variables of every evaluated chunk. Script functions are not shared: each
/// chunk hands back its own function library, and function pointers are called
/// against the library of the chunk that defined them.
pub struct EngineHandle {
    engine: Engine,
    scope: Scope<'static>,
    registered: BTreeSet<String>,
}

impl EngineHandle {
    pub fn create(limits: &EngineLimits) -> MathJaxResult<Self> {
        limits.validate()?;

        let mut engine = Engine::new();
        engine.set_max_operations(limits.max_operations);
        engine.set_max_call_levels(limits.max_call_levels);
        engine.set_max_expr_depths(limits.max_expr_depth, limits.max_function_expr_depth);
        engine.set_max_string_size(limits.max_string_size);
        engine.set_max_array_size(limits.max_array_size);
        engine.set_max_map_size(limits.max_map_size);
        engine.on_print(|text| debug!(target: "mathjax::script", "{}", text));
        engine.on_debug(|text, source, position| {
            debug!(
                target: "mathjax::script",
                source = source.unwrap_or("<unknown>"),
                line = position.line().unwrap_or(0),
                "{}",
                text
            )
        });

        let mut handle = Self {
            engine,
            scope: Scope::new(),
            registered: BTreeSet::new(),
        };

        let bootstrap = format!(
            "const {} = \"{}\";",
            HOST_VERSION_CONSTANT,
            env!("CARGO_PKG_VERSION")
        );
        handle
            .evaluate(&bootstrap, "<bootstrap>")
            .map_err(|error| MathJaxError::EngineCreationFailed(error.to_string()))?;

        Ok(handle)
    }

    /// Binds each type's default value as a zero-argument constructor of the same name.
    pub fn register_capability_types(&mut self, types: &[CapabilityType]) -> MathJaxResult<()> {
        for ty in types {
            let checkpoint = self.scope.len();
            let outcome = self.register_capability_type(ty);
            self.check_exception(checkpoint, outcome)
                .map_err(|error| MathJaxError::RegistrationException {
                    name: ty.name.to_string(),
                    message: fault_text(error),
                })?;
            debug!(name = ty.name, "registered capability type");
        }
        Ok(())
    }

    fn register_capability_type(&mut self, ty: &CapabilityType) -> Result<(), Box<EvalAltResult>> {
        if self.registered.contains(ty.name) {
            return Err(format!("\"{}\" is already registered", ty.name).into());
        }

        let defaults = ty
            .defaults()
            .map_err(|error| -> Box<EvalAltResult> { error.to_string().into() })?;
        let value = json_to_dynamic(&defaults)?;
        self.engine.register_fn(ty.name, move || value.clone());

        let constructed = self.engine.eval::<Dynamic>(&format!("{}()", ty.name))?;
        if !constructed.is::<Map>() {
            return Err(format!("\"{}\" did not construct an option map", ty.name).into());
        }

        self.registered.insert(ty.name.to_string());
        Ok(())
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(String::as_str)
    }

    /// Runs a chunk of source in the global namespace, tagged with `label`.
    ///
    /// Returns the functions the chunk defined.
    pub fn evaluate(&mut self, source: &str, label: &str) -> MathJaxResult<AST> {
        let checkpoint = self.scope.len();
        let outcome = self.compile_and_run(source, label);
        self.check_exception(checkpoint, outcome)
            .map_err(|error| MathJaxError::EvaluationException {
                label: label.to_string(),
                message: fault_text(error),
            })
    }

    fn compile_and_run(&mut self, source: &str, label: &str) -> Result<AST, Box<EvalAltResult>> {
        let mut ast = self.engine.compile_with_scope(&self.scope, source)?;
        ast.set_source(label);
        self.engine.run_ast_with_scope(&mut self.scope, &ast)?;
        Ok(ast.clone_functions_only())
    }

    /// Invokes a function pointer against `library`, the functions of the chunk that defined it.
    pub fn call_function(
        &mut self,
        function: &FnPtr,
        library: &AST,
        args: Vec<Dynamic>,
    ) -> MathJaxResult<Dynamic> {
        let checkpoint = self.scope.len();
        let outcome = function.call::<Dynamic>(&self.engine, library, args);
        self.check_exception(checkpoint, outcome)
    }

    pub fn global(&self, name: &str) -> Option<Dynamic> {
        self.scope.get_value::<Dynamic>(name)
    }

    pub fn has_global(&self, name: &str) -> bool {
        self.scope.contains(name)
    }

    /// The single place engine faults are read.
    ///
    /// On failure the namespace is rewound to `checkpoint`, dropping anything a
    /// partially evaluated chunk declared, and the fault becomes a `ScriptException`.
    pub fn check_exception<T>(
        &mut self,
        checkpoint: usize,
        outcome: Result<T, Box<EvalAltResult>>,
    ) -> MathJaxResult<T> {
        match outcome {
            Ok(value) => Ok(value),
            Err(fault) => {
                if self.scope.len() > checkpoint {
                    self.scope.rewind(checkpoint);
                }
                warn!(error = %fault, "script engine raised");
                Err(MathJaxError::ScriptException(fault_message(&fault)))
            }
        }
    }
}

fn fault_text(error: MathJaxError) -> String {
    match error {
        MathJaxError::ScriptException(message) => message,
        other => other.to_string(),
    }
}
