use serde_json::Value;

use mj_core::{
    parse_chtml, parse_mathml, parse_svg, AsciiMathInputProcessorOptions, ConversionOptions,
    FunctionDescriptor, MathJaxError, MathJaxResult, MmlInputProcessorOptions, OutputFormat,
    TexInputProcessorOptions,
};

use crate::arguments::{ChtmlArguments, MmlArguments, SvgArguments};

pub const TEX2CHTML: FunctionDescriptor = FunctionDescriptor {
    name: "tex2chtml",
    module_name: "CHTML",
    class_name: "TeXConverter",
    owning_format: OutputFormat::Chtml,
    output_parser: parse_chtml,
};

pub const MML2CHTML: FunctionDescriptor = FunctionDescriptor {
    name: "mml2chtml",
    module_name: "CHTML",
    class_name: "MMLConverter",
    owning_format: OutputFormat::Chtml,
    output_parser: parse_chtml,
};

pub const AM2CHTML: FunctionDescriptor = FunctionDescriptor {
    name: "am2chtml",
    module_name: "CHTML",
    class_name: "AsciiMathConverter",
    owning_format: OutputFormat::Chtml,
    output_parser: parse_chtml,
};

pub const TEX2MML: FunctionDescriptor = FunctionDescriptor {
    name: "tex2mml",
    module_name: "MML",
    class_name: "TeXConverter",
    owning_format: OutputFormat::Mml,
    output_parser: parse_mathml,
};

pub const AM2MML: FunctionDescriptor = FunctionDescriptor {
    name: "am2mml",
    module_name: "MML",
    class_name: "AsciiMathConverter",
    owning_format: OutputFormat::Mml,
    output_parser: parse_mathml,
};

pub const TEX2SVG: FunctionDescriptor = FunctionDescriptor {
    name: "tex2svg",
    module_name: "SVG",
    class_name: "TeXConverter",
    owning_format: OutputFormat::Svg,
    output_parser: parse_svg,
};

pub const MML2SVG: FunctionDescriptor = FunctionDescriptor {
    name: "mml2svg",
    module_name: "SVG",
    class_name: "MMLConverter",
    owning_format: OutputFormat::Svg,
    output_parser: parse_svg,
};

pub const FUNCTIONS: [FunctionDescriptor; 7] = [
    TEX2CHTML, MML2CHTML, AM2CHTML, TEX2MML, AM2MML, TEX2SVG, MML2SVG,
];

pub fn descriptor(name: &str) -> Option<&'static FunctionDescriptor> {
    FUNCTIONS.iter().find(|function| function.name == name)
}

/// Default extra arguments for `descriptor`, with `conversion` overriding the conversion options.
pub fn default_arguments(
    descriptor: &FunctionDescriptor,
    conversion: ConversionOptions,
) -> MathJaxResult<Vec<Value>> {
    let input = match descriptor.name.split('2').next() {
        Some("tex") => serde_json::to_value(TexInputProcessorOptions::default()),
        Some("mml") => serde_json::to_value(MmlInputProcessorOptions::default()),
        Some("am") => serde_json::to_value(AsciiMathInputProcessorOptions::default()),
        _ => Ok(Value::Object(Default::default())),
    }
    .map_err(|error| MathJaxError::ScriptException(error.to_string()))?;

    match descriptor.owning_format {
        OutputFormat::Chtml => ChtmlArguments {
            conversion,
            ..ChtmlArguments::default()
        }
        .extra_arguments(&input),
        OutputFormat::Svg => SvgArguments {
            conversion,
            ..SvgArguments::default()
        }
        .extra_arguments(&input),
        OutputFormat::Mml => MmlArguments {
            conversion,
            ..MmlArguments::default()
        }
        .extra_arguments(&input),
    }
}

#[cfg(test)]
mod functions_tests {
    use super::*;

    #[test]
    fn descriptor_finds_every_catalog_entry() {
        for function in FUNCTIONS {
            assert_eq!(descriptor(function.name).copied(), Some(function));
        }
        assert!(descriptor("tex2png").is_none());
    }

    #[test]
    fn catalog_modules_match_owning_formats() {
        for function in FUNCTIONS {
            assert_eq!(
                function.module_name.to_ascii_lowercase(),
                function.owning_format.name()
            );
        }
    }

    #[test]
    fn default_arguments_match_function_family() {
        let chtml = default_arguments(&TEX2CHTML, ConversionOptions::default())
            .expect("chtml arguments");
        assert_eq!(chtml.len(), 8);
        assert!(chtml[6].get("packages").is_some());

        let mml = default_arguments(
            &AM2MML,
            ConversionOptions {
                display: false,
                ..ConversionOptions::default()
            },
        )
        .expect("mml arguments");
        assert_eq!(mml.len(), 3);
        assert_eq!(mml[0]["display"], false);
        assert_eq!(mml[2]["decimalsign"], ".");

        let svg = default_arguments(&MML2SVG, ConversionOptions::default()).expect("svg arguments");
        assert!(svg[6].get("parseAs").is_some());
    }
}
