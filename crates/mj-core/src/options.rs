use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An option shape the host exposes to bundles under a fixed type name.
pub trait OptionsType: Serialize + Default {
    const TYPE_NAME: &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct CapabilityType {
    pub name: &'static str,
    defaults: fn() -> serde_json::Result<Value>,
}

impl CapabilityType {
    pub fn of<T: OptionsType>() -> Self {
        Self {
            name: T::TYPE_NAME,
            defaults: default_value::<T>,
        }
    }

    pub fn custom(name: &'static str, defaults: fn() -> serde_json::Result<Value>) -> Self {
        Self { name, defaults }
    }

    pub fn defaults(&self) -> serde_json::Result<Value> {
        (self.defaults)()
    }
}

fn default_value<T: OptionsType>() -> serde_json::Result<Value> {
    serde_json::to_value(T::default())
}

pub fn capability_types() -> Vec<CapabilityType> {
    vec![
        CapabilityType::of::<ConversionOptions>(),
        CapabilityType::of::<DocumentOptions>(),
        CapabilityType::of::<TexInputProcessorOptions>(),
        CapabilityType::of::<MmlInputProcessorOptions>(),
        CapabilityType::of::<AsciiMathInputProcessorOptions>(),
        CapabilityType::of::<ChtmlOutputProcessorOptions>(),
        CapabilityType::of::<SvgOutputProcessorOptions>(),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversionOptions {
    pub display: bool,
    pub em: f64,
    pub ex: f64,
    pub container_width: f64,
    pub line_width: f64,
    pub scale: f64,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            display: true,
            em: 16.0,
            ex: 8.0,
            container_width: 80.0 * 16.0,
            line_width: 1_000_000.0,
            scale: 1.0,
        }
    }
}

impl OptionsType for ConversionOptions {
    const TYPE_NAME: &'static str = "ConversionOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentOptions {
    pub skip_html_tags: Vec<String>,
    pub include_html_tags: Vec<String>,
    pub ignore_html_class: String,
    pub process_html_class: String,
    pub enable_assistive_mml: bool,
    pub enable_enrichment: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            skip_html_tags: [
                "script", "noscript", "style", "textarea", "pre", "code", "annotation",
                "annotation-xml",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            include_html_tags: vec!["br".to_string(), "wbr".to_string()],
            ignore_html_class: "mathjax_ignore".to_string(),
            process_html_class: "mathjax_process".to_string(),
            enable_assistive_mml: false,
            enable_enrichment: false,
        }
    }
}

impl OptionsType for DocumentOptions {
    const TYPE_NAME: &'static str = "DocumentOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TexInputProcessorOptions {
    pub packages: Vec<String>,
    pub inline_math: Vec<[String; 2]>,
    pub display_math: Vec<[String; 2]>,
    pub process_escapes: bool,
    pub process_environments: bool,
    pub process_refs: bool,
    pub digits: String,
    pub tags: String,
    pub tag_side: String,
    pub tag_indent: String,
    pub use_label_ids: bool,
    pub max_macros: u32,
    pub max_buffer: u32,
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
}

fn delimiters(pairs: &[(&str, &str)]) -> Vec<[String; 2]> {
    pairs
        .iter()
        .map(|(open, close)| [open.to_string(), close.to_string()])
        .collect()
}

impl Default for TexInputProcessorOptions {
    fn default() -> Self {
        Self {
            packages: vec!["base".to_string()],
            inline_math: delimiters(&[("\\(", "\\)")]),
            display_math: delimiters(&[("$$", "$$"), ("\\[", "\\]")]),
            process_escapes: true,
            process_environments: true,
            process_refs: true,
            digits: r"^(?:[0-9]+(?:\{,\}[0-9]{3})*(?:\.[0-9]*)?|\.[0-9]+)".to_string(),
            tags: "none".to_string(),
            tag_side: "right".to_string(),
            tag_indent: "0.8em".to_string(),
            use_label_ids: true,
            max_macros: 10_000,
            max_buffer: 5 * 1024,
            base_url: None,
        }
    }
}

impl OptionsType for TexInputProcessorOptions {
    const TYPE_NAME: &'static str = "TexInputProcessorOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MmlVerifyOptions {
    pub check_arity: bool,
    pub check_attributes: bool,
    pub full_errors: bool,
    pub fix_mmultiscripts: bool,
    pub fix_mtables: bool,
}

impl Default for MmlVerifyOptions {
    fn default() -> Self {
        Self {
            check_arity: true,
            check_attributes: false,
            full_errors: false,
            fix_mmultiscripts: true,
            fix_mtables: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MmlInputProcessorOptions {
    pub parse_as: String,
    pub force_reparse: bool,
    pub verify: MmlVerifyOptions,
}

impl Default for MmlInputProcessorOptions {
    fn default() -> Self {
        Self {
            parse_as: "html".to_string(),
            force_reparse: false,
            verify: MmlVerifyOptions::default(),
        }
    }
}

impl OptionsType for MmlInputProcessorOptions {
    const TYPE_NAME: &'static str = "MmlInputProcessorOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiMathInputProcessorOptions {
    pub fixphi: bool,
    pub displaystyle: bool,
    pub decimalsign: String,
}

impl Default for AsciiMathInputProcessorOptions {
    fn default() -> Self {
        Self {
            fixphi: true,
            displaystyle: true,
            decimalsign: ".".to_string(),
        }
    }
}

impl OptionsType for AsciiMathInputProcessorOptions {
    const TYPE_NAME: &'static str = "AsciiMathInputProcessorOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChtmlOutputProcessorOptions {
    pub scale: f64,
    pub min_scale: f64,
    pub mtext_inherit_font: bool,
    pub merror_inherit_font: bool,
    pub mtext_font: String,
    pub merror_font: String,
    pub mathml_spacing: bool,
    pub skip_attributes: Vec<String>,
    pub ex_factor: f64,
    pub display_align: String,
    pub display_indent: String,
    pub match_font_height: bool,
    #[serde(rename = "fontURL")]
    pub font_url: String,
    #[serde(rename = "adaptiveCSS")]
    pub adaptive_css: bool,
}

impl Default for ChtmlOutputProcessorOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            min_scale: 0.5,
            mtext_inherit_font: false,
            merror_inherit_font: true,
            mtext_font: String::new(),
            merror_font: "serif".to_string(),
            mathml_spacing: false,
            skip_attributes: Vec::new(),
            ex_factor: 0.5,
            display_align: "center".to_string(),
            display_indent: "0".to_string(),
            match_font_height: true,
            font_url: "https://cdn.jsdelivr.net/npm/mathjax-full@3.2.2/es5/output/chtml/fonts/woff-v2"
                .to_string(),
            adaptive_css: true,
        }
    }
}

impl OptionsType for ChtmlOutputProcessorOptions {
    const TYPE_NAME: &'static str = "ChtmlOutputProcessorOptions";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SvgOutputProcessorOptions {
    pub scale: f64,
    pub min_scale: f64,
    pub mtext_inherit_font: bool,
    pub merror_inherit_font: bool,
    pub mathml_spacing: bool,
    pub skip_attributes: Vec<String>,
    pub ex_factor: f64,
    pub display_align: String,
    pub display_indent: String,
    pub font_cache: String,
    pub internal_speech_titles: bool,
}

impl Default for SvgOutputProcessorOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            min_scale: 0.5,
            mtext_inherit_font: false,
            merror_inherit_font: true,
            mathml_spacing: false,
            skip_attributes: Vec::new(),
            ex_factor: 0.5,
            display_align: "center".to_string(),
            display_indent: "0".to_string(),
            font_cache: "local".to_string(),
            internal_speech_titles: true,
        }
    }
}

impl OptionsType for SvgOutputProcessorOptions {
    const TYPE_NAME: &'static str = "SvgOutputProcessorOptions";
}
