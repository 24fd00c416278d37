mod arguments;
mod functions;
mod instance;
mod worker;

pub use arguments::{ChtmlArguments, MmlArguments, RenderArguments, SvgArguments};
pub use functions::{
    default_arguments, descriptor, AM2CHTML, AM2MML, FUNCTIONS, MML2CHTML, MML2SVG, TEX2CHTML,
    TEX2MML, TEX2SVG,
};
pub use instance::{MathJax, MathJaxOptions};
pub use worker::MathJaxWorker;
