pub mod error;
pub mod metadata;
pub mod options;
pub mod output;
pub mod types;

pub use error::{MathJaxError, MathJaxResult};
pub use metadata::{
    Metadata, VersionGate, EXPECTED_LIBRARY_VERSION, LIBRARY_DEPENDENCY_NAME,
};
pub use options::*;
pub use output::{parse_chtml, parse_mathml, parse_svg, passthrough};
pub use types::*;
