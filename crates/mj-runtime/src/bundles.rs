use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhai::AST;
use tracing::{debug, info};
use walkdir::WalkDir;

use mj_core::{MathJaxError, MathJaxResult, OutputFormat};

use crate::engine::EngineHandle;

/// Supplies the script bundle for each output format.
pub trait BundleLocator: Send + Sync {
    /// Resource locator for `format`, or `None` if it cannot be resolved.
    fn locate(&self, format: OutputFormat) -> Option<String>;

    fn read(&self, locator: &str) -> io::Result<Vec<u8>>;
}

/// Finds `<format>.bundle.rhai` files anywhere under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryBundleLocator {
    root: PathBuf,
    bundles: BTreeMap<OutputFormat, PathBuf>,
}

impl DirectoryBundleLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut paths = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect::<Vec<_>>();
        paths.sort();

        let mut bundles = BTreeMap::new();
        for path in paths {
            let Some(format) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(OutputFormat::from_bundle_file_name)
            else {
                continue;
            };
            bundles.entry(format).or_insert(path);
        }

        debug!(
            root = %root.display(),
            found = bundles.len(),
            "scanned bundle directory"
        );
        Self { root, bundles }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BundleLocator for DirectoryBundleLocator {
    fn locate(&self, format: OutputFormat) -> Option<String> {
        self.bundles
            .get(&format)
            .map(|path| path.to_string_lossy().into_owned())
    }

    fn read(&self, locator: &str) -> io::Result<Vec<u8>> {
        fs::read(locator)
    }
}

/// Bundles held in memory, keyed by format.
#[derive(Debug, Clone, Default)]
pub struct StaticBundleLocator {
    bundles: BTreeMap<OutputFormat, (String, Vec<u8>)>,
}

impl StaticBundleLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(
        mut self,
        format: OutputFormat,
        locator: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.bundles
            .insert(format, (locator.into(), content.into()));
        self
    }
}

impl BundleLocator for StaticBundleLocator {
    fn locate(&self, format: OutputFormat) -> Option<String> {
        self.bundles.get(&format).map(|(locator, _)| locator.clone())
    }

    fn read(&self, locator: &str) -> io::Result<Vec<u8>> {
        self.bundles
            .values()
            .find(|(name, _)| name == locator)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, locator.to_string()))
    }
}

/// Tracks which formats have been evaluated into one engine, with each format's functions.
pub struct BundleRegistry {
    locator: Arc<dyn BundleLocator>,
    libraries: BTreeMap<OutputFormat, AST>,
}

impl BundleRegistry {
    pub fn new(locator: Arc<dyn BundleLocator>) -> Self {
        Self {
            locator,
            libraries: BTreeMap::new(),
        }
    }

    pub fn is_loaded(&self, format: OutputFormat) -> bool {
        self.libraries.contains_key(&format)
    }

    pub fn loaded(&self) -> impl Iterator<Item = OutputFormat> + '_ {
        self.libraries.keys().copied()
    }

    /// Functions defined by the bundle for `format`, once it is loaded.
    pub fn library(&self, format: OutputFormat) -> Option<&AST> {
        self.libraries.get(&format)
    }

    /// Evaluates the bundle for `format` unless it already is; failed loads stay unmarked.
    pub fn ensure_loaded(
        &mut self,
        format: OutputFormat,
        engine: &mut EngineHandle,
    ) -> MathJaxResult<()> {
        if self.libraries.contains_key(&format) {
            return Ok(());
        }

        let locator =
            self.locator
                .locate(format)
                .ok_or_else(|| MathJaxError::MissingBundleResource {
                    locator: format.bundle_file_name(),
                })?;
        let missing = || MathJaxError::MissingBundleResource {
            locator: locator.clone(),
        };
        let content = self.locator.read(&locator).map_err(|_| missing())?;
        let source = String::from_utf8(content).map_err(|_| missing())?;

        let library = engine.evaluate(&source, &locator)?;
        self.libraries.insert(format, library);
        info!(format = %format, locator = %locator, "loaded bundle");
        Ok(())
    }
}
