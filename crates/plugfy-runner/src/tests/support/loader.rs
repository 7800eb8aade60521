//! In-process module loading over a temporary libraries directory.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use camino::Utf8PathBuf;
use plugfy_sdk::ModuleDeclaration;
use tempfile::TempDir;

use crate::error::RunnerError;
use crate::library::{LoadedModule, ModuleDirectory, ModuleLoader};

/// File name carrying the platform's dynamic-library extension.
pub fn module_file_name(stem: &str) -> String {
    format!("{stem}.{}", std::env::consts::DLL_EXTENSION)
}

/// Loader resolving file names to declarations linked into the test binary.
#[derive(Debug, Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, ModuleDeclaration>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, file_name: &str, declaration: ModuleDeclaration) -> Self {
        self.modules.insert(file_name.to_owned(), declaration);
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &Path) -> Result<LoadedModule, RunnerError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let declaration = self
            .modules
            .get(&file_name)
            .ok_or_else(|| RunnerError::module_load(&file_name, "not an in-process module"))?;
        LoadedModule::from_declaration(file_name, declaration, None)
    }
}

/// Temporary libraries directory populated with placeholder module files.
pub struct LibraryFolder {
    dir: TempDir,
}

impl LibraryFolder {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create libraries directory"),
        }
    }

    pub fn touch(&self, file_name: &str) -> &Self {
        fs::write(self.dir.path().join(file_name), b"placeholder").expect("write module file");
        self
    }

    pub fn path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 temp path")
    }

    pub fn directory(&self, loader: StaticModuleLoader) -> ModuleDirectory {
        ModuleDirectory::new(self.path(), Arc::new(loader))
    }
}
