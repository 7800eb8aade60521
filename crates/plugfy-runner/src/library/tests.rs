//! Unit tests for module loading and directory resolution.

use std::collections::BTreeSet;
use std::fs;

use rstest::{fixture, rstest};

use super::*;
use crate::tests::support::{LibraryFolder, StaticModuleLoader, module_file_name, widget_declaration};

#[fixture]
fn folder() -> LibraryFolder {
    let folder = LibraryFolder::new();
    folder
        .touch(&module_file_name("widgets"))
        .touch(&module_file_name("other"))
        .touch("notes.txt");
    folder
}

fn loader() -> StaticModuleLoader {
    StaticModuleLoader::new().with_module(&module_file_name("widgets"), widget_declaration())
}

#[rstest]
fn list_returns_only_module_files(folder: LibraryFolder) {
    let directory = folder.directory(loader());
    let listed: BTreeSet<String> = directory.list().expect("list").into_iter().collect();
    let expected: BTreeSet<String> = [module_file_name("widgets"), module_file_name("other")]
        .into_iter()
        .collect();
    assert_eq!(listed, expected);
}

#[test]
fn list_reports_missing_directory() {
    let folder = LibraryFolder::new();
    let missing = folder.path().join("absent");
    let directory = ModuleDirectory::new(missing.clone(), Arc::new(loader()));
    let err = directory.list().expect_err("missing directory");
    assert!(matches!(err, RunnerError::DirectoryNotFound { path } if path == missing));
}

#[rstest]
fn list_skips_subdirectories(folder: LibraryFolder) {
    fs::create_dir(folder.path().join(module_file_name("nested"))).expect("create dir");
    let listed = folder.directory(loader()).list().expect("list");
    assert_eq!(listed.len(), 2);
}

#[rstest]
#[case("")]
#[case(".")]
#[case("..")]
#[case("../escape.so")]
#[case("nested/module.so")]
#[case("/etc/passwd")]
fn rejects_non_plain_names(#[case] name: &str) {
    let err = validate_module_name(name).expect_err("name should be rejected");
    assert_eq!(err.kind(), "InvalidModuleNameError");
}

#[test]
fn accepts_plain_file_names() {
    validate_module_name("libcalculator.so").expect("plain name");
}

#[rstest]
fn load_collects_registrations(folder: LibraryFolder) {
    let module = folder
        .directory(loader())
        .load(&module_file_name("widgets"))
        .expect("load");
    assert_eq!(module.full_name(), "fixture-widgets, Version=1.2.3");
    assert_eq!(module.file_name(), module_file_name("widgets"));
    assert!(module.class("Fixture.Widget").is_some());
    assert!(module.class("fixture.widget").is_none());
}

#[rstest]
fn load_reports_missing_module(folder: LibraryFolder) {
    let err = folder
        .directory(loader())
        .load(&module_file_name("absent"))
        .expect_err("missing module");
    assert_eq!(err.kind(), "ModuleNotFoundError");
}

#[rstest]
fn dynamic_loader_rejects_non_libraries(folder: LibraryFolder) {
    let path = folder.path().join(module_file_name("other"));
    let err = DynamicLibraryLoader
        .load(path.as_std_path())
        .expect_err("placeholder file is not a library");
    assert!(matches!(err, RunnerError::ModuleLoad { ref name, .. } if *name == module_file_name("other")));
}

fn abandon_registration(registrar: &mut dyn plugfy_sdk::ModuleRegistrar) {
    registrar.abort(plugfy_sdk::InvocationFailure::new("config file missing"));
}

#[test]
fn aborted_registration_fails_the_load() {
    let declaration = ModuleDeclaration::new("abandoned", "0.1.0", abandon_registration);
    let err = LoadedModule::from_declaration("abandoned.so", &declaration, None)
        .expect_err("registration aborted");
    assert!(matches!(
        err,
        RunnerError::ModuleLoad { ref message, .. } if message.contains("config file missing")
    ));
}
