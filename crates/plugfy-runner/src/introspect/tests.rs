//! Unit tests for module introspection.

use std::collections::BTreeSet;

use plugfy_sdk::TypeName;
use rstest::{fixture, rstest};

use super::*;
use crate::tests::support::{
    LibraryFolder, StaticModuleLoader, WIDGET_CLASS, module_file_name, widget_declaration,
};

#[fixture]
fn folder() -> LibraryFolder {
    let folder = LibraryFolder::new();
    folder
        .touch(&module_file_name("widgets"))
        .touch(&module_file_name("spare"))
        .touch("readme.md");
    folder
}

fn introspector(folder: &LibraryFolder) -> Introspector {
    let loader =
        StaticModuleLoader::new().with_module(&module_file_name("widgets"), widget_declaration());
    Introspector::new(folder.directory(loader))
}

fn names<'a>(items: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    items.map(str::to_owned).collect()
}

#[rstest]
fn lists_every_module_file(folder: LibraryFolder) {
    let listed = introspector(&folder).list_modules().expect("list");
    assert_eq!(
        names(listed.iter().map(String::as_str)),
        names([module_file_name("widgets"), module_file_name("spare")].iter().map(String::as_str))
    );
}

#[test]
fn listing_missing_directory_fails() {
    let folder = LibraryFolder::new();
    let loader = StaticModuleLoader::new();
    let introspector = Introspector::new(crate::library::ModuleDirectory::new(
        folder.path().join("absent"),
        std::sync::Arc::new(loader),
    ));
    let err = introspector.list_modules().expect_err("missing directory");
    assert_eq!(err.kind(), "DirectoryNotFoundError");
}

#[rstest]
fn describes_registered_classes(folder: LibraryFolder) {
    let descriptor = introspector(&folder)
        .describe_module(&module_file_name("widgets"))
        .expect("describe");
    assert_eq!(descriptor.full_name(), "fixture-widgets, Version=1.2.3");
    assert_eq!(
        names(descriptor.types().iter().map(|ty| ty.name())),
        names([WIDGET_CLASS, "Fixture.NoDefault"].into_iter())
    );

    let widget = descriptor
        .types()
        .iter()
        .find(|ty| ty.name() == WIDGET_CLASS)
        .expect("widget type");
    let methods = names(widget.methods().iter().map(|method| method.name()));
    for expected in ["Label", "Echo", "Progress", "Pick", "Kind"] {
        assert!(methods.contains(expected), "missing method {expected}");
    }
    let kind = widget
        .methods()
        .iter()
        .find(|method| method.name() == "Kind")
        .expect("static method");
    assert!(kind.is_static());
    assert_eq!(kind.return_type(), TypeName::String);

    let field = widget.fields().first().expect("field");
    assert_eq!(field.name(), "Label");
    let event = widget.events().first().expect("event");
    assert_eq!(event.name(), "Progressed");
    assert_eq!(event.event_handler_type(), "Fn(i64 step, String label)");
}

#[rstest]
fn describing_twice_yields_the_same_names(folder: LibraryFolder) {
    let introspector = introspector(&folder);
    let first = introspector
        .describe_module(&module_file_name("widgets"))
        .expect("first");
    let second = introspector
        .describe_module(&module_file_name("widgets"))
        .expect("second");
    assert_eq!(first, second);
}

#[rstest]
#[case("absent.so", "ModuleNotFoundError")]
#[case("../widgets.so", "InvalidModuleNameError")]
fn describe_reports_resolution_failures(
    folder: LibraryFolder,
    #[case] name: &str,
    #[case] kind: &str,
) {
    let err = introspector(&folder)
        .describe_module(name)
        .expect_err("should fail");
    assert_eq!(err.kind(), kind);
}

#[rstest]
fn describe_reports_unloadable_modules(folder: LibraryFolder) {
    let err = introspector(&folder)
        .describe_module(&module_file_name("spare"))
        .expect_err("not loadable");
    assert_eq!(err.kind(), "ModuleLoadError");
}
