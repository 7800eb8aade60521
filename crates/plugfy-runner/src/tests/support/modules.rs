//! Fixture modules: widgets for invocation paths and a transport plugin.

use plugfy_sdk::{
    ClassBuilder, EventEmitter, InvocationFailure, ModuleDeclaration, ModuleRegistrar, Transport,
    TypeName,
};
use serde_json::json;

use super::RecordingTransport;

pub const WIDGET_CLASS: &str = "Fixture.Widget";

struct Widget {
    label: String,
    emitter: EventEmitter,
}

fn register(registrar: &mut dyn ModuleRegistrar) {
    registrar.register_class(
        ClassBuilder::<Widget>::new(WIDGET_CLASS)
            .constructor(&[], |_, emitter| {
                Ok(Widget {
                    label: "default".into(),
                    emitter: emitter.clone(),
                })
            })
            .constructor(&[("label", TypeName::String)], |arguments, emitter| {
                Ok(Widget {
                    label: arguments.get(0)?,
                    emitter: emitter.clone(),
                })
            })
            .method("Label", &[], TypeName::String, |widget, _| {
                Ok(json!(widget.label))
            })
            .method("Echo", &[("value", TypeName::Value)], TypeName::Value, |_, arguments| {
                Ok(arguments.value(0).cloned().unwrap_or_default())
            })
            .method("Count", &[("amount", TypeName::I32)], TypeName::I32, |_, arguments| {
                Ok(json!(arguments.get::<i32>(0)?))
            })
            .method("Fail", &[], TypeName::Unit, |_, _| {
                Err(InvocationFailure::new("widget failure"))
            })
            .method("Panic", &[], TypeName::Unit, |_, _| -> Result<_, InvocationFailure> {
                panic!("widget panicked")
            })
            .method("Nothing", &[], TypeName::Unit, |_, _| Ok(serde_json::Value::Null))
            .method("Progress", &[("steps", TypeName::I64)], TypeName::I64, |widget, arguments| {
                let steps = arguments.get::<i64>(0)?;
                for step in 1..=steps {
                    widget
                        .emitter
                        .raise("Progressed", vec![json!(step), json!(widget.label)])?;
                }
                Ok(json!(steps))
            })
            .method("Pick", &[], TypeName::String, |_, _| Ok(json!("first")))
            .method("Pick", &[("choice", TypeName::String)], TypeName::String, |_, _| {
                Ok(json!("second"))
            })
            .static_method("Kind", &[], TypeName::String, |_| Ok(json!("widget")))
            .field("Label", TypeName::String)
            .event(
                "Progressed",
                &[("step", TypeName::I64), ("label", TypeName::String)],
            )
            .build(),
    );
    registrar.register_class(
        ClassBuilder::<()>::new("Fixture.NoDefault")
            .constructor(&[("seed", TypeName::I64)], |_, _| Ok(()))
            .method("Run", &[], TypeName::Unit, |_, _| Ok(serde_json::Value::Null))
            .build(),
    );
}

/// Declaration of the fixture module.
pub const fn widget_declaration() -> ModuleDeclaration {
    ModuleDeclaration::new("fixture-widgets", "1.2.3", register)
}

fn recording_transport() -> Box<dyn Transport> {
    Box::new(RecordingTransport::default())
}

fn register_transport(registrar: &mut dyn ModuleRegistrar) {
    registrar.register_transport(recording_transport);
}

/// Declaration of a transport plugin providing `Recording`.
pub const fn transport_declaration() -> ModuleDeclaration {
    ModuleDeclaration::new("fixture-transport", "0.0.1", register_transport)
}
