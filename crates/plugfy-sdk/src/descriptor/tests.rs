//! Unit tests for descriptor wire shapes.

use serde_json::json;

use super::*;

fn sample_type() -> TypeDescriptor {
    TypeDescriptor::new(
        "Sample.Calculator",
        vec![MethodDescriptor::new(
            "Add",
            TypeName::I64,
            parameters(&[("a", TypeName::I64), ("b", TypeName::I64)]),
            false,
        )],
        vec![FieldDescriptor::new("Precision", TypeName::U8, true)],
        vec![EventDescriptor::new(
            "Computed",
            parameters(&[("result", TypeName::I64)]),
        )],
    )
}

#[test]
fn event_handler_type_lists_parameters() {
    let event = EventDescriptor::new(
        "Progress",
        parameters(&[("step", TypeName::U32), ("label", TypeName::String)]),
    );
    assert_eq!(event.event_handler_type(), "Fn(u32 step, String label)");
}

#[test]
fn parameterless_event_has_empty_signature() {
    let event = EventDescriptor::new("Reset", Vec::new());
    assert_eq!(event.event_handler_type(), "Fn()");
}

#[test]
fn module_serialises_with_pascal_case_keys() {
    let module = ModuleDescriptor::new("plugfy-sample, Version=0.1.0", vec![sample_type()]);
    let encoded = serde_json::to_value(&module).expect("serialise");

    assert_eq!(
        encoded,
        json!({
            "FullName": "plugfy-sample, Version=0.1.0",
            "Types": [{
                "Name": "Sample.Calculator",
                "Methods": [{
                    "Name": "Add",
                    "ReturnType": "i64",
                    "Parameters": [
                        {"Name": "a", "Type": "i64"},
                        {"Name": "b", "Type": "i64"}
                    ],
                    "IsStatic": false
                }],
                "Fields": [{"Name": "Precision", "FieldType": "u8", "IsStatic": true}],
                "Events": [{
                    "Name": "Computed",
                    "EventHandlerType": "Fn(i64 result)",
                    "Parameters": [{"Name": "result", "Type": "i64"}]
                }]
            }]
        })
    );
}

#[test]
fn arity_counts_parameters() {
    let ty = sample_type();
    let add = ty.methods().first().expect("method");
    assert_eq!(add.arity(), 2);
    assert!(!add.is_static());
}
