//! Sample Plugfy module.
//!
//! Provides `Sample.Calculator`, a small integer calculator that raises a
//! `Computed` event for every arithmetic result and a `Tick` event while
//! counting down. `Crash` panics on purpose, to show that a failing module
//! does not take the runner down with it. Build the crate and drop the
//! resulting dynamic library into the runner's libraries directory to try it
//! out.

use plugfy_sdk::{
    Arguments, ClassBuilder, EventEmitter, InvocationFailure, ModuleDeclaration, ModuleRegistrar,
    TypeName,
};
use serde_json::{Value, json};

/// Fully qualified name of the calculator class.
pub const CALCULATOR_CLASS: &str = "Sample.Calculator";

/// Event raised with `(operation, result)` after each arithmetic method.
pub const COMPUTED_EVENT: &str = "Computed";

/// Event raised with the remaining count while counting down.
pub const TICK_EVENT: &str = "Tick";

struct Calculator {
    memory: i64,
    emitter: EventEmitter,
}

impl Calculator {
    fn new(memory: i64, emitter: &EventEmitter) -> Self {
        Self {
            memory,
            emitter: emitter.clone(),
        }
    }

    fn computed(&self, operation: &str, result: i64) -> Result<Value, InvocationFailure> {
        self.emitter
            .raise(COMPUTED_EVENT, vec![json!(operation), json!(result)])?;
        Ok(json!(result))
    }
}

fn operands(arguments: &Arguments) -> Result<(i64, i64), InvocationFailure> {
    Ok((arguments.get(0)?, arguments.get(1)?))
}

fn overflow(operation: &str) -> InvocationFailure {
    InvocationFailure::new(format!("{operation} overflowed"))
}

/// Registers the module's classes.
pub fn register(registrar: &mut dyn ModuleRegistrar) {
    let pair = [("left", TypeName::I64), ("right", TypeName::I64)];
    registrar.register_class(
        ClassBuilder::<Calculator>::new(CALCULATOR_CLASS)
            .constructor(&[], |_, emitter| Ok(Calculator::new(0, emitter)))
            .constructor(&[("memory", TypeName::I64)], |arguments, emitter| {
                Ok(Calculator::new(arguments.get(0)?, emitter))
            })
            .method("Add", &pair, TypeName::I64, |calculator, arguments| {
                let (left, right) = operands(arguments)?;
                let sum = left.checked_add(right).ok_or_else(|| overflow("Add"))?;
                calculator.computed("Add", sum)
            })
            .method("Subtract", &pair, TypeName::I64, |calculator, arguments| {
                let (left, right) = operands(arguments)?;
                let difference = left
                    .checked_sub(right)
                    .ok_or_else(|| overflow("Subtract"))?;
                calculator.computed("Subtract", difference)
            })
            .method("Divide", &pair, TypeName::I64, |calculator, arguments| {
                let (left, right) = operands(arguments)?;
                if right == 0 {
                    return Err(InvocationFailure::new("Attempted to divide by zero."));
                }
                let quotient = left.checked_div(right).ok_or_else(|| overflow("Divide"))?;
                calculator.computed("Divide", quotient)
            })
            .method(
                "Store",
                &[("value", TypeName::I64)],
                TypeName::Unit,
                |calculator, arguments| {
                    calculator.memory = arguments.get(0)?;
                    Ok(Value::Null)
                },
            )
            .method("Recall", &[], TypeName::I64, |calculator, _| {
                Ok(json!(calculator.memory))
            })
            .method(
                "Countdown",
                &[("from", TypeName::U32)],
                TypeName::U32,
                |calculator, arguments| {
                    let from: u32 = arguments.get(0)?;
                    for remaining in (0..from).rev() {
                        calculator.emitter.raise(TICK_EVENT, vec![json!(remaining)])?;
                    }
                    Ok(json!(from))
                },
            )
            .method(
                "Crash",
                &[("message", TypeName::String)],
                TypeName::Unit,
                |_, arguments| {
                    let message: String = arguments.get(0)?;
                    panic!("{message}")
                },
            )
            .static_method("Version", &[], TypeName::String, |_| {
                Ok(json!(env!("CARGO_PKG_VERSION")))
            })
            .field("Memory", TypeName::I64)
            .event(
                COMPUTED_EVENT,
                &[("operation", TypeName::String), ("result", TypeName::I64)],
            )
            .event(TICK_EVENT, &[("remaining", TypeName::U32)])
            .build(),
    );
}

plugfy_sdk::export_module!(
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    register: register,
);

/// The exported declaration, for hosts linking the crate.
#[must_use]
pub fn declaration() -> ModuleDeclaration {
    PLUGFY_MODULE_DECLARATION
}
