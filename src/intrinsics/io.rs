use crate::error::Result;
use crate::intrinsics::string::display;
use crate::value::{CallScope, Value};

fn join(args: &[Value]) -> String {
    args.iter().map(display).collect::<Vec<_>>().join(" ")
}

/// print : a... -> nil
pub fn print(scope: CallScope<'_>) -> Result<Value> {
    print!("{}", join(&scope.args));
    Ok(Value::Null)
}

/// println : a... -> nil
pub fn println(scope: CallScope<'_>) -> Result<Value> {
    println!("{}", join(&scope.args));
    Ok(Value::Null)
}
