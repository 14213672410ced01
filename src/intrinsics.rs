//! Built-in functions. Each one receives its already evaluated arguments through a [CallScope]
//! and is registered by name in [Environment::register_intrinsics].
//!
//! [CallScope]: crate::value::CallScope
//! [Environment::register_intrinsics]: crate::environment::Environment::register_intrinsics

pub mod cmp;
pub mod codec;
pub mod hashmap;
pub mod io;
pub mod list;
pub mod num;
pub mod rt;
pub mod string;
pub mod vec;
