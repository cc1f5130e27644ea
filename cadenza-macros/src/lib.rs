//! Attribute macros for the Cadenza runtime.
//!
//! Both macros turn an `async fn` into a plain `fn` that builds a runtime
//! and blocks on the original body. They accept the same options as
//! `RuntimeBuilder`:
//!
//! ```rust,ignore
//! #[cadenza::main(max_tasks = 128, name = "server")]
//! async fn main() {}
//! ```
//!
//! A runtime failure such as a deadlock panics with the error.

mod utils;

use proc_macro::TokenStream;
use utils::{RuntimeArgs, compile_error, wrap_body};

/// Runs an `async fn main` on a fresh runtime.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    match RuntimeArgs::parse(attr) {
        Ok(args) => wrap_body(item, &args),
        Err(msg) => compile_error(&msg),
    }
}

/// Runs an `async fn` test on its own runtime.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match RuntimeArgs::parse(attr) {
        Ok(args) => args,
        Err(msg) => return compile_error(&msg),
    };

    let mut result: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    result.extend(wrap_body(item, &args));
    result
}
