//! CLI command implementations.

pub mod codes;
pub mod demo;
pub mod race;
pub mod stress;

use ts3_bridge::{final_code, CallError, ReturnCode};

/// Print one step of a command and return its final code.
pub(crate) fn report<T>(step: &str, result: &Result<T, CallError>) -> ReturnCode {
    let code = final_code(result);
    match result {
        Ok(_) => println!("  {:<32} {}", step, code),
        Err(e) => println!("  {:<32} {} ({})", step, code, e),
    }
    code
}
