//! Entry point for the csvw-validate binary.
//!
//! Delegates to [`csvw_validate::run()`] and translates its `Result` into
//! process exit codes: `0` on success, `1` on any error.

fn main() {
    if csvw_validate::run().is_err() {
        std::process::exit(1);
    }
}
