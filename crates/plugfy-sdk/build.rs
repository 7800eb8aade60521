//! Build script: record the compiler version for module compatibility checks.
//!
//! Modules and the host exchange Rust trait objects across the dynamic library
//! boundary, so both sides must be built by the same compiler. The version
//! string captured here is embedded in every module declaration.

use std::env;
use std::ffi::OsString;
use std::process::Command;

const FALLBACK_VERSION: &str = "rustc unknown";

fn rustc_version() -> String {
    let rustc = env::var_os("RUSTC").unwrap_or_else(|| OsString::from("rustc"));
    let Ok(output) = Command::new(rustc).arg("--version").output() else {
        return FALLBACK_VERSION.into();
    };
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| FALLBACK_VERSION.into())
}

fn main() {
    println!("cargo:rerun-if-env-changed=RUSTC");
    println!("cargo:rustc-env=PLUGFY_RUSTC_VERSION={}", rustc_version());
}
