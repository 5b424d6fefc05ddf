//! Build script for fuzzy-dpi
//!
//! Embeds build metadata reported by `GET /health`.

use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    // The built-in model is compiled in with include_str!
    println!("cargo:rerun-if-changed=src/model/dpi_model.toml");

    // Emit target info
    if let Ok(target) = env::var("TARGET") {
        println!("cargo:rustc-env=DPI_BUILD_TARGET={}", target);
    }
}
