//! Build script for handoff-ffi.
//! Generates the C header for the exported boundary. Header generation is
//! best effort: a failure warns and leaves the library build untouched.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=cbindgen.toml");
    println!("cargo:rerun-if-changed=src");

    generate_c_bindings();
}

fn generate_c_bindings() {
    let (crate_dir, package_name) = match (env::var("CARGO_MANIFEST_DIR"), env::var("CARGO_PKG_NAME")) {
        (Ok(dir), Ok(name)) => (dir, name),
        _ => {
            println!("cargo:warning=Cargo did not provide the package environment; skipping header");
            return;
        }
    };
    let output_file = target_dir()
        .join("include")
        .join(format!("{}.h", package_name.replace('-', "_")));

    // Ensure the parent directory exists.
    if let Some(parent_dir) = output_file.parent() {
        if let Err(e) = std::fs::create_dir_all(parent_dir) {
            println!(
                "cargo:warning=Unable to create directory {}: {}",
                parent_dir.display(),
                e
            );
            return;
        }
    }

    match cbindgen::generate(&crate_dir) {
        Ok(bindings) => {
            // Returns false when the header on disk is already current.
            bindings.write_to_file(&output_file);
        }
        Err(e) => {
            println!("cargo:warning=Unable to generate C bindings: {}", e);
        }
    }
}

fn target_dir() -> PathBuf {
    if let Ok(target) = env::var("CARGO_TARGET_DIR") {
        PathBuf::from(target)
    } else {
        // OUT_DIR is <target>/<profile>/build/<pkg>-<hash>/out
        PathBuf::from(env::var("OUT_DIR").unwrap_or_default()).join("../../../")
    }
}
