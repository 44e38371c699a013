//! Build script for `hc-gpu-hal`: compiles the compute programs.
//!
//! Compiles `.comp` files in `kernels/vulkan/` at the workspace root to `.spv`
//! with `glslc` and exports the output directory as `HC_SPIRV_DIR`.
//!
//! The toolchain is optional. If glslc is not found the build prints a warning
//! and sets `cfg(no_vulkan_kernels)` so the crate still compiles; programs
//! must then be supplied from a directory at run time.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    // Register the custom cfg flag so Cargo does not warn about it.
    println!("cargo::rustc-check-cfg=cfg(no_vulkan_kernels)");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let spv_dir = out_dir.join("spv");
    println!("cargo:rustc-env=HC_SPIRV_DIR={}", spv_dir.display());

    // crates/gpu-hal -> workspace root
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("Cannot determine workspace root");
    let kernel_dir = workspace_root.join("kernels").join("vulkan");

    if env::var("CARGO_FEATURE_VULKAN").is_ok() {
        compile_shaders(&kernel_dir, &spv_dir);
    }
}

/// Find the `glslc` compiler.
///
/// Search order:
/// 1. `VULKAN_SDK` environment variable (`Bin` on Windows, `bin` elsewhere)
/// 2. `PATH` lookup
fn find_glslc() -> Option<PathBuf> {
    if let Ok(sdk) = env::var("VULKAN_SDK") {
        for bin in ["Bin", "bin"] {
            let glslc = Path::new(&sdk).join(bin).join(glslc_binary_name());
            if glslc.exists() {
                return Some(glslc);
            }
        }
    }

    let lookup = if cfg!(target_os = "windows") { "where" } else { "which" };
    let output = Command::new(lookup).arg(glslc_binary_name()).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_line = stdout.lines().next().unwrap_or("").trim();
    (!first_line.is_empty()).then(|| PathBuf::from(first_line))
}

fn glslc_binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "glslc.exe"
    } else {
        "glslc"
    }
}

fn compile_shaders(kernel_dir: &Path, spv_dir: &Path) {
    fs::create_dir_all(spv_dir).expect("Failed to create SPV output directory");
    println!("cargo:rerun-if-changed={}", kernel_dir.display());

    let Some(glslc) = find_glslc() else {
        println!("cargo:warning=glslc not found. Compute programs will NOT be compiled.");
        println!("cargo:warning=Set VULKAN_SDK or add glslc to PATH, or pass --shader-dir at run time.");
        println!("cargo:rustc-cfg=no_vulkan_kernels");
        return;
    };

    let comp_files = collect_files(kernel_dir, "comp");
    if comp_files.is_empty() {
        println!("cargo:warning=No .comp files found in {}", kernel_dir.display());
        println!("cargo:rustc-cfg=no_vulkan_kernels");
        return;
    }

    let failures = comp_files
        .iter()
        .filter_map(|source| compile_one(&glslc, source, spv_dir).err())
        .inspect(|message| println!("cargo:warning={message}"))
        .count();

    if failures > 0 {
        println!("cargo:warning={failures} compute program(s) failed to compile.");
        println!("cargo:rustc-cfg=no_vulkan_kernels");
    }
}

/// `glslc -fshader-stage=compute -O --target-env=vulkan1.0 -o <spv_dir>/<stem>.spv <source>`
///
/// The target environment matches the API version the instance requests.
fn compile_one(glslc: &Path, source: &Path, spv_dir: &Path) -> Result<(), String> {
    println!("cargo:rerun-if-changed={}", source.display());

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("skipping non-UTF8 program name: {}", source.display()))?;

    let status = Command::new(glslc)
        .args(["-fshader-stage=compute", "-O", "--target-env=vulkan1.0", "-o"])
        .arg(spv_dir.join(format!("{stem}.spv")))
        .arg(source)
        .status()
        .map_err(|e| format!("could not run glslc for {stem}.comp: {e}"))?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(format!("glslc exited with {code} for {stem}.comp")),
        None => Err(format!("glslc was terminated by a signal for {stem}.comp")),
    }
}

/// Files in `dir` (not recursive) with the given extension, sorted by path.
fn collect_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}
