use std::env;

/**
 * Decide once which JSON codec gets compiled in.
 *
 * simd-json is used when the `simd` feature is enabled and the target is x86_64 on linux,
 * windows or macos. Everything else falls back to serde_json.
 */
fn main() {
    println!("cargo:rustc-check-cfg=cfg(simd_codec)");
    println!("cargo:rerun-if-changed=build.rs");

    let arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    let os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let simd = env::var_os("CARGO_FEATURE_SIMD").is_some();

    let supported_os = matches!(os.as_str(), "linux" | "windows" | "macos");

    if simd && arch == "x86_64" && supported_os {
        println!("cargo:rustc-cfg=simd_codec");
    }
}
