use std::env;

fn main() {
    // Compile timestamp
    let build_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let version = env!("CARGO_PKG_VERSION");

    // Target platform (e.g., x86_64-unknown-linux-gnu)
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    // Expose build metadata to the binary for the `version` command
    println!("cargo:rustc-env=CENTROID_TOOLS_VERSION={}", version);
    println!("cargo:rustc-env=BUILD_DATE={}", build_time);
    println!("cargo:rustc-env=TARGET={}", target);
    println!("cargo:rerun-if-changed=build.rs");
}
