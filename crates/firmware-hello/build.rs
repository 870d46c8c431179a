use std::env;
use std::fs;
use std::path::PathBuf;

// Put memory.x on the linker search path for riscv-rt's link.x.
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::copy("memory.x", out_dir.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
}
