//! Build script
//!
//! Always writes `utc.rs` with the build time, which seeds the watch clock.
//! For firmware builds it also copies `memory.x` from the crate root into a
//! directory where the linker can always find it and adds the linker scripts.

use std::{env, fs::File, io::Write, path::PathBuf};

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    // create rs file with current UTC time
    File::create(out.join("utc.rs"))
        .unwrap()
        .write_fmt(format_args!(
            "const UTC_EPOCH: i64 = {:?};",
            chrono::Utc::now().timestamp()
        ))
        .unwrap();

    if env::var_os("CARGO_FEATURE_FIRMWARE").is_some() {
        // Put memory layout in the output directory and ensure it's on the linker search path.
        File::create(out.join("memory.x"))
            .unwrap()
            .write_all(include_bytes!("memory.x"))
            .unwrap();
        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Without `rerun-if-changed` every build refreshes `utc.rs`.
}
