use std::env;
use std::path::PathBuf;

const WATCHED_VARIABLES: [&str; 3] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"];

fn warn(message: &str) {
    println!("cargo:warning={message}");
}

/// ffmpeg-sys-next finds FFmpeg through pkg-config everywhere but Windows,
/// where the install location has to be spelled out. Point at a vcpkg
/// install when one exists.
fn main() {
    for variable in WATCHED_VARIABLES {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        warn("FFMPEG_DIR is not set; shot detection needs FFmpeg development libraries (vcpkg install ffmpeg).");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(&triplet);
    if candidate.exists() {
        warn(&format!(
            "Found vcpkg FFmpeg for {triplet}; set FFMPEG_DIR={} to use it.",
            candidate.display()
        ));
    } else {
        warn(&format!(
            "VCPKG_ROOT is set but {} does not exist.",
            candidate.display()
        ));
    }
}
