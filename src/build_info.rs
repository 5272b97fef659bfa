/// Short commit stamped by build.rs, suffixed `-dirty` for uncommitted builds.
pub fn git_sha() -> Option<&'static str> {
    option_env!("MIGRANT_BUILD_GIT_SHA")
}

/// Version string shown by `--version`.
pub fn long_version() -> &'static str {
    match git_sha() {
        Some(sha) => {
            // clap wants a 'static str; leaked once per process.
            Box::leak(format!("{} ({sha})", env!("CARGO_PKG_VERSION")).into_boxed_str())
        }
        None => env!("CARGO_PKG_VERSION"),
    }
}
