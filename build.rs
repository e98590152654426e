fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Seed for the wall clock when the RTC reports it is not running.
    // Honour SOURCE_DATE_EPOCH for reproducible builds.
    let build_secs = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    println!("cargo:rustc-env=PLANTWATER_BUILD_UNIX_SECS={build_secs}");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
