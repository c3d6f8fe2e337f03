//! Logger setup shared by the binaries.

/// Logger reading `RUST_LOG`, defaulting to `info`, with millisecond timestamps.
pub fn builder() -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder
}

pub fn init_logger() {
    builder().init();
}
