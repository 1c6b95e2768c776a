use std::fs;
use std::process;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn settings_export() {
    print!("{}", pgmmr_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let c = die!(
        pgmmr_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: beam.beam_width={}, beam.max_decode_steps={}, beam.min_decode_steps={}, diversity.enabled={}, diversity.lambda={}",
        c.search.beam_width,
        c.search.max_decode_steps,
        c.search.min_decode_steps,
        c.diversity.enabled,
        c.diversity.lambda
    );
}
