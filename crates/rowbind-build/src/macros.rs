//! Build-script helper that runs rowbind codegen from a config file.
//!
//! Paths in the config resolve against `CARGO_MANIFEST_DIR`; generated files
//! land in `OUT_DIR`, ready for `include!(concat!(env!("OUT_DIR"), "/person.rs"))`.
#[macro_export]
macro_rules! build {
    ($config:expr) => {
        use std::{env::var, path::PathBuf};

        //
        // CARGO
        //

        println!("cargo:rerun-if-changed=build.rs");
        println!("cargo:rerun-if-changed={}", $config);

        let manifest_dir =
            PathBuf::from(var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
        let out_dir = PathBuf::from(var("OUT_DIR").expect("OUT_DIR not set"));

        //
        // RECORD CODE
        //

        let config = ::rowbind_build::Config::load(manifest_dir.join($config))?;
        for source in &config.sources {
            println!("cargo:rerun-if-changed={}", source.display());
        }

        ::rowbind_build::run(&config, &manifest_dir, &out_dir)?;
    };
}
