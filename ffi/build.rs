use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let include = crate_dir.join("include");
    if let Err(e) = fs::create_dir_all(&include) {
        println!("cargo:warning=could not create {}: {e}", include.display());
        return;
    }

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("MEMKV_H")
        .with_documentation(true)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(include.join("memkv.h"));
        }
        Err(e) => println!("cargo:warning=header not generated: {e}"),
    }
}
