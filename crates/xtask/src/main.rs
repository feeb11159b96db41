//! Packaging pipeline for the removebg plugin bundle.
//!
//! `cargo run -p xtask -- dist`     stage dist/ with the bundle artifacts
//! `cargo run -p xtask -- package`  archive dist/* into release/<plugin>.zip
//! `cargo run -p xtask -- all`      both (default)
//!
//! plugin.json and schema.json are generated from the plugin types. icon.svg
//! comes from assets/. The three script bundles (frontend, executor, removal
//! runtime) are opaque build outputs copied from bundles/; packaging fails
//! if any required artifact is missing.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::{env, fs, process::exit};

use anyhow::{Context, bail};
use removebg_plugin::manifest::{
    EXECUTOR_BUNDLE, ICON_FILE, MANIFEST_FILE, RUNTIME_BUNDLE, SCHEMA_FILE, UI_BUNDLE,
    PluginManifest,
};
use removebg_plugin::plugin::parameter_schema;

const ZIP_NAME: &str = "mixui-removebg-plugin.zip";

const REQUIRED_FILES: &[&str] = &[
    UI_BUNDLE,
    EXECUTOR_BUNDLE,
    RUNTIME_BUNDLE,
    MANIFEST_FILE,
    SCHEMA_FILE,
    ICON_FILE,
];

fn main() {
    removebg_plugin::logger::init_tracing("info").ok();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("all");

    let root = PathBuf::from(".");
    let result = match command {
        "dist" => stage_dist(&root),
        "package" => package(&root),
        "all" => stage_dist(&root).and_then(|_| package(&root)),
        other => {
            eprintln!("Unknown command `{}` (expected dist, package or all)", other);
            exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        exit(1);
    }
}

/// Stage `dist/` with the six bundle artifacts.
fn stage_dist(root: &Path) -> anyhow::Result<()> {
    let dist = root.join("dist");
    fs::create_dir_all(&dist).with_context(|| format!("creating {}", dist.display()))?;

    let manifest = serde_json::to_string_pretty(&PluginManifest::current())?;
    fs::write(dist.join(MANIFEST_FILE), manifest)?;
    println!("Generated {}", MANIFEST_FILE);

    let schema = serde_json::to_string_pretty(&parameter_schema())?;
    fs::write(dist.join(SCHEMA_FILE), schema)?;
    println!("Generated {}", SCHEMA_FILE);

    copy_artifact(&root.join("assets").join(ICON_FILE), &dist.join(ICON_FILE))?;

    for bundle in [UI_BUNDLE, EXECUTOR_BUNDLE, RUNTIME_BUNDLE] {
        let src = root.join("bundles").join(bundle);
        if src.exists() {
            copy_artifact(&src, &dist.join(bundle))?;
        } else {
            println!("Skipping {} (not built yet)", bundle);
        }
    }

    Ok(())
}

fn copy_artifact(src: &Path, dest: &Path) -> anyhow::Result<()> {
    fs::copy(src, dest)
        .with_context(|| format!("copying {} -> {}", src.display(), dest.display()))?;
    println!("Copied {}", dest.display());
    Ok(())
}

/// Verify the staged bundle and archive `dist/*` into `release/`.
fn package(root: &Path) -> anyhow::Result<()> {
    let dist = root.join("dist");
    verify_bundle(&dist)?;

    let release = root.join("release");
    fs::create_dir_all(&release)?;
    let out = release.join(ZIP_NAME);
    write_zip(&dist, &out)?;

    let size_kb = fs::metadata(&out)?.len() / 1024;
    println!("Packaged {} ({} KB)", out.display(), size_kb);
    Ok(())
}

/// Every required artifact must be present; a missing file is a hard error.
fn verify_bundle(dist: &Path) -> anyhow::Result<()> {
    if !dist.is_dir() {
        bail!("dist/ does not exist; run `cargo run -p xtask -- dist` first");
    }
    let missing: Vec<&str> = REQUIRED_FILES
        .iter()
        .copied()
        .filter(|name| !dist.join(name).is_file())
        .collect();
    if !missing.is_empty() {
        bail!("bundle is missing required files: {}", missing.join(", "));
    }
    Ok(())
}

fn write_zip(dist: &Path, out: &Path) -> anyhow::Result<()> {
    let file = fs::File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut entries: Vec<PathBuf> = fs::read_dir(dist)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("non-utf8 file name in dist/")?
            .to_string();
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(&path)?)?;
    }

    writer.finish()?;
    Ok(())
}
