//! Utilities for packaging a single script entry point as a userscript.
//!
//! The library reads project metadata from `package.json`, derives the
//! `==UserScript==` header from it, runs the bundler with that header as a
//! banner, and optionally mirrors each successful build into the script
//! directories of local userscript managers. All public APIs are documented
//! with invariants, error semantics, and minimal examples.

mod build;
mod bundler;
mod config;
mod display_name;
mod error;
mod header;
mod manager;
mod manifest;
mod metadata;
mod mirror;
mod normalizer;
mod repository;

pub use build::{
    BuildOutcome, BuildPlan, BuildRequest, USERSCRIPT_EXTENSION, artifact_file_name, plan_build,
    run_build,
};
pub use bundler::{
    BuildReport, BundleOptions, Bundler, CompletionHook, EsbuildBundler, OutputFormat, WatchHandle,
    notify_hooks,
};
pub use config::{
    BuildConfig, DEFAULT_CONFIG_FILE, DEFAULT_OUT_DIR, load_config, parse_config,
    parse_meta_overrides,
};
pub use display_name::DisplayName;
pub use error::Error;
pub use header::{HEADER_END, HEADER_START, ParsedHeader, parse_header, render_header};
pub use manager::UserscriptManager;
pub use manifest::{Locator, MANIFEST_FILE, PackageManifest, Person, load_manifest};
pub use metadata::{MetadataRecord, MetadataValue};
pub use mirror::{LOCAL_SUFFIX, MirrorOutcome, OutputMirror, rename_script};
pub use normalizer::{ResolvedMetadata, infer_defaults, resolve_metadata, resolve_name};
pub use repository::normalize_repository_url;
