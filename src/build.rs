// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Build orchestration.
//!
//! Ties the pieces together: project metadata is loaded and normalized, the
//! header is rendered as the bundler banner, and the bundler runs once or in
//! watch mode with the output mirror attached as a completion hook.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info};

use crate::{
    bundler::{BuildReport, BundleOptions, Bundler, CompletionHook, OutputFormat, WatchHandle},
    error::{self, Error},
    header::render_header,
    manifest::load_manifest,
    metadata::MetadataRecord,
    mirror::OutputMirror,
    normalizer::{ResolvedMetadata, resolve_metadata},
};

/// File extension of generated userscripts.
pub const USERSCRIPT_EXTENSION: &str = "user.js";

/// Caller-supplied settings for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct BuildRequest
{
    /// Entry file; relative paths resolve against `root`.
    pub input:       PathBuf,
    /// Output directory; relative paths resolve against `root`.
    pub out_dir:     PathBuf,
    /// Directories receiving a ` (Local)` copy after successful builds;
    /// relative paths resolve against `root`.
    pub mirror_dirs: Vec<PathBuf,>,
    /// Keep rebuilding on source changes.
    pub watch:       bool,
    /// Project root containing `package.json`.
    pub root:        PathBuf,
    /// Header fields layered over the inferred defaults.
    pub metadata:    MetadataRecord,
}

/// Everything derived from the request before the bundler runs.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct BuildPlan
{
    /// Absolute project root; the bundler runs here.
    pub root:     PathBuf,
    /// Final metadata and the resolved script name.
    pub metadata: ResolvedMetadata,
    /// Rendered `==UserScript==` block.
    pub banner:   String,
    /// Absolute entry file.
    pub entry:    PathBuf,
    /// Absolute output directory.
    pub out_dir:  PathBuf,
    /// `<out_dir>/<name>.user.js`.
    pub artifact: PathBuf,
}

/// Result of [`run_build`].
#[derive(Debug,)]
pub enum BuildOutcome
{
    /// One-shot build finished successfully.
    Completed(BuildReport,),
    /// Watch mode is active; rebuilds continue in the background.
    Watching(WatchHandle,),
}

/// Derives metadata, banner, and artifact location without touching the
/// output directory.
///
/// # Errors
///
/// Returns configuration errors when `package.json` is missing or invalid, or
/// when no userscript name can be resolved.
pub fn plan_build(request: &BuildRequest,) -> Result<BuildPlan, Error,>
{
    let root = std::path::absolute(&request.root,).map_err(|source| {
        Error::validation(format!("cannot resolve project root {}: {source}", request.root.display()),)
    },)?;
    let manifest = load_manifest(&root,)?;
    let metadata = resolve_metadata(&manifest, &request.metadata,)?;
    let banner = render_header(&metadata.record,);

    let entry = resolve_path(&root, &request.input,);
    let out_dir = resolve_path(&root, &request.out_dir,);
    let artifact = out_dir.join(artifact_file_name(&metadata.name,),);

    debug!("Resolved userscript '{}' -> {}", metadata.name, artifact.display());

    Ok(BuildPlan {
        root,
        metadata,
        banner,
        entry,
        out_dir,
        artifact,
    },)
}

/// Runs a build for `request` with `bundler`.
///
/// In one-shot mode the call returns once the build finished. In watch mode
/// it returns as soon as the watcher is running.
///
/// # Errors
///
/// Configuration errors are raised before the bundler is invoked. Output
/// directory failures surface as [`Error::ArtifactIo`](Error::ArtifactIo)
/// and one-shot build failures as [`Error::Bundler`](Error::Bundler).
/// Failures of later rebuilds in watch mode are only logged.
pub async fn run_build<B,>(request: &BuildRequest, bundler: &B,) -> Result<BuildOutcome, Error,>
where
    B: Bundler,
{
    let plan = plan_build(request,)?;

    fs::create_dir_all(&plan.out_dir,)
        .map_err(|source| error::artifact_io_error(&plan.out_dir, source,),)?;

    let mut hooks: Vec<Arc<dyn CompletionHook,>,> = Vec::new();
    if !request.mirror_dirs.is_empty() {
        let directories =
            request.mirror_dirs.iter().map(|directory| resolve_path(&plan.root, directory,),).collect();
        hooks.push(Arc::new(OutputMirror::new(plan.metadata.name.clone(), directories,),),);
    }

    let options = BundleOptions {
        entry: plan.entry,
        outfile: plan.artifact,
        working_dir: plan.root,
        bundle: true,
        format: OutputFormat::Iife,
        banner: plan.banner,
        hooks,
    };

    if request.watch {
        let handle = bundler.watch(&options,).await?;
        Ok(BuildOutcome::Watching(handle,),)
    } else {
        let report = bundler.build(&options,).await?;
        info!("Built {}", report.outfile.display());
        Ok(BuildOutcome::Completed(report,),)
    }
}

/// File name of the artifact for a script called `name`.
pub fn artifact_file_name(name: &str,) -> String
{
    format!("{name}.{USERSCRIPT_EXTENSION}")
}

fn resolve_path(root: &Path, path: &Path,) -> PathBuf
{
    if path.is_absolute() { path.to_path_buf() } else { root.join(path,) }
}
