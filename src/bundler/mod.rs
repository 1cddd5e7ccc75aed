// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Seam between the build orchestrator and the external bundler.
//!
//! The bundler itself is a black box: it turns one entry file into one output
//! file, can keep rebuilding on source changes, and reports every finished
//! build to the registered [`CompletionHook`]s.

mod esbuild;

use std::{future::Future, path::PathBuf, sync::Arc};

use tokio::task::JoinHandle;
use tracing::warn;

pub use self::esbuild::EsbuildBundler;
use crate::error::Error;

/// Output wrapper produced by the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default,)]
pub enum OutputFormat
{
    /// Self-executing function expression, the format userscripts need.
    #[default]
    Iife,
    /// CommonJS module.
    Cjs,
    /// ECMAScript module.
    Esm,
}

impl OutputFormat
{
    /// Identifier understood by the bundler CLI.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Iife => "iife",
            Self::Cjs => "cjs",
            Self::Esm => "esm",
        }
    }
}

/// Receives the outcome of every finished build.
pub trait CompletionHook: Send + Sync
{
    /// Called once per finished build, successful or not.
    fn on_build_end(&self, report: &BuildReport,);
}

/// Everything the bundler needs for one entry point.
#[derive(Clone,)]
pub struct BundleOptions
{
    /// Entry file to bundle.
    pub entry:       PathBuf,
    /// File receiving the bundled output.
    pub outfile:     PathBuf,
    /// Directory the bundler runs in; module resolution starts here.
    pub working_dir: PathBuf,
    /// Bundle dependencies into the output instead of leaving imports.
    pub bundle:      bool,
    /// Output wrapper.
    pub format:      OutputFormat,
    /// Text prepended verbatim to the output.
    pub banner:      String,
    /// Hooks invoked after each finished build.
    pub hooks:       Vec<Arc<dyn CompletionHook,>,>,
}

impl std::fmt::Debug for BundleOptions
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        f.debug_struct("BundleOptions",)
            .field("entry", &self.entry,)
            .field("outfile", &self.outfile,)
            .field("working_dir", &self.working_dir,)
            .field("bundle", &self.bundle,)
            .field("format", &self.format,)
            .field("banner", &self.banner,)
            .field("hooks", &self.hooks.len(),)
            .finish()
    }
}

/// Outcome of a single build.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct BuildReport
{
    /// File the build wrote to.
    pub outfile:  PathBuf,
    /// Error diagnostics reported by the bundler.
    pub errors:   Vec<String,>,
    /// Warning diagnostics reported by the bundler.
    pub warnings: Vec<String,>,
}

impl BuildReport
{
    /// Creates a report without diagnostics.
    pub fn new(outfile: PathBuf,) -> Self
    {
        Self {
            outfile,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Reports whether the build finished without errors.
    pub fn succeeded(&self,) -> bool
    {
        self.errors.is_empty()
    }
}

/// Running watch session.
///
/// The session lives until the bundler process exits; there is no stop
/// method, termination is left to the process.
#[derive(Debug,)]
pub struct WatchHandle
{
    task: JoinHandle<Result<(), Error,>,>,
}

impl WatchHandle
{
    /// Wraps the background task driving the watch session.
    pub fn new(task: JoinHandle<Result<(), Error,>,>,) -> Self
    {
        Self {
            task,
        }
    }

    /// Waits until the watch session ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bundler`](Error::Bundler) when the bundler exits
    /// unsuccessfully or the background task panics.
    pub async fn wait(self,) -> Result<(), Error,>
    {
        self.task
            .await
            .map_err(|error| Error::bundler(format!("watch task stopped unexpectedly: {error}"),),)?
    }
}

/// External bundler driven by the orchestrator.
pub trait Bundler: Send + Sync
{
    /// Runs a single build and waits for it to finish.
    ///
    /// Hooks are notified before the result is returned.
    fn build(
        &self,
        options: &BundleOptions,
    ) -> impl Future<Output = Result<BuildReport, Error,>,> + Send;

    /// Starts continuous rebuilding and returns once the watcher is running,
    /// without waiting for the first build.
    fn watch(
        &self,
        options: &BundleOptions,
    ) -> impl Future<Output = Result<WatchHandle, Error,>,> + Send;
}

/// Runs every hook for `report` on the blocking thread pool.
pub async fn notify_hooks(hooks: &[Arc<dyn CompletionHook,>], report: &BuildReport,)
{
    if hooks.is_empty() {
        return;
    }

    let hooks = hooks.to_vec();
    let report = report.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        for hook in &hooks {
            hook.on_build_end(&report,);
        }
    },)
    .await;

    if let Err(error,) = outcome {
        warn!("completion hook panicked: {error}");
    }
}

#[cfg(test)]
mod tests
{
    use std::{
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use super::{BuildReport, CompletionHook, OutputFormat, WatchHandle, notify_hooks};
    use crate::Error;

    #[derive(Default,)]
    struct Recorder
    {
        seen: Mutex<Vec<bool,>,>,
    }

    impl CompletionHook for Recorder
    {
        fn on_build_end(&self, report: &BuildReport,)
        {
            self.seen.lock().expect("poisoned",).push(report.succeeded(),);
        }
    }

    #[test]
    fn default_format_is_iife()
    {
        assert_eq!(OutputFormat::default(), OutputFormat::Iife);
        assert_eq!(OutputFormat::Iife.as_str(), "iife");
        assert_eq!(OutputFormat::Esm.as_str(), "esm");
    }

    #[test]
    fn report_with_errors_is_not_successful()
    {
        let mut report = BuildReport::new(PathBuf::from("dist/a.user.js",),);
        assert!(report.succeeded());
        report.warnings.push("unused import".to_owned(),);
        assert!(report.succeeded());
        report.errors.push("could not resolve".to_owned(),);
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn notify_hooks_runs_every_hook()
    {
        let first = Arc::new(Recorder::default(),);
        let second = Arc::new(Recorder::default(),);
        let hooks: Vec<Arc<dyn CompletionHook,>,> =
            vec![first.clone() as Arc<dyn CompletionHook,>, second.clone()];

        let mut failed = BuildReport::new(PathBuf::from("out.js",),);
        failed.errors.push("boom".to_owned(),);
        notify_hooks(&hooks, &BuildReport::new(PathBuf::from("out.js",),),).await;
        notify_hooks(&hooks, &failed,).await;

        assert_eq!(*first.seen.lock().expect("poisoned",), [true, false]);
        assert_eq!(*second.seen.lock().expect("poisoned",), [true, false]);
    }

    #[tokio::test]
    async fn watch_handle_propagates_task_result()
    {
        let ok = WatchHandle::new(tokio::spawn(async { Ok((),) },),);
        assert!(ok.wait().await.is_ok());

        let failed = WatchHandle::new(tokio::spawn(async { Err(Error::bundler("exit status 1",),) },),);
        assert!(matches!(failed.wait().await, Err(Error::Bundler { .. })));
    }
}
