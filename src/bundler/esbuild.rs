// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// esbuild CLI integration.
///
/// One-shot builds run esbuild to completion and parse its diagnostics.
/// Watch sessions keep esbuild running and follow its log on stderr to learn
/// when a rebuild finished.
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use tracing::{debug, info, warn};

use super::{BuildReport, BundleOptions, Bundler, WatchHandle, notify_hooks};
use crate::error::Error;

const ERROR_MARKER: &str = "[ERROR]";
const WARNING_MARKER: &str = "[WARNING]";
const WATCH_STARTED_MARKER: &str = "[watch] build started";
const WATCH_FINISHED_MARKER: &str = "[watch] build finished";

/// Bundler backed by the esbuild executable.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct EsbuildBundler
{
    executable: PathBuf,
}

impl EsbuildBundler
{
    /// Uses the esbuild executable at `executable`.
    pub fn new(executable: PathBuf,) -> Self
    {
        Self {
            executable,
        }
    }

    /// Finds esbuild: an explicit path wins, then the project's
    /// `node_modules/.bin`, then `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bundler`](Error::Bundler) when no executable can be
    /// found.
    pub fn locate(explicit: Option<&Path,>, root: &Path,) -> Result<Self, Error,>
    {
        if let Some(path,) = explicit {
            return Ok(Self::new(path.to_path_buf(),),);
        }

        let binary = if cfg!(windows) { "esbuild.cmd" } else { "esbuild" };
        let local = root.join("node_modules",).join(".bin",).join(binary,);
        if local.is_file() {
            debug!("Using project esbuild at {}", local.display());
            return Ok(Self::new(local,),);
        }

        which::which("esbuild",).map(Self::new,).map_err(|_| {
            Error::bundler(
                "esbuild executable not found: run `npm install --save-dev esbuild` or pass \
                 --esbuild <PATH>",
            )
        },)
    }

    /// Path of the executable this bundler runs.
    pub fn executable(&self,) -> &Path
    {
        &self.executable
    }

    fn arguments(options: &BundleOptions, watch: bool,) -> Vec<OsString,>
    {
        let mut args: Vec<OsString,> = vec![options.entry.clone().into_os_string()];
        if options.bundle {
            args.push("--bundle".into(),);
        }
        args.push(format!("--format={}", options.format.as_str()).into(),);

        let mut outfile = OsString::from("--outfile=",);
        outfile.push(&options.outfile,);
        args.push(outfile,);

        if !options.banner.is_empty() {
            args.push(format!("--banner:js={}", options.banner).into(),);
        }

        if watch {
            args.push("--watch".into(),);
            args.push("--log-level=info".into(),);
        } else {
            args.push("--log-level=warning".into(),);
        }

        args
    }

    fn command(&self, options: &BundleOptions, watch: bool,) -> Command
    {
        let mut command = Command::new(&self.executable,);
        command.args(Self::arguments(options, watch,),).current_dir(&options.working_dir,);
        command
    }

    fn spawn_error(&self, error: std::io::Error,) -> Error
    {
        Error::bundler(format!("failed to run {}: {error}", self.executable.display()),)
    }
}

impl Bundler for EsbuildBundler
{
    async fn build(&self, options: &BundleOptions,) -> Result<BuildReport, Error,>
    {
        debug!("Running {} for {}", self.executable.display(), options.entry.display());
        let output = self
            .command(options, false,)
            .stdin(Stdio::null(),)
            .output()
            .await
            .map_err(|error| self.spawn_error(error,),)?;

        let mut diagnostics = Diagnostics::default();
        for line in String::from_utf8_lossy(&output.stderr,).lines() {
            diagnostics.observe(line,);
        }

        let mut report = diagnostics.finish(options.outfile.clone(),);
        if !output.status.success() && report.errors.is_empty() {
            report.errors.push(format!("esbuild exited with {}", output.status),);
        }

        notify_hooks(&options.hooks, &report,).await;

        if report.succeeded() {
            Ok(report,)
        } else {
            Err(Error::bundler(report.errors.join("\n",),),)
        }
    }

    async fn watch(&self, options: &BundleOptions,) -> Result<WatchHandle, Error,>
    {
        let mut child = self
            .command(options, true,)
            .stdin(Stdio::piped(),)
            .stdout(Stdio::null(),)
            .stderr(Stdio::piped(),)
            .kill_on_drop(true,)
            .spawn()
            .map_err(|error| self.spawn_error(error,),)?;

        let stdin = child.stdin.take();
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::bundler("esbuild stderr was not captured",),)?;
        let outfile = options.outfile.clone();
        let hooks = options.hooks.clone();

        info!("Watching {} for changes", options.entry.display());

        let task = tokio::spawn(async move {
            // esbuild stops watching once its stdin is closed.
            let _stdin = stdin;
            let mut lines = BufReader::new(stderr,).lines();
            let mut diagnostics = Diagnostics::default();

            while let Some(line,) = lines
                .next_line()
                .await
                .map_err(|error| Error::bundler(format!("failed to read esbuild output: {error}"),),)?
            {
                match WatchEvent::classify(&line,) {
                    WatchEvent::BuildStarted => {
                        debug!("{}", line.trim());
                        diagnostics = Diagnostics::default();
                    }
                    WatchEvent::BuildFinished => {
                        let report = std::mem::take(&mut diagnostics,).finish(outfile.clone(),);
                        if report.succeeded() {
                            info!("Rebuilt {}", outfile.display());
                        } else {
                            warn!("Rebuild failed with {} error(s)", report.errors.len());
                        }
                        notify_hooks(&hooks, &report,).await;
                    }
                    WatchEvent::Output => diagnostics.observe(&line,),
                }
            }

            let status = child
                .wait()
                .await
                .map_err(|error| Error::bundler(format!("failed to wait for esbuild: {error}"),),)?;
            if status.success() {
                Ok((),)
            } else {
                Err(Error::bundler(format!("esbuild exited with {status}"),),)
            }
        },);

        Ok(WatchHandle::new(task,),)
    }
}

/// Kind of a line printed by esbuild in watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
enum WatchEvent
{
    BuildStarted,
    BuildFinished,
    Output,
}

impl WatchEvent
{
    fn classify(line: &str,) -> Self
    {
        if line.contains(WATCH_STARTED_MARKER,) {
            Self::BuildStarted
        } else if line.contains(WATCH_FINISHED_MARKER,) {
            Self::BuildFinished
        } else {
            Self::Output
        }
    }
}

/// Diagnostics collected from esbuild's log for one build.
#[derive(Debug, Default,)]
struct Diagnostics
{
    errors:   Vec<String,>,
    warnings: Vec<String,>,
}

impl Diagnostics
{
    fn observe(&mut self, line: &str,)
    {
        if let Some(message,) = marker_message(line, ERROR_MARKER,) {
            warn!("esbuild: {message}");
            self.errors.push(message,);
        } else if let Some(message,) = marker_message(line, WARNING_MARKER,) {
            warn!("esbuild: {message}");
            self.warnings.push(message,);
        } else if !line.trim().is_empty() {
            debug!("esbuild: {}", line.trim_end());
        }
    }

    fn finish(self, outfile: PathBuf,) -> BuildReport
    {
        BuildReport {
            outfile,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

fn marker_message(line: &str, marker: &str,) -> Option<String,>
{
    let (_, message,) = line.split_once(marker,)?;
    Some(message.trim().to_owned(),)
}
