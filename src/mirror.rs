// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Mirroring of build artifacts into userscript-manager directories.
///
/// After every successful build the artifact is copied into each configured
/// mirror directory under a ` (Local)` name, so the development copy can sit
/// next to the released script in the manager.
use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    bundler::{BuildReport, CompletionHook},
    error::{self, Error},
    header::{parse_header, render_header},
    metadata::MetadataValue,
};

/// Suffix appended to the script name in mirrored copies.
pub const LOCAL_SUFFIX: &str = " (Local)";

/// Result of mirroring into a single directory.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum MirrorOutcome
{
    /// The mirrored copy was written to `destination`.
    Written
    {
        /// File that received the copy.
        destination: PathBuf,
    },
    /// The directory does not exist; nothing was written.
    Skipped
    {
        /// Missing mirror directory.
        directory: PathBuf,
    },
    /// Reading or writing failed for this directory only.
    Failed
    {
        /// Mirror directory that failed.
        directory: PathBuf,
        /// Description of the failure.
        message:   String,
    },
}

/// Completion hook copying the artifact into mirror directories.
#[derive(Debug, Clone,)]
pub struct OutputMirror
{
    name:        String,
    directories: Vec<PathBuf,>,
}

impl OutputMirror
{
    /// Creates a mirror for the script called `name`.
    pub fn new(name: impl Into<String,>, directories: Vec<PathBuf,>,) -> Self
    {
        Self {
            name: name.into(),
            directories,
        }
    }

    /// File name used for mirrored copies: `<name> (Local).user.js`.
    pub fn file_name(&self,) -> String
    {
        format!("{}{LOCAL_SUFFIX}.user.js", self.name)
    }

    /// Mirrors `artifact` into every directory.
    ///
    /// Directories are processed independently and in parallel: a missing
    /// directory is skipped and a failing one does not affect the others.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::{Path, PathBuf};
    ///
    /// use userscript_bundler::OutputMirror;
    ///
    /// let mirror = OutputMirror::new("Demo", vec![PathBuf::from("/tmp/scripts",)],);
    /// for outcome in mirror.mirror(Path::new("dist/Demo.user.js",),) {
    ///     println!("{outcome:?}");
    /// }
    /// ```
    pub fn mirror(&self, artifact: &Path,) -> Vec<MirrorOutcome,>
    {
        self.directories
            .par_iter()
            .map(|directory| self.mirror_into(artifact, directory,),)
            .collect()
    }

    fn mirror_into(&self, artifact: &Path, directory: &Path,) -> MirrorOutcome
    {
        if !directory.is_dir() {
            debug!("Skipping missing mirror directory {}", directory.display());
            return MirrorOutcome::Skipped {
                directory: directory.to_path_buf(),
            };
        }

        let destination = directory.join(self.file_name(),);
        match self.write_copy(artifact, &destination,) {
            Ok((),) => {
                info!("Mirrored {} to {}", artifact.display(), destination.display());
                MirrorOutcome::Written {
                    destination,
                }
            }
            Err(error,) => {
                warn!("Failed to mirror into {}: {error}", directory.display());
                MirrorOutcome::Failed {
                    directory: directory.to_path_buf(),
                    message:   error.to_display_string(),
                }
            }
        }
    }

    fn write_copy(&self, artifact: &Path, destination: &Path,) -> Result<(), Error,>
    {
        let script = fs::read_to_string(artifact,)
            .map_err(|source| error::artifact_io_error(artifact, source,),)?;
        let renamed = rename_script(&script,).unwrap_or_else(|| {
            warn!("No userscript header in {}, copying unchanged", artifact.display());
            script.clone()
        },);
        fs::write(destination, renamed,).map_err(|source| error::artifact_io_error(destination, source,),)
    }
}

impl CompletionHook for OutputMirror
{
    fn on_build_end(&self, report: &BuildReport,)
    {
        if !report.succeeded() {
            debug!("Build finished with errors, skipping mirrors");
            return;
        }
        self.mirror(&report.outfile,);
    }
}

/// Rewrites the header of `script` so its `name` carries [`LOCAL_SUFFIX`].
///
/// The header is parsed into a record, the name is changed, and the block is
/// rendered again in place. Returns `None` when `script` has no header.
///
/// # Examples
///
/// ```
/// use userscript_bundler::rename_script;
///
/// let script = "// ==UserScript==\n// @name  Demo\n// ==/UserScript==\nrun();\n";
/// let renamed = rename_script(script,).expect("header present",);
/// assert!(renamed.contains("// @name  Demo (Local)\n"));
/// assert!(renamed.ends_with("run();\n"));
/// ```
pub fn rename_script(script: &str,) -> Option<String,>
{
    let mut parsed = parse_header(script,)?;

    if let Some(value,) = parsed.record.get_mut("name",) {
        match value {
            MetadataValue::Scalar(name,) => suffix(name,),
            MetadataValue::List(names,) => {
                if let Some(name,) = names.iter_mut().find(|name| !name.trim().is_empty(),) {
                    suffix(name,);
                }
            }
            MetadataValue::Absent | MetadataValue::Flag => {}
        }
    }

    let mut renamed = String::with_capacity(script.len() + LOCAL_SUFFIX.len(),);
    renamed.push_str(&script[..parsed.span.start],);
    renamed.push_str(&render_header(&parsed.record,),);
    renamed.push_str(&script[parsed.span.end..],);
    Some(renamed,)
}

fn suffix(name: &mut String,)
{
    let trimmed = name.trim();
    if !trimmed.is_empty() {
        *name = format!("{trimmed}{LOCAL_SUFFIX}");
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    const SCRIPT: &str = "\
// ==UserScript==
// @name         Demo Script
// @version      1.0.0
// @match        https://example.com/*
// ==/UserScript==
(function () {
  // @name inside code stays untouched
})();
";

    fn successful_report(outfile: PathBuf,) -> BuildReport
    {
        BuildReport::new(outfile,)
    }

    #[test]
    fn rename_script_suffixes_only_the_header_name()
    {
        let renamed = rename_script(SCRIPT,).expect("header present",);

        assert!(renamed.starts_with("// ==UserScript==\n// @name     Demo Script (Local)\n"));
        assert!(renamed.contains("// @name inside code stays untouched"));
        assert!(renamed.contains("// @version  1.0.0\n"));
    }

    #[test]
    fn rename_script_realigns_widened_keys()
    {
        let script = "// ==UserScript==\n// @name Demo\n// @description Widest\n// ==/UserScript==";
        let renamed = rename_script(script,).expect("header present",);
        assert_eq!(
            renamed,
            "// ==UserScript==\n// @name         Demo (Local)\n// @description  Widest\n// \
             ==/UserScript=="
        );
    }

    #[test]
    fn rename_script_keeps_valueless_directives()
    {
        let script = "// ==UserScript==\n// @name Demo\n// @noframes\n// ==/UserScript==\nrun();\n";
        let renamed = rename_script(script,).expect("header present",);
        assert_eq!(
            renamed,
            "// ==UserScript==\n// @name      Demo (Local)\n// @noframes\n// ==/UserScript==\nrun();\n"
        );
    }

    #[test]
    fn rename_script_returns_none_without_header()
    {
        assert!(rename_script("console.log('plain');").is_none());
    }

    #[test]
    fn mirror_writes_local_copy_into_existing_directory()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let artifact = dir.path().join("Demo Script.user.js",);
        fs::write(&artifact, SCRIPT,).expect("failed to write artifact",);
        let mirror_dir = dir.path().join("scripts",);
        fs::create_dir(&mirror_dir,).expect("failed to create mirror dir",);

        let mirror = OutputMirror::new("Demo Script", vec![mirror_dir.clone()],);
        mirror.on_build_end(&successful_report(artifact,),);

        let copy = mirror_dir.join("Demo Script (Local).user.js",);
        let content = fs::read_to_string(&copy,).expect("mirror copy written",);
        let name_line = content.lines().nth(1,).expect("name line",);
        assert_eq!(name_line, "// @name     Demo Script (Local)");
    }

    #[test]
    fn mirror_skips_missing_directory_silently()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let artifact = dir.path().join("Demo.user.js",);
        fs::write(&artifact, SCRIPT,).expect("failed to write artifact",);
        let missing = dir.path().join("does-not-exist",);

        let outcomes = OutputMirror::new("Demo", vec![missing.clone()],).mirror(&artifact,);

        assert_eq!(outcomes, [MirrorOutcome::Skipped {
            directory: missing.clone(),
        }]);
        assert!(!missing.exists());
    }

    #[test]
    fn mirror_isolates_failures_per_directory()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let artifact = dir.path().join("Demo.user.js",);
        fs::write(&artifact, SCRIPT,).expect("failed to write artifact",);
        let good = dir.path().join("good",);
        let blocked = dir.path().join("blocked",);
        fs::create_dir(&good,).expect("failed to create good dir",);
        fs::create_dir_all(blocked.join("Demo (Local).user.js",),)
            .expect("failed to create blocking directory",);

        let outcomes = OutputMirror::new("Demo", vec![blocked.clone(), good.clone()],).mirror(&artifact,);

        assert!(matches!(&outcomes[0], MirrorOutcome::Failed { directory, .. } if *directory == blocked));
        assert_eq!(outcomes[1], MirrorOutcome::Written {
            destination: good.join("Demo (Local).user.js",),
        });
    }

    #[test]
    fn failed_build_does_not_mirror()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let artifact = dir.path().join("Demo.user.js",);
        fs::write(&artifact, SCRIPT,).expect("failed to write artifact",);
        let mirror_dir = dir.path().join("scripts",);
        fs::create_dir(&mirror_dir,).expect("failed to create mirror dir",);

        let mut report = successful_report(artifact,);
        report.errors.push("Could not resolve".to_owned(),);
        OutputMirror::new("Demo", vec![mirror_dir.clone()],).on_build_end(&report,);

        assert!(!mirror_dir.join("Demo (Local).user.js").exists());
    }

    #[test]
    fn script_without_header_is_copied_unchanged()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        let artifact = dir.path().join("Demo.user.js",);
        fs::write(&artifact, "run();\n",).expect("failed to write artifact",);

        let outcomes = OutputMirror::new("Demo", vec![dir.path().to_path_buf()],).mirror(&artifact,);

        assert!(matches!(outcomes[0], MirrorOutcome::Written { .. }));
        let copy = fs::read_to_string(dir.path().join("Demo (Local).user.js",),).expect("copy",);
        assert_eq!(copy, "run();\n");
    }
}
