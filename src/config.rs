//! Build configuration document.
//!
//! A project may keep its build settings in a small YAML file next to
//! `package.json`. Every field is optional in the file so the command line can
//! fill the gaps; [`BuildConfig::into_request`] checks the combined result and
//! produces the immutable [`BuildRequest`] consumed by the orchestrator.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    build::BuildRequest,
    error::{self, Error},
    manager::UserscriptManager,
    metadata::{MetadataRecord, MetadataValue},
};

/// Configuration file looked up in the root directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "userscript.yaml";
/// Output directory used when neither the file nor the CLI sets one.
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use userscript_bundler::BuildConfig;
///
/// let yaml = r#"
/// input: src/main.ts
/// mirror_managers: [userscripts]
/// metadata:
///   match:
///     - https://example.com/*
///   grant: none
/// "#;
/// let config: BuildConfig = serde_yaml::from_str(yaml,).expect("valid configuration",);
/// assert_eq!(config.mirror_managers.len(), 1);
/// assert!(config.metadata.is_set("grant"));
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq,)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig
{
    /// Entry file to bundle.
    #[serde(default, alias = "entry")]
    pub input: Option<PathBuf,>,

    /// Directory receiving `<name>.user.js`.
    #[serde(default, alias = "outDir", alias = "out-dir")]
    pub out_dir: Option<PathBuf,>,

    /// Extra directories receiving a ` (Local)` copy after each build.
    #[serde(default, alias = "mirrorDirs", alias = "mirror-dirs")]
    pub mirror_dirs: Vec<PathBuf,>,

    /// Userscript managers whose storage directories receive a copy.
    #[serde(default, alias = "mirrorManagers", alias = "mirror-managers")]
    pub mirror_managers: Vec<UserscriptManager,>,

    /// Keep rebuilding on source changes.
    #[serde(default)]
    pub watch: bool,

    /// Explicit esbuild executable.
    #[serde(default)]
    pub esbuild: Option<PathBuf,>,

    /// Header fields layered over the values inferred from `package.json`.
    #[serde(default)]
    pub metadata: MetadataRecord,
}

impl BuildConfig
{
    /// Loads `<root>/userscript.yaml` when it exists, or returns an empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`load_config`] failures for an existing file.
    pub fn discover(root: &Path,) -> Result<Self, Error,>
    {
        let path = root.join(DEFAULT_CONFIG_FILE,);
        if path.is_file() {
            load_config(&path,)
        } else {
            debug!("No {} in {}, using defaults", DEFAULT_CONFIG_FILE, root.display());
            Ok(Self::default(),)
        }
    }

    /// Validates the configuration and turns it into a build request.
    ///
    /// `home` is only consulted when mirror managers are configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`](Error::Validation) when the input file
    /// is missing, or when managers are requested without a home directory.
    pub fn into_request(self, root: PathBuf, home: Option<&Path,>,) -> Result<BuildRequest, Error,>
    {
        let input = self
            .input
            .filter(|path| !path.as_os_str().is_empty(),)
            .ok_or_else(|| Error::validation("missing required input entry file",),)?;

        let mut mirror_dirs = self.mirror_dirs;
        if !self.mirror_managers.is_empty() {
            let home = home.ok_or_else(|| {
                Error::validation("cannot resolve userscript manager directories without a home directory",)
            },)?;
            mirror_dirs.extend(self.mirror_managers.iter().map(|manager| manager.scripts_dir(home,),),);
        }

        Ok(BuildRequest {
            input,
            out_dir: self.out_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR,),),
            mirror_dirs,
            watch: self.watch,
            root,
            metadata: self.metadata,
        },)
    }
}

/// Loads a configuration document from `path`.
///
/// # Errors
///
/// Returns [`Error::ConfigIo`](Error::ConfigIo) when the file cannot be read
/// and [`Error::ConfigParse`](Error::ConfigParse) when it is not valid.
pub fn load_config(path: &Path,) -> Result<BuildConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::config_io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses a configuration document from a YAML string.
///
/// # Errors
///
/// Returns [`Error::ConfigParse`](Error::ConfigParse) on malformed YAML or
/// unknown fields.
pub fn parse_config(contents: &str,) -> Result<BuildConfig, Error,>
{
    if contents.trim().is_empty() {
        return Ok(BuildConfig::default(),);
    }
    Ok(serde_yaml::from_str(contents,)?,)
}

/// Parses `key=value` metadata overrides given on the command line.
///
/// Repeating a key collects its values into a list, in order.
///
/// # Errors
///
/// Returns [`Error::Validation`](Error::Validation) when an entry has no `=`
/// or an empty key.
///
/// # Examples
///
/// ```
/// use userscript_bundler::{MetadataValue, parse_meta_overrides};
///
/// let record = parse_meta_overrides(&["grant=none", "match=https://a/*", "match=https://b/*",],)?;
/// assert_eq!(record.get("grant"), Some(&MetadataValue::from("none")));
/// assert_eq!(record.get("match").map(|value| value.values().count()), Some(2));
/// # Ok::<(), userscript_bundler::Error>(())
/// ```
pub fn parse_meta_overrides<S,>(entries: &[S],) -> Result<MetadataRecord, Error,>
where
    S: AsRef<str,>,
{
    let mut record = MetadataRecord::new();
    for entry in entries {
        let entry = entry.as_ref();
        let (key, value,) = entry
            .split_once('=',)
            .ok_or_else(|| Error::validation(format!("metadata override '{entry}' must be KEY=VALUE"),),)?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::validation(format!("metadata override '{entry}' has an empty key"),),);
        }

        let merged = match record.get(key,) {
            Some(MetadataValue::Scalar(existing,),) => {
                MetadataValue::List(vec![existing.clone(), value.to_owned()],)
            }
            Some(MetadataValue::List(existing,),) => {
                let mut values = existing.clone();
                values.push(value.to_owned(),);
                MetadataValue::List(values,)
            }
            None | Some(MetadataValue::Absent | MetadataValue::Flag,) => MetadataValue::from(value,),
        };
        record.insert(key, merged,);
    }
    Ok(record,)
}

#[cfg(test)]
mod tests
{
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    use tempfile::tempdir;

    use super::{BuildConfig, load_config, parse_config, parse_meta_overrides};
    use crate::{Error, manager::UserscriptManager, metadata::MetadataValue};

    #[test]
    fn parse_config_accepts_camel_case_aliases()
    {
        let config = parse_config(
            r#"
entry: src/index.ts
outDir: build
mirrorDirs:
  - /tmp/scripts
watch: true
"#,
        )
        .expect("valid configuration",);

        assert_eq!(config.input.as_deref(), Some(Path::new("src/index.ts")));
        assert_eq!(config.out_dir.as_deref(), Some(Path::new("build")));
        assert_eq!(config.mirror_dirs, [PathBuf::from("/tmp/scripts")]);
        assert!(config.watch);
    }

    #[test]
    fn parse_config_rejects_unknown_fields()
    {
        let error = parse_config("inputs: src/main.ts\n",).expect_err("unknown field",);
        assert!(matches!(error, Error::ConfigParse { .. }));
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn empty_document_yields_defaults()
    {
        assert_eq!(parse_config("  \n",).expect("empty is fine",), BuildConfig::default());
    }

    #[test]
    fn into_request_applies_defaults_and_resolves_managers()
    {
        let config = BuildConfig {
            input: Some(PathBuf::from("src/main.ts",),),
            mirror_dirs: vec![PathBuf::from("/tmp/extra",)],
            mirror_managers: vec![UserscriptManager::Userscripts],
            ..BuildConfig::default()
        };

        let request = config
            .into_request(PathBuf::from("/project",), Some(Path::new("/Users/jane",),),)
            .expect("valid request",);

        assert_eq!(request.out_dir, PathBuf::from("dist"));
        assert_eq!(request.root, PathBuf::from("/project"));
        assert_eq!(request.mirror_dirs.len(), 2);
        assert_eq!(request.mirror_dirs[0], PathBuf::from("/tmp/extra"));
        assert!(request.mirror_dirs[1].starts_with("/Users/jane/Library/Containers"));
        assert!(!request.watch);
    }

    #[test]
    fn into_request_requires_input()
    {
        let error = BuildConfig::default()
            .into_request(PathBuf::from("/project",), None,)
            .expect_err("input is required",);
        assert!(error.to_string().contains("missing required input entry file"));
    }

    #[test]
    fn managers_need_a_home_directory()
    {
        let config = BuildConfig {
            input: Some(PathBuf::from("main.ts",),),
            mirror_managers: vec![UserscriptManager::Userscripts],
            ..BuildConfig::default()
        };
        let error = config.into_request(PathBuf::from("/project",), None,).expect_err("no home",);
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[test]
    fn discover_loads_default_file_when_present()
    {
        let dir = tempdir().expect("failed to create tempdir",);
        assert_eq!(BuildConfig::discover(dir.path(),).expect("defaults",), BuildConfig::default());

        fs::write(dir.path().join("userscript.yaml",), "input: main.js\n",).expect("failed to write",);
        let config = BuildConfig::discover(dir.path(),).expect("config loads",);
        assert_eq!(config.input.as_deref(), Some(Path::new("main.js")));
    }

    #[test]
    fn load_config_reports_missing_file()
    {
        let error = load_config(Path::new("/nonexistent/userscript.yaml",),).expect_err("missing",);
        assert!(matches!(error, Error::ConfigIo { .. }));
    }

    #[test]
    fn meta_overrides_collect_repeated_keys()
    {
        let record = parse_meta_overrides(&["name=Demo", "match=a", "match=b", "match=c", "note=x=y"],)
            .expect("valid overrides",);

        assert_eq!(record.get("name"), Some(&MetadataValue::from("Demo")));
        assert_eq!(
            record.get("match"),
            Some(&MetadataValue::List(vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]))
        );
        assert_eq!(record.get("note"), Some(&MetadataValue::from("x=y")));
    }

    #[test]
    fn meta_overrides_reject_malformed_entries()
    {
        assert!(parse_meta_overrides(&["novalue"]).is_err());
        assert!(parse_meta_overrides(&["=value"]).is_err());
    }
}
