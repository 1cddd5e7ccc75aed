#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the bundler crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free while still
//! exposing a thoroughly documented error surface for library consumers.

use std::path::{Path, PathBuf};

/// Unified error type returned by the build orchestrator and CLI.
///
/// Configuration-class variants ([`Error::is_configuration`]) are raised
/// before the bundler is ever invoked. Instances are typically constructed
/// through the path-carrying helpers at the bottom of this module.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading the project manifest.
    #[error("failed to read project metadata from {path:?}: {source}")]
    ManifestIo {
        /// Location of the `package.json` file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps JSON decoding errors raised for the project manifest.
    #[error("failed to parse project metadata at {path:?}: {source}")]
    ManifestParse {
        /// Location of the `package.json` file.
        path:   PathBuf,
        /// Source decoding error from serde_json.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while reading the build configuration.
    #[error("failed to read configuration from {path:?}: {source}")]
    ConfigIo {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when the configuration violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Reported by the external bundler.
    #[error("bundler error: {message}")]
    Bundler {
        /// Human readable message, usually the bundler's own diagnostics.
        message: String
    },
    /// Wraps I/O errors that occur while preparing or writing artifacts.
    #[error("failed to write artifact at {path:?}: {source}")]
    ArtifactIo {
        /// Location of the artifact or directory being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a bundler error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the bundler failure.
    pub fn bundler<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Bundler {
            message: message.into()
        }
    }

    /// Reports whether the error belongs to the configuration class.
    ///
    /// Configuration errors abort a build before the bundler is started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ManifestIo { .. }
                | Self::ManifestParse { .. }
                | Self::ConfigIo { .. }
                | Self::ConfigParse { .. }
                | Self::Validation { .. }
        )
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// This method is primarily intended for CLI contexts where the variant
    /// name does not add value to end users. The returned string matches the
    /// [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
            source
        }
    }
}

/// Creates an [`Error::ManifestIo`] variant capturing the failing path.
///
/// # Parameters
///
/// * `path` - Location of the manifest that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn manifest_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ManifestIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ManifestParse`] variant capturing the failing path.
pub fn manifest_parse_error(path: &Path, source: serde_json::Error) -> Error {
    Error::ManifestParse {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ConfigIo`] variant capturing the failing path.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn config_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ConfigIo {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ArtifactIo`] variant capturing the failing path.
///
/// # Parameters
///
/// * `path` - Location of the artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn artifact_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ArtifactIo {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::bundler("display me");
        assert_eq!(error.to_string(), error.to_display_string());
        assert_eq!(error.to_string(), "bundler error: display me");
    }

    #[test]
    fn manifest_io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/package.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::manifest_io_error(path, io_error);

        match error {
            Error::ManifestIo {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected manifest io error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_config_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::ConfigParse { .. }));
    }

    #[test]
    fn configuration_class_excludes_bundler_and_artifact_errors() {
        let path = std::path::Path::new("/tmp/dist");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();

        assert!(Error::validation("no name").is_configuration());
        assert!(super::manifest_parse_error(path, invalid).is_configuration());
        assert!(!Error::bundler("exit status 1").is_configuration());
        assert!(!super::artifact_io_error(path, denied).is_configuration());
    }
}
