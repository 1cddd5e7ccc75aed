//! Known userscript managers and their local script storage.
//!
//! Some managers keep installed scripts as plain files in a per-user
//! directory. Pointing a mirror at that directory lets a fresh build show up
//! in the browser without reinstalling it.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Userscript managers with a known script storage directory.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, ValueEnum,)]
#[serde(rename_all = "snake_case")]
pub enum UserscriptManager
{
    /// The "Userscripts" Safari extension for macOS.
    Userscripts,
}

impl UserscriptManager
{
    /// Every supported manager, in display order.
    pub const ALL: &'static [Self] = &[Self::Userscripts];

    /// Identifier accepted on the command line and in configuration files.
    pub const fn as_str(self,) -> &'static str
    {
        match self {
            Self::Userscripts => "userscripts",
        }
    }

    /// Returns the script storage directory below `home`.
    ///
    /// The path is computed only; nothing on disk is inspected.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use userscript_bundler::UserscriptManager;
    ///
    /// let dir = UserscriptManager::Userscripts.scripts_dir(Path::new("/Users/me",),);
    /// assert!(dir.ends_with("Data/Documents/scripts"));
    /// ```
    pub fn scripts_dir(self, home: &Path,) -> PathBuf
    {
        match self {
            Self::Userscripts => home
                .join("Library",)
                .join("Containers",)
                .join("com.userscripts.macos.Userscripts-Extension",)
                .join("Data",)
                .join("Documents",)
                .join("scripts",),
        }
    }
}

impl fmt::Display for UserscriptManager
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

impl FromStr for UserscriptManager
{
    type Err = Error;

    fn from_str(value: &str,) -> Result<Self, Self::Err,>
    {
        let wanted = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|manager| manager.as_str().eq_ignore_ascii_case(wanted,),)
            .ok_or_else(|| {
                let known: Vec<&str,> = Self::ALL.iter().map(|manager| manager.as_str(),).collect();
                Error::validation(format!(
                    "unknown userscript manager '{wanted}' (supported: {})",
                    known.join(", ")
                ),)
            },)
    }
}

#[cfg(test)]
mod tests
{
    use std::path::Path;

    use super::UserscriptManager;
    use crate::Error;

    #[test]
    fn userscripts_directory_lives_in_extension_container()
    {
        let dir = UserscriptManager::Userscripts.scripts_dir(Path::new("/Users/jane",),);
        assert_eq!(
            dir,
            Path::new(
                "/Users/jane/Library/Containers/com.userscripts.macos.Userscripts-Extension/Data/\
                 Documents/scripts"
            )
        );
    }

    #[test]
    fn parsing_is_case_insensitive()
    {
        let manager: UserscriptManager = " Userscripts ".parse().expect("known manager",);
        assert_eq!(manager, UserscriptManager::Userscripts);
        assert_eq!(manager.to_string(), "userscripts");
    }

    #[test]
    fn unknown_manager_is_rejected()
    {
        let error = "greasemonkey".parse::<UserscriptManager,>().expect_err("unknown manager",);
        match error {
            Error::Validation {
                message,
            } => {
                assert!(message.contains("unknown userscript manager 'greasemonkey'"));
                assert!(message.contains("userscripts"));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn yaml_uses_snake_case_identifiers()
    {
        let managers: Vec<UserscriptManager,> =
            serde_yaml::from_str("[userscripts]",).expect("valid manager list",);
        assert_eq!(managers, [UserscriptManager::Userscripts]);
    }
}
