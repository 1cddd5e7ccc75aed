//! Project metadata read from `package.json`.
//!
//! Only the handful of fields that feed the userscript header are modelled.
//! npm allows several of them to be either a bare string or an object, so
//! those are represented as untagged enums and flattened through accessor
//! methods.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{self, Error};

/// File name of the project manifest inside the root directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Subset of `package.json` consumed by the metadata normalizer.
///
/// # Examples
///
/// ```
/// use userscript_bundler::PackageManifest;
///
/// let json = r#"{ "name": "@me/tool", "author": { "name": "Me" } }"#;
/// let manifest: PackageManifest = serde_json::from_str(json,).expect("valid manifest",);
/// assert_eq!(manifest.author_name(), Some("Me"));
/// ```
#[derive(Debug, Clone, Default, Deserialize,)]
pub struct PackageManifest
{
    /// npm package name, possibly scoped.
    #[serde(default)]
    pub name:        Option<String,>,
    /// Package version.
    #[serde(default)]
    pub version:     Option<String,>,
    /// Short package description.
    #[serde(default)]
    pub description: Option<String,>,
    /// SPDX license expression.
    #[serde(default)]
    pub license:     Option<String,>,
    /// Package author as a string or a person object.
    #[serde(default)]
    pub author:      Option<Person,>,
    /// Project homepage.
    #[serde(default)]
    pub homepage:    Option<String,>,
    /// Issue tracker as a URL string or an object with a `url` field.
    #[serde(default)]
    pub bugs:        Option<Locator,>,
    /// Source repository as a shorthand string or an object with a `url`.
    #[serde(default)]
    pub repository:  Option<Locator,>,
}

/// npm person field.
#[derive(Debug, Clone, Deserialize,)]
#[serde(untagged)]
pub enum Person
{
    /// `"Name <email> (url)"` string form, used verbatim.
    Text(String,),
    /// Structured form; only the name is used.
    Object
    {
        /// Display name of the person.
        #[serde(default)]
        name: Option<String,>,
    },
}

/// Field that is either a plain URL string or an object carrying `url`.
#[derive(Debug, Clone, Deserialize,)]
#[serde(untagged)]
pub enum Locator
{
    /// Plain string form.
    Text(String,),
    /// Structured form such as `{ "type": "git", "url": "..." }`.
    Object
    {
        /// Location of the resource.
        #[serde(default)]
        url: Option<String,>,
    },
}

impl Person
{
    fn name(&self,) -> Option<&str,>
    {
        match self {
            Self::Text(text,) => Some(text.as_str(),),
            Self::Object {
                name,
            } => name.as_deref(),
        }
    }
}

impl Locator
{
    fn url(&self,) -> Option<&str,>
    {
        match self {
            Self::Text(text,) => Some(text.as_str(),),
            Self::Object {
                url,
            } => url.as_deref(),
        }
    }
}

impl PackageManifest
{
    /// Author display value.
    pub fn author_name(&self,) -> Option<&str,>
    {
        self.author.as_ref().and_then(Person::name,)
    }

    /// Issue tracker URL.
    pub fn bugs_url(&self,) -> Option<&str,>
    {
        self.bugs.as_ref().and_then(Locator::url,)
    }

    /// Raw repository location, before normalization.
    pub fn repository_url(&self,) -> Option<&str,>
    {
        self.repository.as_ref().and_then(Locator::url,)
    }
}

/// Loads the project manifest from `<root>/package.json`.
///
/// # Errors
///
/// Returns [`Error::ManifestIo`](Error::ManifestIo) when the file cannot be
/// read and [`Error::ManifestParse`](Error::ManifestParse) when it is not a
/// valid manifest.
pub fn load_manifest(root: &Path,) -> Result<PackageManifest, Error,>
{
    let path = root.join(MANIFEST_FILE,);
    let contents =
        fs::read_to_string(&path,).map_err(|source| error::manifest_io_error(&path, source,),)?;
    serde_json::from_str(&contents,).map_err(|source| error::manifest_parse_error(&path, source,),)
}
