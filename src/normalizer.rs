//! Derivation of the final userscript metadata record.
//!
//! Defaults are inferred from the project manifest, repository-derived fields
//! are filled in next, and caller overrides are layered on top. The resulting
//! record is what the header serializer renders and what names the artifact.

use crate::{
    display_name::DisplayName,
    error::Error,
    manifest::PackageManifest,
    metadata::{MetadataRecord, MetadataValue},
    repository::normalize_repository_url,
};

/// Final metadata for one build together with the resolved script name.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ResolvedMetadata
{
    /// Display name used for the artifact file name.
    pub name:   String,
    /// Record rendered into the userscript header.
    pub record: MetadataRecord,
}

/// Resolves the userscript name.
///
/// An override `name` wins (its first non-blank element when it is a list);
/// otherwise the name is derived from the package name through [`DisplayName`].
///
/// # Errors
///
/// Returns [`Error::Validation`](Error::Validation) when neither source yields
/// a non-blank name.
pub fn resolve_name(manifest: &PackageManifest, overrides: &MetadataRecord,) -> Result<String, Error,>
{
    if let Some(name,) = overrides.get("name",).and_then(MetadataValue::first,) {
        return Ok(name.to_owned(),);
    }

    manifest
        .name
        .as_deref()
        .and_then(|package| DisplayName::builder(package,).build(),)
        .ok_or_else(|| {
            Error::validation(
                "unable to resolve a userscript name: set `name` in the metadata overrides or in \
                 package.json",
            )
        },)
}

/// Infers the default record from the project manifest.
///
/// Fields are inserted in header order. A declared repository becomes
/// `homepageURL` when the manifest has no homepage, and `source` otherwise.
pub fn infer_defaults(manifest: &PackageManifest, name: &str,) -> MetadataRecord
{
    let mut record = MetadataRecord::new();
    record.insert("name", name,);
    record.insert("version", MetadataValue::from_option(manifest.version.clone(),),);
    record.insert("description", MetadataValue::from_option(manifest.description.clone(),),);
    record.insert("license", MetadataValue::from_option(manifest.license.clone(),),);
    record.insert("author", MetadataValue::from_option(manifest.author_name().map(str::to_owned,),),);
    record.insert("homepageURL", MetadataValue::from_option(manifest.homepage.clone(),),);
    record.insert("supportURL", MetadataValue::from_option(manifest.bugs_url().map(str::to_owned,),),);

    if let Some(repository,) = manifest.repository_url().filter(|url| !url.trim().is_empty(),) {
        let url = normalize_repository_url(repository,);
        if record.is_set("homepageURL",) {
            record.insert("source", url,);
        } else {
            record.insert("homepageURL", url,);
        }
    }

    record
}

/// Computes the final metadata for a build.
///
/// # Errors
///
/// Propagates [`resolve_name`] failures.
///
/// # Examples
///
/// ```
/// use userscript_bundler::{MetadataRecord, PackageManifest, resolve_metadata};
///
/// let manifest: PackageManifest =
///     serde_json::from_str(r#"{ "name": "@acme/page-tweaks", "version": "1.2.0" }"#,)?;
/// let resolved = resolve_metadata(&manifest, &MetadataRecord::new(),)?;
/// assert_eq!(resolved.name, "Page Tweaks");
/// assert!(resolved.record.is_set("version"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn resolve_metadata(
    manifest: &PackageManifest,
    overrides: &MetadataRecord,
) -> Result<ResolvedMetadata, Error,>
{
    let name = resolve_name(manifest, overrides,)?;
    let mut record = infer_defaults(manifest, &name,);
    record.merge(overrides,);
    // A blank or absent override never removes `@name`; managers require it.
    if !record.is_set("name",) {
        record.insert("name", name.as_str(),);
    }

    Ok(ResolvedMetadata {
        name,
        record,
    },)
}
