// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Utilities for deriving human readable script names from package names.
//!
//! Package names follow npm conventions (`@scope/some-tool`) while userscript
//! managers display the `@name` field verbatim, so the derived name drops the
//! scope and title-cases every `/` or `-` separated segment.

/// Builder for display names derived from npm package names.
#[derive(Debug, Clone, Copy,)]
pub struct DisplayName<'input,>
{
    source: &'input str,
}

impl<'input,> DisplayName<'input,>
{
    /// Creates a new display-name builder for the provided package name.
    ///
    /// The builder retains a borrowed view of the source to avoid allocations
    /// until [`build`](Self::build) is invoked.
    pub fn builder(source: &'input str,) -> Self
    {
        Self {
            source,
        }
    }

    /// Builds the display name. A leading `@scope/` is removed, the remainder
    /// is split on `/` and `-`, empty segments are dropped, and the first
    /// character of every segment is upper-cased. Returns `None` when nothing
    /// is left after normalization.
    ///
    /// # Examples
    ///
    /// ```
    /// use userscript_bundler::DisplayName;
    ///
    /// let name = DisplayName::builder("@scope/my-tool",).build();
    /// assert_eq!(name.as_deref(), Some("My Tool"));
    /// ```
    pub fn build(self,) -> Option<String,>
    {
        let trimmed = self.source.trim();
        let unscoped = match trimmed.strip_prefix('@',) {
            Some(rest,) => rest.split_once('/',).map_or(rest, |(_, name,)| name,),
            None => trimmed,
        };

        let mut name = String::with_capacity(unscoped.len(),);
        for segment in unscoped.split(['/', '-',],).filter(|segment| !segment.trim().is_empty(),) {
            if !name.is_empty() {
                name.push(' ',);
            }
            let mut chars = segment.trim().chars();
            if let Some(first,) = chars.next() {
                name.extend(first.to_uppercase(),);
                name.push_str(chars.as_str(),);
            }
        }

        if name.is_empty() { None } else { Some(name,) }
    }
}
