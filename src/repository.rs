// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Canonicalizes repository locations declared in `package.json`.
///
/// npm accepts many spellings for the `repository` field: git remotes, scp
/// style SSH addresses, hosted shorthands and bare `owner/repo` pairs. The
/// userscript header wants a browsable `https://` URL instead.
use std::sync::LazyLock;

use regex::Regex;

static CREDENTIALS: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"(^|/)[^/@]+@",).expect("valid credentials pattern",)
},);

static SCP_SEPARATOR: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"([\w-]+(?:\.[\w-]+)+):([^/])",).expect("valid scp pattern",)
},);

/// Same as [`SCP_SEPARATOR`] but leaves `host.tld:<digit>` alone, which is a
/// port once the location carries its own scheme.
static SCP_SEPARATOR_NOT_PORT: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"([\w-]+(?:\.[\w-]+)+):([^\d/])",).expect("valid scp pattern",)
},);

const HOSTED_SHORTHANDS: &[(&str, &str,)] = &[
    ("github:", "https://github.com/",),
    ("gitlab:", "https://gitlab.com/",),
    ("bitbucket:", "https://bitbucket.org/",),
];

/// Normalizes a repository location into an `https://` URL.
///
/// The function never fails: inputs it does not recognize are passed through
/// with at most an `https://` prefix added.
///
/// # Example
///
/// ```
/// use userscript_bundler::normalize_repository_url;
///
/// assert_eq!(
///     normalize_repository_url("git+ssh://git@github.com:user/repo.git"),
///     "https://github.com/user/repo"
/// );
/// assert_eq!(normalize_repository_url("user/repo"), "https://github.com/user/repo");
/// ```
pub fn normalize_repository_url(input: &str,) -> String
{
    let mut url = input.trim();
    url = url.strip_prefix("git+",).unwrap_or(url,);
    url = url.strip_suffix(".git",).unwrap_or(url,);

    // `git@host:1password/repo` is scp syntax even though a digit follows
    // the colon; only a scheme without credentials can carry a port.
    let scp_style = CREDENTIALS.is_match(url,) || !url.contains("://",);
    let url = CREDENTIALS.replace(url, "$1",);
    let url = if scp_style {
        SCP_SEPARATOR.replace(&url, "$1/$2",)
    } else {
        SCP_SEPARATOR_NOT_PORT.replace(&url, "$1/$2",)
    };
    let url = replace_scheme(&url, "git://",);
    let url = replace_scheme(&url, "ssh://",);

    for (prefix, base,) in HOSTED_SHORTHANDS {
        if let Some(path,) = url.strip_prefix(prefix,) {
            return format!("{base}{path}");
        }
    }

    if !url.contains("://",) && is_owner_repo_shorthand(&url,) {
        return format!("https://github.com/{url}");
    }

    if url.contains("://",) { url } else { format!("https://{url}") }
}

fn replace_scheme(url: &str, scheme: &str,) -> String
{
    match url.strip_prefix(scheme,) {
        Some(rest,) => format!("https://{rest}"),
        None => url.to_owned(),
    }
}

fn is_owner_repo_shorthand(url: &str,) -> bool
{
    let mut segments = url.split('/',);
    matches!(
        (segments.next(), segments.next(), segments.next()),
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty()
    )
}
