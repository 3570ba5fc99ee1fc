//! Discovery of the Gemini CLI's OAuth client.
//!
//! Google refresh tokens can only be exchanged by the client that issued
//! them. The Gemini CLI ships its installed-app client id and secret inside
//! `@google/gemini-cli-core`, so the package is located on disk and the two
//! constants are read out of `oauth2.js`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use quotabar_fetch::{ClientRegistration, ClientRegistrationSource, FetchContext};
use regex::Regex;
use tracing::{debug, instrument};

use super::error::GeminiError;

/// Env var overriding the client id.
pub const CLIENT_ID_ENV: &str = "GEMINI_OAUTH_CLIENT_ID";

/// Env var overriding the client secret.
pub const CLIENT_SECRET_ENV: &str = "GEMINI_OAUTH_CLIENT_SECRET";

/// Timeout for `npm root -g`.
const NPM_TIMEOUT: Duration = Duration::from_secs(10);

/// Directories walked up from the resolved `gemini` binary.
const MAX_WALK_UP: usize = 10;

/// `oauth2.js` relative to a `node_modules` directory.
const PACKAGE_LAYOUTS: [&str; 2] = [
    "@google/gemini-cli-core/dist/src/code_assist/oauth2.js",
    "@google/gemini-cli/node_modules/@google/gemini-cli-core/dist/src/code_assist/oauth2.js",
];

/// Install roots holding a `node_modules` directory. `~` is the home
/// directory and `*` matches every child directory.
const INSTALL_ROOTS: [&str; 6] = [
    "~/.npm/_npx/*",
    "~/.nvm/versions/node/*/lib",
    "/usr/local/lib",
    "/opt/homebrew/lib",
    "~/.config/yarn/global",
    "~/.local/share/pnpm/global/*",
];

static CLIENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CLIENT_ID\s*=\s*["']([^"']+)["']"#).expect("Invalid regex")
});

static CLIENT_SECRET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CLIENT_SECRET\s*=\s*["']([^"']+)["']"#).expect("Invalid regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Reads the client constants out of JavaScript source.
pub fn parse_client(source: &str) -> Option<ClientRegistration> {
    let id = CLIENT_ID_RE.captures(source)?.get(1)?.as_str();
    let secret = CLIENT_SECRET_RE.captures(source)?.get(1)?.as_str();
    Some(ClientRegistration::new(id, secret))
}

async fn read_client(path: &Path) -> Result<ClientRegistration, GeminiError> {
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GeminiError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    parse_client(&source).ok_or_else(|| GeminiError::MissingClient(path.to_path_buf()))
}

/// Tries every package layout under a `node_modules` directory.
async fn search_node_modules(node_modules: &Path) -> Option<ClientRegistration> {
    for layout in PACKAGE_LAYOUTS {
        let candidate = node_modules.join(layout);
        if !candidate.is_file() {
            continue;
        }
        match read_client(&candidate).await {
            Ok(client) => {
                debug!(path = %candidate.display(), "Found Gemini OAuth client");
                return Some(client);
            }
            Err(e) => debug!(error = %e, "Skipping OAuth client candidate"),
        }
    }
    None
}

/// Expands an install root pattern into existing directories.
fn expand_root(pattern: &str, home: Option<&Path>) -> Vec<PathBuf> {
    let (base, rest) = match pattern.strip_prefix("~/") {
        Some(rest) => match home {
            Some(home) => (home.to_path_buf(), rest),
            None => return Vec::new(),
        },
        None => (PathBuf::from("/"), pattern.trim_start_matches('/')),
    };

    let mut dirs = vec![base];
    for segment in rest.split('/').filter(|s| !s.is_empty()) {
        dirs = if segment == "*" {
            dirs.iter()
                .filter_map(|dir| std::fs::read_dir(dir).ok())
                .flat_map(|entries| entries.filter_map(Result::ok))
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect()
        } else {
            dirs.into_iter()
                .map(|dir| dir.join(segment))
                .filter(|path| path.is_dir())
                .collect()
        };
    }
    dirs.sort();
    dirs
}

// ============================================================================
// Registration Source
// ============================================================================

/// Finds the OAuth client of the locally installed Gemini CLI.
///
/// Order: env override, the `gemini` binary's install tree, `npm root -g`,
/// then well-known install roots. Subprocesses and absolute roots are only
/// used when the host environment allows system probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiCliRegistration;

impl GeminiCliRegistration {
    fn from_env(ctx: &FetchContext) -> Option<ClientRegistration> {
        let id = ctx.env.var(CLIENT_ID_ENV)?;
        let secret = ctx.env.var(CLIENT_SECRET_ENV)?;
        Some(ClientRegistration::new(id, secret))
    }

    async fn from_binary(ctx: &FetchContext) -> Option<ClientRegistration> {
        let binary = ctx.process.which("gemini")?;
        let resolved = std::fs::canonicalize(&binary).ok()?;

        let mut current = resolved.parent();
        for _ in 0..MAX_WALK_UP {
            let dir = current?;
            if let Some(client) = search_node_modules(&dir.join("node_modules")).await {
                return Some(client);
            }
            current = dir.parent();
        }
        None
    }

    async fn from_npm_root(ctx: &FetchContext) -> Result<Option<ClientRegistration>, GeminiError> {
        let output = ctx
            .process
            .run_with_timeout("npm", &["root", "-g"], NPM_TIMEOUT)
            .await?;
        let root = output
            .trimmed_stdout()?
            .ok_or(GeminiError::EmptyOutput("npm root -g"))?;
        Ok(search_node_modules(Path::new(root)).await)
    }

    async fn from_install_roots(ctx: &FetchContext) -> Option<ClientRegistration> {
        let probe_system = ctx.env.probe_system();
        for pattern in INSTALL_ROOTS {
            if !pattern.starts_with('~') && !probe_system {
                continue;
            }
            for root in expand_root(pattern, ctx.env.home()) {
                if let Some(client) = search_node_modules(&root.join("node_modules")).await {
                    return Some(client);
                }
            }
        }
        None
    }
}

#[async_trait]
impl ClientRegistrationSource for GeminiCliRegistration {
    #[instrument(skip_all)]
    async fn discover(&self, ctx: &FetchContext) -> Option<ClientRegistration> {
        if let Some(client) = Self::from_env(ctx) {
            debug!("Using OAuth client from environment");
            return Some(client);
        }

        if ctx.env.probe_system() {
            if let Some(client) = Self::from_binary(ctx).await {
                return Some(client);
            }
            match Self::from_npm_root(ctx).await {
                Ok(Some(client)) => return Some(client),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "npm root lookup failed"),
            }
        }

        Self::from_install_roots(ctx).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quotabar_fetch::testing::{ScriptedTransport, test_context};
    use tempfile::TempDir;

    const OAUTH_JS: &str = r#"
const OAUTH_CLIENT_ID = '681255809395-test.apps.googleusercontent.com';
const OAUTH_CLIENT_SECRET = "GOCSPX-test";
"#;

    fn install(node_modules: &Path, layout: &str, contents: &str) {
        let path = node_modules.join(layout);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_parse_client() {
        let client = parse_client(OAUTH_JS).unwrap();
        assert_eq!(client.client_id, "681255809395-test.apps.googleusercontent.com");
        assert_eq!(client.client_secret, "GOCSPX-test");

        assert!(parse_client("const OAUTH_CLIENT_ID = 'only-id';").is_none());
    }

    #[test]
    fn test_expand_root_wildcard() {
        let home = TempDir::new().unwrap();
        for version in ["v20.1.0", "v22.0.0"] {
            std::fs::create_dir_all(home.path().join(".nvm/versions/node").join(version).join("lib"))
                .unwrap();
        }
        std::fs::write(home.path().join(".nvm/versions/node/README"), "").unwrap();

        let roots = expand_root("~/.nvm/versions/node/*/lib", Some(home.path()));
        assert_eq!(
            roots,
            vec![
                home.path().join(".nvm/versions/node/v20.1.0/lib"),
                home.path().join(".nvm/versions/node/v22.0.0/lib"),
            ]
        );
        assert!(expand_root("~/.config/yarn/global", Some(home.path())).is_empty());
        assert!(expand_root("~/.npm/_npx/*", None).is_empty());
    }

    #[tokio::test]
    async fn test_env_override() {
        let home = TempDir::new().unwrap();
        let ctx = test_context(
            ScriptedTransport::new(),
            home.path(),
            &[(CLIENT_ID_ENV, "id"), (CLIENT_SECRET_ENV, "secret")],
        );
        let client = GeminiCliRegistration.discover(&ctx).await.unwrap();
        assert_eq!(client, ClientRegistration::new("id", "secret"));
    }

    #[tokio::test]
    async fn test_nested_layout_in_npx_cache() {
        let home = TempDir::new().unwrap();
        let node_modules = home.path().join(".npm/_npx/4f2a/node_modules");
        install(&node_modules, PACKAGE_LAYOUTS[1], OAUTH_JS);

        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);
        let client = GeminiCliRegistration.discover(&ctx).await.unwrap();
        assert_eq!(client.client_secret, "GOCSPX-test");
    }

    #[tokio::test]
    async fn test_unusable_file_is_skipped() {
        let home = TempDir::new().unwrap();
        install(
            &home.path().join(".npm/_npx/aaa/node_modules"),
            PACKAGE_LAYOUTS[0],
            "module.exports = {};",
        );
        install(
            &home.path().join(".config/yarn/global/node_modules"),
            PACKAGE_LAYOUTS[0],
            OAUTH_JS,
        );

        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);
        let client = GeminiCliRegistration.discover(&ctx).await.unwrap();
        assert_eq!(client.client_id, "681255809395-test.apps.googleusercontent.com");
    }

    #[tokio::test]
    async fn test_nothing_installed() {
        let home = TempDir::new().unwrap();
        let ctx = test_context(ScriptedTransport::new(), home.path(), &[]);
        assert!(GeminiCliRegistration.discover(&ctx).await.is_none());
    }
}
