//! Directory crawler.
//!
//! # Responsibilities
//! - Walk the routes directory once, synchronously, at startup
//! - Classify entries: route files, literal directories, `$param` directories
//! - Load a `Route` for every route file and register it at the directory's path
//! - Emit registrations most-specific first
//!
//! # Design Decisions
//! - Per directory: wildcard routes, literal subtrees, param subtrees, then the rest
//! - A route file without a route is fatal; no partial table is ever returned
//! - Entries are listed case-insensitively, so two crawls of one tree agree

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::CrawlerConfig;
use crate::error::CrawlError;
use crate::http::dispatch::Registration;
use crate::observability::metrics;
use crate::route::Route;
use crate::routing::ordering::{
    order_route_files, partition_wildcards, sort_case_insensitive, RouteFileName,
};
use crate::routing::verb::Verb;

/// Supplies the route behind a route file.
pub trait RouteLoader {
    /// `relative_path` is relative to the crawl root, e.g. `account/get-2.js`.
    fn load(&self, relative_path: &Path) -> Option<Route>;
}

impl<F> RouteLoader for F
where
    F: Fn(&Path) -> Option<Route>,
{
    fn load(&self, relative_path: &Path) -> Option<Route> {
        self(relative_path)
    }
}

/// Routes keyed by their file's path relative to the crawl root.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<PathBuf, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relative_path: impl Into<PathBuf>, route: Route) -> &mut Self {
        self.routes.insert(relative_path.into(), route);
        self
    }

    pub fn with(mut self, relative_path: impl Into<PathBuf>, route: Route) -> Self {
        self.insert(relative_path, route);
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteLoader for RouteTable {
    fn load(&self, relative_path: &Path) -> Option<Route> {
        self.routes.get(relative_path).cloned()
    }
}

/// One registration produced by a crawl, with where it came from.
#[derive(Debug, Clone)]
pub struct CrawledRoute {
    pub verb: Verb,
    /// Path the route was registered at, before any wildcard suffix.
    pub path: String,
    /// Route file relative to the crawl root.
    pub file: PathBuf,
    pub registration: Registration,
}

/// Transient pairing of a parsed filename and its loaded route.
struct RouteMapping {
    file: RouteFileName,
    relative: PathBuf,
    route: Route,
}

pub struct Crawler {
    root: PathBuf,
    extension: String,
    param_marker: String,
}

impl Crawler {
    pub fn new(config: &CrawlerConfig) -> Self {
        Self {
            root: config.root.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            param_marker: config.param_marker.clone(),
        }
    }

    /// A crawler for `root` with the default conventions.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self::new(&CrawlerConfig {
            root: root.into(),
            ..CrawlerConfig::default()
        })
    }

    /// Same conventions, different root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the whole tree and return registrations in match order.
    pub fn crawl(&self, loader: &dyn RouteLoader) -> Result<Vec<CrawledRoute>, CrawlError> {
        let mut out = Vec::new();
        self.walk(&self.root, &[], loader, &mut out)?;

        let layers: usize = out.iter().map(|r| r.registration.len()).sum();
        metrics::record_registrations(layers);
        tracing::info!(
            root = %self.root.display(),
            routes = out.len(),
            layers,
            "Route crawl complete"
        );

        Ok(out)
    }

    fn walk(
        &self,
        dir: &Path,
        tokens: &[String],
        loader: &dyn RouteLoader,
        out: &mut Vec<CrawledRoute>,
    ) -> Result<(), CrawlError> {
        let mut names = self.list(dir)?;
        sort_case_insensitive(&mut names);

        let mut files = Vec::new();
        let mut literal_dirs = Vec::new();
        let mut param_dirs = Vec::new();

        for name in names {
            let full = dir.join(&name);
            let meta = fs::metadata(&full).map_err(|source| CrawlError::Io {
                path: full.clone(),
                source,
            })?;

            if meta.is_file() {
                files.push(name);
            } else if meta.is_dir() {
                if name.starts_with(&self.param_marker) {
                    param_dirs.push(name);
                } else {
                    literal_dirs.push(name);
                }
            }
        }

        let mut mappings = Vec::new();
        for file in order_route_files(&files, &self.extension) {
            let full = dir.join(&file.filename);
            let relative = full
                .strip_prefix(&self.root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| full.clone());

            let route = loader
                .load(&relative)
                .ok_or_else(|| CrawlError::MissingRoute {
                    path: relative.clone(),
                })?;

            mappings.push(RouteMapping {
                file,
                relative,
                route,
            });
        }

        let path = format!("/{}", tokens.join("/"));
        let (wildcards, rest) = partition_wildcards(mappings, |m| m.route.is_wildcard());

        for mapping in wildcards {
            out.push(self.register(mapping, &path)?);
        }

        for name in &literal_dirs {
            let mut child = tokens.to_vec();
            child.push(name.clone());
            self.walk(&dir.join(name), &child, loader, out)?;
        }

        for name in &param_dirs {
            let mut child = tokens.to_vec();
            child.push(format!(":{}", &name[self.param_marker.len()..]));
            self.walk(&dir.join(name), &child, loader, out)?;
        }

        for mapping in rest {
            out.push(self.register(mapping, &path)?);
        }

        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<String>, CrawlError> {
        let io_err = |source| CrawlError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    tracing::warn!(dir = %dir.display(), name = ?raw, "Skipping non UTF-8 entry");
                }
            }
        }
        Ok(names)
    }

    fn register(&self, mapping: RouteMapping, path: &str) -> Result<CrawledRoute, CrawlError> {
        let verb = mapping.file.verb;
        let registration = mapping
            .route
            .register(verb, path)
            .map_err(|source| CrawlError::Compose {
                path: mapping.relative.clone(),
                source,
            })?;

        tracing::debug!(
            verb = %verb,
            path = %path,
            file = %mapping.relative.display(),
            layers = registration.len(),
            "Registered route"
        );

        Ok(CrawledRoute {
            verb,
            path: path.to_string(),
            file: mapping.relative,
            registration,
        })
    }
}

/// Crawl `root` with default conventions and return the registrations in order.
pub fn crawl(root: impl Into<PathBuf>, loader: &dyn RouteLoader) -> Result<Vec<Registration>, CrawlError> {
    Ok(Crawler::at(root)
        .crawl(loader)?
        .into_iter()
        .map(|r| r.registration)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{Handler, RouteOptions};
    use std::fs::File;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn text(body: &'static str) -> Route {
        Route::single(Handler::continuation(move |_req, res, _next| {
            res.send(body);
        }))
    }

    fn wildcard(body: &'static str) -> Route {
        Route::new(
            RouteOptions::new()
                .wildcard(true)
                .handler(Handler::continuation(move |_req, res, _next| {
                    res.send(body);
                })),
        )
    }

    fn order(crawled: &[CrawledRoute]) -> Vec<String> {
        crawled
            .iter()
            .map(|r| r.file.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_directory_composition_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in [
            "get.js",
            "all-1.js",
            "README.md",
            "account/get.js",
            "account/$id/get.js",
            "account/settings/get.js",
            "$slug/get.js",
            "Blog/get.js",
        ] {
            touch(root, file);
        }

        let table = RouteTable::new()
            .with("get.js", text("root"))
            .with("all-1.js", text("all"))
            .with("account/get.js", text("account"))
            .with("account/$id/get.js", text("account id"))
            .with("account/settings/get.js", text("settings"))
            .with("$slug/get.js", text("slug"))
            .with("Blog/get.js", text("blog"));

        let crawled = Crawler::at(root).crawl(&table).unwrap();
        assert_eq!(
            order(&crawled),
            vec![
                "account/settings/get.js",
                "account/$id/get.js",
                "account/get.js",
                "Blog/get.js",
                "$slug/get.js",
                "all-1.js",
                "get.js",
            ]
        );

        let paths: Vec<&str> = crawled.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/account/settings", "/account/:id", "/account", "/Blog", "/:slug", "/", "/"]
        );
    }

    #[test]
    fn test_wildcards_hoisted_above_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for file in ["get-1.js", "get-2.js", "docs/get.js", "$id/get.js"] {
            touch(root, file);
        }

        let table = RouteTable::new()
            .with("get-1.js", text("one"))
            .with("get-2.js", wildcard("catch-all"))
            .with("docs/get.js", text("docs"))
            .with("$id/get.js", text("id"));

        let crawled = Crawler::at(root).crawl(&table).unwrap();
        assert_eq!(
            order(&crawled),
            vec!["get-2.js", "docs/get.js", "$id/get.js", "get-1.js"]
        );
        assert_eq!(crawled[0].registration.layers()[0].pattern().as_str(), "*");
    }

    #[test]
    fn test_missing_route_aborts_with_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "get.js");
        touch(dir.path(), "account/post-2.js");

        let table = RouteTable::new().with("get.js", text("root"));
        let err = Crawler::at(dir.path()).crawl(&table).unwrap_err();
        match err {
            CrawlError::MissingRoute { path } => {
                assert_eq!(path, Path::new("account").join("post-2.js"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_route_files_are_never_loaded() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["other.js", "helpers.js", "get.txt", "notes.md"] {
            touch(dir.path(), file);
        }
        let loader = |path: &Path| -> Option<Route> { panic!("loaded {}", path.display()) };
        assert!(Crawler::at(dir.path()).crawl(&loader).unwrap().is_empty());
    }

    #[test]
    fn test_custom_conventions() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "_user/GET.route");
        touch(dir.path(), "_user/get.js");

        let config = CrawlerConfig {
            root: dir.path().to_path_buf(),
            extension: ".route".into(),
            param_marker: "_".into(),
        };
        let table = RouteTable::new().with(Path::new("_user").join("GET.route"), text("user"));
        let crawled = Crawler::new(&config).crawl(&table).unwrap();
        assert_eq!(crawled.len(), 1);
        assert_eq!(crawled[0].path, "/:user");
        assert_eq!(crawled[0].verb, Verb::Get);
    }

    #[test]
    fn test_crawl_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["b/get.js", "A/get.js", "a2/get.js", "$x/get.js", "$Y/get.js", "get.js"] {
            touch(dir.path(), file);
        }
        let loader = |_: &Path| Some(text("x"));
        let first = order(&Crawler::at(dir.path()).crawl(&loader).unwrap());
        let second = order(&Crawler::at(dir.path()).crawl(&loader).unwrap());
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec!["A/get.js", "a2/get.js", "b/get.js", "$x/get.js", "$Y/get.js", "get.js"]
        );
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let err = crawl("/definitely/not/a/routes/dir", &RouteTable::new()).unwrap_err();
        assert!(matches!(err, CrawlError::Io { .. }));
    }
}
