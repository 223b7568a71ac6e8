//! Route synthesis: file paths plus export sets become URL route patterns.
//!
//! The functions root uses file-based routing: `index.ts` serves `/`,
//! `users/[id].ts` serves `/users/:id`, `docs/[[path]].ts` serves
//! `/docs/*`. A file's exported handler names decide which HTTP methods
//! the route accepts. Patterns are prefix-mount patterns: a request may
//! carry more segments than the pattern and still match.

use std::path::{Component, Path};

use http::Method;

/// Export name recognized as a catch-all handler for every HTTP method.
pub const ALL_METHODS_EXPORT: &str = "onRequest";

/// File stem marking middleware files, which never become routes.
pub const MIDDLEWARE_STEM: &str = "_middleware";

/// The HTTP method served by a recognized handler export name.
/// Names are case-sensitive; anything unrecognized contributes nothing.
fn method_for_export(name: &str) -> Option<Method> {
    match name {
        "onRequestGet" => Some(Method::GET),
        "onRequestPost" => Some(Method::POST),
        "onRequestPatch" => Some(Method::PATCH),
        "onRequestPut" => Some(Method::PUT),
        "onRequestDelete" => Some(Method::DELETE),
        "onRequestHead" => Some(Method::HEAD),
        "onRequestOptions" => Some(Method::OPTIONS),
        _ => None,
    }
}

/// A synthesized route: URL pattern plus the methods it accepts.
///
/// Invariant: `match_all` is set or `allowed_methods` is non-empty;
/// files satisfying neither produce no descriptor at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// URL route pattern (`/users/:id`, `/docs/*`, `/`).
    pub route_path: String,
    /// Methods accepted when `match_all` is false. Deduplicated.
    pub allowed_methods: Vec<Method>,
    /// Accept every method, regardless of `allowed_methods`.
    pub match_all: bool,
}

impl RouteDescriptor {
    /// Whether a request with this method may use the route.
    pub fn allows(&self, method: &Method) -> bool {
        self.match_all || self.allowed_methods.contains(method)
    }
}

/// Synthesize a route descriptor from a file path relative to the
/// functions root and the file's discovered export names.
///
/// Returns `None` for middleware files and for files exporting neither
/// the catch-all handler nor any recognized method handler.
pub fn synthesize(relative_path: &Path, exports: &[String]) -> Option<RouteDescriptor> {
    if relative_path.file_stem().and_then(|stem| stem.to_str()) == Some(MIDDLEWARE_STEM) {
        return None;
    }

    let match_all = exports.iter().any(|name| name == ALL_METHODS_EXPORT);

    let mut allowed_methods = Vec::new();
    for name in exports {
        if let Some(method) = method_for_export(name) {
            if !allowed_methods.contains(&method) {
                allowed_methods.push(method);
            }
        }
    }

    if !match_all && allowed_methods.is_empty() {
        return None;
    }

    Some(RouteDescriptor {
        route_path: route_path(relative_path),
        allowed_methods,
        match_all,
    })
}

/// Build the URL pattern for a file path relative to the functions root.
///
/// Steps: strip the extension, transform each bracketed segment
/// independently (`[[name]]` -> `*`, `[name]` -> `:name`), normalize
/// separators to `/`, drop a trailing `index` segment, prefix with `/`.
fn route_path(relative_path: &Path) -> String {
    let mut segments: Vec<String> = relative_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some(dot) = last.rfind('.') {
            last.truncate(dot);
        }
    }

    if segments.last().is_some_and(|segment| segment == "index") {
        segments.pop();
    }

    let mut out = String::new();
    for segment in &segments {
        out.push('/');
        out.push_str(&transform_segment(segment));
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Transform one path segment. Already-normalized segments pass through
/// unchanged, so the transformation is idempotent.
fn transform_segment(segment: &str) -> String {
    if segment.len() > 4 {
        if let Some(inner) = segment
            .strip_prefix("[[")
            .and_then(|rest| rest.strip_suffix("]]"))
        {
            if !inner.is_empty() {
                return "*".to_string();
            }
        }
    }
    if segment.len() > 2 {
        if let Some(inner) = segment
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            return format!(":{inner}");
        }
    }
    segment.to_string()
}

/// One segment of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Must equal the request segment exactly.
    Literal(String),
    /// Matches any single request segment.
    Param(String),
    /// Matches the whole remainder of the request path.
    Wildcard,
}

/// A parsed route pattern, matched against request paths with
/// prefix-mount semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<PatternSegment>,
}

impl RoutePattern {
    /// Parse a synthesized route path into its pattern segments.
    pub fn parse(route_path: &str) -> Self {
        let segments = route_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                if segment == "*" {
                    PatternSegment::Wildcard
                } else if let Some(name) = segment.strip_prefix(':') {
                    PatternSegment::Param(name.to_string())
                } else {
                    PatternSegment::Literal(segment.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// Match a request path against the pattern.
    ///
    /// Returns the number of literal segments matched, or `None` when the
    /// pattern does not match. Request segments beyond the pattern are
    /// allowed (the pattern is a mount prefix, not an exact route); the
    /// literal count feeds the specificity tie-break between overlapping
    /// patterns.
    pub fn match_score(&self, path: &str) -> Option<usize> {
        let request: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut score = 0;
        let mut index = 0;
        for segment in &self.segments {
            match segment {
                PatternSegment::Wildcard => return Some(score),
                PatternSegment::Param(_) => {
                    if index >= request.len() {
                        return None;
                    }
                    index += 1;
                }
                PatternSegment::Literal(literal) => match request.get(index) {
                    Some(part) if *part == literal => {
                        score += 1;
                        index += 1;
                    }
                    _ => return None,
                },
            }
        }
        Some(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exports(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn index_file_becomes_root_route() {
        let descriptor =
            synthesize(&PathBuf::from("index.ts"), &exports(&["onRequestGet"])).unwrap();
        assert_eq!(descriptor.route_path, "/");
        assert_eq!(descriptor.allowed_methods, [Method::GET]);
        assert!(!descriptor.match_all);
    }

    #[test]
    fn dynamic_segment_becomes_named_parameter() {
        let descriptor =
            synthesize(&PathBuf::from("api/[id].ts"), &exports(&["onRequest"])).unwrap();
        assert_eq!(descriptor.route_path, "/api/:id");
        assert!(descriptor.match_all);
    }

    #[test]
    fn doubled_bracket_segment_becomes_wildcard() {
        let descriptor = synthesize(
            &PathBuf::from("catchall/[[path]].ts"),
            &exports(&["onRequestPost"]),
        )
        .unwrap();
        assert_eq!(descriptor.route_path, "/catchall/*");
        assert_eq!(descriptor.allowed_methods, [Method::POST]);
        assert!(!descriptor.match_all);
    }

    #[test]
    fn each_bracketed_segment_transforms_independently() {
        let descriptor = synthesize(
            &PathBuf::from("shops/[shop]/[item].ts"),
            &exports(&["onRequestGet"]),
        )
        .unwrap();
        assert_eq!(descriptor.route_path, "/shops/:shop/:item");
    }

    #[test]
    fn trailing_index_segment_is_dropped() {
        let descriptor = synthesize(
            &PathBuf::from("users/index.ts"),
            &exports(&["onRequestGet"]),
        )
        .unwrap();
        assert_eq!(descriptor.route_path, "/users");
    }

    #[test]
    fn middleware_files_are_skipped() {
        assert!(synthesize(&PathBuf::from("_middleware.ts"), &exports(&["onRequest"])).is_none());
        assert!(synthesize(
            &PathBuf::from("api/_middleware.js"),
            &exports(&["onRequestGet"])
        )
        .is_none());
    }

    #[test]
    fn unrecognized_exports_yield_no_descriptor() {
        assert!(synthesize(
            &PathBuf::from("types.ts"),
            &exports(&["Env", "Session", "helper"])
        )
        .is_none());
        assert!(synthesize(&PathBuf::from("empty.ts"), &[]).is_none());
    }

    #[test]
    fn unrecognized_exports_are_ignored_alongside_recognized_ones() {
        let descriptor = synthesize(
            &PathBuf::from("api.ts"),
            &exports(&["Env", "onRequestGet", "onRequestDelete", "helper"]),
        )
        .unwrap();
        assert_eq!(descriptor.allowed_methods, [Method::GET, Method::DELETE]);
    }

    #[test]
    fn duplicate_exports_collapse_to_one_method() {
        let descriptor = synthesize(
            &PathBuf::from("api.ts"),
            &exports(&["onRequestGet", "onRequestGet"]),
        )
        .unwrap();
        assert_eq!(descriptor.allowed_methods, [Method::GET]);
    }

    #[test]
    fn catch_all_export_overrides_method_set() {
        let descriptor = synthesize(
            &PathBuf::from("everything.ts"),
            &exports(&["onRequestGet", "onRequest"]),
        )
        .unwrap();
        assert!(descriptor.match_all);
        assert!(descriptor.allows(&Method::PUT));
    }

    #[test]
    fn segment_transform_is_idempotent() {
        assert_eq!(transform_segment(":id"), ":id");
        assert_eq!(transform_segment("*"), "*");
        assert_eq!(transform_segment("users"), "users");
        assert_eq!(transform_segment("[id]"), ":id");
        assert_eq!(transform_segment("[[path]]"), "*");
    }

    #[test]
    fn pattern_matches_exact_and_deeper_paths() {
        let pattern = RoutePattern::parse("/users/:id");
        assert_eq!(pattern.match_score("/users/42"), Some(1));
        assert_eq!(pattern.match_score("/users/42/posts"), Some(1));
        assert_eq!(pattern.match_score("/users"), None);
        assert_eq!(pattern.match_score("/orders/42"), None);
    }

    #[test]
    fn wildcard_consumes_the_remainder() {
        let pattern = RoutePattern::parse("/docs/*");
        assert_eq!(pattern.match_score("/docs"), Some(1));
        assert_eq!(pattern.match_score("/docs/a/b/c"), Some(1));
        assert_eq!(pattern.match_score("/api"), None);
    }

    #[test]
    fn root_pattern_matches_everything() {
        let pattern = RoutePattern::parse("/");
        assert_eq!(pattern.match_score("/"), Some(0));
        assert_eq!(pattern.match_score("/anything/at/all"), Some(0));
    }

    #[test]
    fn literal_count_ranks_specificity() {
        let literal = RoutePattern::parse("/users/profile");
        let dynamic = RoutePattern::parse("/users/:id");
        assert!(literal.match_score("/users/profile") > dynamic.match_score("/users/profile"));
    }
}
