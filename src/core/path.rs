//! Pure string operations over canonical paths.
//!
//! A canonical path is the root marker followed by separator-joined components,
//! e.g. `/docs/note.txt` for a `/`-rooted namespace or `$.Docs.Note` for a
//! namespace whose root marker is `$` and whose separator is `.`.
//! No `.`/`..` interpretation happens here: components are opaque names.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathModel {
    root: String,
    separator: char,
    case_insensitive: bool,
}

impl Default for PathModel {
    fn default() -> Self {
        Self::new("/", '/')
    }
}

impl PathModel {
    /// Creates a case insensitive model.
    pub fn new(root: impl Into<String>, separator: char) -> Self {
        Self {
            root: root.into(),
            separator,
            case_insensitive: true,
        }
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// `/`-style roots are not a component of their own, `$`-style roots are.
    fn root_is_separator(&self) -> bool {
        let mut buf = [0u8; 4];
        self.root == *self.separator.encode_utf8(&mut buf)
    }

    /// Returns the non-empty components between separators.
    pub fn split<'a>(&self, path: &'a str) -> Vec<&'a str> {
        path.split(self.separator)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// Components below the root.
    fn relative_parts<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let mut parts = self.split(path);
        if !self.root_is_separator() && parts.first() == Some(&self.root.as_str()) {
            parts.remove(0);
        }
        parts
    }

    /// Joins `parts` into a canonical path.
    ///
    /// Parts containing the separator are expanded into their components first, so
    /// `join(["/a/", "b"])` and `join(["a", "b"])` both give `/a/b`. The result always
    /// starts with the root marker.
    pub fn join<I, S>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut components: Vec<String> = Vec::new();
        for part in parts {
            components.extend(self.split(part.as_ref()).into_iter().map(str::to_owned));
        }

        let separator = self.separator.to_string();
        if self.root_is_separator() {
            return format!("{}{}", self.root, components.join(&separator));
        }
        if components.first().map(String::as_str) != Some(self.root.as_str()) {
            components.insert(0, self.root.clone());
        }
        components.join(&separator)
    }

    /// Canonical form of a single path: redundant separators dropped, root prefixed.
    /// The empty path is the root.
    pub fn canonical(&self, path: &str) -> String {
        self.join([path])
    }

    /// Splits a path into its directory and leaf.
    ///
    /// * `/a/b` gives (`/a`, `b`)
    /// * `/a` gives (`/`, `a`)
    /// * `/` and the empty path give (`/`, ``)
    pub fn decompose(&self, path: &str) -> (String, String) {
        let parts = self.relative_parts(path);
        match parts.split_last() {
            None => (self.root.clone(), String::new()),
            Some((leaf, rest)) => (self.join(rest), (*leaf).to_owned()),
        }
    }

    pub fn dirname(&self, path: &str) -> String {
        self.decompose(path).0
    }

    pub fn leafname(&self, path: &str) -> String {
        self.decompose(path).1
    }

    pub fn is_root(&self, path: &str) -> bool {
        self.relative_parts(path).is_empty()
    }

    /// A leafname is a single non-empty component. With a component root, the root
    /// marker itself is not a valid leafname: it would read back as the root.
    pub fn is_valid_leafname(&self, name: &str) -> bool {
        !name.is_empty()
            && !name.contains(self.separator)
            && (self.root_is_separator() || name != self.root)
    }

    /// Key used for cache and membership lookups. Never used for display or ordering.
    pub fn normalise_name(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_owned()
        }
    }

    /// Normalized key of a whole path, insensitive to redundant separators.
    pub fn path_key(&self, path: &str) -> String {
        self.normalise_name(&self.canonical(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slash() -> PathModel {
        PathModel::default()
    }

    fn riscos() -> PathModel {
        PathModel::new("$", '.')
    }

    mod join {
        use super::*;

        #[test]
        fn test_join_prefixes_root() {
            let paths = slash();
            assert_eq!(paths.join(["a", "b"]), "/a/b");
            assert_eq!(paths.join(["/a", "b"]), "/a/b");
            assert_eq!(paths.join(["/", "b"]), "/b");
        }

        #[test]
        fn test_join_expands_parts_with_separators() {
            let paths = slash();
            assert_eq!(paths.join(["/a//b/", "c/d"]), "/a/b/c/d");
        }

        #[test]
        fn test_join_nothing_is_root() {
            let paths = slash();
            assert_eq!(paths.join(Vec::<&str>::new()), "/");
            assert_eq!(paths.join([""]), "/");
        }

        #[test]
        fn test_join_component_root() {
            let paths = riscos();
            assert_eq!(paths.join(["$", "Docs"]), "$.Docs");
            assert_eq!(paths.join(["Docs", "Note"]), "$.Docs.Note");
            assert_eq!(paths.join(["$.Docs", "Note"]), "$.Docs.Note");
            assert_eq!(paths.join(Vec::<&str>::new()), "$");
        }

        #[test]
        fn test_canonical() {
            let paths = slash();
            assert_eq!(paths.canonical(""), "/");
            assert_eq!(paths.canonical("//"), "/");
            assert_eq!(paths.canonical("a/b/"), "/a/b");
        }
    }

    mod decompose {
        use super::*;

        #[test]
        fn test_decompose_nested() {
            let paths = slash();
            assert_eq!(paths.decompose("/a/b/c"), ("/a/b".into(), "c".into()));
        }

        #[test]
        fn test_decompose_single_component() {
            let paths = slash();
            assert_eq!(paths.decompose("/b.txt"), ("/".into(), "b.txt".into()));
        }

        #[test]
        fn test_decompose_root() {
            let paths = slash();
            assert_eq!(paths.decompose("/"), ("/".into(), String::new()));
            assert_eq!(paths.decompose(""), ("/".into(), String::new()));
            assert_eq!(paths.dirname("/"), "/");
        }

        #[test]
        fn test_decompose_component_root() {
            let paths = riscos();
            assert_eq!(paths.decompose("$.Docs.Note"), ("$.Docs".into(), "Note".into()));
            assert_eq!(paths.decompose("$.Docs"), ("$".into(), "Docs".into()));
            assert_eq!(paths.decompose("$"), ("$".into(), String::new()));
            assert!(paths.is_root("$"));
        }

        #[test]
        fn test_split_drops_empty_components() {
            let paths = slash();
            assert_eq!(paths.split("//a///b/"), vec!["a", "b"]);
            assert!(paths.split("/").is_empty());
        }
    }

    mod normalise {
        use super::*;

        #[test]
        fn test_normalise_case_insensitive() {
            let paths = slash();
            assert_eq!(paths.normalise_name("ReadMe.TXT"), "readme.txt");
            assert_eq!(paths.path_key("/Docs//Notes/"), "/docs/notes");
        }

        #[test]
        fn test_normalise_case_sensitive() {
            let paths = slash().with_case_insensitive(false);
            assert_eq!(paths.normalise_name("ReadMe.TXT"), "ReadMe.TXT");
        }

        #[test]
        fn test_valid_leafname() {
            let paths = slash();
            assert!(paths.is_valid_leafname("a.txt"));
            assert!(!paths.is_valid_leafname(""));
            assert!(!paths.is_valid_leafname("a/b"));
        }

        #[test]
        fn test_root_marker_is_not_a_leafname() {
            let paths = riscos();
            assert!(!paths.is_valid_leafname("$"));
            assert!(!paths.is_valid_leafname("a.b"));
            assert!(paths.is_valid_leafname("$x"));
            assert!(paths.is_valid_leafname("Docs"));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn component() -> impl Strategy<Value = String> {
            "[A-Za-z0-9_.-]{1,8}"
        }

        fn messy_path() -> impl Strategy<Value = (Vec<String>, String)> {
            prop::collection::vec((component(), 1usize..3), 0..6).prop_map(|parts| {
                let mut path = String::from("/");
                for (part, slashes) in &parts {
                    path.push_str(part);
                    path.push_str(&"/".repeat(*slashes));
                }
                (parts.into_iter().map(|(part, _)| part).collect(), path)
            })
        }

        proptest! {
            #[test]
            fn join_of_split_is_canonical((components, path) in messy_path()) {
                let paths = slash();
                let rejoined = paths.join(paths.split(&path));
                prop_assert_eq!(&rejoined, &paths.join(&components));
                prop_assert!(rejoined.starts_with(paths.root()));
            }

            #[test]
            fn decompose_inverts_join(
                dir in prop::collection::vec(component(), 0..5),
                leaf in component(),
            ) {
                let paths = slash();
                let dirname = paths.join(&dir);
                let path = paths.join([dirname.as_str(), leaf.as_str()]);
                prop_assert_eq!(paths.dirname(&path), dirname);
                prop_assert_eq!(paths.leafname(&path), leaf);
            }
        }
    }
}
