//! Module entity: a named unit of loadable JavaScript.
//!
//! A module owns its files (primary first, extras after), fallback files,
//! an optional exports symbol and init expression, and the names of the
//! modules it depends on. Files are stored without the `.js` suffix.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{LoaderError, Result};
use crate::expression::JsExpression;

lazy_static! {
    static ref JS_SUFFIX: Regex = Regex::new(r"\.js$").unwrap();
}

/// Option key holding attribute assignments for the module itself
pub const REQUIREJS_OPTIONS_KEY: &str = "requirejs";

/// Option key holding a module's base URL
pub const BASE_URL_OPTION: &str = "baseUrl";

/// Handle to a module stored in a [`crate::config::Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

/// Strips a trailing `.js` from a file path
pub fn strip_js_suffix(path: &str) -> String {
    JS_SUFFIX.replace(path, "").into_owned()
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFile {
    pub path: String,
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub id: ModuleId,
}

/// Attributes that can be assigned through the `requirejs` options key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleAttribute {
    Alias,
    Init,
    Exports,
}

impl ModuleAttribute {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "alias" => Some(ModuleAttribute::Alias),
            "init" => Some(ModuleAttribute::Init),
            "exports" => Some(ModuleAttribute::Exports),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    alias: String,
    files: Vec<ModuleFile>,
    fallback_files: Vec<String>,
    exports: Option<String>,
    init: Option<JsExpression>,
    dependencies: Vec<Dependency>,
    options: Map<String, Value>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Module {
            alias: name.clone(),
            name,
            files: Vec::new(),
            fallback_files: Vec::new(),
            exports: None,
            init: None,
            dependencies: Vec::new(),
            options: Map::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used for this module in generated code and configuration keys
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set_alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.alias = alias.into();
        self
    }

    // ─── files ────────────────────────────────────────────────────────────────

    pub fn add_file(&mut self, path: &str) -> &mut Self {
        self.add_file_with_options(path, Map::new())
    }

    /// Appends a file unless it is already present; existing options are kept
    pub fn add_file_with_options(&mut self, path: &str, options: Map<String, Value>) -> &mut Self {
        let path = strip_js_suffix(path);
        if !self.files.iter().any(|file| file.path == path) {
            self.files.push(ModuleFile { path, options });
        }
        self
    }

    pub fn files(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.iter().map(|file| file.path.as_str())
    }

    pub fn file_entries(&self) -> &[ModuleFile] {
        &self.files
    }

    pub fn file_options(&self, path: &str) -> Option<&Map<String, Value>> {
        let path = strip_js_suffix(path);
        self.files
            .iter()
            .find(|file| file.path == path)
            .map(|file| &file.options)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn primary_file(&self) -> Option<&str> {
        self.files.first().map(|file| file.path.as_str())
    }

    /// Files after the primary one; they load before the module itself
    pub fn extra_files(&self) -> impl Iterator<Item = &str> + '_ {
        self.files.iter().skip(1).map(|file| file.path.as_str())
    }

    pub fn clear_files(&mut self) -> &mut Self {
        self.files.clear();
        self
    }

    pub fn add_fallback_files<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fallback_files
            .extend(paths.into_iter().map(|path| strip_js_suffix(path.as_ref())));
        self
    }

    pub fn fallback_files(&self) -> &[String] {
        &self.fallback_files
    }

    pub fn clear_fallback_files(&mut self) -> &mut Self {
        self.fallback_files.clear();
        self
    }

    /// Identifier of one of this module's files in generated output.
    ///
    /// Files under the module's `baseUrl` become `alias/rest`, resolved
    /// through the `paths` entry; anything else is referenced by URL.
    pub fn file_id(&self, file: &str) -> String {
        if let Some(base_url) = self.base_url() {
            let base_url = base_url.trim_end_matches('/');
            if !base_url.is_empty() {
                if let Some(rest) = file.strip_prefix(base_url).filter(|r| r.starts_with('/')) {
                    return format!("{}{}", self.alias, rest);
                }
            }
        }
        format!("{}.js", file)
    }

    // ─── shim attributes ──────────────────────────────────────────────────────

    pub fn exports(&self) -> Option<&str> {
        self.exports.as_deref()
    }

    /// Trims the value; an empty result clears the exports
    pub fn set_exports(&mut self, exports: Option<&str>) -> &mut Self {
        self.exports = exports
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        self
    }

    /// Dynamic form of [`Module::set_exports`] for values coming from JSON
    pub fn set_exports_value(&mut self, exports: &Value) -> Result<&mut Self> {
        match exports {
            Value::Null => Ok(self.set_exports(None)),
            Value::String(value) => Ok(self.set_exports(Some(value))),
            other => Err(LoaderError::InvalidArgument(format!(
                "Exports must be a string, got {}",
                other
            ))),
        }
    }

    pub fn init(&self) -> Option<&JsExpression> {
        self.init.as_ref()
    }

    pub fn set_init(&mut self, init: impl Into<JsExpression>) -> &mut Self {
        self.init = Some(init.into());
        self
    }

    pub fn clear_init(&mut self) -> &mut Self {
        self.init = None;
        self
    }

    // ─── dependencies ─────────────────────────────────────────────────────────

    /// Adds a dependency keyed by its name; adding the same name twice is a no-op
    pub fn add_dependency(&mut self, id: ModuleId, name: &str) -> &mut Self {
        if !self.dependencies.iter().any(|dep| dep.name == name) {
            self.dependencies.push(Dependency {
                name: name.to_string(),
                id,
            });
        }
        self
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn clear_dependencies(&mut self) -> &mut Self {
        self.dependencies.clear();
        self
    }

    // ─── options ──────────────────────────────────────────────────────────────

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.options.get(BASE_URL_OPTION).and_then(Value::as_str)
    }

    /// Merges `options` into the module options.
    ///
    /// The `requirejs` key is removed first and its entries are assigned to
    /// the module itself. Assignments run in order and stop at the first
    /// failure; the remaining options are merged only when all succeeded.
    pub fn set_options(&mut self, mut options: Map<String, Value>) -> Result<&mut Self> {
        if let Some(assignments) = options.remove(REQUIREJS_OPTIONS_KEY) {
            let assignments = match assignments {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => {
                    return Err(LoaderError::InvalidArgument(format!(
                        "\"{}\" options must be an object, got {}",
                        REQUIREJS_OPTIONS_KEY, other
                    )))
                }
            };

            for (key, value) in assignments {
                self.assign(&key, value)?;
            }
        }

        for (key, value) in options {
            self.options.insert(key, value);
        }

        Ok(self)
    }

    fn assign(&mut self, key: &str, value: Value) -> Result<()> {
        let attribute = ModuleAttribute::from_name(key).ok_or_else(|| {
            LoaderError::UnknownProperty(format!("Module::{} ({})", key, self.name))
        })?;

        match attribute {
            ModuleAttribute::Alias => match value {
                Value::String(alias) => {
                    self.set_alias(alias);
                }
                other => {
                    return Err(LoaderError::InvalidArgument(format!(
                        "Alias must be a string, got {}",
                        other
                    )))
                }
            },
            ModuleAttribute::Init => match value {
                Value::String(init) => {
                    self.set_init(init);
                }
                Value::Null => {
                    self.clear_init();
                }
                other => {
                    return Err(LoaderError::InvalidArgument(format!(
                        "Init must be a string, got {}",
                        other
                    )))
                }
            },
            ModuleAttribute::Exports => {
                self.set_exports_value(&value)?;
            }
        }

        Ok(())
    }
}

impl From<&str> for Module {
    fn from(name: &str) -> Self {
        Module::new(name)
    }
}

impl From<String> for Module {
    fn from(name: String) -> Self {
        Module::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_alias_defaults_to_name() {
        let mut module = Module::new("test");
        assert_eq!(module.name(), "test");
        assert_eq!(module.alias(), "test");

        module.set_alias("testing");
        assert_eq!(module.name(), "test");
        assert_eq!(module.alias(), "testing");
    }

    #[test]
    fn test_files_are_stripped_and_deduplicated() {
        let mut module = Module::new("test");
        module.add_file("a.js").add_file("b").add_file("a");

        assert_eq!(module.files().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(module.primary_file(), Some("a"));
        assert_eq!(module.extra_files().collect::<Vec<_>>(), vec!["b"]);

        module.clear_files();
        assert_eq!(module.file_count(), 0);
        assert_eq!(module.primary_file(), None);
    }

    #[test]
    fn test_file_options_survive_duplicates() {
        let mut module = Module::new("test");
        module.add_file_with_options("a.js", object(json!({"async": true})));
        module.add_file("a");

        assert_eq!(module.file_options("a"), Some(&object(json!({"async": true}))));
        assert_eq!(module.file_options("missing"), None);
    }

    #[test]
    fn test_fallback_files() {
        let mut module = Module::new("test");
        assert!(module.fallback_files().is_empty());

        module.add_fallback_files(["file1.js", "file2", "file3.sj"]);
        assert_eq!(module.fallback_files(), ["file1", "file2", "file3.sj"]);

        module.clear_fallback_files();
        assert!(module.fallback_files().is_empty());
    }

    #[test]
    fn test_exports_are_trimmed() {
        for (value, expected) in [
            (Some(""), None),
            (Some(" "), None),
            (None, None),
            (Some("test"), Some("test")),
            (Some(" test "), Some("test")),
        ] {
            let mut module = Module::new("test");
            module.set_exports(value);
            assert_eq!(module.exports(), expected, "input {:?}", value);
        }
    }

    #[test]
    fn test_exports_value_rejects_non_strings() {
        let mut module = Module::new("test");
        assert!(module.set_exports_value(&json!(" test ")).is_ok());
        assert_eq!(module.exports(), Some("test"));

        let err = module.set_exports_value(&json!([])).unwrap_err();
        assert!(matches!(err, LoaderError::InvalidArgument(_)));
        assert_eq!(module.exports(), Some("test"));

        module.set_exports_value(&Value::Null).unwrap();
        assert_eq!(module.exports(), None);
    }

    #[test]
    fn test_init_accepts_strings_and_expressions() {
        let mut module = Module::new("test");
        module.set_init("alert(1);");
        assert_eq!(module.init().map(JsExpression::expression), Some("alert(1);"));

        let init = module.init().cloned().unwrap();
        module.set_init(init);
        assert_eq!(module.init().map(JsExpression::expression), Some("alert(1);"));
    }

    #[test]
    fn test_add_dependency_is_idempotent() {
        let mut module = Module::new("test");
        module.add_dependency(ModuleId(1), "dep");
        module.add_dependency(ModuleId(1), "dep");
        assert_eq!(module.dependencies().len(), 1);

        module.clear_dependencies();
        assert!(module.dependencies().is_empty());
    }

    #[test]
    fn test_requirejs_options_are_assigned() {
        let mut module = Module::new("test");
        module
            .set_options(object(json!({
                "requirejs": {"alias": "testing", "init": "test;", "exports": "test"},
                "test": "t"
            })))
            .unwrap();

        assert_eq!(module.options(), &object(json!({"test": "t"})));
        assert_eq!(module.alias(), "testing");
        assert_eq!(module.exports(), Some("test"));
        assert_eq!(module.init().map(JsExpression::expression), Some("test;"));
    }

    #[test]
    fn test_unknown_requirejs_option_fails() {
        let mut module = Module::new("test");
        let err = module
            .set_options(object(json!({"requirejs": {"unknown": 1}, "kept": false})))
            .unwrap_err();

        assert!(matches!(err, LoaderError::UnknownProperty(_)));
        assert!(module.options().is_empty());
    }

    #[test]
    fn test_options_merge() {
        let mut module = Module::new("test");
        module.set_options(object(json!({"a": 1}))).unwrap();
        module.set_options(object(json!({"baseUrl": "/base"}))).unwrap();

        assert_eq!(module.option("a"), Some(&json!(1)));
        assert_eq!(module.base_url(), Some("/base"));
    }

    #[test]
    fn test_file_id() {
        let mut module = Module::new("lib");
        assert_eq!(module.file_id("/assets/lib/a"), "/assets/lib/a.js");

        module.set_options(object(json!({"baseUrl": "/assets/lib/"}))).unwrap();
        assert_eq!(module.file_id("/assets/lib/a"), "lib/a");
        assert_eq!(module.file_id("/assets/libx/a"), "/assets/libx/a.js");
        assert_eq!(module.file_id("other"), "other.js");
    }
}
