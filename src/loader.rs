//! Loader orchestration: collects code per render position, merges it into
//! one program body and publishes it together with the configuration header.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::expression::Expression;
use crate::main_file::{default_main_name, MainFileStore};
use crate::module::ModuleId;
use crate::renderer::{JsRenderer, Variant};
use crate::view::{Position, ScriptOptions, View};

pub const DEFAULT_LIBRARY_PATH: &str = "@bower/requirejs/require.js";
pub const DEFAULT_RUNTIME_PATH: &str = "runtime/jsloader";

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// How the `data-main` entry is produced
#[derive(Clone, Default)]
pub enum MainEntry {
    /// Name derived from the content hash of the written file
    #[default]
    Auto,
    /// No main file; the body is inlined into the page
    Disabled,
    Named(String),
    /// Called with the body, returns the file name
    Callback(Rc<dyn Fn(&str) -> String>),
}

impl fmt::Debug for MainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainEntry::Auto => f.write_str("Auto"),
            MainEntry::Disabled => f.write_str("Disabled"),
            MainEntry::Named(name) => f.debug_tuple("Named").field(name).finish(),
            MainEntry::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// `false` disables the main file, a string names it, `true`/`null` is automatic
impl<'de> Deserialize<'de> for MainEntry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Name(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            None | Some(Raw::Flag(true)) => MainEntry::Auto,
            Some(Raw::Flag(false)) => MainEntry::Disabled,
            Some(Raw::Name(name)) => MainEntry::Named(name),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderOptions {
    /// Public URL of the loader library; published from `library_path` when unset
    pub library_url: Option<String>,
    pub library_path: PathBuf,
    pub main: MainEntry,
    /// Directory receiving generated main files
    pub runtime_path: PathBuf,
    pub variant: Variant,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            library_url: None,
            library_path: PathBuf::from(DEFAULT_LIBRARY_PATH),
            main: MainEntry::Auto,
            runtime_path: PathBuf::from(DEFAULT_RUNTIME_PATH),
            variant: Variant::Standard,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MERGE
// ═══════════════════════════════════════════════════════════════════════════════

fn wrap_ready(code: &str) -> String {
    format!("jQuery(function() {{\n{}\n}});", code)
}

/// Merges per-position expressions into one program body.
///
/// Positions are walked from last to first; the text rendered so far is
/// appended to the innermost code of the previous position, so later code
/// runs inside the require blocks of earlier positions.
pub fn merge_expressions(
    expressions: BTreeMap<Position, Expression>,
    renderer: &dyn JsRenderer,
    config: &Config,
) -> String {
    let mut rendered = String::new();

    for (position, mut expression) in expressions.into_iter().rev() {
        if !rendered.is_empty() {
            let innermost = expression.innermost_mut();
            let mut code = innermost.raw_code().to_string();

            if position == Position::Ready && !code.is_empty() {
                code = wrap_ready(&code);
            }

            innermost.set_code(format!("{}\n{}", code, rendered));
        }

        rendered = renderer.render_expression(&expression, config);
    }

    rendered
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct RequireJs<V: View> {
    view: V,
    options: LoaderOptions,
    config: Option<Config>,
    expressions: BTreeMap<Position, Expression>,
}

impl<V: View> RequireJs<V> {
    pub fn new(view: V) -> Self {
        Self::with_options(view, LoaderOptions::default())
    }

    pub fn with_options(view: V, options: LoaderOptions) -> Self {
        RequireJs {
            view,
            options,
            config: None,
            expressions: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LoaderOptions {
        &mut self.options
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// The loader's registry, created on first access
    pub fn config(&mut self) -> &mut Config {
        self.config.get_or_insert_with(Config::new)
    }

    pub fn set_main_callback<F>(&mut self, callback: F)
    where
        F: Fn(&str) -> String + 'static,
    {
        self.options.main = MainEntry::Callback(Rc::new(callback));
    }

    // ─── code collection ──────────────────────────────────────────────────────

    /// Appends code to the expression at `position`
    pub fn add_code(&mut self, position: Position, code: &str) -> &mut Self {
        let innermost = self.expressions.entry(position).or_default().innermost_mut();
        let merged = match innermost.raw_code() {
            "" => code.to_string(),
            existing => format!("{}\n{}", existing, code),
        };
        innermost.set_code(merged);
        self
    }

    pub fn add_dependency(&mut self, position: Position, module: ModuleId) -> &mut Self {
        self.expressions
            .entry(position)
            .or_default()
            .add_dependency(module);
        self
    }

    pub fn set_expression(&mut self, position: Position, expression: Expression) -> &mut Self {
        self.expressions.insert(position, expression);
        self
    }

    pub fn expression(&self, position: Position) -> Option<&Expression> {
        self.expressions.get(&position)
    }

    // ─── rendering ────────────────────────────────────────────────────────────

    /// Merges the collected expressions and publishes the result.
    /// Collected expressions are consumed.
    pub fn render(&mut self) -> Result<String> {
        let expressions = std::mem::take(&mut self.expressions);
        let renderer = self.options.variant.renderer();
        let code = merge_expressions(expressions, renderer, self.config());
        self.publish(&code)?;
        Ok(code)
    }

    /// Configuration header for the current registry
    pub fn render_config(&mut self) -> Result<String> {
        let variant = self.options.variant;
        self.config().to_array().render_header(variant)
    }

    fn library_url(&mut self) -> Result<String> {
        if let Some(url) = self.options.library_url.as_ref().filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }

        let url = self.view.publish(&self.options.library_path)?;
        debug!(
            "Published loader library {} as {}",
            self.options.library_path.display(),
            url
        );
        self.options.library_url = Some(url.clone());
        Ok(url)
    }

    /// Main file name and whether it is content-derived; `None` when the
    /// main file is disabled. Callbacks see the body, the derived name
    /// hashes the full file `content`.
    fn main_name(&self, code: &str, content: &str) -> Option<(String, bool)> {
        let name = match &self.options.main {
            MainEntry::Disabled => return None,
            MainEntry::Auto => String::new(),
            MainEntry::Named(name) => name.trim().to_string(),
            MainEntry::Callback(callback) => callback(code).trim().to_string(),
        };

        if name.is_empty() {
            Some((default_main_name(content), true))
        } else {
            Some((name, false))
        }
    }

    /// Registers the loader library, the configuration header and `code`
    /// with the view
    pub fn publish(&mut self, code: &str) -> Result<()> {
        let library_url = self.library_url()?;
        let header = self.render_config()?;
        let variant = self.options.variant;

        let content = match variant {
            Variant::Standard => format!("{}\n{}", header, code),
            Variant::Legacy => code.to_string(),
        };

        let (name, content_derived) = match self.main_name(code, &content) {
            Some(main) => main,
            None => {
                // the inline head script runs before the library is loaded
                let preload = self.config().to_array().render_header(Variant::Legacy)?;
                self.view.register_script(code, Position::End);
                self.view
                    .register_script_file(&library_url, &ScriptOptions::new(Position::End));
                self.view.register_script(&preload, Position::Head);
                return Ok(());
            }
        };

        let store = MainFileStore::new(self.options.runtime_path.clone());
        let path = store.write(&name, &content, content_derived)?;
        let main_url = self.view.publish(&path)?;
        debug!("Published main file {} as {}", path.display(), main_url);

        let mut options = ScriptOptions::new(Position::End);
        options.defer = true;
        options.is_async = true;
        options.data_main = Some(main_url);
        self.view.register_script_file(&library_url, &options);

        if variant == Variant::Legacy {
            self.view.register_script(&header, Position::Head);
        }

        Ok(())
    }
}
