//! Module registry and its serialization into loader configuration.
//!
//! Modules live in an arena owned by [`Config`] and are addressed by
//! [`ModuleId`]. The registry keeps one entry per name in insertion order;
//! re-adding a name points that entry at the new module.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::attributes::Attributes;
use crate::error::Result;
use crate::expression::JsExpression;
use crate::hash::content_hash;
use crate::module::{Module, ModuleId};
use crate::serialize::{ConfigValue, PathsEntry, RequireConfig, ShimEntry};

// ═══════════════════════════════════════════════════════════════════════════════
// BULK IMPORT INPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) if value.is_empty() => Vec::new(),
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        OneOrMany::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        OneOrMany::One(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for OneOrMany {
    fn from(values: Vec<S>) -> Self {
        OneOrMany::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Keeps an explicit `null` distinct from a missing key
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// One entry of a `shim` declaration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ShimInput {
    #[serde(default)]
    pub deps: Option<OneOrMany>,
    /// `Some(Value::Null)` clears the exports, `None` leaves them unset
    #[serde(default, deserialize_with = "present")]
    pub exports: Option<Value>,
    #[serde(default)]
    pub init: Option<String>,
}

impl ShimInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = Some(OneOrMany::Many(deps.into_iter().map(Into::into).collect()));
        self
    }

    pub fn exports(mut self, exports: impl Into<Value>) -> Self {
        self.exports = Some(exports.into());
        self
    }

    pub fn init(mut self, init: impl Into<String>) -> Self {
        self.init = Some(init.into());
        self
    }

    /// An entry without any keys is skipped by [`Config::set_shim`]
    pub fn is_empty(&self) -> bool {
        self.deps.is_none() && self.exports.is_none() && self.init.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct Config {
    arena: Vec<Module>,
    entries: Vec<ModuleId>,
    index: HashMap<String, ModuleId>,
    attributes: Attributes,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── modules ──────────────────────────────────────────────────────────────

    /// Registers a module (or a new module with the given name).
    ///
    /// An existing entry with the same name is replaced in place; handles to
    /// the previous module keep addressing it.
    pub fn add_module(&mut self, module: impl Into<Module>) -> ModuleId {
        let module = module.into();
        let id = ModuleId(self.arena.len());
        let name = module.name().to_string();
        self.arena.push(module);

        match self.index.insert(name.clone(), id) {
            Some(previous) => {
                if let Some(entry) = self.entries.iter_mut().find(|entry| **entry == previous) {
                    *entry = id;
                }
                debug!("Replaced module {}", name);
            }
            None => {
                self.entries.push(id);
                trace!("Added module {}", name);
            }
        }

        id
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different registry.
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.arena[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different registry.
    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.arena[id.0]
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.index.get(name).copied()
    }

    pub fn get_module(&self, name: &str) -> Option<&Module> {
        self.module_id(name).map(|id| self.module(id))
    }

    pub fn get_module_mut(&mut self, name: &str) -> Option<&mut Module> {
        match self.module_id(name) {
            Some(id) => Some(self.module_mut(id)),
            None => None,
        }
    }

    /// Registered modules in insertion order
    pub fn get_modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> + '_ {
        self.entries.iter().map(move |id| (*id, self.module(*id)))
    }

    /// Registered modules accepted by `filter`, in insertion order
    pub fn get_modules_filtered<'a, F>(
        &'a self,
        filter: F,
    ) -> impl Iterator<Item = (ModuleId, &'a Module)> + 'a
    where
        F: Fn(&Module) -> bool + 'a,
    {
        self.get_modules().filter(move |(_, module)| filter(*module))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve_or_create(&mut self, name: &str) -> ModuleId {
        match self.module_id(name) {
            Some(id) => id,
            None => self.add_module(name),
        }
    }

    /// Resolves a dependency given by string.
    ///
    /// A registered name wins; otherwise the string is treated as a file and
    /// gets a module named by its content hash, created on first use.
    pub fn resolve_dependency(&mut self, dependency: &str) -> ModuleId {
        if let Some(id) = self.module_id(dependency) {
            return id;
        }

        let name = content_hash(dependency);
        if let Some(id) = self.module_id(&name) {
            return id;
        }

        let id = self.add_module(name.as_str());
        self.module_mut(id).add_file(dependency);
        debug!("Created module {} for dependency {}", name, dependency);
        id
    }

    /// Makes `dependency` a dependency of `module`; idempotent per name
    pub fn add_dependency(&mut self, module: ModuleId, dependency: ModuleId) -> &mut Self {
        let name = self.module(dependency).name().to_string();
        self.module_mut(module).add_dependency(dependency, &name);
        self
    }

    // ─── bulk setters ─────────────────────────────────────────────────────────

    /// Imports a `paths` declaration: first value is the primary file, the
    /// rest are fallbacks. Existing files of the module are replaced.
    pub fn set_paths<I, K, V>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<OneOrMany>,
    {
        for (name, files) in paths {
            let mut files = files.into().into_vec().into_iter();
            let primary = match files.next() {
                Some(primary) => primary,
                None => continue,
            };

            let id = self.resolve_or_create(name.as_ref());
            self.module_mut(id)
                .clear_files()
                .clear_fallback_files()
                .add_file(&primary)
                .add_fallback_files(files);
        }

        self
    }

    /// Imports a `shim` declaration. Dependencies and exports of each listed
    /// module are reset before the entry is applied.
    pub fn set_shim<I, K>(&mut self, shim: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, ShimInput)>,
        K: AsRef<str>,
    {
        for (name, properties) in shim {
            if properties.is_empty() {
                continue;
            }

            let id = self.resolve_or_create(name.as_ref());
            self.module_mut(id).set_exports(None).clear_dependencies();

            if let Some(deps) = properties.deps {
                for dep in deps.into_vec() {
                    if dep.is_empty() {
                        continue;
                    }
                    let dep_id = self.resolve_dependency(&dep);
                    self.add_dependency(id, dep_id);
                }
            }

            if let Some(exports) = &properties.exports {
                self.module_mut(id).set_exports_value(exports)?;
            }

            if let Some(init) = properties.init {
                self.module_mut(id).set_init(init);
            }
        }

        Ok(self)
    }

    /// Assigns aliases to registered modules; unknown names are skipped
    pub fn set_aliases<I, K, V>(&mut self, aliases: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, alias) in aliases {
            match self.get_module_mut(name.as_ref()) {
                Some(module) => {
                    module.set_alias(alias);
                }
                None => trace!("Skipping alias for unknown module {}", name.as_ref()),
            }
        }
        self
    }

    // ─── attributes ───────────────────────────────────────────────────────────

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<&mut Self> {
        self.attributes.set(name, value)?;
        Ok(self)
    }

    pub fn attribute(&self, name: &str) -> Result<Option<ConfigValue>> {
        self.attributes.get(name)
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> &mut Self {
        self.attributes.base_url = Some(base_url.into());
        self
    }

    pub fn set_callback(&mut self, callback: impl Into<JsExpression>) -> &mut Self {
        self.attributes.callback = Some(callback.into());
        self
    }

    // ─── serialization ────────────────────────────────────────────────────────

    fn paths_entry(module: &Module) -> Option<PathsEntry> {
        let base_url = module.base_url().filter(|url| !url.is_empty());

        match (base_url, module.primary_file()) {
            (Some(base_url), _) if module.file_count() != 1 => {
                // file ids are `alias/rest`, so the prefix carries no trailing slash
                let trimmed = match base_url.trim_end_matches('/') {
                    "" => base_url,
                    trimmed => trimmed,
                };
                Some(PathsEntry::BaseUrl(trimmed.to_string()))
            }
            (_, Some(primary)) => {
                let mut files = Vec::with_capacity(1 + module.fallback_files().len());
                files.push(primary.to_string());
                files.extend(module.fallback_files().iter().cloned());
                Some(PathsEntry::Files(files))
            }
            (_, None) => None,
        }
    }

    /// Serializes the registry into a loader configuration
    pub fn to_array(&self) -> RequireConfig {
        let mut config = RequireConfig::new();

        for (attribute, value) in self.attributes.values() {
            config.set_attribute(attribute.name(), value);
        }

        let mut shims = Vec::new();

        for (_, module) in self.get_modules() {
            let alias = module.alias();

            if let Some(entry) = Self::paths_entry(module) {
                config.set_paths(alias, entry);
            }

            let mut shim = ShimEntry {
                deps: module
                    .dependencies()
                    .iter()
                    .map(|dep| self.module(dep.id).alias().to_string())
                    .collect(),
                exports: module.exports().map(str::to_string),
                init: module.init().cloned(),
            };

            // extra files load before the module and after its own dependencies
            let inherited = shim.deps.clone();
            let mut extra = Vec::new();
            for file in module.extra_files() {
                let file_id = module.file_id(file);
                shim.deps.push(file_id.clone());
                extra.push((
                    file_id,
                    ShimEntry {
                        deps: inherited.clone(),
                        ..Default::default()
                    },
                ));
            }

            if !shim.is_empty() {
                shims.push((alias.to_string(), shim));
            }
            shims.extend(extra);
        }

        for (alias, shim) in shims {
            config.set_shim(&alias, shim);
        }

        config
    }
}
