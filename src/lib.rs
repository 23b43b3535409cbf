//! # RequireJS bootstrap generation
//!
//! Builds client-side module-loader bootstrap code from a declarative model:
//!
//! 1. **Registry**: [`Config`] holds named [`Module`]s with their files,
//!    fallbacks, exports, init expressions and dependencies, plus the
//!    top-level loader attributes. It serializes into a `paths`/`shim`
//!    configuration object.
//!
//! 2. **Expressions**: code registered at a [`Position`] together with the
//!    modules it needs. A [`JsRenderer`] turns one expression into a
//!    `require([...], function(...) {...});` block.
//!
//! 3. **Loader**: [`RequireJs`] merges the expressions of all positions into
//!    one program body (later positions run inside the blocks of earlier
//!    ones), writes the `data-main` file and registers the scripts with the
//!    host [`View`].
//!
//! Hosts that only speak JSON use [`render_page`] (or `render_page_native`
//! with the `napi` feature).

mod attributes;
mod config;
mod error;
mod expression;
mod hash;
mod loader;
mod main_file;
mod module;
mod page;
mod renderer;
mod serialize;
mod view;


pub use attributes::{Attributes, ConfigAttribute};
pub use config::{Config, OneOrMany, ShimInput};
pub use error::{LoaderError, Result};
pub use expression::{Code, Expression, JsExpression};
pub use hash::content_hash;
pub use loader::{
    merge_expressions, LoaderOptions, MainEntry, RequireJs, DEFAULT_LIBRARY_PATH,
    DEFAULT_RUNTIME_PATH,
};
pub use main_file::{default_main_name, MainFileStore};
pub use module::{
    strip_js_suffix, Dependency, Module, ModuleFile, ModuleId, BASE_URL_OPTION,
    REQUIREJS_OPTIONS_KEY,
};
pub use page::{render_page, PageInput, PositionInput, RenderedPage};
pub use renderer::{JsRenderer, LegacyRenderer, RequireJsRenderer, Variant};
pub use serialize::{ConfigValue, PathsEntry, RequireConfig, ShimEntry};
pub use view::{Position, ScriptOptions, View};

#[cfg(feature = "napi")]
pub use page::render_page_native;
