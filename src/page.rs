//! Page rendering from a serialized description.
//!
//! Hosts that cannot drive [`crate::RequireJs`] directly (the Node binding in
//! particular) describe the page as JSON and get back the configuration
//! header and the merged program body.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::config::{Config, OneOrMany, ShimInput};
use crate::error::{LoaderError, Result};
use crate::expression::Expression;
use crate::loader::merge_expressions;
use crate::renderer::Variant;
use crate::view::Position;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionInput {
    pub position: Position,
    #[serde(default)]
    pub code: Option<String>,
    /// Module names, resolved against the page registry
    #[serde(default)]
    pub depends: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInput {
    pub variant: Variant,
    pub paths: Map<String, Value>,
    pub shim: Map<String, Value>,
    /// Per-module options, applied with `Module::set_options`
    pub modules: Map<String, Value>,
    pub aliases: HashMap<String, String>,
    pub attributes: Map<String, Value>,
    pub expressions: Vec<PositionInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub config: String,
    pub code: String,
}

fn build_config(input: &mut PageInput) -> Result<Config> {
    let mut config = Config::new();

    let mut paths = Vec::with_capacity(input.paths.len());
    for (name, files) in std::mem::take(&mut input.paths) {
        if files.is_null() {
            continue;
        }
        paths.push((name, serde_json::from_value::<OneOrMany>(files)?));
    }
    config.set_paths(paths);

    let mut shim = Vec::with_capacity(input.shim.len());
    for (name, properties) in std::mem::take(&mut input.shim) {
        if properties.is_null() {
            continue;
        }
        shim.push((name, serde_json::from_value::<ShimInput>(properties)?));
    }
    config.set_shim(shim)?;

    for (name, options) in std::mem::take(&mut input.modules) {
        let options = match options {
            Value::Object(options) => options,
            other => {
                return Err(LoaderError::InvalidArgument(format!(
                    "Options of module {} must be an object, got {}",
                    name, other
                )))
            }
        };
        let id = match config.module_id(&name) {
            Some(id) => id,
            None => config.add_module(name.as_str()),
        };
        config.module_mut(id).set_options(options)?;
    }

    config.set_aliases(std::mem::take(&mut input.aliases));

    for (name, value) in std::mem::take(&mut input.attributes) {
        config.set_attribute(&name, value)?;
    }

    Ok(config)
}

/// Builds the registry described by `input` and renders the page
pub fn render_page(mut input: PageInput) -> Result<RenderedPage> {
    let config = build_config(&mut input)?;

    let mut expressions: BTreeMap<Position, Expression> = BTreeMap::new();
    for block in input.expressions {
        let expression = expressions.entry(block.position).or_default();

        if let Some(code) = block.code.filter(|code| !code.is_empty()) {
            let merged = match expression.raw_code() {
                "" => code,
                existing => format!("{}\n{}", existing, code),
            };
            expression.set_code(merged);
        }

        for name in &block.depends {
            let id = config
                .module_id(name)
                .ok_or_else(|| LoaderError::UnknownModule(name.clone()))?;
            expression.add_dependency(id);
        }
    }

    let code = merge_expressions(expressions, input.variant.renderer(), &config);
    let header = config.to_array().render_header(input.variant)?;

    Ok(RenderedPage {
        config: header,
        code,
    })
}

#[cfg(feature = "napi")]
#[napi]
pub fn render_page_native(page_json: serde_json::Value) -> napi::Result<RenderedPage> {
    let input: PageInput = serde_json::from_value(page_json)
        .map_err(|e| napi::Error::from_reason(format!("Invalid page: {}", e)))?;

    render_page(input).map_err(|e| napi::Error::from_reason(e.to_string()))
}
