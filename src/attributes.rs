//! Top-level loader attributes (`baseUrl`, `waitSeconds`, ...).
//!
//! Every recognised name maps to a typed field. Unknown names are rejected
//! with [`LoaderError::UnknownProperty`], values of the wrong JSON type with
//! [`LoaderError::InvalidArgument`].

use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{LoaderError, Result};
use crate::expression::JsExpression;
use crate::serialize::ConfigValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigAttribute {
    EnforceDefine,
    WaitSeconds,
    Context,
    Deps,
    Callback,
    Xhtml,
    UrlArgs,
    ScriptType,
    SkipDataMain,
    Map,
    Config,
    Packages,
    Bundles,
    NodeIdCompat,
    BaseUrl,
}

impl ConfigAttribute {
    /// Emission order; `baseUrl` always comes last
    pub const ALL: [ConfigAttribute; 15] = [
        ConfigAttribute::EnforceDefine,
        ConfigAttribute::WaitSeconds,
        ConfigAttribute::Context,
        ConfigAttribute::Deps,
        ConfigAttribute::Callback,
        ConfigAttribute::Xhtml,
        ConfigAttribute::UrlArgs,
        ConfigAttribute::ScriptType,
        ConfigAttribute::SkipDataMain,
        ConfigAttribute::Map,
        ConfigAttribute::Config,
        ConfigAttribute::Packages,
        ConfigAttribute::Bundles,
        ConfigAttribute::NodeIdCompat,
        ConfigAttribute::BaseUrl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigAttribute::EnforceDefine => "enforceDefine",
            ConfigAttribute::WaitSeconds => "waitSeconds",
            ConfigAttribute::Context => "context",
            ConfigAttribute::Deps => "deps",
            ConfigAttribute::Callback => "callback",
            ConfigAttribute::Xhtml => "xhtml",
            ConfigAttribute::UrlArgs => "urlArgs",
            ConfigAttribute::ScriptType => "scriptType",
            ConfigAttribute::SkipDataMain => "skipDataMain",
            ConfigAttribute::Map => "map",
            ConfigAttribute::Config => "config",
            ConfigAttribute::Packages => "packages",
            ConfigAttribute::Bundles => "bundles",
            ConfigAttribute::NodeIdCompat => "nodeIdCompat",
            ConfigAttribute::BaseUrl => "baseUrl",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        ATTRIBUTE_NAMES
            .get(name)
            .copied()
            .ok_or_else(|| LoaderError::UnknownProperty(format!("Config::{}", name)))
    }
}

lazy_static! {
    static ref ATTRIBUTE_NAMES: HashMap<&'static str, ConfigAttribute> = ConfigAttribute::ALL
        .iter()
        .map(|attribute| (attribute.name(), *attribute))
        .collect();
}

/// Typed storage for the top-level attributes; `None` means unset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub enforce_define: Option<bool>,
    pub wait_seconds: Option<u64>,
    pub context: Option<String>,
    pub deps: Option<Vec<String>>,
    pub callback: Option<JsExpression>,
    pub xhtml: Option<bool>,
    pub url_args: Option<String>,
    pub script_type: Option<String>,
    pub skip_data_main: Option<bool>,
    pub map: Option<Map<String, Value>>,
    pub config: Option<Map<String, Value>>,
    pub packages: Option<Vec<Value>>,
    pub bundles: Option<Map<String, Value>>,
    pub node_id_compat: Option<bool>,
    pub base_url: Option<String>,
}

fn parse<T: DeserializeOwned>(attribute: ConfigAttribute, value: Value) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| LoaderError::InvalidArgument(format!("{}: {}", attribute.name(), e)))
}

impl Attributes {
    /// Sets an attribute by name; `null` unsets it
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let attribute = ConfigAttribute::from_name(name)?;

        match attribute {
            ConfigAttribute::EnforceDefine => self.enforce_define = parse(attribute, value)?,
            ConfigAttribute::WaitSeconds => self.wait_seconds = parse(attribute, value)?,
            ConfigAttribute::Context => self.context = parse(attribute, value)?,
            ConfigAttribute::Deps => self.deps = parse(attribute, value)?,
            ConfigAttribute::Callback => {
                self.callback = parse::<String>(attribute, value)?.map(JsExpression::from)
            }
            ConfigAttribute::Xhtml => self.xhtml = parse(attribute, value)?,
            ConfigAttribute::UrlArgs => self.url_args = parse(attribute, value)?,
            ConfigAttribute::ScriptType => self.script_type = parse(attribute, value)?,
            ConfigAttribute::SkipDataMain => self.skip_data_main = parse(attribute, value)?,
            ConfigAttribute::Map => self.map = parse(attribute, value)?,
            ConfigAttribute::Config => self.config = parse(attribute, value)?,
            ConfigAttribute::Packages => self.packages = parse(attribute, value)?,
            ConfigAttribute::Bundles => self.bundles = parse(attribute, value)?,
            ConfigAttribute::NodeIdCompat => self.node_id_compat = parse(attribute, value)?,
            ConfigAttribute::BaseUrl => self.base_url = parse(attribute, value)?,
        }

        Ok(())
    }

    /// Reads an attribute by name
    pub fn get(&self, name: &str) -> Result<Option<ConfigValue>> {
        ConfigAttribute::from_name(name).map(|attribute| self.value(attribute))
    }

    pub fn value(&self, attribute: ConfigAttribute) -> Option<ConfigValue> {
        let json = match attribute {
            ConfigAttribute::Callback => {
                return self.callback.clone().map(ConfigValue::Expression);
            }
            ConfigAttribute::EnforceDefine => self.enforce_define.map(Value::from),
            ConfigAttribute::WaitSeconds => self.wait_seconds.map(Value::from),
            ConfigAttribute::Context => self.context.clone().map(Value::from),
            ConfigAttribute::Deps => self.deps.clone().map(Value::from),
            ConfigAttribute::Xhtml => self.xhtml.map(Value::from),
            ConfigAttribute::UrlArgs => self.url_args.clone().map(Value::from),
            ConfigAttribute::ScriptType => self.script_type.clone().map(Value::from),
            ConfigAttribute::SkipDataMain => self.skip_data_main.map(Value::from),
            ConfigAttribute::Map => self.map.clone().map(Value::Object),
            ConfigAttribute::Config => self.config.clone().map(Value::Object),
            ConfigAttribute::Packages => self.packages.clone().map(Value::Array),
            ConfigAttribute::Bundles => self.bundles.clone().map(Value::Object),
            ConfigAttribute::NodeIdCompat => self.node_id_compat.map(Value::from),
            ConfigAttribute::BaseUrl => self.base_url.clone().map(Value::from),
        };
        json.map(ConfigValue::Json)
    }

    /// Set attributes in emission order
    pub fn values(&self) -> Vec<(ConfigAttribute, ConfigValue)> {
        ConfigAttribute::ALL
            .iter()
            .filter_map(|attribute| self.value(*attribute).map(|value| (*attribute, value)))
            .collect()
    }
}
