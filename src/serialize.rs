//! Serialized loader configuration and its JavaScript encoding.
//!
//! The output is JSON except for [`JsExpression`] values, which are written
//! raw so that `init` and `callback` stay executable.

use serde_json::Value;

use crate::error::Result;
use crate::expression::JsExpression;
use crate::renderer::Variant;

/// A configuration value: plain JSON or raw JavaScript
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Json(Value),
    Expression(JsExpression),
}

impl ConfigValue {
    /// Null, empty strings, empty arrays and empty objects; `false` and `0` are kept
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigValue::Json(Value::Null) => true,
            ConfigValue::Json(Value::String(s)) => s.is_empty(),
            ConfigValue::Json(Value::Array(a)) => a.is_empty(),
            ConfigValue::Json(Value::Object(o)) => o.is_empty(),
            ConfigValue::Json(_) => false,
            ConfigValue::Expression(expr) => expr.expression().is_empty(),
        }
    }

    fn write_js(&self, out: &mut String) -> Result<()> {
        match self {
            ConfigValue::Json(value) => out.push_str(&serde_json::to_string(value)?),
            ConfigValue::Expression(expr) => out.push_str(expr.expression()),
        }
        Ok(())
    }
}

/// Value of a `paths` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathsEntry {
    BaseUrl(String),
    Files(Vec<String>),
}

/// Value of a `shim` entry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShimEntry {
    pub deps: Vec<String>,
    pub exports: Option<String>,
    pub init: Option<JsExpression>,
}

impl ShimEntry {
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty() && self.exports.is_none() && self.init.is_none()
    }

    fn write_js(&self, out: &mut String) -> Result<()> {
        let mut fields = Vec::new();

        // an entry without exports or init still states its (possibly empty) deps
        if !self.deps.is_empty() || (self.exports.is_none() && self.init.is_none()) {
            fields.push(format!("\"deps\":{}", serde_json::to_string(&self.deps)?));
        }
        if let Some(exports) = &self.exports {
            fields.push(format!("\"exports\":{}", serde_json::to_string(exports)?));
        }
        if let Some(init) = &self.init {
            fields.push(format!("\"init\":{}", init.expression()));
        }

        out.push('{');
        out.push_str(&fields.join(","));
        out.push('}');
        Ok(())
    }
}

/// Loader configuration in emission order: attributes, `paths`, `shim`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequireConfig {
    attributes: Vec<(String, ConfigValue)>,
    paths: Vec<(String, PathsEntry)>,
    shim: Vec<(String, ShimEntry)>,
}

fn upsert<T>(entries: &mut Vec<(String, T)>, key: &str, value: T) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}

fn write_key(out: &mut String, key: &str) -> Result<()> {
    out.push_str(&serde_json::to_string(key)?);
    out.push(':');
    Ok(())
}

impl RequireConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: &str, value: ConfigValue) {
        upsert(&mut self.attributes, name, value);
    }

    pub fn attribute(&self, name: &str) -> Option<&ConfigValue> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn attributes(&self) -> &[(String, ConfigValue)] {
        &self.attributes
    }

    pub fn set_paths(&mut self, alias: &str, entry: PathsEntry) {
        upsert(&mut self.paths, alias, entry);
    }

    pub fn paths(&self, alias: &str) -> Option<&PathsEntry> {
        self.paths.iter().find(|(k, _)| k == alias).map(|(_, v)| v)
    }

    pub fn paths_entries(&self) -> &[(String, PathsEntry)] {
        &self.paths
    }

    pub fn set_shim(&mut self, alias: &str, entry: ShimEntry) {
        upsert(&mut self.shim, alias, entry);
    }

    pub fn shim(&self, alias: &str) -> Option<&ShimEntry> {
        self.shim.iter().find(|(k, _)| k == alias).map(|(_, v)| v)
    }

    pub fn shim_entries(&self) -> &[(String, ShimEntry)] {
        &self.shim
    }

    /// True when nothing would be emitted
    pub fn is_empty(&self) -> bool {
        self.attributes.iter().all(|(_, v)| v.is_empty())
            && self.paths.is_empty()
            && self.shim.is_empty()
    }

    /// Encodes the configuration object, dropping empty top-level values
    pub fn to_js(&self) -> Result<String> {
        let mut members = Vec::new();

        for (name, value) in &self.attributes {
            if value.is_empty() {
                continue;
            }
            let mut member = String::new();
            write_key(&mut member, name)?;
            value.write_js(&mut member)?;
            members.push(member);
        }

        if !self.paths.is_empty() {
            let mut member = String::new();
            write_key(&mut member, "paths")?;
            let mut entries = Vec::with_capacity(self.paths.len());
            for (alias, entry) in &self.paths {
                let mut encoded = String::new();
                write_key(&mut encoded, alias)?;
                match entry {
                    PathsEntry::BaseUrl(url) => encoded.push_str(&serde_json::to_string(url)?),
                    PathsEntry::Files(files) => encoded.push_str(&serde_json::to_string(files)?),
                }
                entries.push(encoded);
            }
            member.push('{');
            member.push_str(&entries.join(","));
            member.push('}');
            members.push(member);
        }

        if !self.shim.is_empty() {
            let mut member = String::new();
            write_key(&mut member, "shim")?;
            let mut entries = Vec::with_capacity(self.shim.len());
            for (alias, entry) in &self.shim {
                let mut encoded = String::new();
                write_key(&mut encoded, alias)?;
                entry.write_js(&mut encoded)?;
                entries.push(encoded);
            }
            member.push('{');
            member.push_str(&entries.join(","));
            member.push('}');
            members.push(member);
        }

        Ok(format!("{{{}}}", members.join(",")))
    }

    /// `require.config({...});` or, for the legacy variant, `var require = {...};`
    pub fn render_header(&self, variant: Variant) -> Result<String> {
        let body = self.to_js()?;
        Ok(match variant {
            Variant::Standard => format!("require.config({});", body),
            Variant::Legacy => format!("var require = {};", body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_config_header() {
        let config = RequireConfig::new();
        assert!(config.is_empty());
        assert_eq!(config.render_header(Variant::Standard).unwrap(), "require.config({});");
        assert_eq!(config.render_header(Variant::Legacy).unwrap(), "var require = {};");
    }

    #[test]
    fn test_paths_header() {
        let mut config = RequireConfig::new();
        config.set_paths("test", PathsEntry::Files(vec!["file".into()]));
        assert_eq!(
            config.render_header(Variant::Standard).unwrap(),
            r#"require.config({"paths":{"test":["file"]}});"#
        );

        config.set_paths("test", PathsEntry::BaseUrl("file".into()));
        assert_eq!(
            config.render_header(Variant::Legacy).unwrap(),
            r#"var require = {"paths":{"test":"file"}};"#
        );
    }

    #[test]
    fn test_paths_and_shim() {
        let mut config = RequireConfig::new();
        config.set_paths("test", PathsEntry::BaseUrl("file".into()));
        config.set_shim(
            "test",
            ShimEntry {
                deps: vec!["file2".into()],
                ..Default::default()
            },
        );
        assert_eq!(
            config.to_js().unwrap(),
            r#"{"paths":{"test":"file"},"shim":{"test":{"deps":["file2"]}}}"#
        );
    }

    #[test]
    fn test_shim_entry_fields() {
        let mut config = RequireConfig::new();
        config.set_shim(
            "lib",
            ShimEntry {
                deps: vec![],
                exports: Some("library".into()),
                init: Some(JsExpression::new("function() { return this.lib; }")),
            },
        );
        config.set_shim("extra.js", ShimEntry::default());
        assert_eq!(
            config.to_js().unwrap(),
            r#"{"shim":{"lib":{"exports":"library","init":function() { return this.lib; }},"extra.js":{"deps":[]}}}"#
        );
    }

    #[test]
    fn test_empty_attributes_are_filtered() {
        let mut config = RequireConfig::new();
        config.set_attribute("context", ConfigValue::Json(json!("")));
        config.set_attribute("deps", ConfigValue::Json(json!([])));
        config.set_attribute("skipDataMain", ConfigValue::Json(json!(false)));
        config.set_attribute("waitSeconds", ConfigValue::Json(json!(0)));
        config.set_attribute("callback", ConfigValue::Expression(JsExpression::new("go()")));
        assert_eq!(
            config.to_js().unwrap(),
            r#"{"skipDataMain":false,"waitSeconds":0,"callback":go()}"#
        );
    }
}
