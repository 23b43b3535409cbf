//! Rendering of [`Expression`]s into `require([...], function(...) {...});` blocks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::iter;

use crate::config::Config;
use crate::expression::{Code, Expression};
use crate::module::Module;

/// Placeholder argument for modules that inject nothing
const NO_INJECT: &str = "undefined";

/// Turns an expression into JavaScript
pub trait JsRenderer {
    fn render_expression(&self, expression: &Expression, config: &Config) -> String;
}

/// Output flavour of the loader.
///
/// `Standard` nests require blocks and emits `require.config(...)`;
/// `Legacy` always wraps code in a single block and emits `var require = ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Standard,
    Legacy,
}

impl Variant {
    pub fn renderer(self) -> &'static dyn JsRenderer {
        match self {
            Variant::Standard => &RequireJsRenderer,
            Variant::Legacy => &LegacyRenderer,
        }
    }
}

fn json_string(value: &str) -> String {
    Value::from(value).to_string()
}

/// Builds the module list and the matching wrapper arguments.
///
/// Modules without exports are padded with `undefined` only when an
/// export-bearing module follows them, so trailing ones add no arguments.
fn extract_modules(dependencies: &[&Module], keep_fileless: bool) -> (Vec<String>, Vec<String>) {
    let mut pad = 0;
    let mut modules = Vec::with_capacity(dependencies.len());
    let mut injects = Vec::new();

    for module in dependencies {
        if !keep_fileless && module.file_count() == 0 {
            continue;
        }

        match module.exports() {
            Some(inject) => {
                injects.extend(iter::repeat(NO_INJECT.to_string()).take(pad));
                injects.push(inject.to_string());
                pad = 0;
            }
            None => pad += 1,
        }

        modules.push(json_string(module.alias()));
    }

    (modules, injects)
}

fn render_require_code(code: &str, modules: &[String], injects: &[String]) -> String {
    if modules.is_empty() {
        return code.to_string();
    }

    let mut block = format!("require([{}]", modules.join(","));

    if !code.is_empty() {
        block.push_str(&format!(", function({}) {{\n{}\n}}", injects.join(","), code));
    }

    block.push_str(");");
    block
}

/// Renderer producing nested require blocks.
///
/// Dependencies with several files are loaded by an inner block listing each
/// file; zero-file dependencies are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireJsRenderer;

impl JsRenderer for RequireJsRenderer {
    fn render_expression(&self, expression: &Expression, config: &Config) -> String {
        if expression.is_empty() {
            return String::new();
        }

        let mut code = match expression.code() {
            Some(Code::Nested(inner)) => self.render_expression(inner, config),
            Some(Code::Raw(code)) => code.clone(),
            None => String::new(),
        };

        let (packages, dependencies): (Vec<&Module>, Vec<&Module>) = expression
            .dependencies()
            .iter()
            .map(|id| config.module(*id))
            .partition(|module| module.file_count() > 1);

        if !packages.is_empty() {
            let files: Vec<String> = packages
                .iter()
                .flat_map(|module| module.files().map(move |file| module.file_id(file)))
                .map(|file_id| json_string(&file_id))
                .collect();
            code = render_require_code(&code, &files, &[]);
        }

        let (modules, injects) = extract_modules(&dependencies, false);
        render_require_code(&code, &modules, &injects)
    }
}

/// Renderer producing one block per expression, even without dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyRenderer;

impl JsRenderer for LegacyRenderer {
    fn render_expression(&self, expression: &Expression, config: &Config) -> String {
        let code = match expression.code() {
            Some(Code::Nested(inner)) => self.render_expression(inner, config),
            Some(Code::Raw(code)) => code.clone(),
            None => String::new(),
        };

        if code.is_empty() {
            return String::new();
        }

        let dependencies: Vec<&Module> = expression
            .dependencies()
            .iter()
            .map(|id| config.module(*id))
            .collect();
        let (modules, injects) = extract_modules(&dependencies, true);

        format!(
            "require([{}], function({}) {{\n{}\n}});",
            modules.join(","),
            injects.join(","),
            code
        )
    }
}
