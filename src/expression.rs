//! Code units handled by the loader.
//!
//! [`JsExpression`] is raw JavaScript that is emitted verbatim inside the
//! configuration object (module `init`, top-level `callback`).
//! [`Expression`] is the code collected at one render position together with
//! the modules it needs. Expressions can wrap other expressions; the chain is
//! owned, so it can never loop back on itself.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::module::ModuleId;

/// Raw JavaScript emitted without JSON quoting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsExpression(String);

impl JsExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        JsExpression(expression.into())
    }

    pub fn expression(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JsExpression {
    fn from(expression: &str) -> Self {
        JsExpression::new(expression)
    }
}

impl From<String> for JsExpression {
    fn from(expression: String) -> Self {
        JsExpression(expression)
    }
}

impl fmt::Display for JsExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of an [`Expression`]
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    Raw(String),
    Nested(Box<Expression>),
}

/// Code registered at one render position plus the modules it depends on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    code: Option<Code>,
    dependencies: Vec<ModuleId>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(code: impl Into<String>) -> Self {
        Expression {
            code: Some(Code::Raw(code.into())),
            dependencies: Vec::new(),
        }
    }

    /// Wraps `inner` so that it renders inside this expression's require block
    pub fn nested(inner: Expression) -> Self {
        Expression {
            code: Some(Code::Nested(Box::new(inner))),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = ModuleId>) -> Self {
        self.dependencies.extend(dependencies);
        self
    }

    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = Some(Code::Raw(code.into()));
    }

    pub fn set_nested(&mut self, inner: Expression) {
        self.code = Some(Code::Nested(Box::new(inner)));
    }

    pub fn clear_code(&mut self) {
        self.code = None;
    }

    /// True when there is a nested expression or a non-empty raw string
    pub fn has_code(&self) -> bool {
        match &self.code {
            Some(Code::Raw(code)) => !code.is_empty(),
            Some(Code::Nested(_)) => true,
            None => false,
        }
    }

    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }

    pub fn add_dependency(&mut self, dependency: ModuleId) {
        self.dependencies.push(dependency);
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<ModuleId>) {
        self.dependencies = dependencies;
    }

    pub fn is_empty(&self) -> bool {
        !self.has_code() && self.dependencies.is_empty()
    }

    /// Raw code of this expression; empty for absent or nested code
    pub fn raw_code(&self) -> &str {
        match &self.code {
            Some(Code::Raw(code)) => code,
            _ => "",
        }
    }

    /// Follows nested code down to the expression holding raw code
    pub fn innermost(&self) -> &Expression {
        match &self.code {
            Some(Code::Nested(inner)) => inner.innermost(),
            _ => self,
        }
    }

    pub fn innermost_mut(&mut self) -> &mut Expression {
        match self.code {
            Some(Code::Nested(ref mut inner)) => inner.innermost_mut(),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_expression() {
        let expression = Expression::new();
        assert!(expression.is_empty());
        assert!(Expression::with_code("").is_empty());
        assert!(!Expression::with_code("x").is_empty());
        assert!(!Expression::nested(Expression::new()).is_empty());
    }

    #[test]
    fn test_innermost_follows_nesting() {
        let mut expression = Expression::nested(Expression::nested(Expression::with_code("inner")));
        assert_eq!(expression.innermost().raw_code(), "inner");

        expression.innermost_mut().set_code("changed");
        assert_eq!(expression.innermost().raw_code(), "changed");
        assert_eq!(expression.raw_code(), "");
    }

    #[test]
    fn test_js_expression_display() {
        let expr = JsExpression::from("alert(1);");
        assert_eq!(expr.expression(), "alert(1);");
        assert_eq!(expr.to_string(), "alert(1);");
    }
}
