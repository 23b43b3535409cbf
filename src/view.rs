//! Interface to the host rendering framework.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Named points in page output, in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Head = 1,
    Begin = 2,
    End = 3,
    Ready = 4,
    Load = 5,
}

/// Options of an emitted `<script src=...>` tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScriptOptions {
    pub defer: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_main: Option<String>,
}

impl ScriptOptions {
    pub fn new(position: Position) -> Self {
        ScriptOptions {
            defer: false,
            is_async: false,
            position,
            data_main: None,
        }
    }

    /// HTML attributes for the tag, `position` excluded
    pub fn html_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = Vec::new();
        if self.defer {
            attributes.push(("defer", "defer".to_string()));
        }
        if self.is_async {
            attributes.push(("async", "async".to_string()));
        }
        if let Some(main) = &self.data_main {
            attributes.push(("data-main", main.clone()));
        }
        attributes
    }
}

/// Asset publishing and script registration provided by the host
pub trait View {
    /// Maps a local file to a public URL; may be called repeatedly for one path
    fn publish(&mut self, path: &Path) -> Result<String>;

    /// Inlines a script body at `position`
    fn register_script(&mut self, code: &str, position: Position);

    /// Emits a script tag for `url`
    fn register_script_file(&mut self, url: &str, options: &ScriptOptions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_order() {
        assert!(Position::Head < Position::Begin);
        assert!(Position::Begin < Position::End);
        assert!(Position::End < Position::Ready);
        assert!(Position::Ready < Position::Load);
    }

    #[test]
    fn test_html_attributes() {
        let mut options = ScriptOptions::new(Position::End);
        assert!(options.html_attributes().is_empty());

        options.defer = true;
        options.is_async = true;
        options.data_main = Some("/main.js".into());
        assert_eq!(
            options.html_attributes(),
            vec![
                ("defer", "defer".to_string()),
                ("async", "async".to_string()),
                ("data-main", "/main.js".to_string()),
            ]
        );
    }

    #[test]
    fn test_script_options_json() {
        let mut options = ScriptOptions::new(Position::End);
        options.data_main = Some("/main.js".into());
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            serde_json::json!({"defer": false, "async": false, "position": "end", "data-main": "/main.js"})
        );
    }
}
