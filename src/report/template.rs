use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Minimal `{{variable}}` substitution over a template string.
pub struct TemplateRenderer {
    template: String,
}

impl TemplateRenderer {
    pub fn from_string(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load `templates/<name>.md`, falling back to the given built-in
    /// template when the file is missing or unreadable. Operators can drop
    /// a file in place to customize the wording without rebuilding.
    pub fn load_or_default(name: &str, fallback: &str) -> Self {
        let path = Path::new("templates").join(format!("{}.md", name));
        match fs::read_to_string(&path) {
            Ok(template) => Self { template },
            Err(e) => {
                debug!(
                    "No template at {}, using built-in ({})",
                    path.display(),
                    e
                );
                Self::from_string(fallback)
            }
        }
    }

    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();
        for (key, value) in variables {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }
        result
    }
}
