//! JSDoc comment parsing.

/// A parsed `/** ... */` comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsDoc {
    /// Free text before the first tag
    pub description: Option<String>,
    pub tags: Vec<JsDocTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsDocTag {
    pub name: String,
    /// Text after the tag name, trimmed; empty for bare tags like `@deprecated`
    pub text: String,
}

impl JsDoc {
    /// Parses the text between `/**` and `*/`.
    pub fn parse(raw: &str) -> JsDoc {
        let mut description_lines: Vec<String> = Vec::new();
        let mut tags: Vec<JsDocTag> = Vec::new();

        for line in raw.lines() {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            let line = line.strip_prefix(' ').unwrap_or(line).trim_end();

            if let Some(rest) = line.strip_prefix('@') {
                let (name, text) = match rest.find(char::is_whitespace) {
                    Some(index) => (&rest[..index], rest[index..].trim()),
                    None => (rest, ""),
                };
                tags.push(JsDocTag {
                    name: name.to_string(),
                    text: text.to_string(),
                });
            } else if let Some(tag) = tags.last_mut() {
                if !line.is_empty() {
                    if !tag.text.is_empty() {
                        tag.text.push('\n');
                    }
                    tag.text.push_str(line);
                }
            } else {
                description_lines.push(line.to_string());
            }
        }

        let description = description_lines.join("\n").trim().to_string();
        JsDoc {
            description: if description.is_empty() {
                None
            } else {
                Some(description)
            },
            tags,
        }
    }

    /// Text of the first tag with this name.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.text.as_str())
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Description of a `@param name text` tag.
    pub fn param(&self, parameter: &str) -> Option<&str> {
        self.tags
            .iter()
            .filter(|t| t.name == "param")
            .find_map(|t| {
                let text = t.text.trim_start();
                // `@param {string} name text` carries an optional type first
                let text = match text.strip_prefix('{') {
                    Some(rest) => rest.split_once('}').map(|(_, r)| r.trim_start())?,
                    None => text,
                };
                let (name, rest) = text
                    .split_once(char::is_whitespace)
                    .unwrap_or((text, ""));
                (name == parameter).then(|| rest.trim())
            })
            .filter(|text| !text.is_empty())
    }
}
