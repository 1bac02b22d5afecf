//! JSDoc block parsing.
//!
//! Descriptions, summaries, `@deprecated`, numeric/date format hints and
//! validator tags all come from `/** ... */` blocks attached to declarations.

/// A parsed `/** ... */` comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsDoc {
    pub description: Option<String>,
    pub tags: Vec<JsDocTag>,
}

/// A single `@tag comment` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JsDocTag {
    pub name: String,
    pub comment: Option<String>,
}

impl JsDoc {
    /// Parses raw comment text. Returns `None` for non-JSDoc comments.
    pub fn parse(raw: &str) -> Option<Self> {
        let body = raw.trim().strip_prefix("/**")?.strip_suffix("*/")?;

        let mut description_lines: Vec<&str> = Vec::new();
        let mut tags: Vec<(String, Vec<String>)> = Vec::new();

        for line in body.lines() {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line).trim();

            if let Some(rest) = line.strip_prefix('@') {
                let (name, comment) = match rest.find(char::is_whitespace) {
                    Some(pos) => (&rest[..pos], rest[pos..].trim()),
                    None => (rest, ""),
                };
                let mut lines = Vec::new();
                if !comment.is_empty() {
                    lines.push(comment.to_string());
                }
                tags.push((name.to_string(), lines));
            } else if let Some((_, lines)) = tags.last_mut() {
                if !line.is_empty() {
                    lines.push(line.to_string());
                }
            } else {
                description_lines.push(line);
            }
        }

        let description = description_lines.join("\n").trim().to_string();
        let tags = tags
            .into_iter()
            .map(|(name, lines)| JsDocTag {
                name,
                comment: if lines.is_empty() {
                    None
                } else {
                    Some(lines.join(" "))
                },
            })
            .collect();

        Some(JsDoc {
            description: if description.is_empty() {
                None
            } else {
                Some(description)
            },
            tags,
        })
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Comment of the first tag with the given name.
    pub fn tag_comment(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .and_then(|t| t.comment.as_deref())
    }

    /// Tags whose comment starts with `parameter` as its first word, with that
    /// word removed. This is how method-level JSDoc targets one parameter
    /// (`@isInt id`, `@minimum id 1 id must be positive`).
    pub fn parameter_tags(&self, parameter: &str) -> Vec<JsDocTag> {
        self.tags
            .iter()
            .filter_map(|tag| {
                let comment = tag.comment.as_deref()?;
                let (first, rest) = split_first_word(comment);
                if first != parameter {
                    return None;
                }
                Some(JsDocTag {
                    name: tag.name.clone(),
                    comment: if rest.is_empty() {
                        None
                    } else {
                        Some(rest.to_string())
                    },
                })
            })
            .collect()
    }

    /// Description of a parameter from `@param [{type}] name [-] text`.
    pub fn param_description(&self, parameter: &str) -> Option<String> {
        self.tags
            .iter()
            .filter(|t| t.name == "param")
            .filter_map(|t| t.comment.as_deref())
            .find_map(|comment| {
                let comment = skip_type_expression(comment);
                let (name, rest) = split_first_word(comment);
                if name.trim_matches(|c| c == '[' || c == ']') != parameter {
                    return None;
                }
                let text = rest.trim_start_matches('-').trim();
                if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            })
    }
}

/// Splits off the first whitespace-delimited word.
pub fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim()),
        None => (text, ""),
    }
}

fn skip_type_expression(comment: &str) -> &str {
    let comment = comment.trim();
    if comment.starts_with('{') {
        if let Some(end) = comment.find('}') {
            return comment[end + 1..].trim();
        }
    }
    comment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description_and_tags() {
        let doc = JsDoc::parse(
            r#"/**
             * Get a user by id.
             * Returns 404 when missing.
             * @summary Fetch user
             * @param id the user id
             * @deprecated
             */"#,
        )
        .unwrap();

        assert_eq!(
            doc.description.as_deref(),
            Some("Get a user by id.\nReturns 404 when missing.")
        );
        assert_eq!(doc.tag_comment("summary"), Some("Fetch user"));
        assert!(doc.has_tag("deprecated"));
        assert_eq!(doc.tag_comment("deprecated"), None);
        assert_eq!(doc.param_description("id").as_deref(), Some("the user id"));
    }

    #[test]
    fn test_non_jsdoc_comment_is_ignored() {
        assert!(JsDoc::parse("// plain comment").is_none());
        assert!(JsDoc::parse("/* block */").is_none());
    }

    #[test]
    fn test_single_line_block() {
        let doc = JsDoc::parse("/** @isInt */").unwrap();
        assert_eq!(doc.description, None);
        assert!(doc.has_tag("isInt"));
    }

    #[test]
    fn test_parameter_tags_strip_parameter_name() {
        let doc = JsDoc::parse(
            r#"/**
             * @isInt id
             * @minimum id 1 id must be positive
             * @maxLength name 20
             */"#,
        )
        .unwrap();

        let tags = doc.parameter_tags("id");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "isInt");
        assert_eq!(tags[0].comment, None);
        assert_eq!(tags[1].comment.as_deref(), Some("1 id must be positive"));
        assert!(doc.parameter_tags("missing").is_empty());
    }

    #[test]
    fn test_param_description_with_type_and_dash() {
        let doc = JsDoc::parse("/**\n * @param {string} name - The user name\n */").unwrap();
        assert_eq!(doc.param_description("name").as_deref(), Some("The user name"));
        assert_eq!(doc.param_description("other"), None);
    }
}
