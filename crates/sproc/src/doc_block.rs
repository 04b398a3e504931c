// Doc Block
// Locates the /** ... */ comment of a routine and splits it into descriptions
// and @param tags

/// Parsed parts of a doc comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocComment {
    pub short_description: String,
    pub long_description: String,
    /// `@param` tags as `(name, description)`, in order of appearance
    pub parameters: Vec<(String, String)>,
}

impl DocComment {
    pub fn parameter_description(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(parameter, _)| parameter == name)
            .map(|(_, description)| description.as_str())
    }
}

/// Turns the text of a doc comment into its parts
pub trait DocCommentParser {
    fn parse(&self, comment: &str) -> DocComment;
}

/// Default parser for `/** ... */` comments.
///
/// The first paragraph is the short description, following paragraphs up to
/// the first tag form the long description. `@param <name> <description>`
/// tags may continue on following lines; other tags are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocBlockParser;

impl DocCommentParser for DocBlockParser {
    fn parse(&self, comment: &str) -> DocComment {
        let lines = strip_comment_markers(comment);

        let first_tag = lines
            .iter()
            .position(|line| line.starts_with('@'))
            .unwrap_or(lines.len());
        let (description, tags) = lines.split_at(first_tag);

        let mut paragraphs = description
            .split(|line| line.is_empty())
            .filter(|paragraph| !paragraph.is_empty());

        let short_description = paragraphs
            .next()
            .map(|paragraph| paragraph.join(" "))
            .unwrap_or_default();
        let long_description = paragraphs
            .map(|paragraph| paragraph.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n");

        DocComment {
            short_description,
            long_description,
            parameters: parse_param_tags(tags),
        }
    }
}

/// Find the doc comment in the directive region and return its text.
pub fn extract_doc_comment(region: &[String]) -> Option<String> {
    let start = region.iter().position(|line| line.trim_start().starts_with("/**"))?;
    let end = region[start..]
        .iter()
        .position(|line| line.contains("*/"))
        .map(|offset| start + offset)?;

    Some(region[start..=end].join("\n"))
}

fn strip_comment_markers(comment: &str) -> Vec<String> {
    let body = comment.trim();
    let body = body.strip_prefix("/**").unwrap_or(body);
    let body = body.strip_suffix("*/").unwrap_or(body);

    let mut lines: Vec<String> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.trim().to_string()
        })
        .collect();

    while lines.first().is_some_and(|line| line.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
}

fn parse_param_tags(tags: &[String]) -> Vec<(String, String)> {
    let mut parameters: Vec<(String, String)> = Vec::new();
    let mut in_param = false;

    for line in tags {
        if let Some(tag) = line.strip_prefix('@') {
            in_param = false;
            let Some(rest) = tag.strip_prefix("param") else {
                continue;
            };
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                continue;
            }

            let mut words = rest.split_whitespace();
            if let Some(name) = words.next() {
                let name = name.trim_start_matches('$').to_string();
                parameters.push((name, words.collect::<Vec<_>>().join(" ")));
                in_param = true;
            }
        } else if in_param && !line.is_empty() {
            if let Some((_, description)) = parameters.last_mut() {
                if !description.is_empty() {
                    description.push(' ');
                }
                description.push_str(line);
            }
        }
    }

    parameters
}
