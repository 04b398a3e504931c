// Extended Parameter Parser
// Parses `-- param:` directives describing list-valued parameters

use std::sync::LazyLock;

use regex::Regex;
use sproc_utils::ExtendedParameterSpec;

use crate::error::CompileErrorKind;
use crate::source_scanner::SourceFile;

static PARAM_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--\s+param:(.*)$").expect("param directive pattern"));

static PARAM_ARGUMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\w+)\s+(\w+)(?:\s+(\S)\s+(\S)\s+(\S))?\s*$").expect("param arguments pattern")
});

/// Parse all `-- param: <name> <list-type> [<delimiter> <enclosure> <escape>]`
/// directives of the directive region, in declaration order.
pub fn parse_extended_parameters(
    source: &SourceFile,
) -> Result<Vec<ExtendedParameterSpec>, CompileErrorKind> {
    let region = source.directive_region().unwrap_or(&[]);
    let mut specs: Vec<ExtendedParameterSpec> = Vec::new();

    for (index, line) in region.iter().enumerate() {
        let Some(arguments) = PARAM_DIRECTIVE.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };

        let captures = PARAM_ARGUMENTS.captures(arguments.as_str()).ok_or_else(|| {
            CompileErrorKind::MalformedDirective {
                line: index + 1,
                message: format!(
                    "expected '-- param: <name> <type> [<delimiter> <enclosure> <escape>]', \
                     found '{}'",
                    arguments.as_str().trim()
                ),
            }
        })?;

        let name = captures[1].to_string();
        if specs.iter().any(|spec| spec.name == name) {
            return Err(CompileErrorKind::DuplicateExtendedParameter(name));
        }

        let single = |group: usize, default: char| {
            captures
                .get(group)
                .and_then(|m| m.as_str().chars().next())
                .unwrap_or(default)
        };

        specs.push(ExtendedParameterSpec {
            name,
            list_type: captures[2].to_string(),
            delimiter: single(3, ExtendedParameterSpec::DEFAULT_DELIMITER),
            enclosure: single(4, ExtendedParameterSpec::DEFAULT_ENCLOSURE),
            escape: single(5, ExtendedParameterSpec::DEFAULT_ESCAPE),
        });
    }

    Ok(specs)
}
