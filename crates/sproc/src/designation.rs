// Designation Resolver
// Parses the `-- type:` directive of the directive region

use std::sync::LazyLock;

use regex::Regex;
use sproc_utils::Designation;

use crate::error::CompileErrorKind;
use crate::source_scanner::SourceFile;

static TYPE_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--\s+type:(.*)$").expect("type directive pattern"));

static TYPE_ARGUMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+)(?:\s+(.*?))?\s*$").expect("type arguments pattern"));

static BULK_INSERT_PAYLOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s+(\S.*)$").expect("bulk insert payload pattern"));

/// Resolve the designation of a routine.
///
/// The directive region (all lines above the body marker) must contain
/// exactly one `-- type:` line.
pub fn resolve_designation(source: &SourceFile) -> Result<Designation, CompileErrorKind> {
    let region = source.directive_region().ok_or_else(|| {
        CompileErrorKind::MissingDesignation(format!(
            "no line '{}' opening the routine body",
            crate::source_scanner::BODY_MARKER
        ))
    })?;

    let mut directives = region.iter().enumerate().filter_map(|(index, line)| {
        TYPE_DIRECTIVE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|arguments| (index + 1, arguments.as_str()))
    });

    let (line, arguments) = directives.next().ok_or_else(|| {
        CompileErrorKind::MissingDesignation(
            "no '-- type:' directive above the routine body".to_string(),
        )
    })?;

    if let Some((duplicate, _)) = directives.next() {
        return Err(malformed(
            duplicate,
            format!("second '-- type:' directive (first one on line {})", line),
        ));
    }

    parse_type_arguments(line, arguments)
}

/// Parse `<designation> [<payload>]`
fn parse_type_arguments(line: usize, arguments: &str) -> Result<Designation, CompileErrorKind> {
    let captures = TYPE_ARGUMENTS
        .captures(arguments)
        .ok_or_else(|| {
            malformed(
                line,
                format!(
                    "expected '-- type: <designation> [<payload>]', found '{}'",
                    arguments.trim()
                ),
            )
        })?;

    let keyword = &captures[1];
    let payload = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let designation = match keyword {
        "none" => Designation::None,
        "procedure" => Designation::Procedure,
        "function" => Designation::Function,
        "table" => Designation::Table,
        "singleton0" => Designation::Singleton0,
        "singleton1" => Designation::Singleton1,
        "rows_with_key" => {
            return Ok(Designation::RowsWithKey {
                columns: require_columns(line, keyword, payload)?,
            });
        }
        "rows_with_index" => {
            return Ok(Designation::RowsWithIndex {
                columns: require_columns(line, keyword, payload)?,
            });
        }
        "bulk_insert" => return parse_bulk_insert(line, payload),
        other => return Err(malformed(line, format!("unknown designation type '{}'", other))),
    };

    if !payload.is_empty() {
        return Err(malformed(
            line,
            format!("designation type '{}' takes no arguments, found '{}'", keyword, payload),
        ));
    }

    Ok(designation)
}

/// `bulk_insert` requires exactly `<table_name> <comma_separated_columns>`
fn parse_bulk_insert(line: usize, payload: &str) -> Result<Designation, CompileErrorKind> {
    let malformed_payload = || {
        malformed(
            line,
            format!(
                "expected '-- type: bulk_insert <table_name> <columns>', found '{}'",
                payload
            ),
        )
    };

    let captures = BULK_INSERT_PAYLOAD.captures(payload).ok_or_else(malformed_payload)?;
    let columns = parse_column_list(&captures[2]).ok_or_else(malformed_payload)?;

    Ok(Designation::BulkInsert {
        table_name: captures[1].to_string(),
        columns,
    })
}

fn require_columns(
    line: usize,
    keyword: &str,
    payload: &str,
) -> Result<Vec<String>, CompileErrorKind> {
    parse_column_list(payload).ok_or_else(|| {
        malformed(
            line,
            format!(
                "expected '-- type: {} <comma_separated_columns>', found '{}'",
                keyword, payload
            ),
        )
    })
}

/// Parse `a,b, c` into column names. `None` if empty or any name is invalid.
fn parse_column_list(list: &str) -> Option<Vec<String>> {
    let columns: Vec<String> = list.split(',').map(|c| c.trim().to_string()).collect();
    let valid = columns
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| ch.is_alphanumeric() || ch == '_'));

    if valid { Some(columns) } else { None }
}

fn malformed(line: usize, message: String) -> CompileErrorKind {
    CompileErrorKind::MalformedDirective { line, message }
}
