// Return Type Resolver
// Parses and validates the `-- return:` directive of function-like routines

use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use sproc_utils::{Designation, ReturnType, ScalarType};

use crate::diagnostics::{Diagnostic, Span};
use crate::error::CompileErrorKind;
use crate::source_scanner::SourceFile;

static RETURN_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*--\s+return:(.*)$").expect("return directive pattern"));

static RETURN_UNION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+(?:\s*\|\s*\w+)*)\s*$").expect("return union pattern"));

/// Resolve the return type of a routine.
///
/// Only function-like designations carry a return type; for all others the
/// result is `None`. A function-like routine without a `-- return:` directive
/// defaults to `mixed` with an advisory.
pub fn resolve_return_type(
    source: &SourceFile,
    designation: &Designation,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<ReturnType>, CompileErrorKind> {
    let region = source.directive_region().unwrap_or(&[]);

    let mut directives = region.iter().enumerate().filter_map(|(index, line)| {
        RETURN_DIRECTIVE
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|union| (index, union.as_str()))
    });
    let directive = directives.next();

    if let Some((duplicate, _)) = directives.next() {
        return Err(CompileErrorKind::MalformedDirective {
            line: duplicate + 1,
            message: "second '-- return:' directive".to_string(),
        });
    }

    if !designation.is_function_like() {
        if let Some((index, _)) = directive {
            let diagnostic = Diagnostic::warning(
                format!(
                    "Ignoring '-- return:' directive for designation type '{}'",
                    designation.keyword()
                ),
                Span::on_line(index, 0, region[index].chars().count()),
            );
            warn!("{}: {}", source.base_name(), diagnostic.message);
            diagnostics.push(diagnostic);
        }
        return Ok(None);
    }

    let Some((index, union)) = directive else {
        let diagnostic = Diagnostic::warning(
            format!(
                "No '-- return:' directive for designation type '{}', assuming 'mixed'",
                designation.keyword()
            ),
            Span::none(),
        );
        warn!("{}: {}", source.base_name(), diagnostic.message);
        diagnostics.push(diagnostic);
        return Ok(Some(ReturnType::mixed()));
    };

    let captures = RETURN_UNION.captures(union).ok_or_else(|| {
        CompileErrorKind::ReturnTypeValidation(format!(
            "line {}: expected '-- return: <type>(|<type>)*', found '{}'",
            index + 1,
            union.trim()
        ))
    })?;

    let return_type =
        ReturnType::parse(&captures[1]).map_err(CompileErrorKind::ReturnTypeValidation)?;
    Ok(Some(return_type))
}

/// Check a return type against the rules of its designation.
///
/// The union must be exactly `mixed`, exactly `bool`, or composed of `int`,
/// `float`, `string` and `null` only. A `singleton0` may legitimately return
/// nothing, so its union must also be able to represent null.
pub fn validate_return_type(
    designation: &Designation,
    return_type: &ReturnType,
) -> Result<(), CompileErrorKind> {
    if !designation.is_function_like() {
        return Ok(());
    }

    let exact =
        return_type.is_exactly(ScalarType::Mixed) || return_type.is_exactly(ScalarType::Bool);
    let scalar_only = return_type.members().iter().all(|member| {
        matches!(
            member,
            ScalarType::Int | ScalarType::Float | ScalarType::String | ScalarType::Null
        )
    });

    if !exact && !scalar_only {
        return Err(CompileErrorKind::ReturnTypeValidation(format!(
            "'{}' must be 'mixed', 'bool', or a combination of 'int', 'float', 'string' and 'null'",
            return_type
        )));
    }

    if *designation == Designation::Singleton0
        && !exact
        && !return_type.contains(ScalarType::Null)
    {
        return Err(CompileErrorKind::ReturnTypeValidation(format!(
            "'{}' must be 'mixed', 'bool', or contain 'null' for designation type 'singleton0'",
            return_type
        )));
    }

    Ok(())
}
