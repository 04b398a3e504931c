// Parameter Reconciler
// Merges catalog parameters with extended parameter specs and doc comments

use log::warn;
use sproc_utils::{DocBlock, DocParameter, ExtendedParameterSpec, ParameterMetadata};

use crate::diagnostics::{Diagnostic, Span};
use crate::doc_block::DocComment;
use crate::error::CompileErrorKind;
use crate::gateway::RoutineParameter;

/// Build parameter metadata from the catalog and attach the extended
/// parameter specs by name. A spec naming a parameter the routine doesn't
/// have is an error.
pub fn merge_parameters(
    catalog: Vec<RoutineParameter>,
    extended: &[ExtendedParameterSpec],
) -> Result<Vec<ParameterMetadata>, CompileErrorKind> {
    let mut parameters: Vec<ParameterMetadata> =
        catalog.into_iter().map(parameter_metadata).collect();

    for spec in extended {
        let parameter = parameters
            .iter_mut()
            .find(|parameter| parameter.name == spec.name)
            .ok_or_else(|| CompileErrorKind::UnknownExtendedParameter(spec.name.clone()))?;
        parameter.extended = Some(spec.clone());
    }

    Ok(parameters)
}

fn parameter_metadata(parameter: RoutineParameter) -> ParameterMetadata {
    let mut descriptor = parameter.dtd_identifier;
    if let Some(character_set) = &parameter.character_set {
        descriptor.push_str(" character set ");
        descriptor.push_str(character_set);
    }
    if let Some(collation) = &parameter.collation {
        descriptor.push_str(" collation ");
        descriptor.push_str(collation);
    }

    ParameterMetadata {
        name: parameter.name,
        data_type: parameter.data_type,
        data_type_descriptor: descriptor,
        character_set: parameter.character_set,
        collation: parameter.collation,
        extended: None,
    }
}

/// The wrapper-facing doc block: catalog parameters in order, each with the
/// description documented for it (empty if undocumented).
pub fn build_doc_block(doc: &DocComment, parameters: &[ParameterMetadata]) -> DocBlock {
    DocBlock {
        short_description: doc.short_description.clone(),
        long_description: doc.long_description.clone(),
        parameters: parameters
            .iter()
            .map(|parameter| DocParameter {
                name: parameter.name.clone(),
                data_type: parameter.data_type_descriptor.clone(),
                description: doc
                    .parameter_description(&parameter.name)
                    .unwrap_or_default()
                    .to_string(),
            })
            .collect(),
    }
}

/// Report parameters missing from the doc comment and documented parameters
/// the routine doesn't have. Advisory only.
pub fn validate_parameter_lists(
    routine_name: &str,
    parameters: &[ParameterMetadata],
    doc: &DocComment,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut advisories = Vec::new();

    for parameter in parameters {
        if doc.parameter_description(&parameter.name).is_none() {
            advisories.push(format!(
                "Parameter '{}' is missing from the doc block",
                parameter.name
            ));
        }
    }

    for (name, _) in &doc.parameters {
        if !parameters.iter().any(|parameter| &parameter.name == name) {
            advisories.push(format!(
                "Documented parameter '{}' is not a parameter of the routine",
                name
            ));
        }
    }

    for message in advisories {
        warn!("{}: {}", routine_name, message);
        diagnostics.push(Diagnostic::warning(message, Span::none()));
    }
}

#[cfg(test)]
#[path = "reconcile/reconcile_tests.rs"]
mod reconcile_tests;
