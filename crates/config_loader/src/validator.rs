//! Configuration validation
//!
//! Rules:
//! - every allow_tags entry names a permitted metadata field
//! - enrichment limits are positive (max_parallel_calls, max_queue_size, timeout_ms)
//! - file source has a path
//! - synthetic source generates at least one record
//! - sink names unique and non-empty, queue capacities positive
//! - sink required params present (file: path, network: addr + format)

use std::collections::HashSet;

use contracts::{is_tag_permitted, ContractError, PipelineBlueprint, SinkType, SourceKind};

/// Validate a PipelineBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_allow_tags(blueprint)?;
    validate_enrich_limits(blueprint)?;
    validate_source(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Validate the metadata allow-list against the permitted field set
fn validate_allow_tags(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    for tag in &blueprint.enrich.allow_tags {
        if !is_tag_permitted(tag) {
            return Err(ContractError::config_validation(
                "enrich.allow_tags",
                format!("un-permitted metadata tag specified in configuration: {tag}"),
            ));
        }
    }
    Ok(())
}

/// Validate enrichment limits are positive
fn validate_enrich_limits(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let enrich = &blueprint.enrich;

    if enrich.max_parallel_calls == 0 {
        return Err(ContractError::config_validation(
            "enrich.max_parallel_calls",
            "max_parallel_calls must be >= 1",
        ));
    }

    if enrich.max_queue_size == 0 {
        return Err(ContractError::config_validation(
            "enrich.max_queue_size",
            "max_queue_size must be >= 1",
        ));
    }

    if enrich.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "enrich.timeout_ms",
            "timeout_ms must be >= 1",
        ));
    }

    Ok(())
}

/// Validate source configuration
fn validate_source(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;

    match source.kind {
        SourceKind::File if source.path.is_none() => Err(ContractError::config_validation(
            "source.path",
            "file source requires a path",
        )),
        SourceKind::Synthetic if source.count == 0 => Err(ContractError::config_validation(
            "source.count",
            "synthetic source must generate at least one record",
        )),
        _ => Ok(()),
    }
}

/// Validate sink configuration
fn validate_sinks(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();

    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }

        if !seen.insert(&sink.name) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }

        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be >= 1",
            ));
        }

        match sink.sink_type {
            SinkType::File => {
                if !sink.params.contains_key("path") {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].params.path", sink.name),
                        "file sink requires a path param",
                    ));
                }
            }
            SinkType::Network => {
                if !sink.params.contains_key("addr") {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].params.addr", sink.name),
                        "network sink requires an addr param",
                    ));
                }
                if let Some(format) = sink.params.get("format") {
                    if format != "json" && format != "bincode" {
                        return Err(ContractError::config_validation(
                            format!("sinks[{}].params.format", sink.name),
                            format!("unknown network format '{format}' (expected json or bincode)"),
                        ));
                    }
                }
            }
            SinkType::Log => {}
        }
    }

    Ok(())
}
