//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{SourceKind, PERMITTED_TAGS};

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    enrich: EnrichInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval_ms: Option<u64>,
}

#[derive(Serialize)]
struct EnrichInfo {
    ordered: bool,
    allow_tags: Vec<String>,
    timeout_ms: u64,
    max_parallel_calls: usize,
    max_queue_size: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tag_status: Vec<TagStatus>,
}

#[derive(Serialize)]
struct TagStatus {
    tag: String,
    enabled: bool,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let source = SourceInfo {
        kind: format!("{:?}", blueprint.source.kind),
        path: blueprint
            .source
            .path
            .as_ref()
            .map(|p| p.display().to_string()),
        count: (blueprint.source.kind == SourceKind::Synthetic).then_some(blueprint.source.count),
        interval_ms: (blueprint.source.kind == SourceKind::Synthetic)
            .then_some(blueprint.source.interval_ms),
    };

    let tag_status = if args.tags {
        PERMITTED_TAGS
            .iter()
            .map(|tag| TagStatus {
                tag: tag.to_string(),
                enabled: blueprint.enrich.allow_tags.iter().any(|t| t == tag),
            })
            .collect()
    } else {
        Vec::new()
    };

    let enrich = EnrichInfo {
        ordered: blueprint.enrich.ordered,
        allow_tags: blueprint.enrich.allow_tags.clone(),
        timeout_ms: blueprint.enrich.timeout_ms,
        max_parallel_calls: blueprint.enrich.max_parallel_calls,
        max_queue_size: blueprint.enrich.max_queue_size,
        tag_status,
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source,
        enrich,
        sinks,
    }
}

fn print_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Metric Tagger Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Source info
    println!("📥 Source");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Kind: {:?}", blueprint.source.kind);
    match blueprint.source.kind {
        SourceKind::File => match &blueprint.source.path {
            Some(path) => println!("   └─ Path: {}", path.display()),
            None => println!("   └─ Path: (missing)"),
        },
        SourceKind::Synthetic => {
            println!(
                "   └─ Records: {} every {} ms",
                blueprint.source.count, blueprint.source.interval_ms
            );
        }
        SourceKind::Stdin => {
            println!("   └─ Input: standard input (NDJSON)");
        }
    }

    // Enrichment settings
    let enrich = &blueprint.enrich;
    println!("\n🏷️  Enrichment");
    println!(
        "   ├─ Mode: {}",
        if enrich.ordered {
            "ordered (release in arrival order)"
        } else {
            "unordered (release on completion)"
        }
    );
    println!("   ├─ Lookup timeout: {} ms", enrich.timeout_ms);
    println!("   ├─ Parallel calls: {}", enrich.max_parallel_calls);
    println!("   ├─ Queue size: {}", enrich.max_queue_size);

    if args.tags {
        println!("   └─ Metadata tags:");
        for (i, tag) in PERMITTED_TAGS.iter().enumerate() {
            let is_last = i == PERMITTED_TAGS.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let enabled = enrich.allow_tags.iter().any(|t| t == tag);
            let marker = if enabled { "✓" } else { "·" };
            println!("      {} {} {}", prefix, marker, tag);
        }
    } else {
        println!("   └─ Allowed tags: {:?}", enrich.allow_tags);
    }

    // Sinks
    if !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };

            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);

            if args.sinks {
                println!("   {}  ├─ Queue capacity: {}", child_prefix, sink.queue_capacity);
                if sink.params.is_empty() {
                    println!("   {}  └─ Params: (none)", child_prefix);
                } else {
                    let mut params: Vec<_> = sink.params.iter().collect();
                    params.sort();
                    println!("   {}  └─ Params:", child_prefix);
                    for (key, value) in params {
                        println!("   {}     - {} = {}", child_prefix, key, value);
                    }
                }
            }
        }
    } else {
        println!("\n📤 Sinks: (none configured)");
    }

    println!();
}
