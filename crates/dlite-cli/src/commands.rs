use std::fmt::Write as _;

use colored::Colorize;
use dlite_collection::vocab::{HAS_META, HAS_UUID};
use dlite_collection::{quad_to_row, Collection};
use dlite_instance::Instance;
use dlite_types::QuadPattern;
use serde_json::json;

use crate::bundle::{self, LoadedBundle};
use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = bundle::config_for(cli.namespace.as_deref(), cli.strict);
    let output = match cli.command {
        Command::Inspect(args) => cmd_inspect(&bundle::open_path(&args.file, config)?, cli.format)?,
        Command::Hash(args) => cmd_hash(&bundle::open_path(&args.file, config)?, cli.format)?,
        Command::Relations(args) => {
            let loaded = bundle::open_path(&args.file, config)?;
            cmd_relations(&loaded, &args, cli.format)?
        }
    };
    print!("{output}");
    Ok(())
}

struct MemberRow {
    label: String,
    uuid: Option<String>,
    meta: Option<String>,
    resolved: bool,
}

fn member_rows(coll: &Collection) -> anyhow::Result<Vec<MemberRow>> {
    let field = |label: &str, predicate: &str| {
        coll.find_first(&QuadPattern::any().subject(label).predicate(predicate))
            .map(|q| q.object().to_string())
    };
    Ok(coll
        .labels()?
        .into_iter()
        .map(|label| MemberRow {
            uuid: field(&label, HAS_UUID),
            meta: field(&label, HAS_META),
            resolved: coll.get(&label).is_ok(),
            label,
        })
        .collect())
}

fn cmd_inspect(loaded: &LoadedBundle, format: OutputFormat) -> anyhow::Result<String> {
    let coll = &loaded.collection;
    let rows = member_rows(coll)?;
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let members: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "label": r.label,
                        "uuid": r.uuid,
                        "meta": r.meta,
                        "resolved": r.resolved,
                    })
                })
                .collect();
            let value = json!({
                "uuid": coll.uuid(),
                "uri": coll.uri(),
                "nrelations": coll.nrelations(),
                "count": coll.count(),
                "members": members,
                "unresolved": loaded.report.unresolved,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        OutputFormat::Text => {
            writeln!(out, "Collection {}", coll.id().to_string().cyan().bold())?;
            if let Some(uri) = coll.uri() {
                writeln!(out, "  uuid: {}", coll.uuid().dimmed())?;
                writeln!(out, "  uri:  {}", uri.blue())?;
            }
            writeln!(
                out,
                "  {} members, {} relations",
                coll.count().to_string().bold(),
                coll.nrelations().to_string().bold()
            )?;
            for row in &rows {
                let mark = if row.resolved { "✓".green() } else { "✗".red() };
                writeln!(
                    out,
                    "  {} {}  {}  {}",
                    mark,
                    row.label.yellow(),
                    row.uuid.as_deref().unwrap_or("-"),
                    row.meta.as_deref().unwrap_or("-").dimmed()
                )?;
            }
            if !loaded.report.is_complete() {
                writeln!(
                    out,
                    "{} unresolved: {}",
                    "warning:".yellow().bold(),
                    loaded.report.unresolved.join(", ")
                )?;
            }
        }
    }
    Ok(out)
}

fn cmd_hash(loaded: &LoadedBundle, format: OutputFormat) -> anyhow::Result<String> {
    let coll = &loaded.collection;
    let digest = coll.content_hash()?;
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let value = json!({ "uuid": coll.uuid(), "hash": digest.to_hex() });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        OutputFormat::Text => writeln!(out, "{}  {}", digest.to_hex().green(), coll.id())?,
    }
    Ok(out)
}

fn cmd_relations(
    loaded: &LoadedBundle,
    args: &RelationsArgs,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let pattern = QuadPattern::triple(
        args.subject.as_deref(),
        args.predicate.as_deref(),
        args.object.as_deref(),
    );
    let found = loaded.collection.find_all(&pattern)?;
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = found.iter().map(quad_to_row).collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        }
        OutputFormat::Text => {
            for quad in &found {
                writeln!(out, "{quad}")?;
            }
            writeln!(out, "{} relation(s)", found.len().to_string().bold())?;
        }
    }
    Ok(out)
}
