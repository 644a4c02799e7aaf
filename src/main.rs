mod cli;

use anyhow::{Context, Result, bail};
use chapterize::{Analysis, AnalysisOptions, DiagnosticLevel};
use clap::Parser;
use cli::output::OutputConfig;
use cli::{Cli, Command};
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = OutputConfig::from_global(cli.json, cli.verbose, cli.quiet, cli.no_color);
    init_tracing(output.log_filter());

    let options = AnalysisOptions {
        scratch_root: cli.scratch_dir,
        heading_font_ratio: cli.heading_ratio,
        ..Default::default()
    };

    match cli.command {
        Command::Analyze { file } => handle_analyze(&file, &options, &output)?,
        Command::Show { file, index } => handle_show(&file, index, &options, &output)?,
        Command::Export {
            file,
            output: out_dir,
        } => handle_export(&file, &out_dir, &options, &output)?,
        Command::Clean => handle_clean(&options, &output),
    }

    Ok(())
}

fn analyze(file: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    chapterize::analyze_document(file, options)
        .with_context(|| format!("failed to analyze {}", file.display()))
}

fn report_diagnostics(analysis: &Analysis, output: &OutputConfig) {
    for d in &analysis.diagnostics {
        let tag = match d.level {
            DiagnosticLevel::Info => "note",
            DiagnosticLevel::Warning => "warning",
        };
        output.detail(&format!("{tag}: {}", d.message));
    }
}

fn handle_analyze(file: &Path, options: &AnalysisOptions, output: &OutputConfig) -> Result<()> {
    let analysis = analyze(file, options)?;

    if output.json {
        let chapters: Vec<_> = analysis
            .chapters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                serde_json::json!({
                    "index": i + 1,
                    "title": c.title,
                    "content_src": c.content_src,
                    "words": c.word_count(),
                })
            })
            .collect();
        let json = serde_json::json!({
            "chapters": chapters,
            "diagnostics": analysis.diagnostics,
        });
        output.print_json(&json)?;
        return Ok(());
    }

    if analysis.chapters.is_empty() {
        output.status(&format!("{}: no chapters found", file.display()));
    } else {
        let rows: Vec<Vec<String>> = analysis
            .chapters
            .iter()
            .enumerate()
            .map(|(i, c)| vec![(i + 1).to_string(), c.title.clone(), c.word_count().to_string()])
            .collect();
        output.print_table(&["#", "Title", "Words"], &rows);
    }
    report_diagnostics(&analysis, output);
    Ok(())
}

fn handle_show(
    file: &Path,
    index: usize,
    options: &AnalysisOptions,
    output: &OutputConfig,
) -> Result<()> {
    let analysis = analyze(file, options)?;
    let count = analysis.chapters.len();
    let Some(chapter) = index.checked_sub(1).and_then(|i| analysis.chapters.get(i)) else {
        bail!("chapter index {index} out of range (1-{count})");
    };

    if output.json {
        output.print_json(chapter)?;
    } else {
        output.detail(&format!("# {}", chapter.title));
        println!("{}", chapter.content);
    }
    Ok(())
}

fn handle_export(
    file: &Path,
    out_dir: &Path,
    options: &AnalysisOptions,
    output: &OutputConfig,
) -> Result<()> {
    let analysis = analyze(file, options)?;
    let written = chapterize::util::export_chapters(&analysis.chapters, file, out_dir)
        .with_context(|| format!("exporting to {}", out_dir.display()))?;

    if output.json {
        output.print_json(&written)?;
    } else {
        output.status(&format!(
            "Exported {} of {} chapters",
            written.len(),
            analysis.chapters.len()
        ));
        for path in &written {
            output.detail(&format!("  {}", path.display()));
        }
    }
    report_diagnostics(&analysis, output);
    Ok(())
}

fn handle_clean(options: &AnalysisOptions, output: &OutputConfig) {
    let root = options.scratch_root();
    let removed = chapterize::clean_scratch_workspaces_in(&root);
    output.status(&format!(
        "Removed {removed} scratch workspace(s) from {}",
        root.display()
    ));
}
