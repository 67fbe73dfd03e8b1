//! Subcommand implementations

use anyhow::Context;
use clap::{Args, Subcommand};
use maestro_core::{
    resolve_formats, transcribe_input, Composer, EditorSession, MaestroConfig, ProjectLayout,
    TimelineEntry,
};
use maestro_render::OutputFormat;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct ComposeArgs {
    /// Produce every output format
    #[arg(long)]
    all: bool,

    /// Paginated DOCX, landscape EVA layout (default)
    #[arg(long)]
    eva_docx: bool,

    /// Paginated DOCX, portrait SODF layout
    #[arg(long)]
    sodf_docx: bool,

    /// Interchange XML keyed by document id
    #[arg(long)]
    ipv_xml: bool,

    /// Styled HTML
    #[arg(long)]
    html: bool,

    /// Markdown with YAML front matter
    #[arg(long)]
    markdown: bool,

    /// Definition files; every file in the procedures directory when omitted
    files: Vec<PathBuf>,
}

impl ComposeArgs {
    fn requested(&self) -> Vec<OutputFormat> {
        [
            (self.eva_docx, OutputFormat::EvaDocx),
            (self.sodf_docx, OutputFormat::SodfDocx),
            (self.ipv_xml, OutputFormat::IpvXml),
            (self.html, OutputFormat::Html),
            (self.markdown, OutputFormat::Markdown),
        ]
        .into_iter()
        .filter_map(|(selected, format)| selected.then_some(format))
        .collect()
    }
}

#[derive(Args, Debug)]
pub(crate) struct TranscribeArgs {
    /// Document to transcribe (.html, .htm, .xml, .zip, .md)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct EditArgs {
    /// Procedure definition to edit
    #[arg(short, long)]
    file: PathBuf,

    /// Print the timeline as JSON
    #[arg(long)]
    json: bool,

    /// Apply the edit without saving it
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    operation: Option<EditOperation>,
}

/// Structural edits, addressed by zero-based index
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOperation {
    /// Move the task at FROM so it ends up at TO
    Move { from: usize, to: usize },

    /// Delete a task
    DeleteTask { task: usize },

    /// Insert an empty division before division BEFORE of TASK
    InsertDivision { task: usize, before: usize },

    /// Append an empty division to TASK
    AppendDivision { task: usize },

    /// Delete division DIVISION of TASK
    DeleteDivision { task: usize, division: usize },
}

pub(crate) async fn compose(project: &Path, config: &MaestroConfig, args: ComposeArgs) -> anyhow::Result<()> {
    let formats = resolve_formats(&args.requested(), args.all);
    let composer = Composer::open(project, config).await?;
    let report = if args.files.is_empty() {
        composer.compose_all(&formats).await?
    } else {
        composer.compose_files(&args.files, &formats).await
    };

    for output in &report.outputs {
        println!("{:<10} {}", output.format, output.path.display());
    }
    if report.is_success() {
        return Ok(());
    }
    for failure in &report.failures {
        match failure.format {
            Some(format) => eprintln!("{} [{format}]: {}", failure.source.display(), failure.error),
            None => eprintln!("{}: {}", failure.source.display(), failure.error),
        }
    }
    anyhow::bail!(
        "{} failure(s), {} output(s) written",
        report.failures.len(),
        report.outputs.len()
    )
}

pub(crate) async fn transcribe(project: &Path, config: &MaestroConfig, args: TranscribeArgs) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(project, config);
    let transcription = transcribe_input(&layout, args.input.as_deref()).await?;
    println!("{}", transcription.destination.display());
    Ok(())
}

pub(crate) async fn edit(project: &Path, config: &MaestroConfig, args: EditArgs) -> anyhow::Result<()> {
    let layout = ProjectLayout::new(project, config);
    let mut session = EditorSession::open_with_tasks_dir(&args.file, &layout.tasks_dir).await?;

    if let Some(operation) = args.operation {
        apply(&mut session, operation)
            .with_context(|| format!("cannot apply {operation:?} to {}", args.file.display()))?;
        if !args.dry_run {
            session.save_change().await?;
        }
    }

    let timeline = session.timeline();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print!("{}", timeline_table(&timeline));
    }
    drop(session.close());
    Ok(())
}

fn apply(session: &mut EditorSession, operation: EditOperation) -> maestro_core::Result<()> {
    match operation {
        EditOperation::Move { from, to } => session.move_task_to(from, to),
        EditOperation::DeleteTask { task } => {
            let id = session.task_id_at(task)?;
            session.delete_task(id).map(drop)
        }
        EditOperation::InsertDivision { task, before } => {
            let task = session.task_id_at(task)?;
            let before = session.division_id_at(task, before)?;
            session.insert_division(task, before).map(drop)
        }
        EditOperation::AppendDivision { task } => {
            let task = session.task_id_at(task)?;
            session.append_division(task).map(drop)
        }
        EditOperation::DeleteDivision { task, division } => {
            let task = session.task_id_at(task)?;
            let division = session.division_id_at(task, division)?;
            session.delete_division(task, division)
        }
    }
}

fn timeline_table(timeline: &[TimelineEntry]) -> String {
    let mut table = format!(
        "{:>3}  {:<8}  {:<8}  {:<8}  {:<8}  {:>4}  {}\n",
        "#", "START", "DURATION", "END", "GAP", "DIVS", "TITLE"
    );
    for entry in timeline {
        table.push_str(&format!(
            "{:>3}  {:<8}  {:<8}  {:<8}  {:<8}  {:>4}  {}\n",
            entry.index,
            entry.start,
            entry.duration,
            entry.end,
            entry.gap_before,
            entry.divisions,
            entry.title
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(subcommand)]
        command: Wrapped,
    }

    #[derive(Subcommand, Debug)]
    enum Wrapped {
        Compose(ComposeArgs),
        Transcribe(TranscribeArgs),
        Edit(EditArgs),
    }

    fn parse(args: &[&str]) -> Wrapped {
        let mut argv = vec!["maestro"];
        argv.extend_from_slice(args);
        Harness::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn compose_flags_select_formats() {
        let Wrapped::Compose(args) = parse(&["compose", "--html", "--ipv-xml", "p.yml"]) else {
            panic!("expected compose");
        };
        assert_eq!(args.requested(), vec![OutputFormat::IpvXml, OutputFormat::Html]);
        assert_eq!(args.files, vec![PathBuf::from("p.yml")]);
    }

    #[test]
    fn compose_without_flags_uses_default() {
        let Wrapped::Compose(args) = parse(&["compose"]) else {
            panic!("expected compose");
        };
        assert_eq!(
            resolve_formats(&args.requested(), args.all),
            vec![OutputFormat::DEFAULT]
        );
    }

    #[test]
    fn transcribe_input_is_optional_at_parse_time() {
        let Wrapped::Transcribe(args) = parse(&["transcribe"]) else {
            panic!("expected transcribe");
        };
        assert_eq!(args.input, None);
    }

    #[test]
    fn edit_operations_parse_indexes() {
        let Wrapped::Edit(args) = parse(&["edit", "-f", "p.yml", "--json", "move", "1", "0"]) else {
            panic!("expected edit");
        };
        assert!(args.json);
        assert_eq!(args.operation, Some(EditOperation::Move { from: 1, to: 0 }));

        let Wrapped::Edit(args) = parse(&["edit", "-f", "p.yml", "delete-division", "0", "2"]) else {
            panic!("expected edit");
        };
        assert_eq!(
            args.operation,
            Some(EditOperation::DeleteDivision { task: 0, division: 2 })
        );
    }

    #[test]
    fn table_lists_every_task() {
        let entry = TimelineEntry {
            index: 1,
            title: "Egress".to_string(),
            start: "00:15:00".to_string(),
            duration: "00:03:00".to_string(),
            end: "00:18:00".to_string(),
            gap_before: "00:05:00".to_string(),
            divisions: 1,
        };
        let table = timeline_table(&[entry]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TITLE"));
        assert!(lines[1].ends_with("Egress"));
        assert!(lines[1].contains("00:05:00"));
    }
}
