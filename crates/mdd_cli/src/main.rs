//! `mdd` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, initialize logging, run one load → mutate → write cycle.
//! - Map every failure to a logged error and exit code 1.

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use log::{error, info};
use mdd_core::{
    find_root, list_documents, verify, BuiltinTemplates, DocumentService, MutationReport,
    Project, ProjectError, TemplateView,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliResult = Result<ExitCode, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = mdd_core::init_logging(&cli.log_level, cli.log_dir.as_deref()) {
        // Without a logger every later report would be dropped.
        eprintln!("mdd: cannot initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            error!("event=command module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> CliResult {
    match command {
        Command::Init { output, project } => init(output, project),
        Command::Templates => {
            let project = open_project()?;
            for template in &project.templates {
                let view = TemplateView::from_template(template);
                println!("{:<12} {}", view.shortcut, view.title);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::New { shortcut, title } => {
            let mut project = open_project()?;
            let name = DocumentService::new(&mut project).new_document(&shortcut, &title.join(" "))?;
            println!("{}", project.document_path.join(name).display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Tag { document, tag } => mutate(|s| s.tag(&document, &tag)),
        Command::Untag { document, tag } => mutate(|s| s.untag(&document, &tag)),
        Command::Link { parent, child } => mutate(|s| s.link(&parent, &child)),
        Command::Unlink { parent, child } => mutate(|s| s.unlink(&parent, &child)),
        Command::Tags => {
            for tag in open_project()?.tags() {
                println!("{tag}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ls { tag } => {
            let project = open_project()?;
            for view in list_documents(&project, tag.as_deref()) {
                let tags = if view.tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", view.tags.join(", "))
                };
                println!("{}  {}{}", view.filename, view.title, tags);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify => verify_project(),
    }
}

fn init(output: Option<PathBuf>, name: Option<String>) -> CliResult {
    let dir = match output {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let name = match name {
        Some(name) => name,
        None => directory_name(&dir),
    };
    let project = Project::create(&dir, &name, &BuiltinTemplates)?;
    println!(
        "created project '{}' at {} with {} templates",
        name,
        project.home_path.display(),
        project.templates.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn mutate<F>(op: F) -> CliResult
where
    F: FnOnce(&mut DocumentService<'_>) -> mdd_core::ServiceResult<MutationReport>,
{
    let mut project = open_project()?;
    let report = op(&mut DocumentService::new(&mut project))?;
    if report.changed && !report.saved {
        error!(
            "event=command module=cli status=error document={} reason=no_metadata_block",
            report.document
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Outcome of `mdd verify`: the lines to report and whether the project passed.
#[derive(Debug)]
struct VerifyReport {
    lines: Vec<String>,
    passed: bool,
}

/// Strict load first so file problems surface, then verify what loads.
fn verify_at(home: &Path) -> Result<VerifyReport, ProjectError> {
    let (project, strict_err) = Project::load_with_fallback(home)?;
    let errors = verify(&project);
    let passed = errors.is_empty() && strict_err.is_none();

    let mut lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    lines.push(format!(
        "event=verify module=cli status={} documents={} integrity_errors={} load_failed={}",
        if passed { "ok" } else { "error" },
        project.documents.len(),
        errors.len(),
        strict_err.is_some()
    ));
    Ok(VerifyReport { lines, passed })
}

fn verify_project() -> CliResult {
    let report = verify_at(&project_home()?)?;
    for line in &report.lines {
        if report.passed {
            info!("{line}");
        } else {
            error!("{line}");
        }
    }
    Ok(if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn open_project() -> Result<Project, ProjectError> {
    Project::discover(true)
}

fn project_home() -> Result<PathBuf, Box<dyn Error>> {
    let cwd = std::env::current_dir()?;
    find_root(&cwd).ok_or_else(|| ProjectError::NotFound(cwd).into())
}

fn directory_name(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mdd".to_string())
}
