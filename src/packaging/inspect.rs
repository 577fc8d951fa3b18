use crate::packaging::dockerfile::{Dockerfile, ExposedPort, Instruction, InstructionKind};
use crate::utils::error::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    MissingCopySource,
    PortMismatch,
    NoExposedPort,
    MissingEntryPoint,
    UnpinnedBaseImage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", level, line, self.message),
            None => write!(f, "{}: {}", level, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Environment variables whose value names the entry-point file.
    pub entrypoint_vars: Vec<String>,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            entrypoint_vars: vec!["FLASK_APP".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectionReport {
    pub findings: Vec<Finding>,
    /// Ports the start command binds.
    pub bound_ports: Vec<u16>,
    /// `EXPOSE`d ports of the final stage, ranges rendered as `a-b`.
    pub exposed_ports: Vec<String>,
}

impl InspectionReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn of_kind(&self, kind: FindingKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.kind == kind)
    }

    fn push(&mut self, kind: FindingKind, severity: Severity, line: Option<usize>, message: String) {
        self.findings.push(Finding {
            kind,
            severity,
            line,
            message,
        });
    }
}

/// Reads `dockerfile_path` and inspects it against `context_dir`.
pub fn inspect_path<P: AsRef<Path>, Q: AsRef<Path>>(
    dockerfile_path: P,
    context_dir: Q,
    options: &InspectOptions,
) -> Result<InspectionReport> {
    let dockerfile = Dockerfile::from_file(dockerfile_path)?;
    Ok(inspect(&dockerfile, context_dir.as_ref(), options))
}

pub fn inspect(dockerfile: &Dockerfile, context_dir: &Path, options: &InspectOptions) -> InspectionReport {
    let mut report = InspectionReport::default();

    check_copy_sources(dockerfile, context_dir, &mut report);
    check_ports(dockerfile, &mut report);
    check_entry_points(dockerfile, context_dir, options, &mut report);
    check_base_images(dockerfile, &mut report);

    tracing::debug!(
        "Inspected {} instructions: {} errors, {} warnings",
        dockerfile.instructions.len(),
        report.count(Severity::Error),
        report.count(Severity::Warning)
    );
    report
}

/// Context-relative path of a `COPY`/`ADD` source, or `None` when it cannot be
/// checked statically (URLs, globs, variables).
fn context_source(source: &str) -> Option<PathBuf> {
    let is_remote = source.contains("://") || source.starts_with("git@");
    let is_dynamic = source.contains(['*', '?', '[', '$']);
    if is_remote || is_dynamic {
        return None;
    }

    let relative = source.trim_start_matches('/');
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    Some(PathBuf::from(if relative.is_empty() { "." } else { relative }))
}

fn check_copy_sources(dockerfile: &Dockerfile, context_dir: &Path, report: &mut InspectionReport) {
    for instruction in &dockerfile.instructions {
        let InstructionKind::Copy {
            sources,
            from_stage: None,
            is_add,
            ..
        } = &instruction.kind
        else {
            continue;
        };

        for source in sources {
            let Some(relative) = context_source(source) else {
                continue;
            };
            if !context_dir.join(&relative).exists() {
                let keyword = if *is_add { "ADD" } else { "COPY" };
                report.push(
                    FindingKind::MissingCopySource,
                    Severity::Error,
                    Some(instruction.line),
                    format!(
                        "{} source '{}' does not exist in the build context",
                        keyword, source
                    ),
                );
            }
        }
    }
}

/// Port named by a `--bind`/`-b` value such as `0.0.0.0:8000` or `:8000`.
fn bind_port(value: &str) -> Option<u16> {
    value.rsplit_once(':').and_then(|(_, port)| port.parse().ok())
}

/// Ports bound by the words of a start command.
pub fn bound_ports(words: &[String]) -> Vec<u16> {
    let mut ports = Vec::new();
    let mut iter = words.iter();

    while let Some(word) = iter.next() {
        let port = if let Some(value) = word.strip_prefix("--port=") {
            value.parse().ok()
        } else if let Some(value) = word.strip_prefix("--bind=") {
            bind_port(value)
        } else {
            match word.as_str() {
                "--port" | "-p" => iter.next().and_then(|v| v.parse().ok()),
                "--bind" | "-b" => iter.next().and_then(|v| bind_port(v)),
                _ => None,
            }
        };
        if let Some(port) = port {
            if !ports.contains(&port) {
                ports.push(port);
            }
        }
    }
    ports
}

fn last_start_commands(stage: &[Instruction]) -> (Vec<String>, Option<usize>) {
    let mut entrypoint = None;
    let mut cmd = None;
    for instruction in stage {
        match &instruction.kind {
            InstructionKind::Entrypoint(c) => entrypoint = Some((c.words(), instruction.line)),
            InstructionKind::Cmd(c) => cmd = Some((c.words(), instruction.line)),
            _ => {}
        }
    }

    let line = cmd.as_ref().or(entrypoint.as_ref()).map(|(_, l)| *l);
    let words = entrypoint
        .into_iter()
        .chain(cmd)
        .flat_map(|(w, _)| w)
        .collect();
    (words, line)
}

fn check_ports(dockerfile: &Dockerfile, report: &mut InspectionReport) {
    let stage = dockerfile.final_stage();

    let exposed: Vec<ExposedPort> = stage
        .iter()
        .filter_map(|i| match &i.kind {
            InstructionKind::Expose(ports) => Some(ports.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    let expose_line = stage
        .iter()
        .find(|i| matches!(i.kind, InstructionKind::Expose(_)))
        .map(|i| i.line);

    let (words, cmd_line) = last_start_commands(stage);
    let bound = bound_ports(&words);

    report.exposed_ports = exposed.iter().map(|p| p.to_string()).collect();
    report.bound_ports = bound.clone();

    if bound.is_empty() {
        return;
    }

    if exposed.is_empty() {
        report.push(
            FindingKind::NoExposedPort,
            Severity::Warning,
            cmd_line,
            format!(
                "start command binds port {} but no port is exposed",
                join_ports(&bound)
            ),
        );
        return;
    }

    let exposed_list = report.exposed_ports.join(", ");
    for port in bound {
        if !exposed.iter().any(|e| e.contains(port)) {
            report.push(
                FindingKind::PortMismatch,
                Severity::Error,
                cmd_line.or(expose_line),
                format!(
                    "start command binds port {} but the image exposes {}",
                    port, exposed_list
                ),
            );
        }
    }
}

fn join_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Files an entry-point value may refer to: `app.py`, `app`, `pkg.mod`,
/// each optionally suffixed with `:callable`.
fn entry_point_candidates(value: &str) -> Vec<PathBuf> {
    let module = value.split(':').next().unwrap_or(value).trim();
    if module.is_empty() {
        return Vec::new();
    }

    let mut candidates = vec![PathBuf::from(module)];
    if !module.ends_with(".py") {
        let as_path = module.replace('.', "/");
        candidates.push(PathBuf::from(format!("{}.py", as_path)));
        candidates.push(PathBuf::from(as_path).join("__init__.py"));
    }
    candidates
}

fn check_entry_points(
    dockerfile: &Dockerfile,
    context_dir: &Path,
    options: &InspectOptions,
    report: &mut InspectionReport,
) {
    // files may land in the image from the context root or from a copied directory
    let mut roots = vec![context_dir.to_path_buf()];
    for instruction in &dockerfile.instructions {
        if let InstructionKind::Copy {
            sources,
            from_stage: None,
            ..
        } = &instruction.kind
        {
            for relative in sources.iter().filter_map(|s| context_source(s)) {
                let dir = context_dir.join(relative);
                if dir.is_dir() && !roots.contains(&dir) {
                    roots.push(dir);
                }
            }
        }
    }

    for var in &options.entrypoint_vars {
        let found = dockerfile.final_stage().iter().rev().find_map(|i| match &i.kind {
            InstructionKind::Env(pairs) => pairs
                .iter()
                .rev()
                .find(|(k, _)| k == var)
                .map(|(_, v)| (v.clone(), i.line)),
            _ => None,
        });
        let Some((value, line)) = found else {
            continue;
        };

        let candidates = entry_point_candidates(&value);
        let exists = candidates
            .iter()
            .any(|c| roots.iter().any(|root| root.join(c).is_file()));
        if !exists {
            report.push(
                FindingKind::MissingEntryPoint,
                Severity::Error,
                Some(line),
                format!(
                    "{}={} does not name a file in the build context",
                    var, value
                ),
            );
        }
    }
}

fn check_base_images(dockerfile: &Dockerfile, report: &mut InspectionReport) {
    let mut stages: Vec<&str> = Vec::new();

    for instruction in &dockerfile.instructions {
        let InstructionKind::From { image, stage } = &instruction.kind else {
            continue;
        };

        let is_stage_ref = stages.contains(&image.name.as_str());
        if let Some(stage) = stage {
            stages.push(stage.as_str());
        }
        if is_stage_ref || image.name == "scratch" || image.is_pinned() {
            continue;
        }

        let detail = match image.tag.as_deref() {
            None | Some("latest") => "uses a floating tag",
            Some(_) => "is not pinned to a digest",
        };
        report.push(
            FindingKind::UnpinnedBaseImage,
            Severity::Warning,
            Some(instruction.line),
            format!(
                "base image '{}' {}; rebuilds may drift with upstream",
                image, detail
            ),
        );
    }
}
