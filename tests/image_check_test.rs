use echo_server::packaging::{
    inspect, inspect_path, Dockerfile, FindingKind, InspectOptions, Severity,
};
use std::path::Path;
use tempfile::TempDir;

const FLASK_DOCKERFILE: &str = r#"# Use an official Python runtime as a parent image
FROM python:3.9-slim-buster

# Set the working directory in the container
WORKDIR /app

COPY install/requirements.txt /app/install/requirements.txt
RUN pip install --no-cache-dir -r /app/install/requirements.txt

COPY . /app

EXPOSE 5000

ENV FLASK_APP=app.py

CMD ["flask", "run", "--host=0.0.0.0", "--port=8081"]
"#;

fn flask_context(with_requirements: bool, with_app: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    if with_requirements {
        std::fs::create_dir_all(dir.path().join("install")).unwrap();
        std::fs::write(dir.path().join("install/requirements.txt"), "flask\n").unwrap();
    }
    if with_app {
        std::fs::write(dir.path().join("app.py"), "app = None\n").unwrap();
    }
    dir
}

#[test]
fn test_flask_image_port_mismatch_is_flagged() {
    let context = flask_context(true, true);
    let dockerfile = Dockerfile::parse(FLASK_DOCKERFILE).unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    assert!(report.has_errors());
    assert_eq!(report.bound_ports, vec![8081]);
    assert_eq!(report.exposed_ports, vec!["5000"]);

    let mismatches: Vec<_> = report.of_kind(FindingKind::PortMismatch).collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].severity, Severity::Error);
    assert_eq!(mismatches[0].line, Some(16));
    assert!(mismatches[0].message.contains("8081"));
    assert!(mismatches[0].message.contains("5000"));

    // nothing else is wrong with this context
    assert_eq!(report.count(Severity::Error), 1);
    assert_eq!(report.of_kind(FindingKind::UnpinnedBaseImage).count(), 1);
}

#[test]
fn test_aligned_ports_pass() {
    let context = flask_context(true, true);
    let fixed = FLASK_DOCKERFILE.replace("EXPOSE 5000", "EXPOSE 8081");
    let report = inspect(
        &Dockerfile::parse(&fixed).unwrap(),
        context.path(),
        &InspectOptions::default(),
    );

    assert!(!report.has_errors());
    assert_eq!(report.of_kind(FindingKind::PortMismatch).count(), 0);
}

#[test]
fn test_missing_requirements_manifest() {
    let context = flask_context(false, true);
    let report = inspect(
        &Dockerfile::parse(FLASK_DOCKERFILE).unwrap(),
        context.path(),
        &InspectOptions::default(),
    );

    let missing: Vec<_> = report.of_kind(FindingKind::MissingCopySource).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].line, Some(7));
    assert!(missing[0].message.contains("install/requirements.txt"));
}

#[test]
fn test_missing_entry_point_module() {
    let context = flask_context(true, false);
    let report = inspect(
        &Dockerfile::parse(FLASK_DOCKERFILE).unwrap(),
        context.path(),
        &InspectOptions::default(),
    );

    let missing: Vec<_> = report.of_kind(FindingKind::MissingEntryPoint).collect();
    assert_eq!(missing.len(), 1);
    assert!(missing[0].message.contains("FLASK_APP=app.py"));
}

#[test]
fn test_entry_point_inside_copied_directory() {
    let context = TempDir::new().unwrap();
    std::fs::create_dir_all(context.path().join("service/web")).unwrap();
    std::fs::write(context.path().join("service/web/__init__.py"), "").unwrap();

    let dockerfile = Dockerfile::parse(
        "FROM python:3.12@sha256:0123\nCOPY service /app\nENV FLASK_APP=web:create_app\n",
    )
    .unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    assert!(report.findings.is_empty(), "{:?}", report.findings);
}

#[test]
fn test_bound_port_without_expose_is_a_warning() {
    let context = TempDir::new().unwrap();
    let dockerfile = Dockerfile::parse(
        "FROM python:3.12\nCMD gunicorn --bind 0.0.0.0:8000 app:app\n",
    )
    .unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    assert!(!report.has_errors());
    assert_eq!(report.of_kind(FindingKind::NoExposedPort).count(), 1);
    assert_eq!(report.bound_ports, vec![8000]);
}

#[test]
fn test_add_with_missing_source() {
    let context = TempDir::new().unwrap();
    let dockerfile = Dockerfile::parse(
        "FROM python:3.12@sha256:0123\nADD vendor.tar.gz /opt/\nADD https://example.com/x.tar.gz /opt/\n",
    )
    .unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    let missing: Vec<_> = report.of_kind(FindingKind::MissingCopySource).collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].line, Some(2));
    assert!(missing[0].message.starts_with("ADD source 'vendor.tar.gz'"));
}

#[test]
fn test_entrypoint_and_cmd_ports_combine() {
    let context = TempDir::new().unwrap();
    let dockerfile = Dockerfile::parse(
        "FROM python:3.12@sha256:0123\nEXPOSE 9000\nENTRYPOINT [\"gunicorn\", \"app:app\"]\nCMD [\"--bind\", \"0.0.0.0:8000\"]\n",
    )
    .unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    assert_eq!(report.bound_ports, vec![8000]);
    let mismatches: Vec<_> = report.of_kind(FindingKind::PortMismatch).collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].line, Some(4));
}

#[test]
fn test_floating_base_image_tags() {
    let context = TempDir::new().unwrap();
    let dockerfile = Dockerfile::parse(
        "FROM python:latest AS builder\nFROM builder\nFROM alpine\nFROM scratch\nFROM debian:bookworm-slim\n",
    )
    .unwrap();
    let report = inspect(&dockerfile, context.path(), &InspectOptions::default());

    let unpinned: Vec<_> = report.of_kind(FindingKind::UnpinnedBaseImage).collect();
    let lines: Vec<_> = unpinned.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![Some(1), Some(3), Some(5)]);
    assert!(unpinned[0].message.contains("floating tag"));
    assert!(unpinned[1].message.contains("floating tag"));
    assert!(unpinned[2].message.contains("not pinned to a digest"));
    assert!(unpinned.iter().all(|f| f.severity == Severity::Warning));
}

#[test]
fn test_inspection_is_repeatable() {
    let context = flask_context(true, true);
    let dockerfile = Dockerfile::parse(FLASK_DOCKERFILE).unwrap();
    let options = InspectOptions::default();

    let first = inspect(&dockerfile, context.path(), &options);
    let second = inspect(&dockerfile, context.path(), &options);
    assert_eq!(first, second);
}

#[test]
fn test_shipped_dockerfile_is_consistent() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let report = inspect_path(root.join("Dockerfile"), root, &InspectOptions::default()).unwrap();

    assert!(!report.has_errors(), "{:?}", report.findings);
    assert_eq!(report.bound_ports, vec![8081]);
    assert_eq!(report.exposed_ports, vec!["8081"]);
}

#[test]
fn test_missing_dockerfile_is_an_error() {
    let context = TempDir::new().unwrap();
    let result = inspect_path(
        context.path().join("Dockerfile"),
        context.path(),
        &InspectOptions::default(),
    );
    assert!(result.is_err());
}
