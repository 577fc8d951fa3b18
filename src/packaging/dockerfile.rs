use crate::utils::error::{EchoError, Result};
use std::path::Path;

/// Image reference of a `FROM` line: `name[:tag][@digest]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    pub fn parse(reference: &str) -> Self {
        let (rest, digest) = match reference.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (reference, None),
        };

        // a ':' before the last '/' belongs to a registry port, not a tag
        let last_slash = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (name, tag) = match rest[last_slash..].rfind(':') {
            Some(i) => (
                rest[..last_slash + i].to_string(),
                Some(rest[last_slash + i + 1..].to_string()),
            ),
            None => (rest.to_string(), None),
        };

        Self { name, tag, digest }
    }

    pub fn is_pinned(&self) -> bool {
        self.digest
            .as_deref()
            .map(|d| d.starts_with("sha256:"))
            .unwrap_or(false)
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

/// `CMD`, `ENTRYPOINT` and `RUN` arguments in exec (`["a", "b"]`) or shell form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exec(Vec<String>),
    Shell(String),
}

impl Command {
    fn parse(args: &str) -> Self {
        let trimmed = args.trim();
        if trimmed.starts_with('[') {
            if let Ok(parts) = serde_json::from_str::<Vec<String>>(trimmed) {
                return Command::Exec(parts);
            }
        }
        Command::Shell(trimmed.to_string())
    }

    /// Individual words, with `sh -c "..."` style strings split as well.
    pub fn words(&self) -> Vec<String> {
        match self {
            Command::Exec(parts) => parts.iter().flat_map(|p| split_words(p)).collect(),
            Command::Shell(line) => split_words(line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposedPort {
    pub start: u16,
    pub end: u16,
}

impl ExposedPort {
    pub fn contains(&self, port: u16) -> bool {
        (self.start..=self.end).contains(&port)
    }
}

impl std::fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionKind {
    From {
        image: ImageRef,
        stage: Option<String>,
    },
    Workdir(String),
    /// `COPY` or `ADD`.
    Copy {
        sources: Vec<String>,
        destination: String,
        from_stage: Option<String>,
        is_add: bool,
    },
    Run(Command),
    Expose(Vec<ExposedPort>),
    Env(Vec<(String, String)>),
    Cmd(Command),
    Entrypoint(Command),
    Other {
        keyword: String,
        args: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// 1-based line where the instruction starts.
    pub line: usize,
    pub kind: InstructionKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dockerfile {
    pub instructions: Vec<Instruction>,
}

impl Dockerfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut pending: Option<(usize, String)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            // blank lines and comments never end a continuation
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }

            let (body, continues) = match trimmed.strip_suffix('\\') {
                Some(body) => (body.trim_end(), true),
                None => (trimmed, false),
            };

            let (start, mut text) = pending.take().unwrap_or((line_no, String::new()));
            if !text.is_empty() && !body.is_empty() {
                text.push(' ');
            }
            text.push_str(body);

            if continues {
                pending = Some((start, text));
            } else if !text.is_empty() {
                instructions.push(parse_instruction(start, &text)?);
            }
        }

        if let Some((start, text)) = pending {
            if !text.is_empty() {
                instructions.push(parse_instruction(start, &text)?);
            }
        }

        Ok(Self { instructions })
    }

    /// Instructions after the last `FROM`, i.e. the image that actually ships.
    pub fn final_stage(&self) -> &[Instruction] {
        let start = self
            .instructions
            .iter()
            .rposition(|i| matches!(i.kind, InstructionKind::From { .. }))
            .unwrap_or(0);
        &self.instructions[start..]
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.instructions
            .iter()
            .filter_map(|i| match &i.kind {
                InstructionKind::From {
                    stage: Some(stage), ..
                } => Some(stage.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn parse_instruction(line: usize, text: &str) -> Result<Instruction> {
    let (keyword, args) = match text.split_once(char::is_whitespace) {
        Some((keyword, args)) => (keyword, args.trim()),
        None => (text, ""),
    };
    let keyword = keyword.to_ascii_uppercase();

    let kind = match keyword.as_str() {
        "FROM" => parse_from(line, args)?,
        "WORKDIR" => InstructionKind::Workdir(args.to_string()),
        "COPY" | "ADD" => parse_copy(line, args, keyword == "ADD")?,
        "RUN" => InstructionKind::Run(Command::parse(args)),
        "CMD" => InstructionKind::Cmd(Command::parse(args)),
        "ENTRYPOINT" => InstructionKind::Entrypoint(Command::parse(args)),
        "EXPOSE" => InstructionKind::Expose(parse_expose(line, args)?),
        "ENV" => InstructionKind::Env(parse_env(line, args)?),
        _ => InstructionKind::Other {
            keyword,
            args: args.to_string(),
        },
    };

    Ok(Instruction { line, kind })
}

fn parse_error(line: usize, message: impl Into<String>) -> EchoError {
    EchoError::DockerfileParseError {
        line,
        message: message.into(),
    }
}

fn parse_from(line: usize, args: &str) -> Result<InstructionKind> {
    let words: Vec<&str> = args
        .split_whitespace()
        .filter(|w| !w.starts_with("--"))
        .collect();

    match words.as_slice() {
        [image] => Ok(InstructionKind::From {
            image: ImageRef::parse(image),
            stage: None,
        }),
        [image, as_kw, stage] if as_kw.eq_ignore_ascii_case("as") => Ok(InstructionKind::From {
            image: ImageRef::parse(image),
            stage: Some(stage.to_string()),
        }),
        _ => Err(parse_error(line, format!("malformed FROM '{}'", args))),
    }
}

fn parse_copy(line: usize, args: &str, is_add: bool) -> Result<InstructionKind> {
    let mut from_stage = None;
    let mut rest = args.trim();

    while rest.starts_with("--") {
        let (flag, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if let Some(stage) = flag.strip_prefix("--from=") {
            from_stage = Some(stage.to_string());
        }
        rest = tail.trim_start();
    }

    let mut paths = match Command::parse(rest) {
        Command::Exec(parts) => parts,
        Command::Shell(line) => split_words(&line),
    };

    if paths.len() < 2 {
        let keyword = if is_add { "ADD" } else { "COPY" };
        return Err(parse_error(
            line,
            format!("{} needs at least one source and a destination", keyword),
        ));
    }

    let destination = paths.pop().unwrap_or_default();
    Ok(InstructionKind::Copy {
        sources: paths,
        destination,
        from_stage,
        is_add,
    })
}

fn parse_expose(line: usize, args: &str) -> Result<Vec<ExposedPort>> {
    let mut ports = Vec::new();
    for word in args.split_whitespace() {
        let spec = word.split('/').next().unwrap_or(word);
        if spec.contains('$') {
            tracing::debug!("Skipping unresolved EXPOSE value '{}' on line {}", word, line);
            continue;
        }

        let parse_port = |s: &str| {
            s.parse::<u16>()
                .map_err(|_| parse_error(line, format!("invalid port '{}' in EXPOSE", word)))
        };
        let port = match spec.split_once('-') {
            Some((start, end)) => ExposedPort {
                start: parse_port(start)?,
                end: parse_port(end)?,
            },
            None => {
                let p = parse_port(spec)?;
                ExposedPort { start: p, end: p }
            }
        };
        ports.push(port);
    }
    Ok(ports)
}

fn parse_env(line: usize, args: &str) -> Result<Vec<(String, String)>> {
    let words = split_words(args);
    let first = words
        .first()
        .ok_or_else(|| parse_error(line, "ENV without a variable"))?;

    if first.contains('=') {
        words
            .iter()
            .map(|w| {
                w.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| parse_error(line, format!("expected KEY=VALUE, got '{}'", w)))
            })
            .collect()
    } else {
        // legacy `ENV KEY value with spaces`
        let value = args
            .trim()
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();
        Ok(vec![(first.clone(), value)])
    }
}

/// Splits on whitespace, honouring single and double quotes and backslash escapes.
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    in_word = true;
                }
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLASK_DOCKERFILE: &str = r#"# Use an official Python runtime as a parent image
FROM python:3.9-slim-buster

WORKDIR /app
COPY install/requirements.txt /app/install/requirements.txt
RUN pip install --no-cache-dir -r /app/install/requirements.txt
COPY . /app
EXPOSE 5000
ENV FLASK_APP=app.py
CMD ["flask", "run", "--host=0.0.0.0", "--port=8081"]
"#;

    #[test]
    fn test_parse_flask_dockerfile() {
        let dockerfile = Dockerfile::parse(FLASK_DOCKERFILE).unwrap();
        assert_eq!(dockerfile.instructions.len(), 8);

        assert_eq!(
            dockerfile.instructions[0].kind,
            InstructionKind::From {
                image: ImageRef {
                    name: "python".to_string(),
                    tag: Some("3.9-slim-buster".to_string()),
                    digest: None,
                },
                stage: None,
            }
        );
        assert_eq!(dockerfile.instructions[0].line, 2);
        assert_eq!(
            dockerfile.instructions[5].kind,
            InstructionKind::Expose(vec![ExposedPort {
                start: 5000,
                end: 5000
            }])
        );
        assert_eq!(
            dockerfile.instructions[6].kind,
            InstructionKind::Env(vec![("FLASK_APP".to_string(), "app.py".to_string())])
        );
        assert_eq!(
            dockerfile.instructions[7].kind,
            InstructionKind::Cmd(Command::Exec(vec![
                "flask".to_string(),
                "run".to_string(),
                "--host=0.0.0.0".to_string(),
                "--port=8081".to_string(),
            ]))
        );
    }

    #[test]
    fn test_continuations_and_case() {
        let content = "from alpine:3.20\nrun apk add \\\n    curl \\\n  # comment inside\n    jq\ncmd echo hi\n";
        let dockerfile = Dockerfile::parse(content).unwrap();
        assert_eq!(dockerfile.instructions.len(), 3);
        assert_eq!(
            dockerfile.instructions[1].kind,
            InstructionKind::Run(Command::Shell("apk add curl jq".to_string()))
        );
        assert_eq!(dockerfile.instructions[2].line, 6);

        let content = "FROM alpine\nCMD flask run \\\n\n    --port=8081\n";
        let dockerfile = Dockerfile::parse(content).unwrap();
        assert_eq!(dockerfile.instructions.len(), 2);
        assert_eq!(
            dockerfile.instructions[1].kind,
            InstructionKind::Cmd(Command::Shell("flask run --port=8081".to_string()))
        );
    }

    #[test]
    fn test_copy_flags_and_stages() {
        let content = "FROM rust:1.80 AS builder\nCOPY --chown=app:app src ./src\nFROM debian:bookworm-slim\nCOPY --from=builder /out/bin /usr/local/bin/bin\n";
        let dockerfile = Dockerfile::parse(content).unwrap();

        assert_eq!(dockerfile.stage_names(), vec!["builder"]);
        assert_eq!(dockerfile.final_stage().len(), 2);
        match &dockerfile.instructions[3].kind {
            InstructionKind::Copy {
                sources,
                from_stage,
                ..
            } => {
                assert_eq!(sources, &vec!["/out/bin".to_string()]);
                assert_eq!(from_stage.as_deref(), Some("builder"));
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[test]
    fn test_env_forms() {
        let dockerfile =
            Dockerfile::parse("ENV A=1 B=\"two words\"\nENV LEGACY value with spaces\n").unwrap();
        assert_eq!(
            dockerfile.instructions[0].kind,
            InstructionKind::Env(vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two words".to_string()),
            ])
        );
        assert_eq!(
            dockerfile.instructions[1].kind,
            InstructionKind::Env(vec![(
                "LEGACY".to_string(),
                "value with spaces".to_string()
            )])
        );

        let dockerfile = Dockerfile::parse("ENV \"KEY\" value\nENV \"ä\" x\n").unwrap();
        assert_eq!(
            dockerfile.instructions[0].kind,
            InstructionKind::Env(vec![("KEY".to_string(), "value".to_string())])
        );
        assert_eq!(
            dockerfile.instructions[1].kind,
            InstructionKind::Env(vec![("ä".to_string(), "x".to_string())])
        );
    }

    #[test]
    fn test_expose_ranges_and_errors() {
        let dockerfile = Dockerfile::parse("EXPOSE 8081/tcp 9000-9002 $PORT\n").unwrap();
        match &dockerfile.instructions[0].kind {
            InstructionKind::Expose(ports) => {
                assert_eq!(ports.len(), 2);
                assert!(ports[1].contains(9001));
                assert!(!ports[1].contains(9003));
            }
            other => panic!("unexpected instruction {:?}", other),
        }

        let err = Dockerfile::parse("FROM alpine\nEXPOSE http\n").unwrap_err();
        assert!(matches!(err, EchoError::DockerfileParseError { line: 2, .. }));
    }

    #[test]
    fn test_image_ref_parsing() {
        let with_registry = ImageRef::parse("localhost:5000/team/app:1.2@sha256:abc");
        assert_eq!(with_registry.name, "localhost:5000/team/app");
        assert_eq!(with_registry.tag.as_deref(), Some("1.2"));
        assert!(with_registry.is_pinned());

        let bare = ImageRef::parse("localhost:5000/app");
        assert_eq!(bare.name, "localhost:5000/app");
        assert!(bare.tag.is_none());
        assert!(!bare.is_pinned());
        assert_eq!(bare.to_string(), "localhost:5000/app");
    }

    #[test]
    fn test_split_words_quotes() {
        assert_eq!(
            split_words(r#"flask run --host="0.0.0.0" 'a b' c\ d"#),
            vec!["flask", "run", "--host=0.0.0.0", "a b", "c d"]
        );
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn test_shell_c_command_words() {
        let cmd = Command::parse(r#"["sh", "-c", "gunicorn --bind 0.0.0.0:8000 app:app"]"#);
        assert_eq!(
            cmd.words(),
            vec!["sh", "-c", "gunicorn", "--bind", "0.0.0.0:8000", "app:app"]
        );
    }
}
