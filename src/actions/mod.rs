use std::{
    env,
    fs::{File, OpenOptions},
    io::{self, Stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use tracing::debug;
use uuid::Uuid;

use crate::constants::{ENV_GITHUB_ENV, ENV_GITHUB_OUTPUT};

/// Pipeline channels a step publishes its results through.
pub trait OutputSink {
    /// Redact `value` from everything the runner echoes from now on.
    fn mask(&mut self, value: &str) -> Result<()>;

    /// Publish step outputs and, when `variables` is non-empty, environment
    /// variables visible to later steps of the same job.
    ///
    /// Every channel involved is checked before the first write, so an
    /// unusable channel leaves nothing published.
    fn publish(&mut self, outputs: &[(&str, &str)], variables: &[(&str, &str)]) -> Result<()>;
}

/// GitHub Actions runner channels.
///
/// Outputs and variables go to the `GITHUB_OUTPUT` / `GITHUB_ENV` files when
/// the runner provides them, and fall back to the legacy stdout workflow
/// commands otherwise. Masks are always stdout commands.
#[derive(Debug)]
pub struct GitHubActions<W: Write> {
    out: W,
    output_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

/// A channel opened and rendered, waiting for its single write.
enum Staged {
    File { file: File, path: PathBuf, payload: String },
    Stdout(String),
}

impl GitHubActions<Stdout> {
    pub fn from_env() -> Self {
        Self::new(
            io::stdout(),
            env::var_os(ENV_GITHUB_OUTPUT)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            env::var_os(ENV_GITHUB_ENV)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        )
    }
}

impl<W: Write> GitHubActions<W> {
    pub fn new(out: W, output_file: Option<PathBuf>, env_file: Option<PathBuf>) -> Self {
        Self {
            out,
            output_file,
            env_file,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn commit(&mut self, staged: Staged) -> Result<()> {
        match staged {
            Staged::File {
                mut file,
                path,
                payload,
            } => {
                file.write_all(payload.as_bytes())
                    .with_context(|| format!("Failed to write to {}", path.display()))?;
                debug!("Wrote {} bytes to {}", payload.len(), path.display());
            }
            Staged::Stdout(payload) => {
                self.out
                    .write_all(payload.as_bytes())
                    .context("Failed to write workflow command")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> OutputSink for GitHubActions<W> {
    fn mask(&mut self, value: &str) -> Result<()> {
        writeln!(self.out, "{}", command_line("add-mask", None, value))
            .context("Failed to write workflow command")?;
        Ok(())
    }

    fn publish(&mut self, outputs: &[(&str, &str)], variables: &[(&str, &str)]) -> Result<()> {
        let staged_outputs = stage(self.output_file.as_deref(), "set-output", outputs)?;
        let staged_variables = if variables.is_empty() {
            None
        } else {
            Some(stage(self.env_file.as_deref(), "set-env", variables)?)
        };

        self.commit(staged_outputs)?;
        if let Some(staged) = staged_variables {
            self.commit(staged)?;
        }
        Ok(())
    }
}

/// Workflow command reporting the step as failed.
pub fn error_command(message: &str) -> String {
    command_line("error", None, message)
}

fn stage(path: Option<&Path>, command: &str, entries: &[(&str, &str)]) -> Result<Staged> {
    match path {
        Some(path) => {
            let payload = entries
                .iter()
                .map(|&(name, value)| key_value_message(name, value))
                .collect::<Result<String>>()?;
            let file = OpenOptions::new()
                .append(true)
                .open(path)
                .with_context(|| format!("Missing file at path: {}", path.display()))?;
            Ok(Staged::File {
                file,
                path: path.to_path_buf(),
                payload,
            })
        }
        None => Ok(Staged::Stdout(
            entries
                .iter()
                .map(|&(name, value)| command_line(command, Some(("name", name)), value) + "\n")
                .collect(),
        )),
    }
}

fn command_line(command: &str, property: Option<(&str, &str)>, data: &str) -> String {
    match property {
        Some((key, value)) => format!(
            "::{command} {key}={}::{}",
            escape_property(value),
            escape_data(data)
        ),
        None => format!("::{command}::{}", escape_data(data)),
    }
}

// Heredoc-style entry; the random delimiter keeps multi-line values intact.
fn key_value_message(name: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());

    if name.contains(&delimiter) {
        bail!("Unexpected input: name should not contain the delimiter \"{delimiter}\"");
    }
    if value.contains(&delimiter) {
        bail!("Unexpected input: value should not contain the delimiter \"{delimiter}\"");
    }

    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    const OUTPUTS: [(&str, &str); 2] = [
        ("aws-access-key-id", "ASIAEXAMPLEKEY"),
        ("expiration", "2026-10-15T13:00:00Z"),
    ];
    const VARIABLES: [(&str, &str); 1] = [("AWS_SESSION_TOKEN", "FwoGZXIvYXdzEtoken")];

    fn stdout_only() -> GitHubActions<Vec<u8>> {
        GitHubActions::new(Vec::new(), None, None)
    }

    fn written(actions: GitHubActions<Vec<u8>>) -> String {
        String::from_utf8(actions.into_inner()).unwrap()
    }

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Parses `name<<delim\nvalue\ndelim\n` entries back out of a file command.
    fn parse_file_commands(content: &str) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        let mut lines = content.lines();
        while let Some(header) = lines.next() {
            let (name, delimiter) = header.split_once("<<").unwrap();
            let mut value = Vec::new();
            for line in lines.by_ref() {
                if line == delimiter {
                    break;
                }
                value.push(line);
            }
            entries.push((name.to_string(), value.join("\n")));
        }
        entries
    }

    #[test]
    fn test_mask_command() {
        let mut actions = stdout_only();
        actions.mask("s3cr3t").unwrap();
        assert_eq!(written(actions), "::add-mask::s3cr3t\n");
    }

    #[test]
    fn test_mask_escapes_newlines() {
        let mut actions = stdout_only();
        actions.mask("line1\nline2\r%").unwrap();
        assert_eq!(written(actions), "::add-mask::line1%0Aline2%0D%25\n");
    }

    #[test]
    fn test_legacy_commands() {
        let mut actions = stdout_only();
        actions.publish(&OUTPUTS, &VARIABLES).unwrap();
        assert_eq!(
            written(actions),
            "::set-output name=aws-access-key-id::ASIAEXAMPLEKEY\n\
             ::set-output name=expiration::2026-10-15T13:00:00Z\n\
             ::set-env name=AWS_SESSION_TOKEN::FwoGZXIvYXdzEtoken\n"
        );
    }

    #[test]
    fn test_legacy_set_env_escapes_property() {
        let mut actions = stdout_only();
        actions.publish(&[], &[("A:B,C", "v")]).unwrap();
        assert_eq!(written(actions), "::set-env name=A%3AB%2CC::v\n");
    }

    #[test]
    fn test_output_file_appends() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "existing<<EOF\nkeep\nEOF\n").unwrap();

        let mut actions =
            GitHubActions::new(Vec::new(), Some(file.path().to_path_buf()), None);
        actions
            .publish(&[("aws-access-key-id", "ASIAEXAMPLEKEY"), ("multi", "a\nb")], &[])
            .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            parse_file_commands(&content),
            vec![
                ("existing".to_string(), "keep".to_string()),
                ("aws-access-key-id".to_string(), "ASIAEXAMPLEKEY".to_string()),
                ("multi".to_string(), "a\nb".to_string()),
            ]
        );
        assert!(written(actions).is_empty());
    }

    #[test]
    fn test_output_and_env_files() {
        let output = NamedTempFile::new().unwrap();
        let env = NamedTempFile::new().unwrap();

        let mut actions = GitHubActions::new(
            Vec::new(),
            Some(output.path().to_path_buf()),
            Some(env.path().to_path_buf()),
        );
        actions.publish(&OUTPUTS, &VARIABLES).unwrap();

        let env_content = fs::read_to_string(env.path()).unwrap();
        assert!(env_content.starts_with("AWS_SESSION_TOKEN<<ghadelimiter_"));
        assert_eq!(parse_file_commands(&env_content), pairs(&VARIABLES));
        assert_eq!(
            parse_file_commands(&fs::read_to_string(output.path()).unwrap()),
            pairs(&OUTPUTS)
        );
    }

    #[test]
    fn test_missing_env_file_writes_no_outputs() {
        let output = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut actions = GitHubActions::new(
            Vec::new(),
            Some(output.path().to_path_buf()),
            Some(dir.path().join("does-not-exist")),
        );
        let err = actions.publish(&OUTPUTS, &VARIABLES).unwrap_err();

        assert!(err.to_string().starts_with("Missing file at path"));
        assert_eq!(fs::read_to_string(output.path()).unwrap(), "");
    }

    #[test]
    fn test_missing_env_file_writes_no_legacy_outputs() {
        let dir = tempfile::tempdir().unwrap();

        let mut actions =
            GitHubActions::new(Vec::new(), None, Some(dir.path().join("does-not-exist")));
        assert!(actions.publish(&OUTPUTS, &VARIABLES).is_err());
        assert!(written(actions).is_empty());
    }

    #[test]
    fn test_missing_output_file_writes_no_variables() {
        let env = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut actions = GitHubActions::new(
            Vec::new(),
            Some(dir.path().join("does-not-exist")),
            Some(env.path().to_path_buf()),
        );
        let err = actions.publish(&OUTPUTS, &VARIABLES).unwrap_err();

        assert!(err.to_string().starts_with("Missing file at path"));
        assert_eq!(fs::read_to_string(env.path()).unwrap(), "");
    }

    #[test]
    fn test_env_file_unused_without_variables() {
        let output = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let mut actions = GitHubActions::new(
            Vec::new(),
            Some(output.path().to_path_buf()),
            Some(dir.path().join("does-not-exist")),
        );
        actions.publish(&OUTPUTS, &[]).unwrap();

        assert_eq!(
            parse_file_commands(&fs::read_to_string(output.path()).unwrap()),
            pairs(&OUTPUTS)
        );
    }

    #[test]
    fn test_error_command() {
        assert_eq!(
            error_command("Failed to assume role\nAccessDenied"),
            "::error::Failed to assume role%0AAccessDenied"
        );
    }
}
