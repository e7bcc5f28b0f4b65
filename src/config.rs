//! Resolves the importer's configuration from, in order of precedence,
//! command-line overrides, an optional `wpimport.yaml` project file, the
//! local git configuration (for the committer identity), and defaults.

use crate::encode::Encoding;
use crate::fastimport::Committer;
use crate::util::open;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// The project file searched for in the working directory and its parents.
pub const PROJECT_FILE: &str = "wpimport.yaml";

/// Settings read from a project file. Every field is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub posts_dir: Option<String>,
    pub pages_dir: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub redirects_file: Option<String>,
    pub ascii: Option<bool>,
}

impl Project {
    /// Loads the project file at `path`. A relative `uploads_dir` is taken
    /// relative to the file's directory.
    pub fn from_file(path: &Path) -> Result<Project> {
        let mut project: Project = serde_yaml::from_reader(open(path, "project")?)
            .with_context(|| format!("Loading configuration `{}`", path.display()))?;
        if let (Some(uploads), Some(dir)) = (&project.uploads_dir, path.parent()) {
            if uploads.is_relative() {
                project.uploads_dir = Some(dir.join(uploads));
            }
        }
        Ok(project)
    }

    /// Searches `dir` and its ancestors for [`PROJECT_FILE`].
    pub fn find(dir: &Path) -> Result<Option<Project>> {
        for candidate in dir.ancestors().map(|d| d.join(PROJECT_FILE)) {
            if candidate.is_file() {
                return Project::from_file(&candidate).map(Some);
            }
        }
        Ok(None)
    }
}

/// Settings given on the command line; `None` defers to the lower layers.
#[derive(Debug, Default)]
pub struct Overrides {
    pub name: Option<String>,
    pub email: Option<String>,
    pub branch: Option<String>,
    pub posts_dir: Option<String>,
    pub pages_dir: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub redirects_file: Option<String>,
    pub ascii: bool,
    pub config: Option<PathBuf>,
}

/// The resolved configuration of an import run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub committer: Committer,
    pub branch: String,

    /// Directory for top-level posts (and parentless attachments).
    pub posts_dir: String,

    /// Directory for top-level pages.
    pub pages_dir: String,

    /// Where attachment bytes are read from. Without it attachments are
    /// committed empty.
    pub uploads_dir: Option<PathBuf>,

    /// Path of the redirect ledger file.
    pub redirects_file: String,

    pub encoding: Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            committer: Committer {
                name: String::new(),
                email: String::new(),
            },
            branch: String::from("master"),
            posts_dir: String::from("posts"),
            pages_dir: String::from("pages"),
            uploads_dir: None,
            redirects_file: String::from("redirects.txt"),
            encoding: Encoding::Utf8,
        }
    }
}

impl Config {
    /// Loads the configuration for `overrides`, reading the project file
    /// named by `overrides.config` or else the nearest [`PROJECT_FILE`], and
    /// asking git for a missing committer identity.
    pub fn load(overrides: Overrides) -> Result<Config> {
        let project = match &overrides.config {
            Some(path) => Some(Project::from_file(path)?),
            None => Project::find(&std::env::current_dir()?)?,
        };
        Config::layered(overrides, project.unwrap_or_default(), git_config)
    }

    /// Merges the layers. `git` looks up a git configuration key.
    pub fn layered<G>(overrides: Overrides, project: Project, git: G) -> Result<Config>
    where
        G: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let name = overrides
            .name
            .or(project.name)
            .or_else(|| git("user.name"))
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| anyhow!("A committer name is required (--name or git user.name)"))?;
        let email = overrides
            .email
            .or(project.email)
            .or_else(|| git("user.email"))
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| anyhow!("A committer email is required (--email or git user.email)"))?;

        Ok(Config {
            committer: Committer { name, email },
            branch: overrides
                .branch
                .or(project.branch)
                .unwrap_or(defaults.branch),
            posts_dir: overrides
                .posts_dir
                .or(project.posts_dir)
                .unwrap_or(defaults.posts_dir),
            pages_dir: overrides
                .pages_dir
                .or(project.pages_dir)
                .unwrap_or(defaults.pages_dir),
            uploads_dir: overrides.uploads_dir.or(project.uploads_dir),
            redirects_file: overrides
                .redirects_file
                .or(project.redirects_file)
                .unwrap_or(defaults.redirects_file),
            encoding: if overrides.ascii || project.ascii.unwrap_or(false) {
                Encoding::Ascii
            } else {
                Encoding::Utf8
            },
        })
    }
}

/// Reads `git config --get <key>`, treating any failure as unset.
fn git_config(key: &str) -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", key])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?.trim().to_owned();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn no_git(_: &str) -> Option<String> {
        None
    }

    fn identity() -> Overrides {
        Overrides {
            name: Some(String::from("Jane")),
            email: Some(String::from("jane@example.com")),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Config::layered(identity(), Project::default(), no_git)?;
        assert_eq!("master", config.branch);
        assert_eq!("posts", config.posts_dir);
        assert_eq!("pages", config.pages_dir);
        assert_eq!(None, config.uploads_dir);
        assert_eq!("redirects.txt", config.redirects_file);
        assert_eq!(Encoding::Utf8, config.encoding);
        Ok(())
    }

    #[test]
    fn test_overrides_beat_project() -> Result<()> {
        let mut overrides = identity();
        overrides.branch = Some(String::from("import"));
        let project = Project {
            name: Some(String::from("Project Name")),
            branch: Some(String::from("wordpress")),
            pages_dir: Some(String::from("site")),
            ascii: Some(true),
            ..Project::default()
        };
        let config = Config::layered(overrides, project, no_git)?;
        assert_eq!("Jane", config.committer.name);
        assert_eq!("import", config.branch);
        assert_eq!("site", config.pages_dir);
        assert_eq!(Encoding::Ascii, config.encoding);
        Ok(())
    }

    #[test]
    fn test_identity_from_git() -> Result<()> {
        let git = |key: &str| match key {
            "user.name" => Some(String::from("Git User")),
            "user.email" => Some(String::from("git@example.com")),
            _ => None,
        };
        let config = Config::layered(Overrides::default(), Project::default(), git)?;
        assert_eq!(
            Committer {
                name: String::from("Git User"),
                email: String::from("git@example.com"),
            },
            config.committer
        );
        Ok(())
    }

    #[test]
    fn test_missing_identity_is_fatal() {
        let overrides = Overrides {
            name: Some(String::from("Jane")),
            ..Overrides::default()
        };
        assert!(Config::layered(overrides, Project::default(), no_git).is_err());
        let overrides = Overrides {
            name: Some(String::from(" ")),
            email: Some(String::from("jane@example.com")),
            ..Overrides::default()
        };
        assert!(Config::layered(overrides, Project::default(), no_git).is_err());
    }

    #[test]
    fn test_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        let mut file = std::fs::File::create(&path)?;
        writeln!(file, "email: jane@example.com\nuploads_dir: uploads\nascii: true")?;
        drop(file);

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested)?;
        let project = Project::find(&nested)?.unwrap();
        assert_eq!(Some(String::from("jane@example.com")), project.email);
        assert_eq!(Some(dir.path().join("uploads")), project.uploads_dir);
        assert_eq!(Some(true), project.ascii);
        Ok(())
    }

    #[test]
    fn test_unknown_project_key() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        std::fs::write(&path, "colour: blue\n")?;
        assert!(Project::from_file(&path).is_err());
        Ok(())
    }
}
