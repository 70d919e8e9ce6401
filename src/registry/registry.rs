use compio::{fs::File, io::AsyncReadExt, io::BufReader};
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use std::{
    borrow::Cow,
    collections::HashMap,
    io::Cursor,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const PROJECTS_FILE_NAME: &str = "projects.yml";

fn get_projects_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(PROJECTS_FILE_NAME)
}

/// One known project: an opaque id resolving to a root folder on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub description: Option<String>,
}

/// Read-only view of the project registry the desktop app persists as a
/// YAML list in its config directory. Writing the file is owned elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: HashMap<String, ProjectEntry>,
}

impl ProjectRegistry {
    pub async fn read(config_dir: &Path) -> Result<Self, RegistryError> {
        Self::from_path(get_projects_file_path(config_dir)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, RegistryError> {
        debug!("Opening project registry: {}", path.display());
        let file = File::open(&path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;

        let cursor = Cursor::new(file);
        let mut reader = BufReader::new(cursor);
        let res = reader.read_to_string(String::new()).await;
        match res.0 {
            Ok(n) => debug!("Read project registry: {n} bytes"),
            _ => {
                res.0.context(ReadSnafu {
                    file_path: path.display().to_string(),
                })?;
            }
        }
        res.1.as_str().try_into()
    }

    /// Builds a registry without touching the filesystem. Used by the CLI
    /// for ad-hoc single-folder sessions and by tests.
    pub fn from_entries(entries: impl IntoIterator<Item = ProjectEntry>) -> Self {
        let projects = entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        ProjectRegistry { projects }
    }

    pub fn resolve(&self, project_id: impl AsRef<str>) -> Option<&ProjectEntry> {
        self.projects.get(project_id.as_ref())
    }

    pub fn get_projects_iter(&self) -> impl Iterator<Item = &ProjectEntry> {
        self.projects.values()
    }

    fn parse_entry(mapping: &LinkedHashMap<Yaml, Yaml>) -> Option<ProjectEntry> {
        let get_str = |key: &'static str| {
            mapping
                .get(&Yaml::Value(Scalar::String(Cow::Borrowed(key))))
                .and_then(|value| value.as_str())
        };

        let id = get_str("id")?.to_string();
        let path = PathBuf::from(get_str("path")?);
        let name = get_str("name").unwrap_or_default().to_string();
        let description = get_str("description").map(|value| value.to_string());

        Some(ProjectEntry {
            id,
            name,
            path,
            description,
        })
    }
}

impl TryFrom<&str> for ProjectRegistry {
    type Error = RegistryError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let contents_vec =
            Yaml::load_from_str(contents).map_err(|e| RegistryError::ParseError { source: e })?;
        let contents = contents_vec
            .get(0)
            .ok_or(RegistryError::MalformedRegistry)?;

        let entries = contents
            .as_sequence()
            .ok_or(RegistryError::TopLevelNotSequence)?;

        let mut projects = HashMap::new();
        for entry in entries {
            let Some(mapping) = entry.as_mapping() else {
                debug!("Skipping non-mapping registry entry: {:?}", entry);
                continue;
            };
            let Some(project) = Self::parse_entry(mapping) else {
                debug!("Skipping registry entry without id/path");
                continue;
            };
            if let Some(previous) = projects.insert(project.id.clone(), project) {
                warn!("Duplicate project id '{}' in registry, keeping the later entry", previous.id);
            }
        }

        Ok(ProjectRegistry { projects })
    }
}

#[derive(Debug, Snafu)]
pub enum RegistryError {
    #[snafu(display("Failed to read project registry file {file_path}"))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse project registry"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Project registry file contains no YAML document"))]
    MalformedRegistry,
    #[snafu(display("Project registry must be a YAML list of projects"))]
    TopLevelNotSequence,
}
