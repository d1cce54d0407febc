use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json;

use crate::config::ensure_home;
use crate::model::project::Project;
use crate::repository::traits::ProjectRepository;

const PROJECTS_FILE_NAME: &str = "projects.json";

#[derive(Clone)]
pub struct FileProjectRepository {
    file_path: PathBuf,
}

impl FileProjectRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut path = ensure_home(base_dir)?;
        path.push(PROJECTS_FILE_NAME);

        if !path.exists() {
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &Vec::<Project>::new())?;
            writer.flush()?;
        }

        Ok(FileProjectRepository { file_path: path })
    }

    fn read_projects(&self) -> Result<Vec<Project>> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("open {}", self.file_path.display()))?;
        let reader = BufReader::new(file);
        let projects = serde_json::from_reader(reader)
            .with_context(|| format!("parse {}", self.file_path.display()))?;
        Ok(projects)
    }

    fn write_projects(&self, projects: &[Project]) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, projects)?;
        writer.flush()?;
        Ok(())
    }
}

impl ProjectRepository for FileProjectRepository {
    fn get(&self, id: u32) -> Result<Option<Project>> {
        let projects = self.read_projects()?;
        Ok(projects.into_iter().find(|p| p.id == id))
    }

    fn list(&self) -> Result<Vec<Project>> {
        self.read_projects()
    }

    fn upsert(&self, project: Project) -> Result<bool> {
        let mut projects = self.read_projects()?;
        let inserted = if let Some(pos) = projects.iter().position(|p| p.id == project.id) {
            projects[pos] = project;
            false
        } else {
            projects.push(project);
            true
        };
        self.write_projects(&projects)?;
        Ok(inserted)
    }
}
