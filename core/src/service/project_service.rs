use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::project::Project;
use crate::repository::ProjectRepository;
use crate::service::dto::Answer;

/// One project as the issue tracker reports it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerProject {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: i32,
    /// e.g. `2023-05-26T10:14:31Z`; only the date part is kept.
    pub created_on: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TrackerPage {
    pub projects: Vec<TrackerProject>,
    #[serde(default)]
    pub total_count: usize,
}

/// Where project records come from.
pub trait ProjectSource {
    fn fetch(&self) -> Result<TrackerPage>;
}

/// Reads a tracker `projects.json` export from disk.
pub struct TrackerExportSource {
    path: PathBuf,
}

impl TrackerExportSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ProjectSource for TrackerExportSource {
    fn fetch(&self) -> Result<TrackerPage> {
        let file = File::open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let page = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parse tracker export {}", self.path.display()))?;
        Ok(page)
    }
}

pub fn parse_created_on(created_on: &str) -> Option<NaiveDate> {
    let date_part = created_on.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

impl TrackerProject {
    pub fn to_project(&self) -> Option<Project> {
        Some(Project {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            created_on: parse_created_on(&self.created_on)?,
        })
    }
}

pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Upserts every tracker project by id.
    pub fn sync<S: ProjectSource>(&self, source: &S) -> Result<Answer> {
        let page = source.fetch()?;
        let total = if page.total_count > 0 { page.total_count } else { page.projects.len() };

        let mut inserted = 0;
        let mut updated = 0;
        for record in &page.projects {
            let Some(project) = record.to_project() else {
                warn!(id = record.id, created_on = %record.created_on, "skipping project with unparsable creation date");
                continue;
            };
            if self.repo.upsert(project)? {
                inserted += 1;
            } else {
                updated += 1;
            }
        }

        info!(total, inserted, updated, "synchronized projects");
        Ok(Answer::new("Sync", format!("Sync {}", total)))
    }

    pub fn list(&self) -> Result<Vec<Project>> {
        let mut projects = self.repo.list()?;
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockProjectRepo {
        projects: RefCell<Vec<Project>>,
    }

    impl ProjectRepository for MockProjectRepo {
        fn get(&self, id: u32) -> Result<Option<Project>> {
            Ok(self.projects.borrow().iter().find(|p| p.id == id).cloned())
        }
        fn list(&self) -> Result<Vec<Project>> {
            Ok(self.projects.borrow().clone())
        }
        fn upsert(&self, project: Project) -> Result<bool> {
            let mut projects = self.projects.borrow_mut();
            if let Some(pos) = projects.iter().position(|p| p.id == project.id) {
                projects[pos] = project;
                Ok(false)
            } else {
                projects.push(project);
                Ok(true)
            }
        }
    }

    struct StaticSource(TrackerPage);

    impl ProjectSource for StaticSource {
        fn fetch(&self) -> Result<TrackerPage> {
            Ok(self.0.clone())
        }
    }

    fn record(id: u32, name: &str, created_on: &str) -> TrackerProject {
        TrackerProject {
            id,
            name: name.to_string(),
            description: format!("{} description", name),
            status: 1,
            created_on: created_on.to_string(),
        }
    }

    #[test]
    fn test_parse_created_on() {
        assert_eq!(parse_created_on("2023-05-26T10:14:31Z"), NaiveDate::from_ymd_opt(2023, 5, 26));
        assert_eq!(parse_created_on("2023-05-26"), NaiveDate::from_ymd_opt(2023, 5, 26));
        assert_eq!(parse_created_on("26.05.2023"), None);
        assert_eq!(parse_created_on("short"), None);
    }

    #[test]
    fn test_sync_upserts_by_id() {
        let service = ProjectService::new(MockProjectRepo::default());
        let first = StaticSource(TrackerPage {
            projects: vec![record(1, "Portal", "2023-05-26T10:14:31Z"), record(2, "Billing", "2023-06-01T08:00:00Z")],
            total_count: 2,
        });
        assert_eq!(service.sync(&first).unwrap(), Answer::new("Sync", "Sync 2"));

        let second = StaticSource(TrackerPage {
            projects: vec![record(1, "Portal NG", "2023-05-26T10:14:31Z")],
            total_count: 1,
        });
        service.sync(&second).unwrap();

        let projects = service.list().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "Portal NG");
        assert_eq!(projects[1].created_on, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[test]
    fn test_sync_skips_bad_dates() {
        let service = ProjectService::new(MockProjectRepo::default());
        let source = StaticSource(TrackerPage {
            projects: vec![record(1, "Portal", "yesterday"), record(2, "Billing", "2023-06-01")],
            total_count: 0,
        });
        let answer = service.sync(&source).unwrap();
        assert_eq!(answer.message, "Sync 2");
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_export_source_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(
            &path,
            r#"{"projects":[{"id":3,"name":"HR","status":1,"created_on":"2022-01-10T00:00:00Z"}],"total_count":1,"offset":0,"limit":25}"#,
        )
        .unwrap();

        let page = TrackerExportSource::new(path).fetch().unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.projects[0].description, "");
        assert_eq!(page.projects[0].to_project().unwrap().created_on, NaiveDate::from_ymd_opt(2022, 1, 10).unwrap());
    }
}
