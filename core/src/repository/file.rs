use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use serde_json;

use crate::config::ensure_home;
use crate::model::user::User;
use crate::repository::traits::UserRepository;

const USERS_FILE_NAME: &str = "users.json";

#[derive(Clone)]
pub struct FileUserRepository {
    file_path: PathBuf,
}

impl FileUserRepository {
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut path = ensure_home(base_dir)?;
        path.push(USERS_FILE_NAME);

        if !path.exists() {
            let mut writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(&mut writer, &Vec::<User>::new())?;
            writer.flush()?;
        }

        Ok(FileUserRepository { file_path: path })
    }

    fn read_users(&self) -> Result<Vec<User>> {
        let file = File::open(&self.file_path)
            .with_context(|| format!("open {}", self.file_path.display()))?;
        let reader = BufReader::new(file);
        let users = serde_json::from_reader(reader)
            .with_context(|| format!("parse {}", self.file_path.display()))?;
        Ok(users)
    }

    fn write_users(&self, users: &[User]) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, users)?;
        writer.flush()?;
        Ok(())
    }
}

impl UserRepository for FileUserRepository {
    fn create(&self, user: User) -> Result<User> {
        let mut users = self.read_users()?;
        if users.iter().any(|u| u.username == user.username) {
            return Err(anyhow!("User {} already exists", user.username));
        }
        users.push(user.clone());
        self.write_users(&users)?;
        Ok(user)
    }

    fn get(&self, username: &str) -> Result<Option<User>> {
        let users = self.read_users()?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    fn list(&self) -> Result<Vec<User>> {
        self.read_users()
    }

    fn update(&self, user: &User) -> Result<()> {
        let mut users = self.read_users()?;
        if let Some(pos) = users.iter().position(|u| u.username == user.username) {
            users[pos] = user.clone();
            self.write_users(&users)?;
            Ok(())
        } else {
            Err(anyhow!("User {} not found", user.username))
        }
    }

    fn delete(&self, username: &str) -> Result<()> {
        let mut users = self.read_users()?;
        let initial_len = users.len();
        users.retain(|u| u.username != username);

        if users.len() == initial_len {
            return Err(anyhow!("User {} not found", username));
        }

        self.write_users(&users)?;
        Ok(())
    }
}
