//! Runs parsed script commands against a booth and prints their results.

use anyhow::Result;
use camera_core::{BoothCommand, BoothOutcome, PhotoBooth};
use shared::{
    domain::PhotoId,
    error::{BoothError, ErrorCode},
};
use tracing::warn;

use crate::script::{parse_line, PhotoRef, ScriptCommand};

pub struct Session {
    booth: PhotoBooth,
}

impl Session {
    pub fn new(booth: PhotoBooth) -> Self {
        Self { booth }
    }

    pub fn booth(&self) -> &PhotoBooth {
        &self.booth
    }

    /// Rejected commands are reported and skipped; only output failures abort.
    pub async fn run_line(&self, index: usize, line: &str) -> Result<()> {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!(line = index, "booth: {err:#}");
                return Ok(());
            }
        };
        if let Err(err) = self.run(command).await {
            println!("error {}", serde_json::to_string(&err)?);
        }
        Ok(())
    }

    async fn run(&self, command: ScriptCommand) -> Result<(), BoothError> {
        match command {
            ScriptCommand::Capture => self.dispatch(BoothCommand::Capture).await,
            ScriptCommand::Wait => {
                self.booth.wait_for_captions().await;
                self.booth.capture_controller().wait_until_ready().await;
                Ok(())
            }
            ScriptCommand::List => {
                let photos: Vec<_> = self
                    .booth
                    .store()
                    .list()
                    .await
                    .iter()
                    .map(|photo| photo.summary())
                    .collect();
                let json = serde_json::to_string_pretty(&photos)
                    .map_err(|err| BoothError::new(ErrorCode::Internal, err.to_string()))?;
                println!("{json}");
                Ok(())
            }
            ScriptCommand::Drag { photo, from, to } => {
                let id = self.resolve(photo).await?;
                self.dispatch(BoothCommand::BeginDrag { id, pointer: from })
                    .await?;
                self.dispatch(BoothCommand::PointerMove { pointer: to })
                    .await?;
                self.dispatch(BoothCommand::EndDrag).await
            }
            ScriptCommand::Hover(photo) => {
                let id = match photo {
                    Some(photo) => Some(self.resolve(photo).await?),
                    None => None,
                };
                self.dispatch(BoothCommand::Hover { id }).await
            }
            ScriptCommand::Edit(photo) => {
                let id = self.resolve(photo).await?;
                self.dispatch(BoothCommand::BeginEdit { id }).await
            }
            ScriptCommand::Draft(text) => self.dispatch(BoothCommand::UpdateDraft { text }).await,
            ScriptCommand::Key(key) => self.dispatch(BoothCommand::EditKey(key)).await,
            ScriptCommand::Regenerate(photo) => {
                let id = self.resolve(photo).await?;
                self.dispatch(BoothCommand::Regenerate { id }).await
            }
            ScriptCommand::Download(photo) => {
                let id = self.resolve(photo).await?;
                self.dispatch(BoothCommand::Download { id }).await
            }
            ScriptCommand::Delete(photo) => {
                let id = self.resolve(photo).await?;
                self.dispatch(BoothCommand::Delete { id }).await
            }
        }
    }

    async fn dispatch(&self, command: BoothCommand) -> Result<(), BoothError> {
        match self.booth.dispatch(command).await? {
            BoothOutcome::Captured(id) => println!("captured {id}"),
            BoothOutcome::Exported(Some(path)) => println!("saved {}", path.display()),
            BoothOutcome::Exported(None) => println!("download failed"),
            BoothOutcome::Deleted(true) => println!("deleted"),
            BoothOutcome::Committed(Some(id)) => println!("caption saved for {id}"),
            BoothOutcome::Regenerating(id) => println!("regenerating {id}"),
            _ => {}
        }
        Ok(())
    }

    async fn resolve(&self, photo: PhotoRef) -> Result<PhotoId, BoothError> {
        match photo {
            PhotoRef::Id(id) => Ok(id),
            PhotoRef::Last => self
                .booth
                .store()
                .most_recent()
                .await
                .map(|photo| photo.id())
                .ok_or_else(|| BoothError::new(ErrorCode::NotFound, "no photos yet")),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
