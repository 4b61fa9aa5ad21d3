use super::{Delivery, WorkQueue};
use crate::Result;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::{IntoAppError, bail};
use std::io;
use url::Url;

const LOG_TARGET: &str = "     queue";
const MESSAGE_EXTENSION: &str = ".msg";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Queue backed by a spool directory holding one file per pending message.
///
/// File names start with a zero-padded timestamp, so listing the directory yields
/// roughly send order. Acknowledging a message deletes its file.
#[derive(Debug, Clone)]
pub struct SpoolQueue {
    dir: Utf8PathBuf,
}

impl SpoolQueue {
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open a spool queue from a `file://` URL or a plain directory path.
    pub fn from_url(queue_url: &str) -> Result<Self> {
        match Url::parse(queue_url) {
            Ok(url) if url.scheme() == "file" => {
                let Ok(path) = url.to_file_path() else {
                    bail!("queue URL '{queue_url}' does not name a local directory");
                };
                let dir = Utf8PathBuf::try_from(path).into_app_err_with(|| format!("queue URL '{queue_url}' is not valid UTF-8"))?;
                Ok(Self::new(dir))
            }

            // A single-letter scheme is a Windows drive letter, not a URL
            Ok(url) if url.scheme().len() > 1 => {
                bail!("unsupported queue URL scheme '{}' in '{queue_url}'", url.scheme())
            }

            _ => Ok(Self::new(queue_url)),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn next_message_name() -> String {
        format!(
            "{:020}-{}-{:06}{MESSAGE_EXTENSION}",
            Utc::now().timestamp_micros(),
            std::process::id(),
            SEQUENCE.fetch_add(1, Ordering::Relaxed)
        )
    }
}

#[async_trait]
impl WorkQueue for SpoolQueue {
    async fn send(&self, body: String) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .into_app_err_with(|| format!("creating queue directory '{}'", self.dir))?;

        let name = Self::next_message_name();
        let temp = self.dir.join(format!(".{name}.tmp"));
        let path = self.dir.join(&name);

        tokio::fs::write(&temp, body.as_bytes())
            .await
            .into_app_err_with(|| format!("writing queue message '{temp}'"))?;
        tokio::fs::rename(&temp, &path)
            .await
            .into_app_err_with(|| format!("publishing queue message '{path}'"))?;

        log::debug!(target: LOG_TARGET, "Enqueued message '{name}'");
        Ok(())
    }

    async fn receive(&self, max: usize) -> Result<Vec<Delivery>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading queue directory '{}'", self.dir)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .into_app_err_with(|| format!("reading queue directory '{}'", self.dir))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && name.ends_with(MESSAGE_EXTENSION) {
                names.push(name);
            }
        }
        names.sort();

        let mut deliveries = Vec::with_capacity(max.min(names.len()));
        for name in names {
            if deliveries.len() >= max {
                break;
            }

            let path = self.dir.join(&name);
            match tokio::fs::read_to_string(&path).await {
                Ok(body) => deliveries.push(Delivery { id: name, body }),

                // Acknowledged by a concurrent consumer after we listed it
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}

                Err(e) => return Err(e).into_app_err_with(|| format!("reading queue message '{path}'")),
            }
        }

        Ok(deliveries)
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        if delivery.id.contains(['/', '\\']) || delivery.id.starts_with('.') {
            bail!("invalid delivery id '{}'", delivery.id);
        }

        let path = self.dir.join(&delivery.id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).into_app_err_with(|| format!("acknowledging queue message '{path}'")),
        }
    }
}
