//! Сессии загрузки: две партиции, результат конвейера и модели

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::RunOutput;
use crate::preprocessing::PipelineOutput;
use crate::types::{Partition, RawTable};

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(u64),

    #[error("Partition '{0}' has not been uploaded")]
    MissingPartition(Partition),

    #[error("Session has not been preprocessed")]
    NotPreprocessed,

    #[error("No model has been run for this session")]
    NotModeled,

    #[error("Session {0} changed while the request was running")]
    Stale(u64),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    labeled: Option<RawTable>,
    unlabeled: Option<RawTable>,
    output: Option<PipelineOutput>,
    model: Option<RunOutput>,
    revision: u64,
}

/// Краткое состояние сессии для ответов API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub labeled_rows: Option<usize>,
    pub unlabeled_rows: Option<usize>,
    pub preprocessed: bool,
    pub modeled: bool,
}

impl Session {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            labeled: None,
            unlabeled: None,
            output: None,
            model: None,
            revision: 0,
        }
    }

    /// Новая партиция делает устаревшими признаки и предсказания
    pub fn set_partition(&mut self, partition: Partition, table: RawTable) {
        match partition {
            Partition::Labeled => self.labeled = Some(table),
            Partition::Unlabeled => self.unlabeled = Some(table),
        }
        self.output = None;
        self.model = None;
        self.revision += 1;
    }

    pub fn partition(&self, partition: Partition) -> Option<&RawTable> {
        match partition {
            Partition::Labeled => self.labeled.as_ref(),
            Partition::Unlabeled => self.unlabeled.as_ref(),
        }
    }

    pub fn partitions(&self) -> Result<(&RawTable, &RawTable), SessionError> {
        let labeled = self
            .labeled
            .as_ref()
            .ok_or(SessionError::MissingPartition(Partition::Labeled))?;
        let unlabeled = self
            .unlabeled
            .as_ref()
            .ok_or(SessionError::MissingPartition(Partition::Unlabeled))?;
        Ok((labeled, unlabeled))
    }

    pub fn set_output(&mut self, output: PipelineOutput) {
        self.output = Some(output);
        self.model = None;
        self.revision += 1;
    }

    /// Растёт при каждой смене партиций или результата конвейера
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ошибка, если сессия менялась после снимка с ревизией `seen`
    pub fn ensure_revision(&self, seen: u64) -> Result<(), SessionError> {
        if self.revision == seen {
            Ok(())
        } else {
            Err(SessionError::Stale(self.id))
        }
    }

    pub fn output(&self) -> Result<&PipelineOutput, SessionError> {
        self.output.as_ref().ok_or(SessionError::NotPreprocessed)
    }

    pub fn set_model(&mut self, model: RunOutput) {
        self.model = Some(model);
    }

    pub fn model(&self) -> Result<&RunOutput, SessionError> {
        self.model.as_ref().ok_or(SessionError::NotModeled)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            labeled_rows: self.labeled.as_ref().map(RawTable::len),
            unlabeled_rows: self.unlabeled.as_ref().map(RawTable::len),
            preprocessed: self.output.is_some(),
            modeled: self.model.is_some(),
        }
    }
}

/// Хранилище сессий, разделяемое обработчиками
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    next_id: Arc<AtomicU64>,
    sessions: Arc<Mutex<HashMap<u64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> SessionSummary {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let session = Session::new(id);
        let summary = session.summary();
        self.sessions.lock().await.insert(id, session);
        tracing::info!("Session {} created", id);
        summary
    }

    pub async fn remove(&self, id: u64) -> Result<Session, SessionError> {
        let removed = self.sessions.lock().await.remove(&id);
        removed.ok_or(SessionError::NotFound(id))
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Выполняет `f` над сессией под блокировкой хранилища
    pub async fn with_session<T, E, F>(&self, id: u64, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Session) -> Result<T, E>,
        E: From<SessionError>,
    {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        f(session)
    }
}
