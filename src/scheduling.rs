//! Class schedule CRUD. Admission for a new schedule (day capacity, exact
//! duplicate) happens atomically inside the store; this service validates
//! input and translates store rejections.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{ClassFields, GymClass};
use crate::store::{EntityStore, StoreError};
use crate::validation::is_blank;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Cannot create more than {0} classes on the same day")]
    DayFull(u32),
    #[error("Class schedule already exists")]
    Duplicate,
    #[error("Class schedule not found")]
    NotFound,
    #[error("store failure: {0}")]
    Store(StoreError),
}

pub struct ScheduleService {
    store: Arc<dyn EntityStore>,
    daily_class_limit: u32,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn EntityStore>, daily_class_limit: u32) -> Self {
        Self {
            store,
            daily_class_limit,
        }
    }

    pub async fn create(&self, fields: ClassFields) -> Result<GymClass, ScheduleError> {
        if is_blank(&fields.class_name) || fields.duration == 0 {
            return Err(ScheduleError::MissingFields);
        }

        match self.store.insert_class(fields).await {
            Ok(class) => {
                info!("class scheduled: {} at {}", class.class_name, class.schedule);
                Ok(class)
            }
            Err(StoreError::DayFull) => Err(ScheduleError::DayFull(self.daily_class_limit)),
            Err(StoreError::DuplicateSchedule) => Err(ScheduleError::Duplicate),
            Err(other) => Err(ScheduleError::Store(other)),
        }
    }

    pub async fn list(&self) -> Result<Vec<GymClass>, ScheduleError> {
        self.store.list_classes().await.map_err(ScheduleError::Store)
    }

    pub async fn get(&self, id: Uuid) -> Result<GymClass, ScheduleError> {
        self.store
            .find_class(id)
            .await
            .map_err(ScheduleError::Store)?
            .ok_or(ScheduleError::NotFound)
    }

    /// Full replace. Capacity and duplicate checks are not re-run on update.
    pub async fn update(&self, id: Uuid, fields: ClassFields) -> Result<GymClass, ScheduleError> {
        self.store
            .replace_class(id, fields)
            .await
            .map_err(ScheduleError::Store)?
            .ok_or(ScheduleError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ScheduleError> {
        let deleted = self
            .store
            .delete_class(id)
            .await
            .map_err(ScheduleError::Store)?
            .ok_or(ScheduleError::NotFound)?;
        if deleted.removed_bookings > 0 {
            info!(
                "class {} deleted, cascaded {} bookings",
                deleted.class.id, deleted.removed_bookings
            );
        }
        Ok(())
    }
}
