//! Durable record keeper for users, classes and bookings.
//!
//! The uniqueness and capacity invariants live here rather than in the
//! services: `insert_booking` and `insert_class` read their counts and write
//! under a single guard, so two concurrent admissions can never both observe
//! the same free slot. Everything else is a plain single-record operation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Booking, ClassFields, GymClass, Role, User};
use crate::policy::{BookingDecision, CapacityPolicy, ScheduleDecision};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error("referenced class does not exist")]
    ClassMissing,
    #[error("user already holds a booking for this class")]
    BookingExists,
    #[error("class booking capacity reached")]
    ClassFull,
    #[error("daily class limit reached")]
    DayFull,
    #[error("identical class schedule already stored")]
    DuplicateSchedule,
}

/// Result of a cascading class deletion.
#[derive(Debug, Clone)]
pub struct DeletedClass {
    pub class: GymClass,
    pub removed_bookings: usize,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
    async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> Result<Option<User>, StoreError>;
    async fn set_password_hash(&self, id: Uuid, hash: String) -> Result<Option<User>, StoreError>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError>;
    /// Updates name and email; the unique-email constraint is re-checked
    /// against every other user under the guard.
    async fn set_user_details(
        &self,
        id: Uuid,
        full_name: String,
        email: String,
    ) -> Result<Option<User>, StoreError>;

    /// Admission-checked insert: the same-day count, the exact-duplicate
    /// lookup and the write happen under one guard.
    async fn insert_class(&self, fields: ClassFields) -> Result<GymClass, StoreError>;
    async fn list_classes(&self) -> Result<Vec<GymClass>, StoreError>;
    async fn find_class(&self, id: Uuid) -> Result<Option<GymClass>, StoreError>;
    /// Full replace of the mutable fields; no admission re-check.
    async fn replace_class(
        &self,
        id: Uuid,
        fields: ClassFields,
    ) -> Result<Option<GymClass>, StoreError>;
    /// Deletes the class and every booking referencing it.
    async fn delete_class(&self, id: Uuid) -> Result<Option<DeletedClass>, StoreError>;

    /// Admission-checked insert: re-verifies class existence, the
    /// per-(user, class) uniqueness and the capacity ceiling under one guard.
    async fn insert_booking(&self, user_id: Uuid, class_id: Uuid) -> Result<Booking, StoreError>;
    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;
    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError>;
    async fn list_bookings_for_class(&self, class_id: Uuid) -> Result<Vec<Booking>, StoreError>;
    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError>;
    async fn count_bookings_for_class(&self, class_id: Uuid) -> Result<u32, StoreError>;
    async fn delete_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    classes: HashMap<Uuid, GymClass>,
    bookings: HashMap<Uuid, Booking>,
    /// Uniqueness constraint on (user, class).
    booked_pairs: HashMap<(Uuid, Uuid), Uuid>,
    /// Bounded slot arena per class; a booking claims a slot by appending.
    class_slots: HashMap<Uuid, Vec<Uuid>>,
}

pub struct MemoryStore {
    policy: CapacityPolicy,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(policy: CapacityPolicy) -> Self {
        Self {
            policy,
            tables: RwLock::new(Tables::default()),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn set_refresh_token(
        &self,
        id: Uuid,
        token: Option<String>,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.refresh_token = token;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, hash: String) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.password_hash = hash;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.get_mut(&id).map(|user| {
            user.role = role;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_details(
        &self,
        id: Uuid,
        full_name: String,
        email: String,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != id && u.email == email)
        {
            return Err(StoreError::EmailTaken);
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            user.full_name = full_name;
            user.email = email;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn insert_class(&self, fields: ClassFields) -> Result<GymClass, StoreError> {
        let mut tables = self.tables.write().await;

        // Day window: [UTC midnight of the schedule, +1 day).
        let day_start = fields.schedule.date_naive().and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        let same_day_count = tables
            .classes
            .values()
            .filter(|c| c.schedule >= day_start && c.schedule < day_end)
            .count() as u32;
        let exact_duplicate = tables.classes.values().any(|c| {
            c.class_name == fields.class_name
                && c.trainer_id == fields.trainer_id
                && c.schedule == fields.schedule
        });

        match self.policy.can_schedule(same_day_count, exact_duplicate) {
            ScheduleDecision::RejectDayFull => Err(StoreError::DayFull),
            ScheduleDecision::RejectDuplicate => Err(StoreError::DuplicateSchedule),
            ScheduleDecision::Admit => {
                let now = Utc::now();
                let class = GymClass {
                    id: Uuid::new_v4(),
                    class_name: fields.class_name,
                    trainer_id: fields.trainer_id,
                    duration: fields.duration,
                    schedule: fields.schedule,
                    created_at: now,
                    updated_at: now,
                };
                tables.classes.insert(class.id, class.clone());
                Ok(class)
            }
        }
    }

    async fn list_classes(&self) -> Result<Vec<GymClass>, StoreError> {
        let tables = self.tables.read().await;
        let mut classes: Vec<GymClass> = tables.classes.values().cloned().collect();
        classes.sort_by(|a, b| a.schedule.cmp(&b.schedule));
        Ok(classes)
    }

    async fn find_class(&self, id: Uuid) -> Result<Option<GymClass>, StoreError> {
        Ok(self.tables.read().await.classes.get(&id).cloned())
    }

    async fn replace_class(
        &self,
        id: Uuid,
        fields: ClassFields,
    ) -> Result<Option<GymClass>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.classes.get_mut(&id).map(|class| {
            class.class_name = fields.class_name;
            class.trainer_id = fields.trainer_id;
            class.duration = fields.duration;
            class.schedule = fields.schedule;
            class.updated_at = Utc::now();
            class.clone()
        }))
    }

    async fn delete_class(&self, id: Uuid) -> Result<Option<DeletedClass>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(class) = tables.classes.remove(&id) else {
            return Ok(None);
        };

        let dependent: Vec<Uuid> = tables
            .bookings
            .values()
            .filter(|b| b.class_id == id)
            .map(|b| b.id)
            .collect();
        for booking_id in &dependent {
            if let Some(booking) = tables.bookings.remove(booking_id) {
                tables
                    .booked_pairs
                    .remove(&(booking.user_id, booking.class_id));
            }
        }
        tables.class_slots.remove(&id);

        Ok(Some(DeletedClass {
            class,
            removed_bookings: dependent.len(),
        }))
    }

    async fn insert_booking(&self, user_id: Uuid, class_id: Uuid) -> Result<Booking, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.classes.contains_key(&class_id) {
            return Err(StoreError::ClassMissing);
        }

        let already_booked = tables.booked_pairs.contains_key(&(user_id, class_id));
        let slot_count = tables
            .class_slots
            .get(&class_id)
            .map_or(0, |slots| slots.len() as u32);

        match self.policy.can_book(already_booked, slot_count) {
            BookingDecision::RejectAlreadyBooked => Err(StoreError::BookingExists),
            BookingDecision::RejectClassFull => Err(StoreError::ClassFull),
            BookingDecision::Admit => {
                let now = Utc::now();
                let booking = Booking {
                    id: Uuid::new_v4(),
                    user_id,
                    class_id,
                    booking_date: now,
                    created_at: now,
                };
                tables.bookings.insert(booking.id, booking.clone());
                tables.booked_pairs.insert((user_id, class_id), booking.id);
                tables
                    .class_slots
                    .entry(class_id)
                    .or_default()
                    .push(booking.id);
                Ok(booking)
            }
        }
    }

    async fn find_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.booking_date.cmp(&b.booking_date));
        Ok(bookings)
    }

    async fn list_bookings_for_class(&self, class_id: Uuid) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.class_id == class_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.booking_date.cmp(&b.booking_date));
        Ok(bookings)
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| a.booking_date.cmp(&b.booking_date));
        Ok(bookings)
    }

    async fn count_bookings_for_class(&self, class_id: Uuid) -> Result<u32, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .class_slots
            .get(&class_id)
            .map_or(0, |slots| slots.len() as u32))
    }

    async fn delete_booking(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(booking) = tables.bookings.remove(&id) else {
            return Ok(None);
        };
        tables
            .booked_pairs
            .remove(&(booking.user_id, booking.class_id));
        if let Some(slots) = tables.class_slots.get_mut(&booking.class_id) {
            slots.retain(|slot| *slot != id);
        }
        Ok(Some(booking))
    }
}
