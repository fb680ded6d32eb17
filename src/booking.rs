//! Booking admission and views. The duplicate and capacity checks run
//! atomically inside the store; delete authority is owner-or-admin with the
//! admin role re-read from the store rather than trusted from the token.

use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::{Booking, BookingView, PublicUser, Role};
use crate::store::{EntityStore, StoreError};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Class not found")]
    ClassMissing,
    #[error("You have already booked this class")]
    AlreadyBooked,
    #[error("Class is fully booked")]
    ClassFull,
    #[error("Booking not found")]
    NotFound,
    #[error("You are not allowed to delete this booking")]
    NotOwner,
    #[error("store failure: {0}")]
    Store(StoreError),
}

pub struct BookingService {
    store: Arc<dyn EntityStore>,
}

impl BookingService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, class_id: Uuid) -> Result<Booking, BookingError> {
        // Early existence check for a clean 404; the insert re-verifies it
        // under the store's guard.
        if self
            .store
            .find_class(class_id)
            .await
            .map_err(BookingError::Store)?
            .is_none()
        {
            return Err(BookingError::ClassMissing);
        }

        match self.store.insert_booking(user_id, class_id).await {
            Ok(booking) => {
                info!("booking admitted: user {user_id} class {class_id}");
                Ok(booking)
            }
            Err(StoreError::ClassMissing) => Err(BookingError::ClassMissing),
            Err(StoreError::BookingExists) => Err(BookingError::AlreadyBooked),
            Err(StoreError::ClassFull) => Err(BookingError::ClassFull),
            Err(other) => Err(BookingError::Store(other)),
        }
    }

    pub async fn user_bookings(&self, user_id: Uuid) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self
            .store
            .list_bookings_for_user(user_id)
            .await
            .map_err(BookingError::Store)?;
        self.enrich(bookings).await
    }

    /// No existence check on the class: an unknown id yields an empty list.
    pub async fn class_bookings(&self, class_id: Uuid) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self
            .store
            .list_bookings_for_class(class_id)
            .await
            .map_err(BookingError::Store)?;
        self.enrich(bookings).await
    }

    pub async fn all_bookings(&self) -> Result<Vec<BookingView>, BookingError> {
        let bookings = self.store.list_bookings().await.map_err(BookingError::Store)?;
        self.enrich(bookings).await
    }

    /// Owner-or-admin: a non-owner must hold the admin role in the user
    /// store at the time of the call, not merely in the token claim.
    pub async fn delete(&self, booking_id: Uuid, caller: AuthUser) -> Result<(), BookingError> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await
            .map_err(BookingError::Store)?
            .ok_or(BookingError::NotFound)?;

        if booking.user_id != caller.id {
            let stored_role = self
                .store
                .find_user(caller.id)
                .await
                .map_err(BookingError::Store)?
                .map(|u| u.role);
            if stored_role != Some(Role::Admin) {
                return Err(BookingError::NotOwner);
            }
        }

        self.store
            .delete_booking(booking_id)
            .await
            .map_err(BookingError::Store)?
            .ok_or(BookingError::NotFound)?;
        Ok(())
    }

    async fn enrich(&self, bookings: Vec<Booking>) -> Result<Vec<BookingView>, BookingError> {
        try_join_all(bookings.into_iter().map(|booking| self.view(booking))).await
    }

    async fn view(&self, booking: Booking) -> Result<BookingView, BookingError> {
        let user = self
            .store
            .find_user(booking.user_id)
            .await
            .map_err(BookingError::Store)?
            .map(PublicUser::from);
        let class = self
            .store
            .find_class(booking.class_id)
            .await
            .map_err(BookingError::Store)?;
        Ok(BookingView {
            booking,
            user,
            class,
        })
    }
}
