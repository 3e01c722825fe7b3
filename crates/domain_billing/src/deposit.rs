//! Guest deposits
//!
//! A deposit is money collected from a guest before an invoice exists,
//! typically to hold a reservation. It is later applied to one or more
//! invoices; each application creates a payment of type
//! `DepositApplication`, so a deposit never turns into invoice credit
//! without a payment record behind it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DepositId, EmployeeId, GuestId, Money, ReservationId};

use crate::error::BillingError;
use crate::payment::PaymentMethod;

/// Deposit lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositStatus {
    /// Requested, money not yet received
    Pending,
    /// Money received and held on file
    Collected,
    /// Some of the deposit has been applied to invoices
    PartiallyApplied,
    /// The whole deposit has been applied
    FullyApplied,
    /// Lapsed before being applied
    Expired,
    /// Returned to the guest without being applied
    Refunded,
}

/// Money held on file for a guest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    /// Unique identifier
    pub id: DepositId,
    /// Guest the money belongs to
    pub guest_id: GuestId,
    /// Reservation the deposit was taken for, if any
    pub reservation_id: Option<ReservationId>,
    /// Collected amount
    pub amount: Money,
    /// Cumulative amount applied to invoices; never decreases
    pub amount_applied: Money,
    /// Status
    pub status: DepositStatus,
    /// How the money was received
    pub method: PaymentMethod,
    /// Date after which the deposit can no longer be applied
    pub expires_at: Option<NaiveDate>,
    /// When the money was received
    pub collected_at: Option<DateTime<Utc>>,
    /// Operator who collected it
    pub collected_by: Option<EmployeeId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Deposit {
    /// Creates a new pending deposit
    ///
    /// # Errors
    ///
    /// Returns a validation error if the amount is not strictly positive.
    pub fn new(
        guest_id: GuestId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation("Deposit amount must be positive"));
        }

        let now = Utc::now();
        Ok(Self {
            id: DepositId::new_v7(),
            guest_id,
            reservation_id: None,
            amount,
            amount_applied: Money::zero(amount.currency()),
            status: DepositStatus::Pending,
            method,
            expires_at: None,
            collected_at: None,
            collected_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Links the deposit to the reservation it was taken for
    pub fn with_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    /// Sets the expiry date
    pub fn with_expiry(mut self, expires_at: NaiveDate) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Records receipt of the money
    pub fn collect(&mut self, collected_by: EmployeeId) -> Result<(), BillingError> {
        if self.status != DepositStatus::Pending {
            return Err(self.transition_error(DepositStatus::Collected));
        }
        self.status = DepositStatus::Collected;
        self.collected_at = Some(Utc::now());
        self.collected_by = Some(collected_by);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Amount still available to apply
    pub fn remaining_amount(&self) -> Money {
        self.amount - self.amount_applied
    }

    /// Returns true if the deposit has lapsed as of the given date
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        matches!(self.expires_at, Some(expiry) if today > expiry)
    }

    /// Returns true if funds can currently be drawn from this deposit
    pub fn can_apply(&self) -> bool {
        matches!(
            self.status,
            DepositStatus::Collected | DepositStatus::PartiallyApplied
        )
    }

    /// Draws funds from the deposit
    ///
    /// `amount_applied` only ever increases; there is no reversal path
    /// other than refunding the remainder to the guest.
    ///
    /// # Errors
    ///
    /// Returns a state conflict if the deposit is not applicable, and a
    /// validation error if the amount is non-positive or exceeds what
    /// remains.
    pub fn apply(&mut self, amount: Money) -> Result<(), BillingError> {
        if !self.can_apply() {
            return Err(BillingError::state_conflict(format!(
                "Deposit {} cannot be applied from status {:?}",
                self.id, self.status
            )));
        }
        if !amount.is_positive() {
            return Err(BillingError::validation("Applied amount must be positive"));
        }
        let remaining = self.remaining_amount();
        if amount > remaining {
            return Err(BillingError::validation(format!(
                "Applied amount {} exceeds remaining deposit {}",
                amount, remaining
            )));
        }

        self.amount_applied = self.amount_applied.checked_add(&amount)?;
        self.status = if self.remaining_amount().is_zero() {
            DepositStatus::FullyApplied
        } else {
            DepositStatus::PartiallyApplied
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks a lapsed deposit as expired
    pub fn expire(&mut self) -> Result<(), BillingError> {
        if !matches!(
            self.status,
            DepositStatus::Pending | DepositStatus::Collected | DepositStatus::PartiallyApplied
        ) {
            return Err(self.transition_error(DepositStatus::Expired));
        }
        self.status = DepositStatus::Expired;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the un-applied remainder as returned to the guest
    pub fn mark_refunded(&mut self) -> Result<(), BillingError> {
        if !matches!(
            self.status,
            DepositStatus::Collected | DepositStatus::PartiallyApplied
        ) {
            return Err(self.transition_error(DepositStatus::Refunded));
        }
        self.status = DepositStatus::Refunded;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn transition_error(&self, target: DepositStatus) -> BillingError {
        BillingError::InvalidStatusTransition {
            entity: "deposit",
            from: format!("{:?}", self.status),
            to: format!("{:?}", target),
        }
    }
}
