//! Synchronization state of a future's shared slot.
//!
//! The state is packed into a single `AtomicU8` with the following layout:
//! - Bit 0: SETTLED - A payload has been published
//! - Bit 1: LOCKED - The exclusion scope around the cell is held
//! - Bit 2: WAITING - At least one thread is parked on this word
//! - Bit 3: ABANDONED - The producer went away without publishing
//! - Bits 4-7: EPOCH - Generation counter, bumped on every release
//!
//! Producers publish while holding `LOCKED` and set `SETTLED` with release
//! ordering in the same store that drops the lock, so a consumer whose
//! acquire load observes `SETTLED` also observes the whole payload. Blocking
//! uses `parking_lot_core`'s address-keyed parking.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

/// Atomic state of a future slot.
#[repr(transparent)]
pub(crate) struct FutureState(AtomicU8);

impl FutureState {
   /// Bit flag: A payload has been published.
   const SETTLED: u8 = 1;
   /// Bit flag: The exclusion scope is held.
   const LOCKED: u8 = 2;
   /// Bit flag: At least one thread is waiting.
   const WAITING: u8 = 4;
   /// Bit flag: The producer was dropped before publishing.
   const ABANDONED: u8 = 8;
   /// Start of epoch bits.
   const EPOCH_1: u8 = 16;
   /// Mask for epoch bits.
   const EPOCH_MASK: u8 = !(Self::SETTLED | Self::LOCKED | Self::WAITING | Self::ABANDONED);
   /// Either terminal bit.
   const RESOLVED: u8 = Self::SETTLED | Self::ABANDONED;

   /// Calculates the next epoch value based on the current state.
   #[inline(always)]
   const fn next_epoch(current_state: u8) -> u8 {
      (current_state & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// A pending slot.
   #[inline]
   pub(crate) const fn new() -> Self {
      Self(AtomicU8::new(0))
   }

   /// A slot that was settled at construction.
   #[inline]
   pub(crate) const fn settled() -> Self {
      Self(AtomicU8::new(Self::SETTLED))
   }

   /// Wakes every parked thread.
   #[inline]
   fn notify_all(&self) {
      // SAFETY: The address passed to unpark matches the one used by park.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks until the state moves away from `expected_state` or `deadline` passes.
   /// Spurious wake-ups are possible; callers re-check in a loop.
   #[inline]
   fn park(&self, expected_state: u8, deadline: Option<Instant>) {
      // SAFETY: See `notify_all`.
      unsafe {
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected_state,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            deadline,
         );
      }
   }

   /// Sets `WAITING` on `current_state`. Returns the state to park on, or `None`
   /// if the word changed under us and the caller should re-read it.
   #[inline]
   fn announce_waiter(&self, current_state: u8) -> Option<u8> {
      if current_state & Self::WAITING != 0 {
         return Some(current_state);
      }
      let new_state = current_state | Self::WAITING;
      match self.0.compare_exchange_weak(
         current_state,
         new_state,
         Ordering::Relaxed,
         Ordering::Relaxed,
      ) {
         Ok(_) => Some(new_state),
         Err(_) => {
            std::hint::spin_loop();
            None
         }
      }
   }

   #[inline]
   pub(crate) fn is_settled(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::SETTLED != 0
   }

   #[inline]
   pub(crate) fn is_abandoned(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::ABANDONED != 0
   }

   /// True once the slot is settled or abandoned. Never blocks.
   #[inline]
   pub(crate) fn is_resolved(&self) -> bool {
      self.0.load(Ordering::Acquire) & Self::RESOLVED != 0
   }

   /// Blocks until the slot is settled or abandoned.
   pub(crate) fn wait(&self) {
      self.wait_deadline(None);
   }

   /// Blocks until the slot is settled or abandoned, or until `deadline`.
   /// Returns `true` if the slot resolved.
   pub(crate) fn wait_deadline(&self, deadline: Option<Instant>) -> bool {
      loop {
         let current_state = self.0.load(Ordering::Acquire);
         if current_state & Self::RESOLVED != 0 {
            return true;
         }
         if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return false;
         }
         if let Some(parked_state) = self.announce_waiter(current_state) {
            self.park(parked_state, deadline);
         }
      }
   }

   /// Waits asynchronously until the slot is settled or abandoned.
   ///
   /// Tries spinning/yielding first, then falls back to `block_in_place`.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub(crate) async fn wait_async(&self) {
      for _ in 0..16 {
         let state = self.0.load(Ordering::Acquire);
         if state & Self::RESOLVED != 0 {
            return;
         }
         for _ in 0..32 {
            tokio::task::yield_now().await;
            if self.0.load(Ordering::Relaxed) != state {
               break;
            }
         }
      }

      #[cfg(feature = "async-tokio-mt")]
      {
         if !self.is_resolved() {
            tokio::task::block_in_place(|| self.wait());
         }
      }

      #[cfg(not(feature = "async-tokio-mt"))]
      while !self.is_resolved() {
         tokio::task::yield_now().await;
      }
   }

   /// Tries to take the exclusion scope once. On contention, announces a waiter
   /// and returns the state to park on.
   #[inline]
   fn lock_step(&self) -> Result<StateGuard<'_>, u8> {
      loop {
         let current_state = self.0.load(Ordering::Relaxed);
         if current_state & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               current_state,
               current_state | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Ok(StateGuard::new(self)),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }
         match self.announce_waiter(current_state) {
            Some(parked_state) => return Err(parked_state),
            None => continue,
         }
      }
   }

   /// Takes the exclusion scope, blocking while another thread holds it.
   #[inline]
   pub(crate) fn lock(&self) -> StateGuard<'_> {
      loop {
         match self.lock_step() {
            Ok(guard) => return guard,
            Err(parked_state) => self.park(parked_state, None),
         }
      }
   }

   /// Drops `LOCKED`, ORs in `extra`, bumps the epoch and wakes waiters.
   #[inline]
   fn release(&self, extra: u8) {
      let update = |state: u8| {
         let kept = state & (Self::SETTLED | Self::ABANDONED);
         Some(kept | extra | Self::next_epoch(state))
      };
      // Release ordering publishes every write made under the lock together
      // with the new terminal bits.
      let prev_state = match self.0.fetch_update(Ordering::Release, Ordering::Relaxed, update) {
         Ok(state) | Err(state) => state,
      };
      if prev_state & Self::WAITING != 0 {
         self.notify_all();
      }
   }
}

/// RAII exclusion scope over a future's cell.
///
/// Dropping the guard releases the scope on every exit path, unwinding
/// included. [`publish`](Self::publish) releases it and marks the slot settled
/// in one store.
pub(crate) struct StateGuard<'a> {
   state: &'a FutureState,
}

impl<'a> StateGuard<'a> {
   /// Assumes the `LOCKED` flag is already set on `state`.
   #[inline(always)]
   const fn new(state: &'a FutureState) -> Self {
      Self { state }
   }

   /// Releases the scope, marking the slot settled and waking every waiter.
   #[inline]
   pub(crate) fn publish(self) {
      self.state.release(FutureState::SETTLED);
      mem::forget(self);
   }

   /// Releases the scope, marking the slot abandoned and waking every waiter.
   #[inline]
   pub(crate) fn abandon(self) {
      self.state.release(FutureState::ABANDONED);
      mem::forget(self);
   }
}

impl Drop for StateGuard<'_> {
   #[inline(always)]
   fn drop(&mut self) {
      self.state.release(0);
   }
}
