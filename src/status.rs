//! Status word of a [`StateCell`](crate::StateCell).
//!
//! The status is packed into a single `u16` with the following layout:
//! - Bit 0: HAS_VALUE - A value is stored
//! - Bit 1: HAS_ERROR - An error is stored
//! - Bit 2: HAS_EXCEPTION - An exception is stored
//! - Bit 3: ERROR_IS_ERRNO - The stored error was classified as errno-like
//! - Bit 4: MOVED_FROM - The payload was consumed by a move-out read
//! - Bits 8-15: CUSTOM - Free for the owner of the cell
//!
//! At most one of the three `HAS_*` bits is ever set.

use core::fmt;

/// Packed status bits of a state cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Status(u16);

impl Status {
   /// Bit flag: A value is stored.
   pub const HAS_VALUE: u16 = 1;
   /// Bit flag: An error is stored.
   pub const HAS_ERROR: u16 = 2;
   /// Bit flag: An exception is stored.
   pub const HAS_EXCEPTION: u16 = 4;
   /// Bit flag: The stored error behaves like an errno code.
   pub const ERROR_IS_ERRNO: u16 = 8;
   /// Bit flag: The payload was moved out by a consuming read.
   pub const MOVED_FROM: u16 = 16;
   /// Mask of the payload bits.
   const PAYLOAD_MASK: u16 = Self::HAS_VALUE | Self::HAS_ERROR | Self::HAS_EXCEPTION;
   /// Shift of the custom byte.
   const CUSTOM_SHIFT: u32 = 8;
   /// Mask of the custom byte.
   const CUSTOM_MASK: u16 = 0xff << Self::CUSTOM_SHIFT;

   /// The empty status.
   pub const EMPTY: Self = Self(0);

   /// Raw bits.
   #[inline(always)]
   pub const fn bits(self) -> u16 {
      self.0
   }

   #[inline(always)]
   pub const fn has_value(self) -> bool {
      self.0 & Self::HAS_VALUE != 0
   }

   #[inline(always)]
   pub const fn has_error(self) -> bool {
      self.0 & Self::HAS_ERROR != 0
   }

   #[inline(always)]
   pub const fn has_exception(self) -> bool {
      self.0 & Self::HAS_EXCEPTION != 0
   }

   /// True if an error or an exception is stored.
   #[inline(always)]
   pub const fn has_failure(self) -> bool {
      self.0 & (Self::HAS_ERROR | Self::HAS_EXCEPTION) != 0
   }

   /// True if the stored error was classified as errno-like at construction.
   #[inline(always)]
   pub const fn error_is_errno(self) -> bool {
      self.0 & Self::ERROR_IS_ERRNO != 0
   }

   #[inline(always)]
   pub const fn is_moved_from(self) -> bool {
      self.0 & Self::MOVED_FROM != 0
   }

   /// True if no payload is stored. A moved-from cell is also empty.
   #[inline(always)]
   pub const fn is_empty(self) -> bool {
      self.0 & Self::PAYLOAD_MASK == 0
   }

   /// The custom byte.
   #[inline(always)]
   pub const fn custom(self) -> u8 {
      (self.0 >> Self::CUSTOM_SHIFT) as u8
   }

   /// Kind of the stored payload.
   #[inline]
   pub const fn kind(self) -> Kind {
      if self.has_value() {
         Kind::Value
      } else if self.has_error() {
         Kind::Error
      } else if self.has_exception() {
         Kind::Exception
      } else {
         Kind::Empty
      }
   }

   /// Replaces the payload bits, dropping the errno and moved-from markers.
   #[inline(always)]
   pub(crate) const fn with_payload(self, bit: u16) -> Self {
      Self((self.0 & Self::CUSTOM_MASK) | bit)
   }

   #[inline(always)]
   pub(crate) const fn with_errno(self, errno: bool) -> Self {
      if errno {
         Self(self.0 | Self::ERROR_IS_ERRNO)
      } else {
         Self(self.0 & !Self::ERROR_IS_ERRNO)
      }
   }

   #[inline(always)]
   pub(crate) const fn with_custom(self, custom: u8) -> Self {
      Self((self.0 & !Self::CUSTOM_MASK) | ((custom as u16) << Self::CUSTOM_SHIFT))
   }
}

impl fmt::Debug for Status {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_struct("Status");
      d.field("kind", &self.kind());
      if self.error_is_errno() {
         d.field("errno", &true);
      }
      if self.is_moved_from() {
         d.field("moved_from", &true);
      }
      if self.custom() != 0 {
         d.field("custom", &format_args!("{:#04x}", self.custom()));
      }
      d.finish()
   }
}

/// Which alternative a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
   Empty,
   Value,
   Error,
   Exception,
}

impl fmt::Display for Kind {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Self::Empty => "empty",
         Self::Value => "value",
         Self::Error => "error",
         Self::Exception => "exception",
      })
   }
}
