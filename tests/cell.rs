use std::convert::Infallible;
use std::rc::Rc;

use poly_outcome::{Error, Kind, Payload, StateCell, Status};

type Cell<T> = StateCell<T, String, Infallible>;

#[test]
fn test_new_is_empty_and_valid() {
   let cell: Cell<i32> = StateCell::new();
   assert!(cell.is_empty());
   assert!(!cell.is_moved_from());
   assert!(cell.check_validity().is_ok());
   assert_eq!(cell.status(), Status::EMPTY);
   assert_eq!(cell.status().kind(), Kind::Empty);
   assert_eq!(cell.value(), None);
}

#[test]
fn test_construct_exactly_once() {
   let mut cell: Cell<i32> = StateCell::new();
   assert_eq!(cell.construct_value(1).copied(), Ok(1));
   assert!(cell.has_value());

   // A second construction of any alternative is refused.
   assert_eq!(cell.construct_value(2), Err(2));
   assert_eq!(cell.construct_error("late".to_string()), Err("late".to_string()));
   assert_eq!(cell.value(), Some(&1));
}

#[test]
fn test_at_most_one_alternative() {
   let cell: Cell<i32> = StateCell::with_error("boom".to_string());
   assert!(cell.has_error());
   assert!(!cell.has_value());
   assert!(!cell.has_exception());
   assert_eq!(cell.status().bits() & Status::HAS_ERROR, Status::HAS_ERROR);
   assert_eq!(cell.error().map(String::as_str), Some("boom"));
   assert_eq!(cell.value(), None);
}

#[test]
fn test_take_marks_moved_from() {
   let mut cell: Cell<String> = StateCell::with_value("hello".to_string());
   assert_eq!(cell.take(), Payload::Value("hello".to_string()));
   assert!(cell.is_moved_from());
   assert!(matches!(cell.check_validity(), Err(Error::NoState)));

   // Nothing left to move out; a moved-from cell refuses new payloads.
   assert_eq!(cell.take_value(), None);
   assert_eq!(cell.construct_value("again".to_string()), Err("again".to_string()));
}

#[test]
fn test_take_alternative_mismatch_leaves_payload() {
   let mut cell: Cell<i32> = StateCell::with_value(5);
   assert_eq!(cell.take_error(), None);
   assert!(cell.has_value());
   assert_eq!(cell.take_value(), Some(5));
}

#[test]
fn test_clear_revalidates() {
   let mut cell: Cell<i32> = StateCell::with_value(3);
   let _ = cell.take();
   assert!(cell.is_moved_from());

   cell.clear();
   assert!(cell.is_empty());
   assert!(cell.check_validity().is_ok());
   assert!(cell.construct_value(4).is_ok());

   // Clearing twice is harmless.
   cell.clear();
   cell.clear();
   assert!(cell.is_empty());
}

#[test]
fn test_payload_dropped_exactly_once() {
   let tracker = Rc::new(());
   {
      let cell: StateCell<Rc<()>, (), ()> = StateCell::with_value(Rc::clone(&tracker));
      assert_eq!(Rc::strong_count(&tracker), 2);
      drop(cell);
   }
   assert_eq!(Rc::strong_count(&tracker), 1);

   let mut cell: StateCell<(), Rc<()>, ()> = StateCell::with_error(Rc::clone(&tracker));
   let taken = cell.take_error();
   assert_eq!(Rc::strong_count(&tracker), 2);
   drop(cell);
   assert_eq!(Rc::strong_count(&tracker), 2);
   drop(taken);
   assert_eq!(Rc::strong_count(&tracker), 1);
}

#[test]
fn test_void_alternatives() {
   let mut cell: StateCell<(), (), ()> = StateCell::new();
   assert!(cell.construct_exception(()).is_ok());
   assert!(cell.has_exception());
   assert_eq!(cell.take(), Payload::Exception(()));
}

#[test]
fn test_custom_flags_survive_take() {
   let mut cell: Cell<i32> = StateCell::with_value(1);
   cell.set_custom_flags(0xa5);
   assert_eq!(cell.custom_flags(), 0xa5);

   let _ = cell.take();
   assert_eq!(cell.custom_flags(), 0xa5);
   assert!(cell.is_moved_from());

   cell.clear();
   assert_eq!(cell.custom_flags(), 0);
}

#[test]
fn test_errno_bit_only_with_error() {
   let mut cell: Cell<i32> = StateCell::with_value(1);
   cell.set_error_is_errno(true);
   assert!(!cell.status().error_is_errno());

   let mut cell: Cell<i32> = StateCell::with_error("e".to_string());
   cell.set_error_is_errno(true);
   assert!(cell.status().error_is_errno());
}

#[test]
fn test_from_result_and_into_payload() {
   let cell: Cell<i32> = Ok(9).into();
   assert_eq!(cell.into_payload(), Payload::Value(9));

   let cell: Cell<i32> = Err("bad".to_string()).into();
   assert_eq!(cell.status().kind(), Kind::Error);
   assert_eq!(cell.into_payload(), Payload::Error("bad".to_string()));
}

#[test]
fn test_clone_copies_status() {
   let mut cell: Cell<i32> = StateCell::with_error("e".to_string());
   cell.set_error_is_errno(true);
   cell.set_custom_flags(7);

   let copy = cell.clone();
   assert_eq!(copy.status(), cell.status());
   assert_eq!(copy.error(), cell.error());
   assert_eq!(copy, cell);
}
