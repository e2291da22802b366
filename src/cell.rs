use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::value::{ConversionError, Float, Int, Parsed, Scan, Text};

/// Shared handle to a bound column's storage.
///
/// The reader is the only writer: every successful `advance` re-scans the
/// current row into the slot. Values are meaningful only after an advance
/// that returned `true`, and only when the reader has no latched error the
/// caller is unwilling to accept.
///
/// Holding a [`Slot::borrow`] guard across `advance` panics.
pub struct Slot<V>(Rc<RefCell<V>>);

impl<V> Slot<V> {
    pub(crate) fn new(value: V) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    pub fn borrow(&self) -> Ref<'_, V> {
        self.0.borrow()
    }
}

impl<V> Clone for Slot<V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: fmt::Debug> fmt::Debug for Slot<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&*self.0.borrow()).finish()
    }
}

impl<V: Scan> Scan for Slot<V> {
    fn scan(&mut self, text: &str) -> Result<(), ConversionError> {
        self.0.borrow_mut().scan(text)
    }

    fn last_error(&self) -> Option<ConversionError> {
        self.0.borrow().last_error()
    }
}

impl Slot<Text> {
    #[must_use]
    pub fn value(&self) -> String {
        self.0.borrow().value.clone()
    }
}

impl Slot<Int> {
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0.borrow().value
    }

    #[must_use]
    pub fn value_or_default(&self) -> i64 {
        self.0.borrow().value_or_default()
    }
}

impl Slot<Float> {
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0.borrow().value
    }

    #[must_use]
    pub fn value_or_default(&self) -> f64 {
        self.0.borrow().value_or_default()
    }
}

impl<T: Clone + FromStr> Slot<Parsed<T>> {
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.0.borrow().value.clone()
    }
}
