use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A field's text could not be represented in the declared type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {text:?} to {target}: {reason}")]
pub struct ConversionError {
    /// The offending field text, verbatim.
    pub text: String,
    /// Name of the destination type.
    pub target: Cow<'static, str>,
    pub reason: String,
}

impl ConversionError {
    pub fn new(
        text: impl Into<String>,
        target: impl Into<Cow<'static, str>>,
        reason: impl fmt::Display,
    ) -> Self {
        Self {
            text: text.into(),
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Converts one raw field into typed storage.
///
/// Implementors update their own storage in place on success. On failure
/// the prior content is left as the implementor sees fit, but the error must
/// still be reported so the reader can latch it.
pub trait Scan {
    /// Scans `text` into this value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if `text` is not representable in the
    /// destination type.
    fn scan(&mut self, text: &str) -> Result<(), ConversionError>;

    /// Error produced by the most recent scan, if it failed.
    ///
    /// Owned so that shared handles can report it without holding a borrow.
    fn last_error(&self) -> Option<ConversionError> {
        None
    }
}

/// Text destination. Stores the field verbatim and never fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub value: String,
}

impl Text {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Scan for Text {
    fn scan(&mut self, text: &str) -> Result<(), ConversionError> {
        self.value.clear();
        self.value.push_str(text);
        Ok(())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Base-10 signed integer destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Int {
    pub value: i64,
    /// Returned by [`Int::value_or_default`] after a failed scan.
    pub default: i64,
    error: Option<ConversionError>,
}

impl Int {
    #[must_use]
    pub const fn with_default(default: i64) -> Self {
        Self {
            value: 0,
            default,
            error: None,
        }
    }

    #[must_use]
    pub const fn value_or_default(&self) -> i64 {
        if self.error.is_some() {
            self.default
        } else {
            self.value
        }
    }
}

impl Scan for Int {
    fn scan(&mut self, text: &str) -> Result<(), ConversionError> {
        match text.parse::<i64>() {
            Ok(value) => {
                self.value = value;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                let error = ConversionError::new(text, "integer", err);
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn last_error(&self) -> Option<ConversionError> {
        self.error.clone()
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = itoa::Buffer::new();
        f.write_str(buffer.format(self.value))
    }
}

/// IEEE-754 double destination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Float {
    pub value: f64,
    /// Returned by [`Float::value_or_default`] after a failed scan.
    pub default: f64,
    error: Option<ConversionError>,
}

impl Float {
    #[must_use]
    pub const fn with_default(default: f64) -> Self {
        Self {
            value: 0.0,
            default,
            error: None,
        }
    }

    #[must_use]
    pub const fn value_or_default(&self) -> f64 {
        if self.error.is_some() {
            self.default
        } else {
            self.value
        }
    }
}

impl Scan for Float {
    fn scan(&mut self, text: &str) -> Result<(), ConversionError> {
        match text.parse::<f64>() {
            Ok(value) => {
                self.value = value;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                let error = ConversionError::new(text, "float", err);
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn last_error(&self) -> Option<ConversionError> {
        self.error.clone()
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buffer = ryu::Buffer::new();
        f.write_str(buffer.format(self.value))
    }
}

/// Destination for any [`FromStr`] type.
///
/// Holds `None` until the first successful scan; a failed scan keeps the
/// previous value.
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: Option<T>,
    error: Option<ConversionError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
        }
    }
}

impl<T> Scan for Parsed<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn scan(&mut self, text: &str) -> Result<(), ConversionError> {
        match text.parse::<T>() {
            Ok(value) => {
                self.value = Some(value);
                self.error = None;
                Ok(())
            }
            Err(err) => {
                let error = ConversionError::new(text, std::any::type_name::<T>(), err);
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn last_error(&self) -> Option<ConversionError> {
        self.error.clone()
    }
}
