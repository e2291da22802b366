use csv::ReaderBuilder;

/// Field-count policy applied to every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldCount {
    /// Every record must have as many fields as the header.
    #[default]
    FirstRecord,
    /// Records may vary in length.
    Any,
    /// Every record, the header included, must have exactly this many fields.
    Exact(usize),
}

/// Dialect and header-matching configuration for a column reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    delimiter: u8,
    comment: Option<u8>,
    quote: u8,
    quoting: bool,
    escape: Option<u8>,
    fields_per_record: FieldCount,
    trim_leading_space: bool,
    case_sensitive_header: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            delimiter: b',',
            comment: None,
            quote: b'"',
            quoting: true,
            escape: None,
            fields_per_record: FieldCount::FirstRecord,
            trim_leading_space: false,
            case_sensitive_header: false,
        }
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Lines starting with `comment` are skipped.
    #[must_use]
    pub const fn with_comment(mut self, comment: Option<u8>) -> Self {
        self.comment = comment;
        self
    }

    #[must_use]
    pub const fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Disables quote handling entirely when `false`.
    #[must_use]
    pub const fn with_quoting(mut self, quoting: bool) -> Self {
        self.quoting = quoting;
        self
    }

    /// Escape byte inside quoted fields. `None` means doubled quotes.
    #[must_use]
    pub const fn with_escape(mut self, escape: Option<u8>) -> Self {
        self.escape = escape;
        self
    }

    #[must_use]
    pub const fn with_fields_per_record(mut self, count: FieldCount) -> Self {
        self.fields_per_record = count;
        self
    }

    /// Strips leading whitespace from every field, the header included.
    ///
    /// Trimming happens after tokenization: a space before an opening quote
    /// keeps the field unquoted, so `a, "b,c"` splits into three fields and
    /// the quote characters stay in the text.
    #[must_use]
    pub const fn with_trim_leading_space(mut self, trim: bool) -> Self {
        self.trim_leading_space = trim;
        self
    }

    /// Header names must match declared names exactly when `true`.
    #[must_use]
    pub const fn with_case_sensitive_header(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive_header = case_sensitive;
        self
    }

    pub(crate) const fn fields_per_record(&self) -> FieldCount {
        self.fields_per_record
    }

    pub(crate) const fn trim_leading_space(&self) -> bool {
        self.trim_leading_space
    }

    pub(crate) const fn case_sensitive_header(&self) -> bool {
        self.case_sensitive_header
    }

    /// Tokenizer configuration. Header handling stays with the column reader,
    /// so the tokenizer yields the header as an ordinary record.
    pub(crate) fn csv_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .delimiter(self.delimiter)
            .comment(self.comment)
            .quote(self.quote)
            .quoting(self.quoting)
            .escape(self.escape)
            .double_quote(self.escape.is_none())
            .flexible(!matches!(self.fields_per_record, FieldCount::FirstRecord));
        builder
    }
}
