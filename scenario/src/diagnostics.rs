use derive_more::{Display, Error};

/// A non-fatal problem found while parsing or serving a scenario.
///
/// None of these stop an instance from answering queries; each comes with a defined
/// fallback, noted on the variant.
#[derive(Clone, Debug, PartialEq, Display, Error)]
pub enum ScenarioWarning {
    /// No scenario text was set before parsing. Every output reads 0.0.
    #[display("no scenario text was set, all outputs will read 0.0")]
    MissingInput,

    /// A group whose time field is not a number. Only that group is dropped.
    #[display("dropped scenario group {index} `[{text}]`: time field is not a number")]
    MalformedRow {
        index: usize,
        text: String,
    },

    /// A group whose time is earlier than the group accepted before it. Only that group is dropped.
    #[display("dropped scenario group {index} `[{text}]`: time {time} is earlier than {previous}")]
    OutOfOrderRow {
        index: usize,
        text: String,
        time: f64,
        previous: f64,
    },

    /// The interpolation text does not name one policy per column. Every column uses the default.
    #[display(
        "interpolation has {tokens} token(s) for {columns} column(s), using the default for all columns"
    )]
    ColumnCountMismatch { tokens: usize, columns: usize },

    /// A value reference that does not address an output. Reads 0.0.
    #[display("value reference {reference} is not a parsed output")]
    UnknownReference { reference: u32 },

    /// A string was written to a value reference that is not a string parameter. Ignored.
    #[display("value reference {reference} is not a string parameter")]
    NotAStringParameter { reference: u32 },
}

/// Outcome of one engine call, ordered by severity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Status {
    #[default]
    Ok,
    Warning,
    Error,
}

impl Status {
    /// The more severe of the two.
    #[must_use]
    pub fn and(self, other: Status) -> Status {
        self.max(other)
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl From<&ScenarioWarning> for Status {
    fn from(_: &ScenarioWarning) -> Self {
        Status::Warning
    }
}

impl FromIterator<Status> for Status {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        iter.into_iter().fold(Status::Ok, Status::and)
    }
}
