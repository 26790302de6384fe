use crate::domain::payment::PaymentRequest;
use crate::error::{Result, RoutingError};
use std::io::Read;

/// Reads payment requests from a CSV source.
///
/// Wraps `csv::Reader` and yields `Result<PaymentRequest>` per row,
/// trimming whitespace and tolerating flexible record lengths.
pub struct PaymentRequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PaymentRequestReader<R> {
    /// Creates a new reader from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes requests,
    /// allowing large files to stream without loading everything.
    pub fn requests(self) -> impl Iterator<Item = Result<PaymentRequest>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RoutingError::from))
    }
}
