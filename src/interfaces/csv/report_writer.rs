use crate::domain::payment::Payment;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReportRow<'a> {
    id: String,
    provider: String,
    status: String,
    provider_reference: &'a str,
}

/// Writes a CSV report of processed payments.
pub struct PaymentReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentReportWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_payments(&mut self, payments: &[Payment]) -> Result<()> {
        for payment in payments {
            self.writer.serialize(ReportRow {
                id: payment.id.to_string(),
                provider: payment.provider.to_string(),
                status: payment.status.to_string(),
                provider_reference: payment.provider_reference.as_deref().unwrap_or(""),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
