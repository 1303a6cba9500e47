//! A 'sink' is where samples end up.

use metric::Sample;
use thiserror::Error;

mod console;
mod influxdb;

pub use self::console::Console;
pub use self::influxdb::InfluxDB;

/// Sink errors.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] ::reqwest::Error),
    /// The database refused the write.
    #[error("write rejected with status {0}: {1}")]
    Rejected(u16, String),
    /// Delivery was retried until the attempt limit without success.
    #[error("gave up after {0} delivery attempts: {1}")]
    GaveUp(u32, String),
    /// There was nothing to write.
    #[error("nothing was collected")]
    NothingCollected,
}

/// A 'sink' accepts samples and writes them somewhere on flush.
pub trait Sink {
    /// Buffer one sample.
    fn deliver(&mut self, sample: Sample) -> ();
    /// Write out every buffered sample.
    fn flush(&mut self) -> Result<(), Error>;

    /// Buffer every sample, then flush.
    fn deliver_all(&mut self, samples: Vec<Sample>) -> Result<(), Error> {
        for sample in samples {
            self.deliver(sample);
        }
        self.flush()
    }
}
