pub mod clock;
pub mod sample;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use sample::{RawSample, StorageRecord};

/// A gas/environment sensor that can take one raw sample per call.
///
/// A sample whose `heat_stable` flag is false is a valid reading: the device
/// answered but its gas heater has not reached the target temperature yet.
/// `Err` means the device could not be talked to.
pub trait GasSensor {
    fn poll(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>>;
}

impl<S: GasSensor + ?Sized> GasSensor for Box<S> {
    fn poll(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).poll()
    }
}

/// Persistence collaborator fed by the storage loop.
pub trait ReadingSink {
    fn store(&mut self, record: &StorageRecord) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<K: ReadingSink + ?Sized> ReadingSink for Box<K> {
    fn store(&mut self, record: &StorageRecord) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).store(record)
    }
}
