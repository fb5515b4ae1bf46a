use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("bme680 measurement timeout")]
    Timeout,
    #[error("bme680 not found on any known i2c address")]
    NotFound,
    #[error("unexpected chip id 0x{id:02x} at address 0x{address:02x}")]
    InvalidChipId { address: u8, id: u8 },
    #[error("invalid device settings: {0}")]
    InvalidSettings(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
