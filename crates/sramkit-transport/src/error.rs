/// Errors that can occur in SPI transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The SPI peripheral reported a bus fault.
    #[error("spi bus fault: {0}")]
    Bus(String),

    /// The chip-select line could not be driven.
    #[error("chip-select fault: {0}")]
    ChipSelect(String),

    /// A data transfer was attempted while chip-select was released.
    #[error("transfer attempted with chip-select released")]
    NotSelected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
