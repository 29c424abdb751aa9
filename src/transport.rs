use futures::stream::{self, Stream};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info, trace};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial link closed")]
    Closed,
}

/// One end of the serial link between detector and gate.
///
/// Generic over the underlying stream so the same code drives a real port
/// or an in-memory pipe.
#[derive(Debug)]
pub struct Transport<S = SerialStream> {
    stream: S,
}

impl Transport<SerialStream> {
    /// Open `port` as 8N1 with no flow control.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, TransportError> {
        let stream = tokio_serial::new(port, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open_native_async()
            .map_err(|source| TransportError::Open {
                port: port.to_string(),
                source,
            })?;
        info!(port, baud_rate, "serial port open");
        Ok(Transport::new(stream))
    }
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Transport { stream }
    }

    /// Next byte off the line, or `None` once the other end hangs up.
    pub async fn recv_byte(&mut self) -> Result<Option<u8>, TransportError> {
        let mut buf = [0u8; 1];
        match self.stream.read(&mut buf).await? {
            0 => {
                debug!("serial stream ended");
                Ok(None)
            }
            _ => {
                trace!(byte = buf[0], "received");
                Ok(Some(buf[0]))
            }
        }
    }

    pub async fn send_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.stream.write_all(&[byte]).await.map_err(write_error)?;
        self.stream.flush().await.map_err(write_error)?;
        trace!(byte, "sent");
        Ok(())
    }

    /// Incoming bytes as a stream. Ends when the line closes or after the
    /// first error.
    pub fn bytes(self) -> impl Stream<Item = Result<u8, TransportError>> {
        stream::unfold(Some(self), |state| async move {
            let mut transport = state?;
            match transport.recv_byte().await {
                Ok(Some(byte)) => Some((Ok(byte), Some(transport))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

fn write_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe => TransportError::Closed,
        _ => TransportError::Io(e),
    }
}
