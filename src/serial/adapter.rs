use std::future::pending;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::debounce::ButtonDebouncer;
use super::framer::LineFramer;
use super::keyboard::{key_to_line, terminal_line_to_key};
use super::protocol::{Button, Command, parse_line};
use super::SerialError;

const READ_CHUNK: usize = 64;
const COMMAND_QUEUE: usize = 16;
const PRESS_QUEUE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Serial,
    /// Terminal lines are treated as key presses first.
    Keyboard,
}

/// Cloneable access to a connected box, handed to whatever consumes input.
#[derive(Clone)]
pub struct FunBoxHandle {
    active: watch::Receiver<Option<Button>>,
    presses: broadcast::Sender<Button>,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
}

impl FunBoxHandle {
    /// The button currently inside its debounce window, if any.
    pub fn watch_active(&self) -> watch::Receiver<Option<Button>> {
        self.active.clone()
    }

    /// Every accepted press, in arrival order.
    pub fn presses(&self) -> broadcast::Receiver<Button> {
        self.presses.subscribe()
    }

    pub async fn send(&self, command: Command) -> Result<(), SerialError> {
        if self.cancel.is_cancelled() {
            return Err(SerialError::Disconnected);
        }
        self.commands
            .send(command)
            .await
            .map_err(|_| SerialError::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

pub struct FunBox {
    handle: FunBoxHandle,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl FunBox {
    /// Starts the read and write loops over an already open transport.
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::start(reader, writer, InputMode::Serial)
    }

    /// Opens a serial device node such as `/dev/ttyUSB0`. The line settings
    /// are expected to be configured on the node already.
    pub async fn open_device(path: impl AsRef<Path>) -> Result<Self, SerialError> {
        let path = path.as_ref();
        let file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .await?;
        info!("connected to FunBox at {}", path.display());
        let (reader, writer) = tokio::io::split(file);
        Ok(Self::connect(reader, writer))
    }

    /// Keyboard fallback: `a`-`f`, `1`-`6` and `esc`, one per line. Commands
    /// are echoed to `output`.
    pub fn keyboard<R, W>(input: R, output: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("serial device unavailable, using keyboard input");
        Self::start(input, output, InputMode::Keyboard)
    }

    fn start<R, W>(reader: R, writer: W, mode: InputMode) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (active_tx, active_rx) = watch::channel(None);
        let (press_tx, _) = broadcast::channel(PRESS_QUEUE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let cancel = CancellationToken::new();

        let reader = tokio::spawn(read_loop(
            reader,
            mode,
            active_tx,
            press_tx.clone(),
            cancel.clone(),
        ));
        let writer = tokio::spawn(write_loop(writer, command_rx, cancel.clone()));

        Self {
            handle: FunBoxHandle {
                active: active_rx,
                presses: press_tx,
                commands: command_tx,
                cancel,
            },
            reader,
            writer,
        }
    }

    pub fn handle(&self) -> FunBoxHandle {
        self.handle.clone()
    }

    /// Stops both loops and releases the transport.
    pub async fn disconnect(self) {
        self.handle.cancel.cancel();
        if let Err(e) = self.reader.await {
            warn!("serial read loop ended abnormally: {}", e);
        }
        if let Err(e) = self.writer.await {
            warn!("serial write loop ended abnormally: {}", e);
        }
        info!("FunBox disconnected");
    }
}

async fn read_loop<R>(
    mut reader: R,
    mode: InputMode,
    active: watch::Sender<Option<Button>>,
    presses: broadcast::Sender<Button>,
    cancel: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut framer = LineFramer::new();
    let mut debouncer = ButtonDebouncer::default();
    let mut reset_at: Option<Instant> = None;
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let reset = async move {
            match reset_at {
                Some(at) => sleep_until(at).await,
                None => pending().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = reset => {
                reset_at = None;
                active.send_replace(None);
            }
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    info!("FunBox input closed");
                    break;
                }
                Ok(n) => {
                    for line in framer.push(&buf[..n]) {
                        let line = match mode {
                            InputMode::Serial => line,
                            InputMode::Keyboard => match key_to_line(&terminal_line_to_key(&line)) {
                                Some(line) => line,
                                None => continue,
                            },
                        };
                        let Some(button) = handle_line(&line, &mut debouncer) else {
                            continue;
                        };
                        active.send_replace(Some(button));
                        reset_at = Some(Instant::now() + debouncer.window());
                        // No subscribers is fine; the watch still carries it.
                        let _ = presses.send(button);
                    }
                }
                Err(e) => {
                    error!("FunBox read failed: {}", e);
                    break;
                }
            }
        }
    }

    active.send_replace(None);
    cancel.cancel();
}

fn handle_line(line: &str, debouncer: &mut ButtonDebouncer) -> Option<Button> {
    let Some(button) = parse_line(line) else {
        warn!("ignoring serial line {:?}", line);
        return None;
    };

    match debouncer.accept(button, Instant::now().into_std()) {
        Some(button) => {
            debug!("button {:?} pressed", button);
            Some(button)
        }
        None => {
            debug!("button {:?} dropped during debounce", button);
            None
        }
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let command = tokio::select! {
            _ = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        debug!("sending {} to FunBox", command);
        let written = async {
            writer.write_all(&command.encode()).await?;
            writer.flush().await
        };
        if let Err(e) = written.await {
            error!("FunBox write failed: {}", e);
            break;
        }
    }

    let _ = writer.shutdown().await;
}
