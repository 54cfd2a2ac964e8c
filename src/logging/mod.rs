use std::io::{self, Write};

use env_logger::Builder;
use tokio::{
    fs::{create_dir_all, metadata, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::{
        mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
        watch,
    },
    task::JoinHandle,
};

use crate::{config, core::OrderResult};

pub struct AsyncWriter {
    sender: UnboundedSender<Vec<u8>>,
}

impl Write for AsyncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let data = buf.to_vec();
        self.sender
            .send(data)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes `log` records either to stderr or, when `log.path` is set, through a
/// channel to a file written by [`Logger::run`].
///
/// The console shares the terminal with the logger, so a file is the usual
/// choice for interactive sessions.
pub struct Logger {
    sender: UnboundedSender<Vec<u8>>,
    receiver: UnboundedReceiver<Vec<u8>>,
    config: config::Log,
}

impl Logger {
    pub fn new(config: config::Log) -> Self {
        let (sender, receiver) = unbounded_channel::<Vec<u8>>();
        Self {
            sender,
            receiver,
            config,
        }
    }

    fn create_async_writer(&self) -> AsyncWriter {
        AsyncWriter {
            sender: self.sender.clone(),
        }
    }

    fn builder(&self) -> Builder {
        let mut builder = Builder::new();
        builder.filter_level(self.config.level_filter());
        // RUST_LOG still wins over the configured level
        builder.parse_env(env_logger::Env::default());
        builder
    }

    pub fn init_env_logger(&self) {
        let mut builder = self.builder();
        if self.config.path.is_some() {
            builder.target(env_logger::Target::Pipe(Box::new(self.create_async_writer())));
        }
        if let Err(e) = builder.try_init() {
            eprintln!("logger already initialized: {e}");
        }
    }

    /// Starts [`Logger::run`] on the runtime.
    pub fn spawn(self) -> LogTask {
        let (shutdown, shutdown_rx) = watch::channel(false);
        LogTask {
            shutdown,
            handle: tokio::spawn(self.run(shutdown_rx)),
        }
    }

    /// Drains buffered records into the log file until `shutdown` flips to true
    /// or every writer is gone. Returns immediately when logging to stderr.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> OrderResult<()> {
        let Some(log_file_path) = self.config.path.clone() else {
            return Ok(());
        };

        if let Some(parent) = std::path::Path::new(&log_file_path).parent() {
            if !parent.as_os_str().is_empty() && metadata(parent).await.is_err() {
                create_dir_all(parent).await?;
            }
        }

        let mut file = BufWriter::new(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&log_file_path)
                .await?,
        );

        // only writers handed to env_logger keep the channel open
        drop(self.sender);

        loop {
            tokio::select! {
                biased;
                // Shutdown signal handling
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },

                data = self.receiver.recv() => {
                    match data {
                        Some(data) => {
                            if let Err(e) = file.write_all(&data).await {
                                eprintln!("Failed to write to log file: {e}");
                            }
                            file.flush().await?;
                        }
                        None => break,
                    }
                }
            }
        }

        // keep whatever was logged right before shutdown
        while let Ok(data) = self.receiver.try_recv() {
            file.write_all(&data).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// A running log writer and its shutdown switch.
pub struct LogTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<OrderResult<()>>,
}

impl LogTask {
    /// Signals the writer and waits until buffered records are on disk.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        match self.handle.await {
            Ok(Err(e)) => eprintln!("Failed to write log file: {e}"),
            Err(e) => eprintln!("Log writer failed: {e}"),
            Ok(Ok(())) => {}
        }
    }
}
