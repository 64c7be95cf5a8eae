// CLASSIFICATION: COMMUNITY
// Filename: server.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Control socket listener.
//!
//! Binds the Unix socket, accepts connections and runs the dispatcher for
//! each one on its own thread. A failed connection never affects the
//! listener or other connections.

use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use super::dispatch::Dispatcher;
use super::registry::SockoptRegistry;
use crate::config::CtrlConfig;

/// Listening control socket.
pub struct CtrlServer {
    listener: UnixListener,
    path: PathBuf,
    dispatcher: Dispatcher,
    shutdown: Arc<AtomicBool>,
    next_conn: AtomicU64,
}

impl CtrlServer {
    /// Bind the socket described by `config`, replacing a stale socket file.
    pub fn bind(config: &CtrlConfig, registry: Arc<SockoptRegistry>) -> io::Result<Self> {
        let path = config.socket_path.clone();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.file_type().is_socket() => {
                fs::remove_file(&path)?;
                debug!("removed stale control socket {}", path.display());
            }
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a socket", path.display()),
                ))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        let listener = UnixListener::bind(&path)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(config.socket_mode))?;
        info!("control socket listening at {}", path.display());
        Ok(Self {
            listener,
            path,
            dispatcher: Dispatcher::new(registry).with_max_payload(config.max_payload),
            shutdown: Arc::new(AtomicBool::new(false)),
            next_conn: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Accept and serve connections until shutdown is requested.
    pub fn run(&self) -> io::Result<()> {
        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.serve_connection(stream) {
                        warn!("cannot spawn control connection thread: {}", e);
                    }
                }
                Err(e) => warn!("control accept failed: {}", e),
            }
        }
        info!("control socket {} stopped", self.path.display());
        Ok(())
    }

    fn serve_connection(&self, mut stream: UnixStream) -> io::Result<()> {
        let id = self.next_conn.fetch_add(1, Ordering::Relaxed);
        let dispatcher = self.dispatcher.clone();
        thread::Builder::new()
            .name(format!("ctrl-conn-{}", id))
            .spawn(move || {
                debug!("control connection {} accepted", id);
                match dispatcher.sockopt_ctl(&mut stream) {
                    Ok(n) => debug!("control connection {} done, {} requests", id, n),
                    Err(e) => debug!("control connection {} ended: {}", id, e),
                }
            })?;
        Ok(())
    }

    /// Run the accept loop on a background thread.
    pub fn spawn(self) -> io::Result<CtrlServerHandle> {
        let shutdown = Arc::clone(&self.shutdown);
        let path = self.path.clone();
        let thread = thread::Builder::new()
            .name("ctrl-listener".into())
            .spawn(move || {
                if let Err(e) = self.run() {
                    warn!("control listener failed: {}", e);
                }
            })?;
        Ok(CtrlServerHandle {
            path,
            shutdown,
            thread: Some(thread),
        })
    }
}

impl Drop for CtrlServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Handle to a listener started with [`CtrlServer::spawn`].
pub struct CtrlServerHandle {
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CtrlServerHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop accepting connections and wait for the listener thread.
    ///
    /// Connections already being served run until their peers leave.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake the blocking accept. Without that the listener never sees
        // the flag, so it is left detached instead of joined.
        if let Err(e) = UnixStream::connect(&self.path) {
            warn!(
                "cannot wake control listener at {}: {}, detaching it",
                self.path.display(),
                e
            );
            return;
        }
        if thread.join().is_err() {
            warn!("control listener thread panicked");
        }
    }
}

impl Drop for CtrlServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
