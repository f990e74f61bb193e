//! Sysfs GPIO edge source.
//!
//! Reads line levels from `/sys/class/gpio/gpioN/value` style files and turns
//! the priority notifications the kernel raises on a configured edge into
//! [`EdgeEvent`]s. Exporting the GPIO and writing its `edge` file is left to
//! the host.
//!
//! On hosts where the file cannot be registered for priority readiness (not
//! Linux, no tokio reactor, or a file that is not pollable) subscriptions fall
//! back to an inert no-op and a warning is logged.

use crate::error::{Result, WiegandError};
use crate::traits::{EdgeMask, EdgeSender, EdgeSource, LineResource, Subscription};
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use wiegand_core::Line;

/// Edge source backed by sysfs GPIO value files.
#[derive(Debug, Default, Clone)]
pub struct SysfsEdgeSource {
    degraded: bool,
}

impl SysfsEdgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edge source that opens and samples real files but never subscribes.
    ///
    /// Useful for hosts that want to exercise attach without edge delivery.
    pub fn degraded() -> Self {
        Self { degraded: true }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// An opened sysfs value file.
#[derive(Debug)]
pub struct SysfsLine {
    line: Line,
    path: PathBuf,
    file: File,
}

impl SysfsLine {
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_level(&self) -> std::io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let n = self.file.read_at(&mut buf, 0)?;
        Ok((n == 1).then_some(buf[0]))
    }
}

impl LineResource for SysfsLine {
    fn sample(&self) -> Result<u8> {
        let byte = self
            .read_level()
            .map_err(|e| WiegandError::sample(self.line, e.to_string()))?;

        match byte {
            Some(b'0') => Ok(0),
            Some(b'1') => Ok(1),
            Some(other) => Err(WiegandError::sample(
                self.line,
                format!("unexpected value {other:#04x} in {}", self.path.display()),
            )),
            None => Err(WiegandError::sample(
                self.line,
                format!("empty read from {}", self.path.display()),
            )),
        }
    }
}

impl EdgeSource for SysfsEdgeSource {
    type Resource = SysfsLine;

    fn open(&mut self, line: Line, path: &Path) -> Result<SysfsLine> {
        let file = File::open(path).map_err(|e| WiegandError::attach(line, path, e))?;
        let resource = SysfsLine {
            line,
            path: path.to_path_buf(),
            file,
        };

        // Reading once clears any notification pending from before we opened.
        resource
            .read_level()
            .map_err(|e| WiegandError::attach(line, path, e))?;

        debug!("Opened {} at {}", line, path.display());
        Ok(resource)
    }

    fn subscribe(
        &mut self,
        line: Line,
        resource: &SysfsLine,
        mask: EdgeMask,
        notify: EdgeSender,
    ) -> Result<Subscription> {
        if self.degraded {
            debug!("Edge notification disabled, {} will stay silent", line);
            return Ok(Subscription::inert(line));
        }

        match watch::spawn(line, resource, mask, notify) {
            Ok(task) => Ok(Subscription::from_task(line, task)),
            Err(reason) => {
                warn!(
                    "Edge notification unavailable for {} ({}): {}; line will stay silent",
                    line,
                    resource.path.display(),
                    reason
                );
                Ok(Subscription::inert(line))
            }
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod watch {
    use super::SysfsLine;
    use crate::traits::{EdgeEvent, EdgeMask, EdgeSender};
    use std::fs::File;
    use tokio::io::Interest;
    use tokio::io::unix::AsyncFd;
    use tokio::task::JoinHandle;
    use tracing::trace;
    use wiegand_core::Line;

    pub(super) fn spawn(
        line: Line,
        resource: &SysfsLine,
        mask: EdgeMask,
        notify: EdgeSender,
    ) -> Result<JoinHandle<()>, String> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| e.to_string())?;
        let _guard = runtime.enter();

        let file = resource.file.try_clone().map_err(|e| e.to_string())?;
        let fd = AsyncFd::with_interest(file, Interest::PRIORITY).map_err(|e| e.to_string())?;

        Ok(runtime.spawn(run(line, fd, mask, notify)))
    }

    async fn run(line: Line, fd: AsyncFd<File>, mask: EdgeMask, notify: EdgeSender) {
        loop {
            let event = match fd.ready(Interest::PRIORITY).await {
                Ok(mut guard) => {
                    let ready = guard.ready();
                    guard.clear_ready();

                    let mut events = EdgeMask::PRI;
                    if ready.is_error() {
                        events |= EdgeMask::ERR;
                    }
                    if (events & mask).is_empty() {
                        continue;
                    }
                    trace!("Edge on {}: {}", line, events);
                    EdgeEvent::new(line, events & mask)
                }
                Err(e) => EdgeEvent::failed(line, e.to_string()),
            };

            let failed = event.error.is_some();
            if notify.send(event).is_err() || failed {
                break;
            }
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod watch {
    use super::SysfsLine;
    use crate::traits::{EdgeMask, EdgeSender};
    use tokio::task::JoinHandle;
    use wiegand_core::Line;

    pub(super) fn spawn(
        _line: Line,
        _resource: &SysfsLine,
        _mask: EdgeMask,
        _notify: EdgeSender,
    ) -> Result<JoinHandle<()>, String> {
        Err("priority readiness is only available on Linux".to_string())
    }
}
