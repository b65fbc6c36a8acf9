use std::sync::{Arc, Mutex};

use prologix_frame::{LogicalCommand, ResponseLine};
use prologix_transport::LineTransport;

use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, Result};

/// A dispatcher that can be cloned and used from several threads.
///
/// The lock is held for the whole write-then-read of an exchange, so a
/// response is always delivered to the caller that sent the command. If a
/// caller panics while holding the lock, every later call fails with
/// [`DispatchError::Poisoned`].
pub struct SharedDispatcher<T: LineTransport> {
    inner: Arc<Mutex<Dispatcher<T>>>,
}

impl<T: LineTransport> SharedDispatcher<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(dispatcher)),
        }
    }

    /// Run `f` with exclusive access to the dispatcher.
    ///
    /// Use this to group several exchanges, e.g. select an address and then
    /// query the instrument, without another caller slipping in between.
    pub fn with<R>(&self, f: impl FnOnce(&mut Dispatcher<T>) -> Result<R>) -> Result<R> {
        let mut guard = self.inner.lock().map_err(|_| DispatchError::Poisoned)?;
        f(&mut guard)
    }

    pub fn send_only(&self, cmd: &LogicalCommand) -> Result<()> {
        self.with(|d| d.send_only(cmd))
    }

    pub fn send_and_receive(&self, cmd: &LogicalCommand) -> Result<ResponseLine> {
        self.with(|d| d.send_and_receive(cmd))
    }

    pub fn write(&self, text: &str) -> Result<()> {
        self.with(|d| d.write(text))
    }

    pub fn query(&self, text: &str) -> Result<ResponseLine> {
        self.with(|d| d.query(text))
    }

    /// Recover the dispatcher once every other handle has been dropped.
    ///
    /// Hands `self` back while other handles exist. The inner result is
    /// [`DispatchError::Poisoned`] if a caller panicked mid-exchange.
    pub fn try_unwrap(self) -> std::result::Result<Result<Dispatcher<T>>, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().map_err(|_| DispatchError::Poisoned)),
            Err(inner) => Err(Self { inner }),
        }
    }
}

impl<T: LineTransport> Clone for SharedDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: LineTransport> From<Dispatcher<T>> for SharedDispatcher<T> {
    fn from(dispatcher: Dispatcher<T>) -> Self {
        Self::new(dispatcher)
    }
}
