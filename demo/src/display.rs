//! Simulated display that logs every lookup table write

use myrtio_gamma_composer::virtual_display::VirtualSession;
use myrtio_gamma_composer::{
    Channel, DeviceError, GammaDevice, GammaSession, LookupTable, TransferFn, VirtualDisplay,
};
use tracing::{debug, trace};

/// [`VirtualDisplay`] wrapper tracing the curves it gets programmed with
#[derive(Clone)]
pub(crate) struct TracedDisplay {
    inner: VirtualDisplay,
}

impl TracedDisplay {
    pub(crate) fn new(inner: VirtualDisplay) -> Self {
        Self { inner }
    }

    pub(crate) fn display(&self) -> &VirtualDisplay {
        &self.inner
    }
}

impl GammaDevice for TracedDisplay {
    type Session = TracedSession;

    fn open(&mut self) -> Result<TracedSession, DeviceError> {
        let session = self.inner.open()?;
        debug!(controllers = self.inner.controllers(), "session opened");
        Ok(TracedSession { inner: session })
    }
}

pub(crate) struct TracedSession {
    inner: VirtualSession,
}

impl GammaSession for TracedSession {
    fn set_gamma(&mut self, curve: &TransferFn) -> Result<(), DeviceError> {
        self.inner.set_gamma(curve)?;
        trace!(
            red = curve.apply(Channel::Red, 0.5),
            green = curve.apply(Channel::Green, 0.5),
            blue = curve.apply(Channel::Blue, 0.5),
            "curve written"
        );
        Ok(())
    }

    fn lookup_table(&mut self) -> Result<LookupTable, DeviceError> {
        self.inner.lookup_table()
    }
}
