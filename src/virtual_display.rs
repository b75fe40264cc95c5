//! In-memory display
//!
//! Simulates a set of display controllers with gamma lookup tables. Useful
//! for previews and for exercising animations without a display server.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::DeviceError;
use crate::lookup_table::{LookupTable, quantize};
use crate::transfer::{Channel, TransferFn};
use crate::{GammaDevice, GammaSession};

/// Controllers captured by a readback, see [`GammaSession::lookup_table`]
const READBACK_CONTROLLERS: usize = 1;

/// Lookup tables of one controller, indexed by channel
type ControllerTables = [Vec<u16>; 3];

struct DisplayState {
    controllers: Vec<ControllerTables>,
    writes: usize,
    unavailable: bool,
}

/// Simulated display.
///
/// Clones share the same state, so one clone can be handed to an animator
/// while another one inspects the tables or plays a foreign process.
#[derive(Clone)]
pub struct VirtualDisplay {
    state: Arc<Mutex<RefCell<DisplayState>>>,
}

impl VirtualDisplay {
    /// Create a display with `controllers` controllers of `size` entries,
    /// programmed with a linear ramp.
    pub fn new(controllers: usize, size: usize) -> Self {
        let ramp: Vec<u16> = (0..size)
            .map(|idx| quantize(idx as f32 / size as f32))
            .collect();
        let controllers = vec![[ramp.clone(), ramp.clone(), ramp]; controllers];
        Self {
            state: Arc::new(Mutex::new(RefCell::new(DisplayState {
                controllers,
                writes: 0,
                unavailable: false,
            }))),
        }
    }

    /// Make opening sessions fail
    pub fn set_unavailable(&self, unavailable: bool) {
        critical_section::with(|cs| {
            self.state.borrow(cs).borrow_mut().unavailable = unavailable;
        });
    }

    /// Program every controller with `curve` as another process would.
    ///
    /// Not counted in [`VirtualDisplay::write_count`].
    pub fn interfere(&self, curve: &TransferFn) {
        critical_section::with(|cs| {
            program(&mut self.state.borrow(cs).borrow_mut(), curve);
        });
    }

    /// Number of lookup table writes made through sessions
    pub fn write_count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow(cs).borrow().writes)
    }

    /// Number of simulated controllers
    pub fn controllers(&self) -> usize {
        critical_section::with(|cs| self.state.borrow(cs).borrow().controllers.len())
    }

    /// Snapshot of every controller, including the ones sessions don't read back
    pub fn full_lookup_table(&self) -> LookupTable {
        critical_section::with(|cs| capture(&self.state.borrow(cs).borrow(), usize::MAX))
    }

    /// Level the given controller currently outputs for `input`
    pub fn sample(&self, controller: usize, channel: Channel, input: f32) -> Option<f32> {
        let tables = critical_section::with(|cs| {
            self.state.borrow(cs).borrow().controllers.get(controller).cloned()
        })?;
        let [red, green, blue] = tables;
        let snapshot = LookupTable::from_tables(vec![red], vec![green], vec![blue]);
        Some(snapshot.transfer_fn().apply(channel, input))
    }
}

impl GammaDevice for VirtualDisplay {
    type Session = VirtualSession;

    fn open(&mut self) -> Result<VirtualSession, DeviceError> {
        let unavailable =
            critical_section::with(|cs| self.state.borrow(cs).borrow().unavailable);
        if unavailable {
            return Err(DeviceError::Unavailable("virtual display is offline".into()));
        }
        Ok(VirtualSession {
            display: self.clone(),
        })
    }
}

/// Session with a [`VirtualDisplay`]
pub struct VirtualSession {
    display: VirtualDisplay,
}

impl GammaSession for VirtualSession {
    fn set_gamma(&mut self, curve: &TransferFn) -> Result<(), DeviceError> {
        critical_section::with(|cs| {
            let mut state = self.display.state.borrow(cs).borrow_mut();
            program(&mut state, curve);
            state.writes += 1;
        });
        Ok(())
    }

    fn lookup_table(&mut self) -> Result<LookupTable, DeviceError> {
        Ok(critical_section::with(|cs| {
            capture(&self.display.state.borrow(cs).borrow(), READBACK_CONTROLLERS)
        }))
    }
}

fn program(state: &mut DisplayState, curve: &TransferFn) {
    for tables in &mut state.controllers {
        let size = tables[0].len();
        let sampled = LookupTable::sample(curve, 1, size);
        for channel in Channel::ALL {
            if let Some(lut) = sampled.table(channel, 0) {
                tables[channel.index()].copy_from_slice(lut);
            }
        }
    }
}

fn capture(state: &DisplayState, controllers: usize) -> LookupTable {
    let mut channels: [Vec<Vec<u16>>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for tables in state.controllers.iter().take(controllers) {
        for channel in Channel::ALL {
            channels[channel.index()].push(tables[channel.index()].clone());
        }
    }
    let [red, green, blue] = channels;
    LookupTable::from_tables(red, green, blue)
}
