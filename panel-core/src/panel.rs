//! Physical panel access for the forced resync.

/// Input-polling side of the panels.
///
/// Every tick the engine collects the controls that moved since the last
/// tick. During panel sync it asks for the current position of every
/// control, as if each had just changed.
pub trait PanelSource {
    /// Call `request(label, value)` once per tracked control.
    fn resync(&mut self, request: &mut dyn FnMut(&str, u16));

    /// Call `request(label, value)` for each control that changed since the
    /// previous poll.
    fn poll_changes(&mut self, request: &mut dyn FnMut(&str, u16)) {
        let _ = request;
    }
}

/// No physical inputs attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPanels;

impl PanelSource for NoPanels {
    fn resync(&mut self, _request: &mut dyn FnMut(&str, u16)) {}
}

impl<P: PanelSource + ?Sized> PanelSource for &mut P {
    fn resync(&mut self, request: &mut dyn FnMut(&str, u16)) {
        (**self).resync(request);
    }

    fn poll_changes(&mut self, request: &mut dyn FnMut(&str, u16)) {
        (**self).poll_changes(request);
    }
}

/// A fixed list of `(label, value)` positions.
impl<const N: usize> PanelSource for [(&str, u16); N] {
    fn resync(&mut self, request: &mut dyn FnMut(&str, u16)) {
        for &(label, value) in self.iter() {
            request(label, value);
        }
    }
}
